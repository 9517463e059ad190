//! Cardinality bounds.

use std::fmt;

use crate::ids::SymbolId;

/// Upper bound on the number of values of a sort or position.
///
/// `Card(s)` stands for the number of `s` facts in a model: unbounded in
/// general, but finite in any one model. Constructors simplify: counts are
/// folded, `Infinity` absorbs, and a zero factor zeroes a product.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SizeExpr {
    Infinity,
    Count(u64),
    Card(SymbolId),
    Sum(Vec<SizeExpr>),
    Product(Vec<SizeExpr>),
}

impl SizeExpr {
    pub fn is_infinite(&self) -> bool {
        matches!(self, SizeExpr::Infinity)
    }

    /// The bound when it does not depend on any fact count.
    pub fn closed(&self) -> Option<u64> {
        self.evaluate(&|_| None)
    }

    pub fn sum(parts: impl IntoIterator<Item = SizeExpr>) -> SizeExpr {
        let mut count: u64 = 0;
        let mut terms = Vec::new();
        let mut queue: Vec<SizeExpr> = parts.into_iter().collect();
        queue.reverse();
        while let Some(part) = queue.pop() {
            match part {
                SizeExpr::Infinity => return SizeExpr::Infinity,
                SizeExpr::Count(n) => match count.checked_add(n) {
                    Some(c) => count = c,
                    None => return SizeExpr::Infinity,
                },
                // Nested counts fold into this one.
                SizeExpr::Sum(inner) => queue.extend(inner.into_iter().rev()),
                other => terms.push(other),
            }
        }
        finish(terms, count, 0, SizeExpr::Sum)
    }

    pub fn product(parts: impl IntoIterator<Item = SizeExpr>) -> SizeExpr {
        let mut count: u64 = 1;
        let mut infinite = false;
        let mut terms = Vec::new();
        let mut queue: Vec<SizeExpr> = parts.into_iter().collect();
        queue.reverse();
        while let Some(part) = queue.pop() {
            match part {
                SizeExpr::Count(0) => return SizeExpr::Count(0),
                SizeExpr::Infinity => infinite = true,
                SizeExpr::Count(n) => match count.checked_mul(n) {
                    Some(c) => count = c,
                    None => infinite = true,
                },
                SizeExpr::Product(inner) => queue.extend(inner.into_iter().rev()),
                other => terms.push(other),
            }
        }
        if infinite {
            return SizeExpr::Infinity;
        }
        finish(terms, count, 1, SizeExpr::Product)
    }

    /// Evaluate with known fact counts. `None` if infinite, a count is
    /// missing, or the result overflows.
    pub fn evaluate(&self, card: &dyn Fn(SymbolId) -> Option<u64>) -> Option<u64> {
        match self {
            SizeExpr::Infinity => None,
            SizeExpr::Count(n) => Some(*n),
            SizeExpr::Card(s) => card(*s),
            SizeExpr::Sum(parts) => parts
                .iter()
                .try_fold(0u64, |acc, p| acc.checked_add(p.evaluate(card)?)),
            SizeExpr::Product(parts) => parts
                .iter()
                .try_fold(1u64, |acc, p| acc.checked_mul(p.evaluate(card)?)),
        }
    }

    /// Rewrite `Card` references; unmapped ones become `Infinity`.
    #[must_use]
    pub fn map_ids(&self, f: &dyn Fn(SymbolId) -> Option<SymbolId>) -> SizeExpr {
        match self {
            SizeExpr::Infinity => SizeExpr::Infinity,
            SizeExpr::Count(n) => SizeExpr::Count(*n),
            SizeExpr::Card(s) => f(*s).map_or(SizeExpr::Infinity, SizeExpr::Card),
            SizeExpr::Sum(parts) => SizeExpr::sum(parts.iter().map(|p| p.map_ids(f))),
            SizeExpr::Product(parts) => SizeExpr::product(parts.iter().map(|p| p.map_ids(f))),
        }
    }
}

fn finish(
    mut terms: Vec<SizeExpr>,
    count: u64,
    identity: u64,
    make: fn(Vec<SizeExpr>) -> SizeExpr,
) -> SizeExpr {
    if count != identity || terms.is_empty() {
        terms.push(SizeExpr::Count(count));
    }
    if terms.len() == 1 {
        terms.pop().unwrap_or(SizeExpr::Count(count))
    } else {
        make(terms)
    }
}

impl fmt::Display for SizeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, parts: &[SizeExpr], op: &str| {
            f.write_str("(")?;
            for (i, p) in parts.iter().enumerate() {
                if i > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{p}")?;
            }
            f.write_str(")")
        };
        match self {
            SizeExpr::Infinity => f.write_str("inf"),
            SizeExpr::Count(n) => write!(f, "{n}"),
            SizeExpr::Card(s) => write!(f, "|{s:?}|"),
            SizeExpr::Sum(parts) => join(f, parts, "+"),
            SizeExpr::Product(parts) => join(f, parts, "*"),
        }
    }
}

#[cfg(test)]
mod tests;
