use pretty_assertions::assert_eq;

use super::*;

fn card(n: usize) -> SizeExpr {
    SizeExpr::Card(SymbolId::from_index(n))
}

#[test]
fn counts_fold() {
    assert_eq!(
        SizeExpr::product([SizeExpr::Count(3), SizeExpr::Count(4)]),
        SizeExpr::Count(12)
    );
    assert_eq!(
        SizeExpr::sum([SizeExpr::Count(3), SizeExpr::Count(4)]),
        SizeExpr::Count(7)
    );
    assert_eq!(SizeExpr::sum([]), SizeExpr::Count(0));
    assert_eq!(SizeExpr::product([]), SizeExpr::Count(1));
}

#[test]
fn infinity_absorbs_but_zero_wins_products() {
    assert_eq!(
        SizeExpr::sum([SizeExpr::Count(1), SizeExpr::Infinity]),
        SizeExpr::Infinity
    );
    assert_eq!(
        SizeExpr::product([SizeExpr::Infinity, SizeExpr::Count(0)]),
        SizeExpr::Count(0)
    );
    assert_eq!(
        SizeExpr::product([SizeExpr::Count(u64::MAX), SizeExpr::Count(2)]),
        SizeExpr::Infinity
    );
}

#[test]
fn symbolic_terms_stay_symbolic() {
    let e = SizeExpr::product([card(4), SizeExpr::Count(2), SizeExpr::Count(1)]);
    assert_eq!(e, SizeExpr::Product(vec![card(4), SizeExpr::Count(2)]));
    assert_eq!(e.closed(), None);
    assert_eq!(e.to_string(), "(|s4| * 2)");
    assert_eq!(SizeExpr::sum([card(4)]), card(4));
}

#[test]
fn nested_counts_fold_into_the_outer_count() {
    let inner = SizeExpr::Sum(vec![card(1), SizeExpr::Count(1)]);
    assert_eq!(
        SizeExpr::sum([inner, SizeExpr::Count(2)]),
        SizeExpr::Sum(vec![card(1), SizeExpr::Count(3)])
    );
    let inner = SizeExpr::Product(vec![card(1), SizeExpr::Count(3)]);
    assert_eq!(
        SizeExpr::product([SizeExpr::Count(2), inner]),
        SizeExpr::Product(vec![card(1), SizeExpr::Count(6)])
    );
    let closed = SizeExpr::Sum(vec![SizeExpr::Count(4), SizeExpr::Count(1)]);
    assert_eq!(SizeExpr::sum([closed]), SizeExpr::Count(5));
}

#[test]
fn evaluate_with_fact_counts() {
    let e = SizeExpr::sum([SizeExpr::product([card(1), card(2)]), SizeExpr::Count(3)]);
    let counts = |s: SymbolId| Some(u64::from(s.raw()) * 10);
    assert_eq!(e.evaluate(&counts), Some(10 * 20 + 3));
    assert_eq!(SizeExpr::Infinity.evaluate(&counts), None);
    assert_eq!(e.closed(), None);
    assert_eq!(SizeExpr::Count(5).closed(), Some(5));
}

#[test]
fn map_ids_drops_unknown_cards_to_infinity() {
    let e = SizeExpr::product([card(1), SizeExpr::Count(2)]);
    let mapped = e.map_ids(&|s| (s.raw() == 1).then(|| SymbolId::from_index(7)));
    assert_eq!(mapped, SizeExpr::Product(vec![card(7), SizeExpr::Count(2)]));
    let lost = e.map_ids(&|_| None);
    assert_eq!(lost, SizeExpr::Infinity);
}
