//! Three-valued truth for write-once decisions.

use crate::error::InternalError;

/// A decision that starts `Pending` and is resolved at most once.
///
/// Used for table validity and for coercion cache entries. Resolving an
/// already resolved value to the other value is an internal fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Lifted {
    True,
    False,
    #[default]
    Pending,
}

impl Lifted {
    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value {
            Lifted::True
        } else {
            Lifted::False
        }
    }

    /// `None` while pending.
    #[inline]
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Lifted::True => Some(true),
            Lifted::False => Some(false),
            Lifted::Pending => None,
        }
    }

    #[inline]
    pub fn is_pending(self) -> bool {
        self == Lifted::Pending
    }

    /// Resolve to `value`. Re-resolving to the same value is a no-op.
    pub fn resolve(&mut self, value: bool) -> Result<(), InternalError> {
        match self.to_bool() {
            None => {
                *self = Lifted::from_bool(value);
                Ok(())
            }
            Some(old) if old == value => Ok(()),
            Some(old) => Err(InternalError::LiftedRewrite { old, new: value }),
        }
    }

    /// Lower a pending value to `False`; resolved values are kept.
    ///
    /// Validity uses this: once any error is seen the table is invalid for
    /// good, but a still-pending table may later become valid.
    pub fn falsify(&mut self) {
        if *self == Lifted::Pending {
            *self = Lifted::False;
        }
    }
}
