//! Cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CheckAbort;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Polls a token every `batch` steps of a long traversal.
pub(crate) struct Ticker<'a> {
    token: &'a CancellationToken,
    batch: usize,
    count: usize,
}

impl<'a> Ticker<'a> {
    pub(crate) fn new(token: &'a CancellationToken, batch: usize) -> Self {
        Ticker {
            token,
            batch: batch.max(1),
            count: 0,
        }
    }

    #[inline]
    pub(crate) fn tick(&mut self) -> Result<(), CheckAbort> {
        self.count += 1;
        if self.count >= self.batch {
            self.count = 0;
            if self.token.is_cancelled() {
                return Err(CheckAbort::Cancelled);
            }
        }
        Ok(())
    }
}
