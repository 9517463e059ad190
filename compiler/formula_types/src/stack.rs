//! Stack growth for recursive coercion.
//!
//! Coercion recurses along nested sort references, whose depth is bounded
//! only by the module being checked. Union flattening walks a worklist and
//! needs no guard.

/// Keep at least this much stack available (100KB).
const RED_ZONE: usize = 100 * 1024;

/// Grow by this much when below the red zone (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
