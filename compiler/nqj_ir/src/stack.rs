//! Stack growth for deeply nested trees.
//!
//! The checker and the lowering phase recurse once per nested expression
//! and statement. Wrapping those recursions in [`ensure_sufficient_stack`]
//! grows the stack on demand instead of overflowing.

#[cfg(not(target_arch = "wasm32"))]
/// Grow the stack when less than this many bytes remain.
const RED_ZONE: usize = 100 * 1024;

#[cfg(not(target_arch = "wasm32"))]
/// Size of each additional stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if the remaining space is below the red zone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack; run `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
