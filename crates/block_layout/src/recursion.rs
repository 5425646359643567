//! Stack growth for deep block trees.
//!
//! The solver recurses once per nesting level and once per wrap child, so a
//! machine-generated tree (a long chain of nested lists, a wrap over
//! thousands of words) can exceed a thread's default stack. Recursive entry
//! points run through [`ensure_sufficient_stack`], which grows the stack on
//! demand.
//!
//! On `wasm32` the call is a passthrough.

/// Grow the stack when less than this remains (128KB).
#[cfg(not(target_arch = "wasm32"))]
const RED_ZONE: usize = 128 * 1024;

/// Size of each stack extension (2MB).
#[cfg(not(target_arch = "wasm32"))]
const GROWTH: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROWTH, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
