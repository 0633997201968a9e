/// Grow the stack when less than this much is left.
const RED_ZONE: usize = 128 * 1024;

/// How much to allocate each time the stack grows.
const GROW_BY: usize = 1024 * 1024;

/// Run `f`, first moving onto a freshly allocated stack segment if the current
/// one is nearly exhausted. Wraps every recursive walk over values so that deep
/// nesting is bounded by `Config::max_depth` rather than the thread's stack.
#[inline]
pub fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROW_BY, f)
}
