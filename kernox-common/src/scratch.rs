/// Per-processor reusable slot for records too large for the probe stack.
///
/// The slot content is whatever the previous invocation on this processor left behind;
/// callers zero-fill it before use. `None` means the slot is unavailable and the
/// invocation must be abandoned.
pub trait ScratchPool<T> {
	fn with_slot<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>;
}
