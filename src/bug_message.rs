/// Panic message for states the locking protocol is supposed to make
/// unreachable.
pub(crate) const BUG_MESSAGE: &str = "[BUG] lockkit reached a state its locking \
protocol forbids. Please open an issue at https://github.com/lockkit/lockkit \
and describe what led up to this.";
