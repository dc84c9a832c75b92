use super::core::Core;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// The runtime currently driving this thread, if any.
    ///
    /// Set for the duration of `block_on`, so that timers, sockets
    /// and `spawn` can reach the reactor without explicit handles.
    static CURRENT: RefCell<Option<Rc<Core>>> = const { RefCell::new(None) };
}

/// Restores the previous runtime context when dropped.
pub(crate) struct EnterGuard {
    prev: Option<Rc<Core>>,
}

/// Enters the runtime execution context for the current thread.
pub(crate) fn enter(core: Rc<Core>) -> EnterGuard {
    let prev = CURRENT.with(|cell| cell.replace(Some(core)));

    EnterGuard { prev }
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        let prev = self.prev.take();
        let _ = CURRENT.try_with(|cell| cell.replace(prev));
    }
}

/// Returns the runtime driving this thread, if any.
pub(crate) fn try_current() -> Option<Rc<Core>> {
    CURRENT.try_with(|cell| cell.borrow().clone()).ok().flatten()
}

/// Returns the runtime driving this thread.
///
/// # Panics
///
/// Panics if called outside of [`Runtime::block_on`](super::Runtime::block_on).
pub(crate) fn current() -> Rc<Core> {
    try_current().expect("no greenwire runtime in context")
}
