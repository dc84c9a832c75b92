use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Completion slot shared between a task and its handle.
struct JoinState<T> {
    result: Option<T>,
    waiter: Option<Waker>,
    finished: bool,
}

/// A handle to a spawned task.
///
/// A `JoinHandle` allows awaiting the result of a task spawned onto
/// the runtime. It implements [`Future`] and resolves once the task
/// has completed.
///
/// Dropping the `JoinHandle` does **not** cancel the task; it only
/// discards the ability to observe its result.
pub struct JoinHandle<T> {
    state: Rc<RefCell<JoinState<T>>>,
}

impl<T> JoinHandle<T> {
    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }
}

/// Wraps `future` so that its output is stored for the returned handle.
pub(crate) fn joinable<F>(future: F) -> (impl Future<Output = ()> + 'static, JoinHandle<F::Output>)
where
    F: Future + 'static,
    F::Output: 'static,
{
    let state = Rc::new(RefCell::new(JoinState {
        result: None,
        waiter: None,
        finished: false,
    }));

    let slot = state.clone();
    let task = async move {
        let output = future.await;

        let waiter = {
            let mut state = slot.borrow_mut();
            state.result = Some(output);
            state.finished = true;
            state.waiter.take()
        };

        if let Some(waker) = waiter {
            waker.wake();
        }
    };

    (task, JoinHandle { state })
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    /// Resolves with the task output, or registers the current waker.
    ///
    /// # Panics
    ///
    /// Panics if polled again after it already returned the output.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.state.borrow_mut();

        if let Some(value) = state.result.take() {
            return Poll::Ready(value);
        }

        assert!(!state.finished, "JoinHandle polled after completion");

        state.waiter = Some(cx.waker().clone());
        Poll::Pending
    }
}
