use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One branch of a `join!`: the future until it completes, then its
/// output until the macro collects it.
pub enum MaybeDone<F: Future> {
    Pending(Pin<Box<F>>),
    Done(F::Output),
    Taken,
}

impl<F: Future> MaybeDone<F> {
    pub fn new(future: F) -> Self {
        MaybeDone::Pending(Box::pin(future))
    }

    /// Polls the branch if it is still running. Returns `true` once
    /// its output is stored.
    pub fn poll_done(&mut self, cx: &mut Context<'_>) -> bool {
        let output = match self {
            MaybeDone::Pending(future) => match future.as_mut().poll(cx) {
                Poll::Ready(output) => output,
                Poll::Pending => return false,
            },
            _ => return true,
        };

        *self = MaybeDone::Done(output);
        true
    }

    /// Moves the stored output out.
    ///
    /// # Panics
    ///
    /// Panics if the branch has not completed or was already taken.
    pub fn take(&mut self) -> F::Output {
        match std::mem::replace(self, MaybeDone::Taken) {
            MaybeDone::Done(output) => output,
            _ => panic!("join! branch taken before it completed"),
        }
    }
}
