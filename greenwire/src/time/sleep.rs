use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A timer registration: the waker it will wake and its cancel flag.
struct Registration {
    waker: Waker,
    cancelled: Arc<AtomicBool>,
}

impl Registration {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// A future that completes once its deadline is reached.
///
/// The timer is registered with the reactor on first poll. Polling
/// again with a different waker moves the registration to that waker,
/// and dropping the future cancels it, so an abandoned sleep never
/// wakes anyone.
pub struct Sleep {
    deadline: Instant,
    registration: Option<Registration>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            registration: None,
        }
    }

    /// The instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn register(&mut self, waker: &Waker) {
        if let Some(current) = &self.registration {
            if current.waker.will_wake(waker) {
                return;
            }
            current.cancel();
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        context::current()
            .reactor
            .add_timer(self.deadline, waker.clone(), cancelled.clone());

        self.registration = Some(Registration {
            waker: waker.clone(),
            cancelled,
        });
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        this.register(cx.waker());
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if let Some(registration) = &self.registration {
            registration.cancel();
        }
    }
}
