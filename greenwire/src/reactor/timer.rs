use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::task::Waker;
use std::time::Instant;

/// A scheduled wake-up in the reactor timer heap.
///
/// Entries are never removed early. A dropped [`Sleep`](crate::time::Sleep)
/// flips `cancelled`, and the reactor discards the entry when it
/// reaches the top of the heap.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Waker to notify when the deadline is reached.
    pub(crate) waker: Waker,

    /// Cancellation flag shared with the associated sleep future.
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::TimerEntry;

    use std::collections::BinaryHeap;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::task::Waker;
    use std::time::{Duration, Instant};

    fn entry(deadline: Instant) -> TimerEntry {
        TimerEntry {
            deadline,
            waker: Waker::noop().clone(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    #[test]
    fn heap_pops_earliest_deadline() {
        let now = Instant::now();
        let mut heap = BinaryHeap::new();

        heap.push(entry(now + Duration::from_millis(30)));
        heap.push(entry(now + Duration::from_millis(10)));
        heap.push(entry(now + Duration::from_millis(20)));

        let order: Vec<_> = std::iter::from_fn(|| heap.pop())
            .map(|e| e.deadline.duration_since(now).as_millis())
            .collect();

        assert_eq!(order, vec![10, 20, 30]);
    }
}
