use crate::transport::Direction;

use std::cell::Cell;

/// Per-direction count of multi-frame transfers in progress.
///
/// Batches from different tasks may overlap on one socket, so this is
/// a depth rather than a flag.
#[derive(Default)]
pub(crate) struct BatchState {
    send: Cell<usize>,
    recv: Cell<usize>,
}

impl BatchState {
    fn depth(&self, direction: Direction) -> &Cell<usize> {
        match direction {
            Direction::Read => &self.recv,
            Direction::Write => &self.send,
        }
    }

    pub(crate) fn is_active(&self, direction: Direction) -> bool {
        self.depth(direction).get() > 0
    }

    /// Marks `direction` as batching until the scope is dropped.
    ///
    /// Each scope runs its own `on_finish` exactly once when it ends,
    /// on every exit path.
    pub(crate) fn enter<F: FnOnce()>(&self, direction: Direction, on_finish: F) -> BatchScope<'_, F> {
        let depth = self.depth(direction);
        depth.set(depth.get() + 1);

        BatchScope {
            depth,
            on_finish: Some(on_finish),
        }
    }
}

/// Guard returned by [`BatchState::enter`].
pub(crate) struct BatchScope<'a, F: FnOnce()> {
    depth: &'a Cell<usize>,
    on_finish: Option<F>,
}

impl<F: FnOnce()> Drop for BatchScope<'_, F> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);

        if let Some(on_finish) = self.on_finish.take() {
            on_finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_scopes_each_finish_once() {
        let state = BatchState::default();
        let finished = Cell::new(0);

        let first = state.enter(Direction::Write, || finished.set(finished.get() + 1));
        let second = state.enter(Direction::Write, || finished.set(finished.get() + 10));
        assert!(state.is_active(Direction::Write));
        assert!(!state.is_active(Direction::Read));

        // The first scope ends while the second is still running.
        drop(first);
        assert!(state.is_active(Direction::Write));
        assert_eq!(finished.get(), 1);

        drop(second);
        assert!(!state.is_active(Direction::Write));
        assert_eq!(finished.get(), 11);
    }

    #[test]
    fn finishes_on_unwind() {
        let state = BatchState::default();
        let finished = Cell::new(false);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = state.enter(Direction::Read, || finished.set(true));
            panic!("frame failed");
        }));

        assert!(result.is_err());
        assert!(finished.get());
        assert!(!state.is_active(Direction::Read));
    }
}
