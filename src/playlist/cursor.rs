//! Index bookkeeping and the auto-advance state machine.
//!
//! Kept free of engines and threads so the navigation rules can be tested
//! on their own. `Cursor` and `Advance` live behind separate locks: the
//! advance machine is fed from the engine's dispatch path, which must never
//! wait on a navigation that is busy commanding the engine.

use crate::engine::EventKind;

#[derive(Debug)]
pub(crate) struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    /// `len` must be non-zero and `index < len`.
    pub(crate) fn new(len: usize, index: usize) -> Self {
        debug_assert!(index < len);
        Self { index, len }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn is_first(&self) -> bool {
        self.index == 0
    }

    pub(crate) fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }

    /// Index after `next()`, or `None` at the last track.
    pub(crate) fn following(&self) -> Option<usize> {
        (!self.is_last()).then_some(self.index + 1)
    }

    /// Index after `previous()`, or `None` at the first track.
    pub(crate) fn preceding(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        index < self.len
    }

    /// Move to `index`. Returns `false` (and changes nothing) when `index`
    /// is out of range.
    pub(crate) fn enter(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        self.index = index;
        true
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum AdvanceState {
    Idle,
    /// The track of load `load` became ready; its `ended` triggers an advance.
    AwaitingEnd { load: u64 },
}

/// Which load is current and whether its `ended` should advance.
#[derive(Debug)]
pub(crate) struct Advance {
    /// Bumped on every load so events and decisions from an earlier load
    /// can't match.
    load: u64,
    state: AdvanceState,
}

impl Default for Advance {
    fn default() -> Self {
        Self {
            load: 0,
            state: AdvanceState::Idle,
        }
    }
}

impl Advance {
    pub(crate) fn load(&self) -> u64 {
        self.load
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> AdvanceState {
        self.state
    }

    /// Start a new load and forget whatever the previous one was awaiting.
    pub(crate) fn rearm(&mut self) -> u64 {
        self.load += 1;
        self.state = AdvanceState::Idle;
        self.load
    }

    /// Feed one engine event. Returns the load to advance from when the
    /// current track ended after becoming ready.
    pub(crate) fn observe(&mut self, kind: EventKind) -> Option<u64> {
        match (kind, self.state) {
            (EventKind::CanPlay, _) => {
                self.state = AdvanceState::AwaitingEnd { load: self.load };
                None
            }
            (EventKind::Ended, AdvanceState::AwaitingEnd { load }) if load == self.load => {
                self.state = AdvanceState::Idle;
                Some(load)
            }
            _ => None,
        }
    }
}
