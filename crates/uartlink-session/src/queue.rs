use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Bounded FIFO with two overflow disciplines.
///
/// - `push_wait` blocks the producer while the queue is full (outbound
///   commands: losing a control input is worse than slowing the producer)
/// - `push_drop_oldest` displaces the oldest item (inbound telemetry:
///   stale readings have no value)
///
/// Closing wakes every waiter; consumers drain remaining items before
/// seeing `None`.
pub(crate) struct Fifo<T> {
    state: Mutex<FifoState<T>>,
    cond: Condvar,
    capacity: usize,
}

struct FifoState<T> {
    items: VecDeque<T>,
    closed: bool,
    dropped: u64,
}

impl<T> Fifo<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(FifoState {
                items: VecDeque::new(),
                closed: false,
                dropped: 0,
            }),
            cond: Condvar::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FifoState<T>> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Append, blocking while the queue is at capacity. Returns false if
    /// the queue is (or becomes) closed.
    pub(crate) fn push_wait(&self, item: T) -> bool {
        let mut state = self.lock();
        loop {
            if state.closed {
                return false;
            }
            if state.items.len() < self.capacity {
                state.items.push_back(item);
                self.cond.notify_all();
                return true;
            }
            state = self.cond.wait(state).unwrap_or_else(|p| p.into_inner());
        }
    }

    /// Append, displacing the oldest item when full. Returns true if an
    /// item was displaced.
    pub(crate) fn push_drop_oldest(&self, item: T) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }
        let displaced = if state.items.len() >= self.capacity {
            state.items.pop_front();
            state.dropped += 1;
            true
        } else {
            false
        };
        state.items.push_back(item);
        self.cond.notify_all();
        displaced
    }

    /// Remove the front item without blocking.
    pub(crate) fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        let item = state.items.pop_front();
        if item.is_some() {
            self.cond.notify_all();
        }
        item
    }

    /// Remove the front item, blocking until one arrives or the queue is
    /// closed and empty.
    pub(crate) fn pop_wait(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.cond.notify_all();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            state = self.cond.wait(state).unwrap_or_else(|p| p.into_inner());
        }
    }

    /// Remove the front item, waiting at most `timeout`.
    pub(crate) fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                self.cond.notify_all();
                return Some(item);
            }
            if state.closed {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (next, _timed_out) = self
                .cond
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            state = next;
        }
    }

    /// Close the queue and wake every waiter.
    pub(crate) fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        self.cond.notify_all();
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Items displaced by `push_drop_oldest` over the queue's lifetime.
    pub(crate) fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}
