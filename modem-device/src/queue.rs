use std::sync::{Condvar, Mutex};

use heapless::Deque;

/// Bounded blocking queue between a cpal callback thread and the blocking
/// `AudioCapture`/`AudioPlayback` consumer. Overwrites the oldest entry
/// rather than blocking the callback thread, since cpal callbacks must
/// never stall.
pub struct Queue<T, const N: usize> {
    deque: Mutex<Deque<T, N>>,
    cond: Condvar,
}

impl<T, const N: usize> Default for Queue<T, N> {
    fn default() -> Self {
        Queue {
            deque: Mutex::new(Deque::new()),
            cond: Condvar::new(),
        }
    }
}

impl<T, const N: usize> Queue<T, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `item`, dropping the oldest queued item first if full.
    /// Called from the cpal audio callback; never blocks.
    pub fn force_push(&self, item: T) {
        let mut deque = self.deque.lock().unwrap();
        if deque.is_full() {
            deque.pop_front();
        }
        let _ = deque.push_back(item);
        self.cond.notify_one();
    }

    /// Blocks until an item is available, then returns it.
    pub fn read(&self) -> T {
        let mut deque = self.deque.lock().unwrap();
        loop {
            if let Some(item) = deque.pop_front() {
                return item;
            }
            deque = self.cond.wait(deque).unwrap();
        }
    }
}
