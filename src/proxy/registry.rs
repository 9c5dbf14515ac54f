//! Sequence-number allocation and correlation
//!
//! Owns the sequence-number namespace: hands out wrapping, non-negative
//! numbers and maps each live number to the request that owns it. Entries
//! are only removed by explicit deregistration; nothing expires on its own.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps live sequence numbers to their owning requests
pub struct SequenceRegistry<T> {
    inner: Mutex<RegistryInner<T>>,
}

struct RegistryInner<T> {
    /// Last number handed out
    last: i32,
    entries: HashMap<i32, Arc<T>>,
}

impl<T> RegistryInner<T> {
    /// Advance modulo `i32::MAX`, skipping numbers still owned after a wrap
    fn advance(&mut self) -> i32 {
        loop {
            self.last = (self.last + 1) % i32::MAX;
            if !self.entries.contains_key(&self.last) {
                return self.last;
            }
            log::warn!(
                "Sequence {} still owned by an unfinished request, skipping",
                self.last
            );
        }
    }
}

impl<T> SequenceRegistry<T> {
    /// Create a registry; the first allocation returns `start + 1`
    ///
    /// Negative or out-of-range starts are folded into `0..i32::MAX`.
    pub fn new(start: i32) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                last: start.max(0) % i32::MAX,
                entries: HashMap::new(),
            }),
        }
    }

    /// Allocate the next sequence number and register the value built for it
    ///
    /// `build` runs while the registry lock is held and must not call back
    /// into the registry.
    pub fn allocate<F>(&self, build: F) -> Arc<T>
    where
        F: FnOnce(i32) -> Arc<T>,
    {
        let mut inner = self.inner.lock();
        let sequence = inner.advance();
        let entry = build(sequence);
        inner.entries.insert(sequence, Arc::clone(&entry));
        entry
    }

    /// Look up the owner of a sequence number
    ///
    /// `None` is a normal outcome (late reply, foreign sequence number).
    pub fn lookup(&self, sequence: i32) -> Option<Arc<T>> {
        self.inner.lock().entries.get(&sequence).cloned()
    }

    /// Remove a sequence number; removing an absent number is a no-op
    pub fn deregister(&self, sequence: i32) -> bool {
        self.inner.lock().entries.remove(&sequence).is_some()
    }

    pub fn contains(&self, sequence: i32) -> bool {
        self.inner.lock().entries.contains_key(&sequence)
    }

    /// Number of outstanding registrations
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Outstanding sequence numbers, in no particular order
    pub fn sequences(&self) -> Vec<i32> {
        self.inner.lock().entries.keys().copied().collect()
    }
}
