// src/console/buffer.rs

//! Bounded console ring buffer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of characters retained.
pub const DEFAULT_CAPACITY: usize = 20_000;

/// Text returned by [`ConsoleBuffer::snapshot_or_placeholder`] when empty.
pub const EMPTY_PLACEHOLDER: &str = "[No logs yet]";

/// Fixed-capacity tail of the managed process's console.
///
/// Characters are stored in a `VecDeque<char>` that never grows past
/// `capacity`: each append evicts from the head as it pushes, so no caller
/// can ever observe an over-capacity state.
///
/// Cloning is cheap and yields another handle to the same buffer. Every
/// append holds the lock for its whole write, so text from the stdout reader,
/// the stderr reader, command echoes and exit notices never interleaves
/// mid-write.
#[derive(Debug, Clone)]
pub struct ConsoleBuffer {
    inner: Arc<Mutex<Ring>>,
}

#[derive(Debug)]
struct Ring {
    chars: VecDeque<char>,
    capacity: usize,
}

impl Ring {
    fn evict_over(&mut self, extra: usize) -> usize {
        let over = (self.chars.len() + extra).saturating_sub(self.capacity);
        let evict = over.min(self.chars.len());
        self.chars.drain(..evict);
        evict
    }
}

impl ConsoleBuffer {
    /// Create a buffer retaining at most `capacity` characters.
    ///
    /// A capacity of zero is bumped to one; config validation rejects it
    /// before we get here.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Mutex::new(Ring {
                chars: VecDeque::with_capacity(capacity),
                capacity,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        // A panic while holding the lock cannot leave the ring over capacity,
        // so a poisoned buffer is still safe to use.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append `text`, keeping only the most recent `capacity` characters.
    pub fn append(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut ring = self.lock();
        let capacity = ring.capacity;

        // Only the last `capacity` characters of `text` can survive.
        let incoming = text.chars().count();
        let skip = incoming.saturating_sub(capacity);
        let kept = incoming - skip;

        ring.evict_over(kept);
        ring.chars.extend(text.chars().skip(skip));
    }

    /// Append `text` as a line, adding a trailing `\n` if it is missing.
    pub fn append_line(&self, text: &str) {
        if text.ends_with('\n') {
            self.append(text);
        } else {
            let mut line = String::with_capacity(text.len() + 1);
            line.push_str(text);
            line.push('\n');
            self.append(&line);
        }
    }

    /// Everything currently retained, verbatim.
    pub fn snapshot(&self) -> String {
        self.lock().chars.iter().collect()
    }

    /// Like [`snapshot`](Self::snapshot), but returns [`EMPTY_PLACEHOLDER`]
    /// when nothing has been captured yet.
    pub fn snapshot_or_placeholder(&self) -> String {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            EMPTY_PLACEHOLDER.to_string()
        } else {
            snapshot
        }
    }

    /// Re-apply the capacity bound and return how many characters were
    /// evicted. Always zero unless something bypassed `append`.
    pub fn trim(&self) -> usize {
        self.lock().evict_over(0)
    }

    /// Number of characters currently retained.
    pub fn len(&self) -> usize {
        self.lock().chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().chars.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
