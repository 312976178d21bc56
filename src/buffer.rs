use std::sync::{Mutex, MutexGuard, PoisonError};

/// The raw, append-only log text shared between a producer and the UI.
///
/// The lock is only held while a fragment is copied in or the text is
/// copied out, never while filtering or rendering.
#[derive(Debug, Default)]
pub struct LogBuffer {
    text: Mutex<String>,
}

impl LogBuffer {
    /// Create a buffer seeded with the text already present in the console
    pub fn with_text(initial: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(initial.into()),
        }
    }

    /// Append a fragment to the end of the raw log
    pub fn append(&self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.lock().push_str(fragment);
    }

    /// Copy of the full raw log as of this call
    pub fn snapshot(&self) -> String {
        self.lock().clone()
    }

    /// Append only if `accept` still holds once the lock is taken.
    /// Returns whether the fragment was appended.
    pub fn append_if(&self, fragment: &str, accept: impl FnOnce() -> bool) -> bool {
        let mut text = self.lock();
        if !accept() {
            return false;
        }
        text.push_str(fragment);
        true
    }

    /// Reset the raw log to empty
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Drop the raw log and give its memory back
    pub fn release(&self) {
        *self.lock() = String::new();
    }

    /// Length of the raw log in bytes
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panicking holder can't leave the String half-written, so a
    // poisoned lock still guards whole text.
    fn lock(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_is_monotonic() {
        let buffer = LogBuffer::with_text("seed\n");
        let prior = buffer.snapshot();
        buffer.append("a\n");
        buffer.append("b");
        assert_eq!(buffer.snapshot(), format!("{}a\nb", prior));
    }

    #[test]
    fn test_clear_empties_snapshot() {
        let buffer = LogBuffer::with_text("one\ntwo\n");
        buffer.clear();
        assert_eq!(buffer.snapshot(), "");
        assert!(buffer.is_empty());

        buffer.append("three\n");
        assert_eq!(buffer.snapshot(), "three\n");
    }

    #[test]
    fn test_empty_fragment_is_ignored() {
        let buffer = LogBuffer::default();
        buffer.append("");
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_append_if_checks_under_lock() {
        let buffer = LogBuffer::with_text("a\n");
        assert!(!buffer.append_if("b\n", || false));
        assert!(buffer.append_if("c\n", || true));
        assert_eq!(buffer.snapshot(), "a\nc\n");
    }

    #[test]
    fn test_release_drops_text() {
        let buffer = LogBuffer::with_text("x".repeat(1 << 20));
        buffer.release();
        assert!(buffer.is_empty());
        assert_eq!(buffer.snapshot(), "");
    }

    #[test]
    fn test_snapshot_never_tears_a_fragment() {
        let buffer = Arc::new(LogBuffer::default());
        let fragment = "0123456789abcdef\n";

        let writer = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                for _ in 0..2_000 {
                    buffer.append(fragment);
                }
            })
        };

        for _ in 0..200 {
            let snapshot = buffer.snapshot();
            assert_eq!(snapshot.len() % fragment.len(), 0);
            assert!(snapshot.lines().all(|line| line == fragment.trim_end()));
        }

        writer.join().unwrap();
        assert_eq!(buffer.len(), fragment.len() * 2_000);
    }
}
