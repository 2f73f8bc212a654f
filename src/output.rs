use std::fmt;

/// Fixed-capacity text region a command writes its result into.
///
/// Writes past the capacity are dropped without an error. The cut always
/// lands on a character boundary so the contents stay valid UTF-8, and the
/// fact that something was dropped is remembered in [`is_truncated`].
///
/// [`is_truncated`]: OutputBuffer::is_truncated
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    text: String,
    capacity: usize,
    truncated: bool,
}

impl OutputBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            capacity,
            truncated: false,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.truncated = false;
    }

    /// Appends as much of `s` as fits. Returns `false` if anything was dropped.
    ///
    /// Once a write has been cut, every later write is dropped until
    /// [`clear`](Self::clear), so the contents stay a prefix of what was written.
    pub fn push_str(&mut self, s: &str) -> bool {
        if self.truncated {
            return s.is_empty();
        }

        let room = self.remaining();
        if s.len() <= room {
            self.text.push_str(s);
            return true;
        }

        let mut cut = room;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        self.text.push_str(&s[..cut]);
        self.truncated = true;
        false
    }

    /// Records that the producer dropped data before it reached the buffer.
    pub fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.text.len()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Write for OutputBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Overflow is not an error for the writer.
        self.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write;

    #[test]
    fn test_push_within_capacity() {
        let mut out = OutputBuffer::with_capacity(16);
        assert!(out.push_str("hello\n"));
        assert_eq!(out.as_str(), "hello\n");
        assert_eq!(out.remaining(), 10);
        assert!(!out.is_truncated());
    }

    #[test]
    fn test_overflow_is_silent() {
        let mut out = OutputBuffer::with_capacity(4);
        write!(out, "abcdefgh").unwrap();
        assert_eq!(out.as_str(), "abcd");
        assert!(out.is_truncated());
        assert_eq!(out.remaining(), 0);
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        let mut out = OutputBuffer::with_capacity(5);
        // "🎲" is four bytes; only one of them would fit after "ab".
        out.push_str("ab🎲");
        out.push_str("cd");
        assert_eq!(out.as_str(), "ab");
        assert!(out.is_truncated());
    }

    #[test]
    fn test_nothing_fits_after_a_cut() {
        let mut out = OutputBuffer::with_capacity(3);
        out.push_str("📘");
        assert!(!out.push_str("="));
        assert_eq!(out.as_str(), "");
    }

    #[test]
    fn test_marked_buffer_takes_no_more() {
        let mut out = OutputBuffer::with_capacity(64);
        out.push_str("partial");
        out.mark_truncated();
        out.push_str("tail\n");
        assert_eq!(out.as_str(), "partial");
    }

    #[test]
    fn test_clear_resets_state() {
        let mut out = OutputBuffer::with_capacity(2);
        out.push_str("stale");
        out.clear();
        assert!(out.is_empty());
        assert!(!out.is_truncated());
        assert_eq!(out.capacity(), 2);
    }
}
