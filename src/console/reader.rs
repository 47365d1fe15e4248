//! Bounded console line reader
//!
//! Reads console input one line at a time, never handing out more than
//! `max_len` bytes per read. A line longer than the limit is delivered as
//! several consecutive pieces; nothing is dropped.

use std::io;

use crate::config::input::MAX_LINE_LEN;
use crate::console::traits::LineSource;

/// One read's worth of console input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Bytes exactly as read, terminator included when present
    pub bytes: Vec<u8>,
    /// False when the line continues in the next read
    pub complete: bool,
}

/// Console line reader
///
/// Wraps a [`LineSource`] and enforces the per-read limit.
pub struct LineReader<S> {
    source: S,
    max_len: usize,
}

impl<S: LineSource> LineReader<S> {
    /// Create a reader with the default limit
    pub fn new(source: S) -> Self {
        Self::with_limit(source, MAX_LINE_LEN)
    }

    /// Create a reader with a custom limit (at least one byte)
    pub fn with_limit(source: S, max_len: usize) -> Self {
        Self {
            source,
            max_len: max_len.max(1),
        }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Read the next line or line piece.
    ///
    /// Returns `Ok(None)` at end of input. A final line without a
    /// terminator is returned as complete.
    pub fn next_line(&mut self) -> io::Result<Option<Line>> {
        let mut bytes = Vec::with_capacity(self.max_len);

        loop {
            let remaining = self.max_len - bytes.len();
            let n = match self.source.read_line_bounded(&mut bytes, remaining) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if n == 0 {
                // End of input
                if bytes.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Line {
                    bytes,
                    complete: true,
                }));
            }

            if bytes.last() == Some(&b'\n') {
                return Ok(Some(Line {
                    bytes,
                    complete: true,
                }));
            }

            if bytes.len() >= self.max_len {
                return Ok(Some(Line {
                    bytes,
                    complete: false,
                }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::traits::mock::MockInput;
    use std::io::Cursor;

    #[test]
    fn test_read_lines() {
        let mut reader = LineReader::new(Cursor::new(b"hello\nworld\n".to_vec()));

        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.bytes, b"hello\n".to_vec());
        assert!(first.complete);

        let second = reader.next_line().unwrap().unwrap();
        assert_eq!(second.bytes, b"world\n".to_vec());

        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn test_long_line_split_at_limit() {
        let mut input = vec![b'x'; 300];
        input.push(b'\n');
        let mut reader = LineReader::new(Cursor::new(input));

        let first = reader.next_line().unwrap().unwrap();
        assert_eq!(first.bytes.len(), MAX_LINE_LEN);
        assert!(!first.complete);

        let second = reader.next_line().unwrap().unwrap();
        assert_eq!(second.bytes.len(), 300 - MAX_LINE_LEN + 1);
        assert!(second.complete);
        assert_eq!(second.bytes.last(), Some(&b'\n'));
    }

    #[test]
    fn test_unterminated_last_line() {
        let mut reader = LineReader::new(Cursor::new(b"tail".to_vec()));

        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.bytes, b"tail".to_vec());
        assert!(line.complete);
        assert!(reader.next_line().unwrap().is_none());
    }

    #[test]
    fn test_partial_reads_accumulate() {
        // Source returns a line in two pieces without the terminator first
        let input = MockInput::new().push(b"ab").push(b"c\n");
        let mut reader = LineReader::new(input);

        let line = reader.next_line().unwrap().unwrap();
        assert_eq!(line.bytes, b"abc\n".to_vec());
    }

    #[test]
    fn test_input_error_propagates() {
        let input = MockInput::new()
            .push(b"ok\n")
            .fail_at_end(io::ErrorKind::BrokenPipe);
        let mut reader = LineReader::with_limit(input, 8);

        assert_eq!(reader.next_line().unwrap().unwrap().bytes, b"ok\n".to_vec());
        assert_eq!(
            reader.next_line().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
