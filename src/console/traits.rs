//! Console input trait for abstraction and testability
//!
//! The input pump reads through this trait so that stdin can be swapped
//! with in-memory input in tests.

use std::io::{self, BufRead, Read};

/// Blocking source of console input lines
pub trait LineSource {
    /// Append bytes up to and including the next `\n` to `buf`, reading at
    /// most `limit` bytes.
    ///
    /// Returns the number of bytes appended; zero means end of input.
    fn read_line_bounded(&mut self, buf: &mut Vec<u8>, limit: usize) -> io::Result<usize>;
}

impl<R: BufRead> LineSource for R {
    fn read_line_bounded(&mut self, buf: &mut Vec<u8>, limit: usize) -> io::Result<usize> {
        self.by_ref().take(limit as u64).read_until(b'\n', buf)
    }
}

#[cfg(test)]
pub mod mock {
    //! Mock console input for testing

    use super::*;
    use std::collections::VecDeque;

    /// Input that hands out queued chunks, then an optional error
    pub struct MockInput {
        chunks: VecDeque<Vec<u8>>,
        error_at_end: Option<io::ErrorKind>,
    }

    impl MockInput {
        pub fn new() -> Self {
            Self {
                chunks: VecDeque::new(),
                error_at_end: None,
            }
        }

        /// Queue one read's worth of input
        pub fn push(mut self, chunk: &[u8]) -> Self {
            self.chunks.push_back(chunk.to_vec());
            self
        }

        /// Fail instead of reporting end of input
        pub fn fail_at_end(mut self, kind: io::ErrorKind) -> Self {
            self.error_at_end = Some(kind);
            self
        }
    }

    impl Default for MockInput {
        fn default() -> Self {
            Self::new()
        }
    }

    impl LineSource for MockInput {
        fn read_line_bounded(&mut self, buf: &mut Vec<u8>, limit: usize) -> io::Result<usize> {
            let Some(mut chunk) = self.chunks.pop_front() else {
                return match self.error_at_end {
                    Some(kind) => Err(io::Error::from(kind)),
                    None => Ok(0),
                };
            };

            if chunk.len() > limit {
                let rest = chunk.split_off(limit);
                self.chunks.push_front(rest);
            }
            buf.extend_from_slice(&chunk);
            Ok(chunk.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bufread_stops_at_newline() {
        let mut input = Cursor::new(b"one\ntwo\n".to_vec());
        let mut buf = Vec::new();

        assert_eq!(input.read_line_bounded(&mut buf, 256).unwrap(), 4);
        assert_eq!(buf, b"one\n".to_vec());
    }

    #[test]
    fn test_bufread_respects_limit() {
        let mut input = Cursor::new(b"abcdef\n".to_vec());
        let mut buf = Vec::new();

        assert_eq!(input.read_line_bounded(&mut buf, 4).unwrap(), 4);
        assert_eq!(buf, b"abcd".to_vec());

        buf.clear();
        assert_eq!(input.read_line_bounded(&mut buf, 4).unwrap(), 3);
        assert_eq!(buf, b"ef\n".to_vec());
    }

    #[test]
    fn test_bufread_end_of_input() {
        let mut input = Cursor::new(Vec::new());
        let mut buf = Vec::new();
        assert_eq!(input.read_line_bounded(&mut buf, 256).unwrap(), 0);
    }
}
