//! Pipe plumbing for the engine's output streams.

use nix::fcntl::{FcntlArg, OFlag, fcntl};
use std::io::{self, Read};
use std::os::fd::AsRawFd;

const READ_CHUNK: usize = 8192;

/// Switches a pipe to non-blocking reads.
pub fn set_nonblocking<F: AsRawFd>(pipe: &F) -> io::Result<()> {
    let fd = pipe.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Reads everything currently available from `reader` into `buf`.
///
/// Returns `true` once the writer has closed its end.
pub fn read_available<R: Read>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<bool> {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(true),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Reassembles lines from arbitrarily split reads.
///
/// Both `\r` and `\n` terminate a line. Bytes after the last terminator are
/// held back until more data or end-of-stream arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `data` and returns the non-empty lines it completes.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(data);
        let Some(end) = self.pending.iter().rposition(|b| *b == b'\r' || *b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=end).collect();
        split_lines(&complete)
    }

    /// Returns the held-back fragment, if any, at end-of-stream.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        split_lines(&rest).pop()
    }
}

fn split_lines(data: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(data)
        .split(['\r', '\n'])
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Chunked {
        chunks: Vec<io::Result<Vec<u8>>>,
    }

    impl Read for Chunked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let data = self.chunks.remove(0)?;
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        }
    }

    #[test]
    fn test_line_buffer_keeps_trailing_fragment() {
        let mut lines = LineBuffer::new();
        assert_eq!(lines.push(b"frame=  1 fps=0"), Vec::<String>::new());
        assert_eq!(
            lines.push(b".0\rframe=  2 fps=25\rframe=  3"),
            vec!["frame=  1 fps=0.0", "frame=  2 fps=25"]
        );
        assert_eq!(lines.push(b" fps=25\n\n"), vec!["frame=  3 fps=25"]);
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn test_line_buffer_flushes_fragment_at_end() {
        let mut lines = LineBuffer::new();
        assert!(lines.push(b"Conversion failed!").is_empty());
        assert_eq!(lines.finish().as_deref(), Some("Conversion failed!"));
        assert_eq!(lines.finish(), None);
    }

    #[test]
    fn test_read_available_stops_at_would_block() {
        let mut reader = Chunked {
            chunks: vec![
                Ok(b"abc".to_vec()),
                Err(io::Error::from(io::ErrorKind::Interrupted)),
                Ok(b"def".to_vec()),
                Err(io::Error::from(io::ErrorKind::WouldBlock)),
            ],
        };
        let mut buf = Vec::new();
        assert!(!read_available(&mut reader, &mut buf).unwrap());
        assert_eq!(buf, b"abcdef");

        // Nothing left: end of stream
        assert!(read_available(&mut reader, &mut buf).unwrap());
    }

    #[test]
    fn test_read_available_propagates_errors() {
        let mut reader = Chunked {
            chunks: vec![Err(io::Error::from(io::ErrorKind::BrokenPipe))],
        };
        let mut buf = Vec::new();
        assert!(read_available(&mut reader, &mut buf).is_err());
    }
}
