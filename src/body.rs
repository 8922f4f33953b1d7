use core::str;

use log::trace;

use crate::header::Headers;
use crate::transport::Transport;
use crate::{Error, HttpVersion, Result};

/// How the response body is delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// No length information. Read until the peer closes. Only valid on
    /// connections that will not be reused.
    Whole,
    /// Delimited by content-length.
    Bounded(u64),
    /// Chunked transfer encoding.
    Chunked,
}

impl BodyMode {
    /// Whether the exchange carries a body at all.
    ///
    /// Responses to HEAD, all 1xx, 204 and 304 have none, whatever the
    /// headers claim.
    pub(crate) fn expects_body(method: &str, status: u16) -> bool {
        let informational = (100..200).contains(&status);
        !(method.eq_ignore_ascii_case("HEAD") || status == 204 || status == 304 || informational)
    }

    /// Pick the delimiting from the response version and headers.
    ///
    /// Chunked wins over content-length, but only under 1.1. A
    /// content-length that does not parse as a number counts as absent.
    pub(crate) fn from_headers(version: HttpVersion, headers: &Headers) -> BodyMode {
        if version == HttpVersion::Http11 {
            let chunked = headers
                .find("Transfer-Encoding")
                .map(|v| v.trim().eq_ignore_ascii_case("chunked"))
                .unwrap_or(false);
            if chunked {
                return BodyMode::Chunked;
            }
        }

        let len = headers
            .find("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok());

        match len {
            Some(len) => BodyMode::Bounded(len),
            None => BodyMode::Whole,
        }
    }
}

/// Resumable pull-based reader for one response body.
///
/// Each pull yields at most one chunk of bytes, capped by the
/// `max_chunk` given to that pull. The cap can change between pulls.
/// `Ok(None)` means the body is done; the reader is then terminal and
/// stays so. A reader that returned an error is poisoned and refuses
/// further pulls.
#[derive(Debug)]
pub struct BodyReader {
    mode: BodyMode,
    /// Bytes delivered so far (bounded mode).
    received: u64,
    /// Bytes left of a chunk whose size line is already consumed
    /// (chunked mode). 0 means the next pull reads a fresh size line.
    remaining: u64,
    terminal: bool,
    failed: bool,
}

impl BodyReader {
    pub(crate) fn new(mode: BodyMode) -> Self {
        BodyReader {
            mode,
            received: 0,
            remaining: 0,
            // A declared empty body never touches the transport.
            terminal: mode == BodyMode::Bounded(0),
            failed: false,
        }
    }

    pub fn mode(&self) -> BodyMode {
        self.mode
    }

    /// True once the body is fully delivered. The connection can only be
    /// reused for another exchange after this.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Pull the next piece of the body, at most `max_chunk` bytes.
    ///
    /// `Ok(Some(_))` is body data, `Ok(None)` is the end. In whole-body
    /// mode `max_chunk` is ignored and everything arrives in one pull.
    pub fn pull<T: Transport>(
        &mut self,
        transport: &mut T,
        max_chunk: Option<usize>,
    ) -> Result<Option<Vec<u8>>> {
        if self.failed {
            return Err(Error::ReaderNotResumable);
        }
        if self.terminal {
            return Ok(None);
        }

        let ret = match self.mode {
            BodyMode::Whole => self.pull_whole(transport),
            BodyMode::Bounded(total) => self.pull_bounded(transport, max_chunk, total),
            BodyMode::Chunked => self.pull_chunked(transport, max_chunk),
        };

        if ret.is_err() {
            self.failed = true;
        }

        ret
    }

    fn pull_whole<T: Transport>(&mut self, transport: &mut T) -> Result<Option<Vec<u8>>> {
        let data = transport.recv_all()?;
        trace!("whole body, {} bytes", data.len());
        self.terminal = true;
        Ok(Some(data))
    }

    fn pull_bounded<T: Transport>(
        &mut self,
        transport: &mut T,
        max_chunk: Option<usize>,
        total: u64,
    ) -> Result<Option<Vec<u8>>> {
        let left = total - self.received;
        let len = max_chunk.map(|m| m as u64).unwrap_or(left).min(left);

        if len == 0 {
            self.terminal = true;
            return Ok(None);
        }

        let data = transport.recv_exact(len as usize)?;
        self.received += len;
        if self.received == total {
            self.terminal = true;
        }
        Ok(Some(data))
    }

    fn pull_chunked<T: Transport>(
        &mut self,
        transport: &mut T,
        max_chunk: Option<usize>,
    ) -> Result<Option<Vec<u8>>> {
        let len;

        if self.remaining > 0 {
            // Continue a chunk a previous capped pull did not finish.
            len = max_chunk
                .map(|m| m as u64)
                .unwrap_or(self.remaining)
                .min(self.remaining);
            self.remaining -= len;
        } else {
            let line = transport.recv_line()?;
            let size = parse_chunk_size(&line)?;
            trace!("chunk size {}", size);

            if size == 0 {
                // End of body. The final crlf and any trailer block stay
                // on the transport for the trailer read.
                self.terminal = true;
                return Ok(None);
            }

            match max_chunk {
                Some(m) if (m as u64) < size => {
                    self.remaining = size - m as u64;
                    len = m as u64;
                }
                _ => {
                    self.remaining = 0;
                    len = size;
                }
            }
        }

        let data = transport.recv_exact(len as usize)?;

        if self.remaining == 0 {
            // The declared chunk is fully delivered, its crlf goes too.
            let crlf = transport.recv_exact(2)?;
            if crlf.as_slice() != b"\r\n" {
                return Err(Error::ChunkExpectedCrLf);
            }
        }

        Ok(Some(data))
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<u64> {
    let line = str::from_utf8(line).map_err(|_| Error::ChunkLenNotANumber)?;

    // Chunk extensions after ';' are ignored.
    let size = line.split(';').next().unwrap_or("").trim();

    u64::from_str_radix(size, 16).map_err(|_| Error::ChunkLenNotANumber)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::transport::test::MockTransport;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        let mut h = Headers::new();
        for (k, v) in pairs {
            h.append(k, v);
        }
        h
    }

    #[test]
    fn test_expects_body() {
        assert!(BodyMode::expects_body("GET", 200));
        assert!(BodyMode::expects_body("GET", 404));
        assert!(!BodyMode::expects_body("HEAD", 200));
        assert!(!BodyMode::expects_body("head", 200));
        assert!(!BodyMode::expects_body("GET", 204));
        assert!(!BodyMode::expects_body("GET", 304));
        assert!(!BodyMode::expects_body("GET", 100));
        assert!(!BodyMode::expects_body("GET", 199));
    }

    #[test]
    fn test_mode_selection() {
        let h = headers(&[("Transfer-Encoding", "chunked")]);
        assert_eq!(BodyMode::from_headers(HttpVersion::Http11, &h), BodyMode::Chunked);
        // Chunked requires 1.1.
        assert_eq!(BodyMode::from_headers(HttpVersion::Http10, &h), BodyMode::Whole);

        let h = headers(&[("transfer-encoding", "CHUNKED")]);
        assert_eq!(BodyMode::from_headers(HttpVersion::Http11, &h), BodyMode::Chunked);

        let h = headers(&[("Content-Length", "42")]);
        assert_eq!(
            BodyMode::from_headers(HttpVersion::Http11, &h),
            BodyMode::Bounded(42)
        );

        let h = headers(&[("Content-Length", "nonsense")]);
        assert_eq!(BodyMode::from_headers(HttpVersion::Http11, &h), BodyMode::Whole);

        assert_eq!(
            BodyMode::from_headers(HttpVersion::Http11, &Headers::new()),
            BodyMode::Whole
        );
    }

    #[test]
    fn test_bounded_single_pull() -> Result<()> {
        let mut t = MockTransport::new(b"Wikipedia");
        let mut r = BodyReader::new(BodyMode::Bounded(9));

        assert_eq!(r.pull(&mut t, None)?, Some(b"Wikipedia".to_vec()));
        assert!(r.is_terminal());
        assert_eq!(r.pull(&mut t, None)?, None);
        Ok(())
    }

    #[test]
    fn test_bounded_capped_pull_count() -> Result<()> {
        // ceil(10 / 4) = 3 non-empty pulls.
        let mut t = MockTransport::new(b"0123456789");
        let mut r = BodyReader::new(BodyMode::Bounded(10));

        let mut pulls = 0;
        let mut total = Vec::new();
        while let Some(chunk) = r.pull(&mut t, Some(4))? {
            pulls += 1;
            total.extend_from_slice(&chunk);
        }

        assert_eq!(pulls, 3);
        assert_eq!(total, b"0123456789");
        Ok(())
    }

    #[test]
    fn test_bounded_varying_cap() -> Result<()> {
        let mut t = MockTransport::new(b"0123456789");
        let mut r = BodyReader::new(BodyMode::Bounded(10));

        assert_eq!(r.pull(&mut t, Some(3))?, Some(b"012".to_vec()));
        assert_eq!(r.pull(&mut t, Some(1))?, Some(b"3".to_vec()));
        // No cap takes the rest.
        assert_eq!(r.pull(&mut t, None)?, Some(b"456789".to_vec()));
        assert!(r.is_terminal());
        Ok(())
    }

    #[test]
    fn test_bounded_zero_is_terminal_at_birth() -> Result<()> {
        let mut t = MockTransport::new(b"");
        let mut r = BodyReader::new(BodyMode::Bounded(0));
        assert!(r.is_terminal());
        assert_eq!(r.pull(&mut t, None)?, None);
        Ok(())
    }

    #[test]
    fn test_whole_reads_to_close() -> Result<()> {
        let mut t = MockTransport::new(b"everything until eof");
        let mut r = BodyReader::new(BodyMode::Whole);

        // The cap is ignored in this mode.
        assert_eq!(r.pull(&mut t, Some(4))?, Some(b"everything until eof".to_vec()));
        assert!(r.is_terminal());
        assert_eq!(r.pull(&mut t, None)?, None);
        Ok(())
    }

    const WIKI: &[u8] = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

    #[test]
    fn test_chunked_uncapped() -> Result<()> {
        let mut t = MockTransport::new(WIKI);
        let mut r = BodyReader::new(BodyMode::Chunked);

        assert_eq!(r.pull(&mut t, None)?, Some(b"Wiki".to_vec()));
        assert!(!r.is_terminal());
        assert_eq!(r.pull(&mut t, None)?, Some(b"pedia".to_vec()));
        assert_eq!(r.pull(&mut t, None)?, None);
        assert!(r.is_terminal());
        Ok(())
    }

    #[test]
    fn test_chunked_capped() -> Result<()> {
        let mut t = MockTransport::new(WIKI);
        let mut r = BodyReader::new(BodyMode::Chunked);

        let mut chunks = Vec::new();
        while let Some(chunk) = r.pull(&mut t, Some(2))? {
            chunks.push(chunk);
        }

        let expect: Vec<&[u8]> = vec![b"Wi", b"ki", b"pe", b"di", b"a"];
        assert_eq!(chunks, expect);
        Ok(())
    }

    #[test]
    fn test_chunked_continuation_uncapped_remainder() -> Result<()> {
        let mut t = MockTransport::new(WIKI);
        let mut r = BodyReader::new(BodyMode::Chunked);

        assert_eq!(r.pull(&mut t, Some(1))?, Some(b"W".to_vec()));
        assert_eq!(r.pull(&mut t, None)?, Some(b"iki".to_vec()));
        assert_eq!(r.pull(&mut t, None)?, Some(b"pedia".to_vec()));
        assert_eq!(r.pull(&mut t, None)?, None);
        Ok(())
    }

    #[test]
    fn test_chunked_extension_ignored() -> Result<()> {
        let mut t = MockTransport::new(b"4;name=value\r\nWiki\r\n0\r\n\r\n");
        let mut r = BodyReader::new(BodyMode::Chunked);

        assert_eq!(r.pull(&mut t, None)?, Some(b"Wiki".to_vec()));
        assert_eq!(r.pull(&mut t, None)?, None);
        Ok(())
    }

    #[test]
    fn test_chunked_final_crlf_left_on_transport() -> Result<()> {
        let mut t = MockTransport::new(WIKI);
        let mut r = BodyReader::new(BodyMode::Chunked);
        while r.pull(&mut t, None)?.is_some() {}

        // The blank line after the zero chunk is for the trailer read.
        assert_eq!(t.recv_line()?, b"");
        Ok(())
    }

    #[test]
    fn test_chunked_bad_size_line() {
        let mut t = MockTransport::new(b"zz\r\n");
        let mut r = BodyReader::new(BodyMode::Chunked);

        assert!(matches!(r.pull(&mut t, None), Err(Error::ChunkLenNotANumber)));
        // Poisoned after the error.
        assert!(matches!(r.pull(&mut t, None), Err(Error::ReaderNotResumable)));
    }

    #[test]
    fn test_chunked_missing_crlf() {
        let mut t = MockTransport::new(b"4\r\nWikiXXmore");
        let mut r = BodyReader::new(BodyMode::Chunked);

        assert!(matches!(r.pull(&mut t, None), Err(Error::ChunkExpectedCrLf)));
    }

    #[test]
    fn test_transport_error_poisons() {
        // Content-length says 10 but the peer only has 4.
        let mut t = MockTransport::new(b"0123");
        let mut r = BodyReader::new(BodyMode::Bounded(10));

        assert!(matches!(r.pull(&mut t, None), Err(Error::Transport(_))));
        assert!(!r.is_terminal());
        assert!(matches!(r.pull(&mut t, None), Err(Error::ReaderNotResumable)));
    }
}
