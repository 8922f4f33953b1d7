use std::io;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// The byte-stream boundary the protocol engine runs on.
///
/// The engine only ever consumes a connected stream through these
/// operations. Anything that can satisfy them works: a TCP socket, a TLS
/// wrapper, a unix socket, a canned test script.
///
/// Lines are delimiter-stripped: `recv_line` returns the bytes up to but
/// excluding the line terminator.
pub trait Transport {
    /// Send the entire buffer.
    fn send_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read one line, excluding the terminator. Hitting end-of-stream
    /// before a terminator is an error.
    fn recv_line(&mut self) -> io::Result<Vec<u8>>;

    /// Read exactly `n` bytes.
    fn recv_exact(&mut self, n: usize) -> io::Result<Vec<u8>>;

    /// Read until the peer closes the stream.
    fn recv_all(&mut self) -> io::Result<Vec<u8>>;

    /// Read/write timeout for subsequent operations. `None` blocks forever.
    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Enable or disable transport-level keepalive probing.
    fn set_keepalive(&mut self, enabled: bool) -> io::Result<()>;

    /// Close the stream. Any operation after this must fail rather than
    /// block.
    fn close(&mut self) -> io::Result<()>;

    /// How many exchanges this transport has been reused for, where the
    /// implementation tracks pooling. Defaults to none.
    fn reuse_count(&self) -> u64 {
        0
    }
}

/// Blocking TCP implementation of [`Transport`].
///
/// Keeps an internal read buffer so `recv_line` can over-read from the
/// socket without losing bytes for the following `recv_exact`.
pub struct TcpTransport {
    stream: Option<TcpStream>,
    buf: Vec<u8>,
    pos: usize,
}

impl TcpTransport {
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let stream = TcpStream::connect((host, port))?;
        Ok(TcpTransport {
            stream: Some(stream),
            buf: Vec::new(),
            pos: 0,
        })
    }

    fn stream(&mut self) -> io::Result<&mut TcpStream> {
        self.stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport is closed"))
    }

    /// Bytes buffered but not yet handed out.
    fn buffered(&self) -> &[u8] {
        &self.buf[self.pos..]
    }

    fn consume(&mut self, n: usize) -> Vec<u8> {
        let out = self.buf[self.pos..self.pos + n].to_vec();
        self.pos += n;
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        }
        out
    }

    /// Read more from the socket into the buffer. Returns how much arrived,
    /// 0 meaning end-of-stream.
    fn fill(&mut self) -> io::Result<usize> {
        let mut chunk = [0u8; 4096];
        let n = self.stream()?.read(&mut chunk)?;
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl Transport for TcpTransport {
    fn send_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream()?.write_all(buf)
    }

    fn recv_line(&mut self) -> io::Result<Vec<u8>> {
        loop {
            if let Some(i) = self.buffered().iter().position(|c| *c == b'\n') {
                let mut line = self.consume(i + 1);
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(line);
            }
            if self.fill()? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "eof before line terminator",
                ));
            }
        }
    }

    fn recv_exact(&mut self, n: usize) -> io::Result<Vec<u8>> {
        while self.buffered().len() < n {
            if self.fill()? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "eof before full read",
                ));
            }
        }
        Ok(self.consume(n))
    }

    fn recv_all(&mut self) -> io::Result<Vec<u8>> {
        let mut out = self.consume(self.buffered().len());
        self.stream()?.read_to_end(&mut out)?;
        Ok(out)
    }

    fn set_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let stream = self.stream()?;
        stream.set_read_timeout(timeout)?;
        stream.set_write_timeout(timeout)
    }

    fn set_keepalive(&mut self, _enabled: bool) -> io::Result<()> {
        // SO_KEEPALIVE is not reachable through std::net.
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "keepalive not supported by the tcp transport",
        ))
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(stream) = self.stream.take() {
            // Both directions. Errors from an already gone peer are fine.
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }
}
