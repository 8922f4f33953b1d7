use std::time::Duration;

use log::debug;

use crate::body::{BodyMode, BodyReader};
use crate::header::Headers;
use crate::parser::{parse_status_line, read_header_block};
use crate::req::{format, Query, RequestParams};
use crate::transport::{TcpTransport, Transport};
use crate::url::parse_uri;
use crate::{DrainError, Error, HttpVersion, Result};

/// Parsed response preamble plus the body reader, when the exchange has a
/// body. HEAD, 1xx, 204 and 304 leave `body` as `None`.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub version: HttpVersion,
    pub headers: Headers,
    pub body: Option<BodyReader>,
}

/// One connected peer, serving one request/response exchange at a time.
///
/// The connection remembers the host it was opened against, which becomes
/// the default `Host` header. Reuse across exchanges requires the previous
/// body to be fully drained first; a partially-read body leaves the
/// transport misaligned, so `request` refuses until it is.
pub struct Connection<T: Transport> {
    transport: T,
    host: String,
    /// A returned body reader has not yet reached its terminal state.
    body_pending: bool,
}

impl Connection<TcpTransport> {
    /// Open a TCP connection. The remembered host includes the port when
    /// it is not 80, matching what the `Host` header should carry.
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let transport = TcpTransport::connect(host, port)?;
        let host = if port == 80 {
            host.to_string()
        } else {
            std::format!("{}:{}", host, port)
        };
        Ok(Connection::new(transport, host))
    }
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, host: impl Into<String>) -> Self {
        Connection {
            transport,
            host: host.into(),
            body_pending: false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Send one request and read the response preamble.
    ///
    /// The status line and header block are consumed; body bytes stay on
    /// the transport for the returned reader to pull.
    pub fn request(&mut self, params: &RequestParams) -> Result<Response> {
        if self.body_pending {
            return Err(Error::BodyNotDrained);
        }

        let head = format(params, &self.host);
        self.transport.send_all(&head)?;
        if let Some(body) = &params.body {
            self.transport.send_all(body)?;
        }
        debug!("> {} {}", params.method.to_ascii_uppercase(), params.path);

        let line = self.transport.recv_line()?;
        let (status, version) = parse_status_line(&line)?;
        let headers = read_header_block(&mut self.transport)?;
        debug!("< {} {}", version.as_str(), status);

        let body = if BodyMode::expects_body(&params.method, status) {
            let mode = BodyMode::from_headers(version, &headers);
            debug!("body mode {:?}", mode);
            Some(BodyReader::new(mode))
        } else {
            None
        };

        self.body_pending = body.as_ref().map(|b| !b.is_terminal()).unwrap_or(false);

        Ok(Response {
            status,
            version,
            headers,
            body,
        })
    }

    /// Pull the next body chunk, at most `max_chunk` bytes. `Ok(None)`
    /// means the body is done and the connection can be reused.
    pub fn pull(
        &mut self,
        reader: &mut BodyReader,
        max_chunk: Option<usize>,
    ) -> Result<Option<Vec<u8>>> {
        let ret = reader.pull(&mut self.transport, max_chunk);
        if reader.is_terminal() {
            self.body_pending = false;
        }
        ret
    }

    /// Read the whole body into one buffer.
    ///
    /// `None` for the reader is a state error, not a transport one: the
    /// exchange had no body (HEAD, 204, 304). A failure mid-stream keeps
    /// the bytes collected so far in [`DrainError::partial`].
    pub fn read_body(
        &mut self,
        reader: Option<&mut BodyReader>,
    ) -> core::result::Result<Vec<u8>, DrainError> {
        let Some(reader) = reader else {
            return Err(DrainError {
                partial: Vec::new(),
                source: Error::NoBody,
            });
        };

        let mut out = Vec::new();
        loop {
            match self.pull(reader, None) {
                Ok(Some(chunk)) => out.extend_from_slice(&chunk),
                Ok(None) => return Ok(out),
                Err(source) => return Err(DrainError { partial: out, source }),
            }
        }
    }

    /// Merge trailers into `headers` after a chunked body ended.
    ///
    /// A no-op unless the response declared a `Trailer` header. Trailer
    /// keys overwrite existing ones. Calling this while the body is still
    /// being read is a state error.
    pub fn read_trailers(&mut self, headers: &mut Headers) -> Result<()> {
        if self.body_pending {
            return Err(Error::TrailersBeforeBodyEnd);
        }
        if headers.find("Trailer").is_none() {
            return Ok(());
        }

        let trailers = read_header_block(&mut self.transport)?;
        debug!("merged {} trailers", trailers.len());
        for (name, value) in trailers.iter() {
            headers.insert(name, value);
        }
        Ok(())
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.transport.set_timeout(timeout)?)
    }

    pub fn set_keepalive(&mut self, enabled: bool) -> Result<()> {
        Ok(self.transport.set_keepalive(enabled)?)
    }

    pub fn reuse_count(&self) -> u64 {
        self.transport.reuse_count()
    }

    /// Close the transport. Abandons any partially-read body; the
    /// connection cannot be used afterwards.
    pub fn close(&mut self) -> Result<()> {
        self.body_pending = false;
        Ok(self.transport.close()?)
    }
}

/// Response with the body already drained, as returned by [`fetch`].
#[derive(Debug)]
pub struct Fetched {
    pub status: u16,
    pub version: HttpVersion,
    pub headers: Headers,
    pub body: Vec<u8>,
}

/// One-shot exchange against a uri: connect, request, drain, merge
/// trailers, close.
///
/// The uri's path and query override whatever `params` carried. Only the
/// `http` scheme is supported.
pub fn fetch(uri: &str, mut params: RequestParams) -> Result<Fetched> {
    let u = parse_uri(uri)?;
    params.path = u.path.to_string();
    if let Some(query) = u.query {
        params.query = Query::Literal(query.to_string());
    }

    let mut conn = Connection::connect(u.host, u.port)?;
    let result = exchange(&mut conn, &params);
    let _ = conn.close();
    result
}

fn exchange<T: Transport>(conn: &mut Connection<T>, params: &RequestParams) -> Result<Fetched> {
    let mut response = conn.request(params)?;

    let body = match conn.read_body(response.body.as_mut()) {
        Ok(body) => body,
        // No body at all is fine for a one-shot fetch.
        Err(DrainError {
            source: Error::NoBody,
            ..
        }) => Vec::new(),
        Err(e) => return Err(e.source),
    };

    conn.read_trailers(&mut response.headers)?;

    Ok(Fetched {
        status: response.status,
        version: response.version,
        headers: response.headers,
        body,
    })
}
