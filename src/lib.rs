//! Blocking HTTP/1.x client protocol engine.
//!
//! peck speaks the client side of HTTP/1.0 and 1.1 over any
//! already-connected byte stream. It formats requests, parses status
//! lines and headers, and exposes response bodies as a resumable sequence
//! of pulls that handles all three wire delimitings: read-to-close,
//! content-length and chunked transfer encoding.
//!
//! The transport is pluggable through the [`Transport`] trait; a plain
//! TCP implementation is included. Redirects, retries, caching, cookies
//! and TLS are all left to the caller.
//!
//! ```no_run
//! use peck::{Connection, RequestParams};
//!
//! # fn main() -> Result<(), peck::Error> {
//! let mut conn = Connection::connect("example.test", 80)?;
//!
//! let mut response = conn.request(&RequestParams::new("GET", "/some-path"))?;
//! assert_eq!(response.status, 200);
//!
//! // Pull the body in pieces of at most 1024 bytes. The cap can change
//! // between pulls.
//! if let Some(reader) = response.body.as_mut() {
//!     while let Some(chunk) = conn.pull(reader, Some(1024))? {
//!         println!("{} bytes", chunk.len());
//!     }
//! }
//!
//! // Chunked responses may carry trailers after the body.
//! conn.read_trailers(&mut response.headers)?;
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod error;
mod header;
mod parser;
mod req;
mod transport;
mod url;

pub use body::{BodyMode, BodyReader};
pub use client::{fetch, Connection, Fetched, Response};
pub use error::{DrainError, Error};
pub(crate) use error::Result;
pub use header::Headers;
pub use req::{format, Query, RequestParams, Values};
pub use transport::{TcpTransport, Transport};

/// The two protocol versions this crate speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    /// The wire form, `HTTP/1.0` or `HTTP/1.1`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Http10 => "HTTP/1.0",
            HttpVersion::Http11 => "HTTP/1.1",
        }
    }
}
