use std::io;

/// Error type for peck.
///
/// Falls in three families: transport failures (surfaced verbatim, never
/// retried), protocol violations (fatal to the exchange, the transport is
/// left at an unknown position and should be closed), and state errors
/// (caller used the API out of order).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Failure in the underlying byte transport.
    #[error("transport: {0}")]
    Transport(#[from] io::Error),

    /// Status line had fewer fields than `HTTP/1.x <code>`.
    #[error("status line too short")]
    StatusLineTooShort,

    /// Status line HTTP version was not 1.0 or 1.1.
    #[error("unsupported http version")]
    UnsupportedVersion,

    /// Status code field did not parse as a number.
    #[error("status code is not a number")]
    StatusNotANumber,

    /// Chunk length line cannot be read as a hex number.
    #[error("chunk length cannot be read as a number")]
    ChunkLenNotANumber,

    /// The CRLF terminating a chunk was something else.
    #[error("chunk expected crlf as next character")]
    ChunkExpectedCrLf,

    /// Attempt to drain a response that has no body.
    #[error("response has no body")]
    NoBody,

    /// New request on a connection whose previous body is not fully read.
    #[error("previous response body not fully read")]
    BodyNotDrained,

    /// Trailer read before the body reached its end.
    #[error("trailers read before body end")]
    TrailersBeforeBodyEnd,

    /// Pull on a body reader that already signaled an error.
    #[error("body reader failed, not resumable")]
    ReaderNotResumable,

    /// URI did not have the shape `http://host[:port][/path]`.
    #[error("bad uri: {0}")]
    BadUri(&'static str),
}

impl Error {
    /// True if this error originated in the transport rather than in
    /// protocol parsing or API misuse.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Error from draining a body, carrying whatever was read before the
/// failure.
#[derive(Debug, thiserror::Error)]
#[error("body drain failed after {} bytes: {source}", .partial.len())]
pub struct DrainError {
    /// Bytes collected before the failure, in order.
    pub partial: Vec<u8>,
    #[source]
    pub source: Error,
}

pub(crate) type Result<T> = core::result::Result<T, Error>;
