use crate::header::Headers;
use crate::transport::Transport;
use crate::{Error, HttpVersion, Result};

/// Parse a `HTTP/1.x <code> <reason>` status line.
///
/// Tokenizes on whitespace rather than using fixed character offsets, which
/// tolerates missing or oddly spaced reason phrases. The reason phrase is
/// discarded.
pub(crate) fn parse_status_line(line: &[u8]) -> Result<(u16, HttpVersion)> {
    let line = String::from_utf8_lossy(line);
    let mut tokens = line.split_whitespace();

    let proto = tokens.next().ok_or(Error::StatusLineTooShort)?;
    let code = tokens.next().ok_or(Error::StatusLineTooShort)?;

    let version = match proto {
        "HTTP/1.0" => HttpVersion::Http10,
        "HTTP/1.1" => HttpVersion::Http11,
        _ => return Err(Error::UnsupportedVersion),
    };

    // The status code is defined as a 3-digit field. Anything trailing the
    // first three characters is ignored.
    let code = code.get(..3).ok_or(Error::StatusLineTooShort)?;
    let code: u16 = code.parse().map_err(|_| Error::StatusNotANumber)?;

    Ok((code, version))
}

/// Split one header line into `(name, value)`.
///
/// A name is one or more ascii alphanumerics or hyphens followed by a
/// colon. The value is the rest of the line with surrounding whitespace
/// trimmed. Lines that do not fit the shape return `None` and are skipped
/// by the block reader.
pub(crate) fn parse_header_line(line: &[u8]) -> Option<(&str, &str)> {
    let line = core::str::from_utf8(line).ok()?;
    let (name, value) = line.split_once(':')?;

    if name.is_empty() || !name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-') {
        return None;
    }

    Some((name, value.trim()))
}

/// Read header lines until a blank (whitespace-only) line.
///
/// Used both for the response preamble and for trailers. Malformed lines
/// are not an error, they are dropped. Folded continuation lines get no
/// special handling, so they are dropped too.
pub(crate) fn read_header_block<T: Transport>(transport: &mut T) -> Result<Headers> {
    let mut headers = Headers::new();

    loop {
        let line = transport.recv_line()?;
        if line.iter().all(|c| c.is_ascii_whitespace()) {
            break;
        }
        if let Some((name, value)) = parse_header_line(&line) {
            headers.append(name, value);
        }
    }

    Ok(headers)
}
