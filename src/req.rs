use std::fmt::Write;

use crate::HttpVersion;

/// One value or an ordered list of values, for headers and query maps.
/// A list produces one wire item per value, in list order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Values {
    One(String),
    Many(Vec<String>),
}

impl Values {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let slice = match self {
            Values::One(v) => std::slice::from_ref(v),
            Values::Many(v) => v.as_slice(),
        };
        slice.iter().map(|v| v.as_str())
    }
}

impl From<&str> for Values {
    fn from(v: &str) -> Self {
        Values::One(v.to_string())
    }
}

impl From<String> for Values {
    fn from(v: String) -> Self {
        Values::One(v)
    }
}

impl From<Vec<String>> for Values {
    fn from(v: Vec<String>) -> Self {
        Values::Many(v)
    }
}

/// Query string for a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Query {
    #[default]
    None,
    /// Appended after `?` verbatim. Must already be encoded.
    Literal(String),
    /// Percent-encoded and joined with `&`. A multi-valued key emits one
    /// `k=v` pair per value.
    Map(Vec<(String, Values)>),
}

/// Parameters for one request.
#[derive(Debug, Clone)]
pub struct RequestParams {
    /// Upper-cased on the wire regardless of input case.
    pub method: String,
    /// Empty means `/`.
    pub path: String,
    pub query: Query,
    pub version: HttpVersion,
    /// Ordered. A multi-valued entry emits one header line per value.
    pub headers: Vec<(String, Values)>,
    /// Raw body bytes, sent verbatim after the header block.
    pub body: Option<Vec<u8>>,
}

impl Default for RequestParams {
    fn default() -> Self {
        RequestParams {
            method: "GET".to_string(),
            path: "/".to_string(),
            query: Query::None,
            version: HttpVersion::Http11,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestParams {
    pub fn new(method: &str, path: &str) -> Self {
        RequestParams {
            method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: impl Into<Values>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

/// Serialize the request line and header block.
///
/// The returned bytes end with the blank line; body bytes are not
/// included. `default_host` fills in the `Host` header when the caller did
/// not set one.
pub fn format(params: &RequestParams, default_host: &str) -> Vec<u8> {
    let mut head = String::new();

    let method = params.method.to_ascii_uppercase();
    let path = if params.path.is_empty() {
        "/"
    } else {
        params.path.as_str()
    };
    let _ = write!(head, "{} {}", method, path);

    let query = encode_query(&params.query);
    if !query.is_empty() {
        let _ = write!(head, "?{}", query);
    }
    let _ = write!(head, " {}\r\n", params.version.as_str());

    for (name, values) in &params.headers {
        for value in values.iter() {
            let _ = write!(head, "{}: {}\r\n", name, value);
        }
    }

    if let Some(body) = &params.body {
        if !params.has_header("content-length") {
            let _ = write!(head, "Content-Length: {}\r\n", body.len());
        }
    }
    if !params.has_header("host") {
        let _ = write!(head, "Host: {}\r\n", default_host);
    }
    if !params.has_header("user-agent") {
        let _ = write!(head, "User-Agent: peck/{}\r\n", env!("CARGO_PKG_VERSION"));
    }
    // For 1.0 the connection closes by default, ask the server to hold it.
    if params.version == HttpVersion::Http10 && !params.has_header("connection") {
        head.push_str("Connection: Keep-Alive\r\n");
    }

    head.push_str("\r\n");
    head.into_bytes()
}

fn encode_query(query: &Query) -> String {
    match query {
        Query::None => String::new(),
        Query::Literal(q) => q.clone(),
        Query::Map(pairs) => {
            let mut out = String::new();
            for (key, values) in pairs {
                for value in values.iter() {
                    if !out.is_empty() {
                        out.push('&');
                    }
                    percent_encode(key, &mut out);
                    out.push('=');
                    percent_encode(value, &mut out);
                }
            }
            out
        }
    }
}

/// RFC 3986 unreserved characters stay, everything else becomes %XX.
fn percent_encode(s: &str, out: &mut String) {
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => {
                let _ = write!(out, "%{:02X}", b);
            }
        }
    }
}
