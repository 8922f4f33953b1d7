use crate::{Error, Result};

/// The parts of an `http://host[:port][/path][?query][#fragment]` uri that
/// matter for a request. The fragment is dropped, the query is kept
/// verbatim (already encoded by whoever built the uri).
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Uri<'a> {
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
    pub query: Option<&'a str>,
}

pub(crate) fn parse_uri(s: &str) -> Result<Uri<'_>> {
    let s = s.split('#').next().unwrap_or(s);

    let rest = s
        .strip_prefix("http://")
        .ok_or(Error::BadUri("expected http:// scheme"))?;

    // The authority ends where the path or query begins.
    let split = rest.find(|c| c == '/' || c == '?').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(split);

    if authority.is_empty() {
        return Err(Error::BadUri("missing host"));
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| Error::BadUri("port not a number"))?;
            (host, port)
        }
        None => (authority, 80),
    };

    let (path, query) = match tail.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (tail, None),
    };
    let path = if path.is_empty() { "/" } else { path };

    Ok(Uri {
        host,
        port,
        path,
        query,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_full() -> Result<()> {
        let u = parse_uri("http://example.test:8080/some/path?x=1&y=2#frag")?;
        assert_eq!(u.host, "example.test");
        assert_eq!(u.port, 8080);
        assert_eq!(u.path, "/some/path");
        assert_eq!(u.query, Some("x=1&y=2"));
        Ok(())
    }

    #[test]
    fn test_parse_bare_host() -> Result<()> {
        let u = parse_uri("http://example.test")?;
        assert_eq!(u.host, "example.test");
        assert_eq!(u.port, 80);
        assert_eq!(u.path, "/");
        assert_eq!(u.query, None);
        Ok(())
    }

    #[test]
    fn test_parse_query_without_path() -> Result<()> {
        let u = parse_uri("http://example.test?x=1")?;
        assert_eq!(u.path, "/");
        assert_eq!(u.query, Some("x=1"));
        Ok(())
    }

    #[test]
    fn test_parse_rejects() {
        assert!(parse_uri("https://example.test").is_err());
        assert!(parse_uri("example.test/path").is_err());
        assert!(parse_uri("http://").is_err());
        assert!(parse_uri("http://host:notaport/").is_err());
    }
}
