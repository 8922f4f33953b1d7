use std::collections::BTreeMap;

/// Response (and trailer) header map.
///
/// Names are stored exactly as they arrived on the wire and `get` matches
/// them literally. When the same name arrives on several lines the values
/// are folded into one entry, joined with `", "` in arrival order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Headers {
    map: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Headers::default()
    }

    /// Add one header line worth of value, folding into an existing entry.
    pub fn append(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.map.get_mut(name) {
            existing.push_str(", ");
            existing.push_str(value);
        } else {
            self.map.insert(name.to_string(), value.to_string());
        }
    }

    /// Set a header, replacing any previous value. Used for trailer merge.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.map.insert(name.to_string(), value.to_string());
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|v| v.as_str())
    }

    /// ASCII-case-insensitive lookup. Scans the entries, first hit wins.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.map
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_append_folds_repeats() {
        let mut h = Headers::new();
        h.append("X-A", "1");
        h.append("X-A", "2");
        h.append("X-A", "3");
        assert_eq!(h.get("X-A"), Some("1, 2, 3"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_get_is_literal() {
        let mut h = Headers::new();
        h.append("Content-Length", "10");
        assert_eq!(h.get("content-length"), None);
        assert_eq!(h.find("content-length"), Some("10"));
    }

    #[test]
    fn test_insert_overwrites() {
        let mut h = Headers::new();
        h.append("Foo", "a");
        h.insert("Foo", "b");
        assert_eq!(h.get("Foo"), Some("b"));
    }
}
