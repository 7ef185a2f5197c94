//! Header storage for synthesized requests and handler responses.
//!
//! Virtual requests carry at most a handful of headers (the conditional
//! fields plus content markers), so storage uses a small-vector optimization
//! to avoid heap allocation in the common case.

use smallvec::SmallVec;

/// Maximum number of headers stored inline (stack allocated).
const INLINE_HEADERS: usize = 8;

/// An ordered list of header (name, value) pairs.
///
/// Lookup is case-insensitive per RFC 7230; insertion replaces any existing
/// header with the same name.
///
/// # Example
///
/// ```
/// use galen_core::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("If-Match", "W/\"1\"");
///
/// assert_eq!(headers.get("if-match"), Some("W/\"1\""));
/// assert_eq!(headers.get("If-None-Match"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    inner: SmallVec<[(String, String); INLINE_HEADERS]>,
}

impl Headers {
    /// Creates a new empty header list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header.
    ///
    /// Any existing header with the same name (case-insensitive) is removed
    /// before the new value is appended.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.inner.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.inner.push((name, value.into()));
    }

    /// Returns the value for a header by name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if a header with the given name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns `true` if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns an iterator over the headers.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Headers {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_headers_insert_and_get() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/fhir+json");
        headers.insert("If-Match", "W/\"1\"");

        assert_eq!(headers.get("Content-Type"), Some("application/fhir+json"));
        assert_eq!(headers.get("If-Match"), Some("W/\"1\""));
        assert_eq!(headers.get("Location"), None);
    }

    #[test]
    fn test_headers_get_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("ETag", "W/\"7\"");

        assert_eq!(headers.get("etag"), Some("W/\"7\""));
        assert_eq!(headers.get("ETAG"), Some("W/\"7\""));
    }

    #[test]
    fn test_headers_insert_replaces() {
        let mut headers = Headers::new();
        headers.insert("If-Match", "W/\"1\"");
        headers.insert("if-match", "W/\"2\"");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("If-Match"), Some("W/\"2\""));
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.insert("a", "1");
        headers.insert("b", "2");

        let pairs: Vec<_> = headers.iter().collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_headers_from_iterator() {
        let headers: Headers = vec![
            ("Location".to_string(), "/Patient/1".to_string()),
            ("ETag".to_string(), "W/\"1\"".to_string()),
        ]
        .into_iter()
        .collect();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("location"), Some("/Patient/1"));
    }
}
