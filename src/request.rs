//! Incoming HTTP request type.

use bytes::Bytes;

/// An incoming HTTP request with its body fully collected.
pub struct Request {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: Bytes,
}

impl Request {
    pub(crate) fn new(method: String, path: String, body: Bytes) -> Self {
        Self { method, path, body }
    }

    /// Builds a request from hyper's head and an already-collected body.
    pub(crate) fn from_parts(parts: &http::request::Parts, body: Bytes) -> Self {
        Self::new(parts.method.as_str().to_owned(), parts.uri.path().to_owned(), body)
    }

    pub fn method(&self) -> &str { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }
}

#[cfg(test)]
impl Request {
    /// Test constructor: a request with the given method, path and body.
    pub(crate) fn for_test(method: &str, path: &str, body: &[u8]) -> Self {
        Self::new(method.to_owned(), path.to_owned(), Bytes::copy_from_slice(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_keeps_path_without_query() {
        let (parts, ()) = http::Request::builder()
            .method("POST")
            .uri("http://localhost:8001/generate-chart?x=1")
            .body(())
            .unwrap()
            .into_parts();

        let req = Request::from_parts(&parts, Bytes::from_static(b"{}"));
        assert_eq!(req.method(), "POST");
        assert_eq!(req.path(), "/generate-chart");
        assert_eq!(req.body(), b"{}");
    }
}
