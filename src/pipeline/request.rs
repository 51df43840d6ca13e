//! Inbound request model.
//!
//! # Responsibilities
//! - Carry the read-only view of a host-originated resource request
//! - Assign a unique request ID as early as possible for tracing
//! - Expose query parameters and post data in the shapes handlers consume

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use axum::http::Method;
use bytes::{Bytes, BytesMut};
use url::Url;
use uuid::Uuid;

use crate::pipeline::headers::Headers;

/// Unique identifier for a scheme request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One element of a request body, as delivered by the host.
#[derive(Debug, Clone)]
pub enum PostDataElement {
    Bytes(Bytes),
    File(PathBuf),
    Empty,
}

impl PostDataElement {
    /// Read the element's content. File elements are read from disk.
    pub async fn read(&self) -> std::io::Result<Bytes> {
        match self {
            PostDataElement::Bytes(bytes) => Ok(bytes.clone()),
            PostDataElement::File(path) => tokio::fs::read(path).await.map(Bytes::from),
            PostDataElement::Empty => Ok(Bytes::new()),
        }
    }
}

/// Ordered list of body elements.
#[derive(Debug, Clone, Default)]
pub struct PostData {
    pub elements: Vec<PostDataElement>,
}

impl PostData {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            elements: vec![PostDataElement::Bytes(bytes.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Concatenate every element in order.
    pub async fn concat(&self) -> std::io::Result<Bytes> {
        let mut buf = BytesMut::new();
        for element in &self.elements {
            buf.extend_from_slice(&element.read().await?);
        }
        Ok(buf.freeze())
    }
}

/// Query parameters as a string-keyed multi-map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    inner: BTreeMap<String, Vec<String>>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the query component of a URL.
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::new();
        for (key, value) in url.query_pairs() {
            params.insert(key.into_owned(), value.into_owned());
        }
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.entry(key.into()).or_default().push(value.into());
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.inner.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// A resource request routed through the scheme pipeline.
#[derive(Debug, Clone)]
pub struct SchemeRequest {
    pub id: RequestId,
    pub url: Url,
    pub method: Method,
    pub headers: Headers,
    pub post_data: Option<PostData>,
}

impl SchemeRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            id: RequestId::new(),
            url,
            method,
            headers: Headers::new(),
            post_data: None,
        }
    }

    /// Convenience constructor for a GET request.
    pub fn get(url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Method::GET, Url::parse(url)?))
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.post_data = Some(PostData::from_bytes(body));
        self
    }

    pub fn query_params(&self) -> QueryParams {
        QueryParams::from_url(&self.url)
    }

    /// The first post-data element as UTF-8 text, or an empty string.
    ///
    /// File elements are not read here; JSON routes only receive inline bodies.
    pub fn post_data_text(&self) -> String {
        match self.post_data.as_ref().and_then(|p| p.elements.first()) {
            Some(PostDataElement::Bytes(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_multi_valued() {
        let req = SchemeRequest::get("http://command.com/movies?id=1&id=2&name=a%20b").unwrap();
        let params = req.query_params();

        assert_eq!(params.get("id"), Some("1"));
        assert_eq!(params.get_all("id"), &["1".to_string(), "2".to_string()]);
        assert_eq!(params.get("name"), Some("a b"));
        assert!(params.get_all("missing").is_empty());
    }

    #[test]
    fn test_post_data_text_uses_first_element() {
        let mut req = SchemeRequest::get("http://command.com/save").unwrap();
        assert_eq!(req.post_data_text(), "");

        req.post_data = Some(PostData {
            elements: vec![
                PostDataElement::Bytes(Bytes::from_static(b"{\"a\":1}")),
                PostDataElement::Bytes(Bytes::from_static(b"ignored")),
            ],
        });
        assert_eq!(req.post_data_text(), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_post_data_concat_in_order() {
        let post = PostData {
            elements: vec![
                PostDataElement::Bytes(Bytes::from_static(b"he")),
                PostDataElement::Empty,
                PostDataElement::Bytes(Bytes::from_static(b"llo")),
            ],
        };
        assert_eq!(post.concat().await.unwrap(), Bytes::from_static(b"hello"));
    }
}
