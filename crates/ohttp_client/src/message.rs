// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain HTTP request and response descriptors, as seen by the caller on
//! one side and the target resolver on the other.

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use http::{Method, StatusCode, Uri};

/// Ordered header multimap.
///
/// Unlike [`http::HeaderMap`], iteration is guaranteed to follow insertion
/// order across different names, which is the order fields are written to
/// the wire. Names compare case-insensitively (they are stored lowercased).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderList(Vec<(HeaderName, HeaderValue)>);

impl HeaderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, keeping any existing fields with the same name.
    pub fn append(&mut self, name: HeaderName, value: HeaderValue) {
        self.0.push((name, value));
    }

    /// Parse and add a field from strings.
    pub fn try_append(&mut self, name: &str, value: &str) -> Result<(), InvalidHeader> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.append(name, value);
        Ok(())
    }

    /// First value for `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.0
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// All values for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.0
            .iter()
            .filter(move |(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (HeaderName, HeaderValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(HeaderName, HeaderValue)> for HeaderList {
    fn from_iter<T: IntoIterator<Item = (HeaderName, HeaderValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a (HeaderName, HeaderValue);
    type IntoIter = std::slice::Iter<'a, (HeaderName, HeaderValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&http::HeaderMap> for HeaderList {
    fn from(map: &http::HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InvalidHeader {
    #[error("invalid header name: {0}")]
    Name(#[from] InvalidHeaderName),
    #[error("invalid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// The request a caller wants delivered to the target.
///
/// An empty body means "no body".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: Method,
    url: Uri,
    headers: HeaderList,
    body: Bytes,
    trailers: HeaderList,
}

impl RequestDescriptor {
    pub fn new(method: Method, url: Uri) -> Self {
        Self {
            method,
            url,
            headers: HeaderList::new(),
            body: Bytes::new(),
            trailers: HeaderList::new(),
        }
    }

    /// Shorthand for a GET with no headers.
    pub fn get(url: Uri) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn try_header(mut self, name: &str, value: &str) -> Result<Self, InvalidHeader> {
        self.headers.try_append(name, value)?;
        Ok(self)
    }

    pub fn headers_mut(&mut self) -> &mut HeaderList {
        &mut self.headers
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn trailer(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.trailers.append(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn trailers(&self) -> &HeaderList {
        &self.trailers
    }
}

impl From<http::Request<Bytes>> for RequestDescriptor {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            url: parts.uri,
            headers: HeaderList::from(&parts.headers),
            body,
            trailers: HeaderList::new(),
        }
    }
}

/// An interim (1xx) response that preceded the final one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationalResponse {
    pub status: StatusCode,
    pub headers: HeaderList,
}

/// The target's final answer, as recovered from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: HeaderList,
    body: Bytes,
    informational: Vec<InformationalResponse>,
    trailers: HeaderList,
}

impl ResponseDescriptor {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderList::new(),
            body: Bytes::new(),
            informational: Vec::new(),
            trailers: HeaderList::new(),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn informational(mut self, response: InformationalResponse) -> Self {
        self.informational.push(response);
        self
    }

    pub fn trailer(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.trailers.append(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    pub fn body_bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    pub fn informational_responses(&self) -> &[InformationalResponse] {
        &self.informational
    }

    pub fn trailers(&self) -> &HeaderList {
        &self.trailers
    }
}

impl From<ResponseDescriptor> for http::Response<Bytes> {
    fn from(response: ResponseDescriptor) -> Self {
        let mut out = http::Response::new(response.body);
        *out.status_mut() = response.status;
        let headers = out.headers_mut();
        for (name, value) in response.headers.0 {
            headers.append(name, value);
        }
        out
    }
}
