use crate::error::AdapterError;
use crate::stream::BodyStream;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// Framework-independent response produced from a handler result.
///
/// Invariant: a streamed response never holds a buffered body. The stream
/// itself travels alongside and is never read here.
#[derive(Debug, Default)]
pub struct CanonicalResponse {
    body: Option<Bytes>,
    status_code: Option<StatusCode>,
    mimetype: Option<String>,
    content_type: Option<String>,
    headers: Option<HeaderMap>,
    is_streamed: bool,
    stream: Option<BodyStream>,
    passthrough: bool,
}

impl CanonicalResponse {
    pub fn builder() -> CanonicalResponseBuilder {
        CanonicalResponseBuilder::default()
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    pub fn mimetype(&self) -> Option<&str> {
        self.mimetype.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn is_streamed(&self) -> bool {
        self.is_streamed
    }

    /// Copied from a framework response; its headers are final.
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    /// Take the stream handle, leaving `is_streamed` untouched.
    pub fn take_stream(&mut self) -> Option<BodyStream> {
        self.stream.take()
    }

    pub fn into_builder(self) -> CanonicalResponseBuilder {
        CanonicalResponseBuilder { inner: self }
    }

    pub(crate) fn into_parts(self) -> CanonicalParts {
        CanonicalParts {
            body: self.body,
            status_code: self.status_code,
            mimetype: self.mimetype,
            content_type: self.content_type,
            headers: self.headers,
            stream: self.stream,
            passthrough: self.passthrough,
        }
    }
}

pub(crate) struct CanonicalParts {
    pub body: Option<Bytes>,
    pub status_code: Option<StatusCode>,
    pub mimetype: Option<String>,
    pub content_type: Option<String>,
    pub headers: Option<HeaderMap>,
    pub stream: Option<BodyStream>,
    pub passthrough: bool,
}

#[derive(Debug, Default)]
pub struct CanonicalResponseBuilder {
    inner: CanonicalResponse,
}

impl CanonicalResponseBuilder {
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.inner.body = Some(body.into());
        self
    }

    pub fn maybe_body(mut self, body: Option<Bytes>) -> Self {
        self.inner.body = body;
        self
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.inner.status_code = Some(status);
        self
    }

    pub fn maybe_status(mut self, status: Option<StatusCode>) -> Self {
        self.inner.status_code = status;
        self
    }

    pub fn mimetype(mut self, mimetype: Option<String>) -> Self {
        self.inner.mimetype = mimetype;
        self
    }

    pub fn content_type(mut self, content_type: Option<String>) -> Self {
        self.inner.content_type = content_type;
        self
    }

    pub fn headers(mut self, headers: Option<HeaderMap>) -> Self {
        self.inner.headers = headers;
        self
    }

    pub fn passthrough(mut self, passthrough: bool) -> Self {
        self.inner.passthrough = passthrough;
        self
    }

    /// Mark the response as streamed, optionally with the stream to forward.
    pub fn streamed(mut self, stream: Option<BodyStream>) -> Self {
        self.inner.is_streamed = true;
        self.inner.stream = stream;
        self
    }

    pub fn build(self) -> Result<CanonicalResponse, AdapterError> {
        if self.inner.is_streamed && self.inner.body.is_some() {
            return Err(AdapterError::StreamedBodyBuffered);
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::BodyStream;

    #[test]
    fn test_streamed_with_body_is_rejected() {
        let err = CanonicalResponse::builder()
            .body("buffered")
            .streamed(None)
            .build()
            .unwrap_err();
        assert!(matches!(err, AdapterError::StreamedBodyBuffered));
    }

    #[test]
    fn test_streamed_without_body() {
        let mut resp = CanonicalResponse::builder()
            .status(StatusCode::OK)
            .streamed(Some(BodyStream::new(vec![Bytes::from("x")])))
            .build()
            .unwrap();
        assert!(resp.is_streamed());
        assert!(resp.body().is_none());
        assert!(resp.take_stream().is_some());
        assert!(resp.is_streamed());
    }

    #[test]
    fn test_defaults_are_absent() {
        let resp = CanonicalResponse::builder().build().unwrap();
        assert!(resp.status_code().is_none());
        assert!(resp.mimetype().is_none());
        assert!(resp.headers().is_none());
        assert!(!resp.is_streamed());
        assert!(!resp.is_passthrough());
    }

    #[test]
    fn test_into_builder_keeps_invariant() {
        let resp = CanonicalResponse::builder().streamed(None).build().unwrap();
        assert!(resp.into_builder().body("late").build().is_err());
    }
}
