use crate::body::{extract_body, RequestBody};
use crate::error::{AdapterError, Problem};
use crate::http_facts::PROBLEM_MIMETYPE;
use crate::jsonifier::Jsonifier;
use crate::lifecycle::{CanonicalRequest, CanonicalResponse};
use crate::response::Payload;
use crate::stream::BodyStream;
use crate::uri_parsing::UriParser;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use std::sync::Arc;

/// Body handed to a framework's response constructor.
#[derive(Debug, Default)]
pub enum ResponseBody {
    #[default]
    Empty,
    Buffered(Bytes),
    Streamed(BodyStream),
}

impl ResponseBody {
    pub fn is_streamed(&self) -> bool {
        matches!(self, ResponseBody::Streamed(_))
    }
}

/// Arguments of a framework response constructor.
///
/// `None` fields are left for the framework to default. With `verbatim`
/// the headers are used as given and no content type is added.
#[derive(Debug, Default)]
pub struct ResponseParts {
    pub body: ResponseBody,
    pub status: Option<StatusCode>,
    pub headers: Option<HeaderMap>,
    pub content_type: Option<String>,
    pub mimetype: Option<String>,
    pub verbatim: bool,
}

/// Binding between the canonical model and one web framework.
///
/// Implementations are zero-sized markers; all methods are associated
/// functions so that an adapter holds no framework state.
pub trait Framework: Send + Sync + 'static {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn name() -> &'static str;

    /// Capture a framework request into the canonical model.
    fn get_request(request: Self::Request, uri_parser: Arc<dyn UriParser>) -> CanonicalRequest;

    fn get_body(request: &CanonicalRequest) -> Option<RequestBody> {
        extract_body(request)
    }

    /// Whether a handler payload is already a response of this framework.
    fn is_framework_response<R>(payload: &Payload<R>) -> bool {
        payload.is_native()
    }

    /// Copy status, headers, mimetype and body out of a native response.
    ///
    /// Streamed responses must not be read: their body stays `None` and the
    /// stream handle moves into the canonical response.
    fn framework_to_canonical(response: Self::Response)
        -> Result<CanonicalResponse, AdapterError>;

    /// Re-issue a native response with status/header overrides applied.
    fn make_response(
        response: Self::Response,
        status: Option<StatusCode>,
        headers: Option<HeaderMap>,
    ) -> Result<Self::Response, AdapterError>;

    /// Construct a response from prepared parts, applying framework defaults
    /// for every absent field.
    fn response_class(parts: ResponseParts) -> Result<Self::Response, AdapterError>;

    /// Render a pipeline rejection as `application/problem+json`.
    fn problem_response(
        problem: &Problem,
        jsonifier: &Jsonifier,
    ) -> Result<Self::Response, AdapterError> {
        Self::response_class(ResponseParts {
            body: ResponseBody::Buffered(Bytes::from(jsonifier.to_vec(problem)?)),
            status: Some(problem.status),
            headers: None,
            content_type: None,
            mimetype: Some(PROBLEM_MIMETYPE.to_string()),
            verbatim: false,
        })
    }
}

/// Native response type a handler may return for framework `F`.
pub trait NativeResponse<F: Framework>: Send + 'static {
    fn into_native(self) -> F::Response;
}

/// Native response type of handlers that never build framework responses.
///
/// Having no values, it lets one operation be served by any framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Portable {}

impl<F: Framework> NativeResponse<F> for Portable {
    fn into_native(self) -> F::Response {
        match self {}
    }
}

/// Merge `overrides` into `base`: every header named in `overrides`
/// replaces all values of the same name in `base`.
pub fn merge_headers(base: Option<HeaderMap>, overrides: Option<HeaderMap>) -> Option<HeaderMap> {
    let Some(overrides) = overrides else {
        return base;
    };
    let mut merged = base.unwrap_or_default();
    let mut current = None;
    for (name, value) in overrides {
        let name = match name {
            Some(name) => {
                merged.remove(&name);
                current = Some(name.clone());
                name
            }
            None => match &current {
                Some(name) => name.clone(),
                None => continue,
            },
        };
        merged.append(name, value);
    }
    Some(merged)
}
