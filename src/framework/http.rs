use super::core::{merge_headers, Framework, NativeResponse, ResponseBody, ResponseParts};
use crate::error::AdapterError;
use crate::http_facts::{get_content_type, split_content_type};
use crate::lifecycle::{CanonicalRequest, CanonicalResponse, ParamVec};
use crate::stream::BodyStream;
use crate::uri_parsing::UriParser;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use std::sync::Arc;
use tracing::debug;

/// Mimetype applied when a response names none.
pub const HTTP_DEFAULT_MIMETYPE: &str = "text/plain";

/// Path parameters extracted by whatever router matched the request.
///
/// Insert into the request extensions before handing it to the adapter.
#[derive(Debug, Clone, Default)]
pub struct PathParams(pub ParamVec);

/// Response body of the `http` crate binding.
#[derive(Debug, Default)]
pub enum HttpBody {
    #[default]
    Empty,
    Full(Bytes),
    Streaming(BodyStream),
}

impl HttpBody {
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            HttpBody::Full(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, HttpBody::Streaming(_))
    }

    /// Collect the whole body, draining a stream if present.
    pub fn collect(self) -> Bytes {
        match self {
            HttpBody::Empty => Bytes::new(),
            HttpBody::Full(bytes) => bytes,
            HttpBody::Streaming(stream) => stream.concat(),
        }
    }
}

impl From<ResponseBody> for HttpBody {
    fn from(body: ResponseBody) -> Self {
        match body {
            ResponseBody::Empty => HttpBody::Empty,
            ResponseBody::Buffered(bytes) => HttpBody::Full(bytes),
            ResponseBody::Streamed(stream) => HttpBody::Streaming(stream),
        }
    }
}

pub type HttpRequest = http::Request<Bytes>;
pub type HttpResponse = http::Response<HttpBody>;

/// Binding for the `http` crate's request/response types.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFramework;

impl NativeResponse<HttpFramework> for HttpResponse {
    fn into_native(self) -> HttpResponse {
        self
    }
}

impl Framework for HttpFramework {
    type Request = HttpRequest;
    type Response = HttpResponse;

    fn name() -> &'static str {
        "http"
    }

    fn get_request(request: HttpRequest, uri_parser: Arc<dyn UriParser>) -> CanonicalRequest {
        let (parts, body) = request.into_parts();
        let path_params = parts
            .extensions
            .get::<PathParams>()
            .map(|p| p.0.clone())
            .unwrap_or_default();
        debug!(
            method = %parts.method,
            path = %parts.uri.path(),
            header_count = parts.headers.len(),
            path_param_count = path_params.len(),
            body_size_bytes = body.len(),
            "Captured http request"
        );
        let mut builder = CanonicalRequest::builder(parts.method, parts.uri.path(), uri_parser)
            .path_params(path_params)
            .headers(parts.headers);
        if let Some(query) = parts.uri.query() {
            builder = builder.query_string(query);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }
        builder.build()
    }

    fn framework_to_canonical(response: HttpResponse) -> Result<CanonicalResponse, AdapterError> {
        let (parts, body) = response.into_parts();
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mimetype = content_type
            .as_deref()
            .map(|ct| split_content_type(ct).0);
        let builder = CanonicalResponse::builder()
            .status(parts.status)
            .mimetype(mimetype)
            .content_type(content_type)
            .headers(Some(parts.headers));
        let builder = match body {
            HttpBody::Empty => builder,
            HttpBody::Full(bytes) => builder.body(bytes),
            HttpBody::Streaming(stream) => builder.streamed(Some(stream)),
        };
        builder.build()
    }

    fn make_response(
        response: HttpResponse,
        status: Option<StatusCode>,
        headers: Option<HeaderMap>,
    ) -> Result<HttpResponse, AdapterError> {
        let (mut parts, body) = response.into_parts();
        if let Some(status) = status {
            parts.status = status;
        }
        if let Some(merged) = merge_headers(Some(parts.headers.clone()), headers) {
            parts.headers = merged;
        }
        Ok(http::Response::from_parts(parts, body))
    }

    fn response_class(parts: ResponseParts) -> Result<HttpResponse, AdapterError> {
        let mut headers = parts.headers.unwrap_or_default();
        let has_body = !matches!(parts.body, ResponseBody::Empty);
        let content_type = match parts.verbatim {
            true => None,
            false => parts.content_type.or_else(|| {
                let mimetype = parts.mimetype.or_else(|| {
                    (has_body && !headers.contains_key(CONTENT_TYPE))
                        .then(|| HTTP_DEFAULT_MIMETYPE.to_string())
                })?;
                Some(get_content_type(&mimetype, "utf-8"))
            }),
        };
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type)?);
        }

        let mut response = http::Response::new(HttpBody::from(parts.body));
        *response.status_mut() = parts.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = headers;
        Ok(response)
    }
}
