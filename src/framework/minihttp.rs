use super::core::{merge_headers, Framework, NativeResponse, ResponseBody, ResponseParts};
use crate::error::AdapterError;
use crate::http_facts::split_content_type;
use crate::lifecycle::{CanonicalRequest, CanonicalResponse, ParamVec};
use crate::stream::BodyStream;
use crate::uri_parsing::UriParser;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Mimetype applied when a response names none.
pub const MINIHTTP_DEFAULT_MIMETYPE: &str = "text/plain";

/// Owned capture of a `may_minihttp::Request`.
///
/// `may_minihttp` borrows the connection buffer for the request's lifetime,
/// so the binding copies what it needs before dispatching.
#[derive(Debug, Clone)]
pub struct MiniRequest {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    path_params: ParamVec,
}

impl MiniRequest {
    /// Build a request by hand; used by tests and by callers that already
    /// parsed the wire request.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            path_params: ParamVec::new(),
        }
    }

    /// Copy method, target, headers and body out of a live request.
    pub fn from_minihttp(req: may_minihttp::Request) -> io::Result<Self> {
        let method = Method::from_bytes(req.method().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut request = MiniRequest::new(method, req.path());

        for h in req.headers().iter() {
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(h.name.as_bytes()),
                HeaderValue::from_bytes(h.value),
            ) else {
                debug!(header = %h.name, "Skipping malformed header");
                continue;
            };
            request.headers.append(name, value);
        }

        let mut body = Vec::new();
        req.body().read_to_end(&mut body)?;
        request.body = Bytes::from(body);

        debug!(
            method = %request.method,
            path = %request.path,
            header_count = request.headers.len(),
            body_size_bytes = request.body.len(),
            "Captured may_minihttp request"
        );
        Ok(request)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_path_params(mut self, params: ParamVec) -> Self {
        self.path_params = params;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Default)]
pub enum MiniBody {
    #[default]
    Empty,
    Buffered(Bytes),
    Streamed(BodyStream),
}

/// Response of the may_minihttp binding, written out with [`MiniResponse::write_to`].
#[derive(Debug)]
pub struct MiniResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: MiniBody,
}

impl MiniResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: MiniBody::Empty,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = MiniBody::Buffered(body.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &MiniBody {
        &self.body
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            MiniBody::Buffered(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Write status, headers and body into the connection's response.
    ///
    /// `may_minihttp` frames every response with `Content-Length`, so a
    /// streamed body is drained here before writing.
    ///
    /// Header lines must be `'static` for `may_minihttp` and are leaked.
    /// Up to 4096 distinct lines are interned and reused; headers whose
    /// values differ on every response (cookies, request ids) leak each
    /// time once that set is full.
    pub fn write_to(self, res: &mut may_minihttp::Response) {
        res.status_code(self.status.as_u16() as usize, status_reason(self.status));
        for (name, value) in self.headers.iter() {
            let Ok(value) = value.to_str() else {
                warn!(header = %name, "Dropping non-ASCII response header");
                continue;
            };
            res.header(header_line(name.as_str(), value));
        }
        match self.body {
            MiniBody::Empty => {}
            MiniBody::Buffered(bytes) => res.body_vec(bytes.to_vec()),
            MiniBody::Streamed(stream) => res.body_vec(stream.concat().to_vec()),
        }
    }
}

impl NativeResponse<MiniHttp> for MiniResponse {
    fn into_native(self) -> MiniResponse {
        self
    }
}

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Distinct header lines kept for reuse before interning stops.
const MAX_INTERNED_HEADER_LINES: usize = 4096;

static HEADER_LINES: Lazy<HeaderLines> = Lazy::new(|| HeaderLines::new(MAX_INTERNED_HEADER_LINES));

/// Interned `'static` header lines.
///
/// `may_minihttp` only accepts `'static` header lines, so every line is
/// leaked. Identical lines are leaked once and reused until `capacity`
/// distinct lines are held; after that new lines are leaked per response.
struct HeaderLines {
    lines: Mutex<HashSet<&'static str>>,
    capacity: usize,
    full: AtomicBool,
}

impl HeaderLines {
    fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(HashSet::new()),
            capacity,
            full: AtomicBool::new(false),
        }
    }

    fn get(&self, name: &str, value: &str) -> &'static str {
        let line = format!("{name}: {value}");
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = lines.get(line.as_str()) {
            return existing;
        }
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        if lines.len() < self.capacity {
            lines.insert(leaked);
        } else if !self.full.swap(true, Ordering::Relaxed) {
            warn!(
                capacity = self.capacity,
                header = %name,
                "Header line intern set is full; distinct header values now leak per response"
            );
        }
        leaked
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn header_line(name: &str, value: &str) -> &'static str {
    HEADER_LINES.get(name, value)
}

/// Binding for the `may_minihttp` coroutine HTTP server.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniHttp;

impl Framework for MiniHttp {
    type Request = MiniRequest;
    type Response = MiniResponse;

    fn name() -> &'static str {
        "may_minihttp"
    }

    fn get_request(request: MiniRequest, uri_parser: Arc<dyn UriParser>) -> CanonicalRequest {
        let mut builder = CanonicalRequest::builder(request.method, request.path, uri_parser)
            .path_params(request.path_params)
            .headers(request.headers);
        if let Some(query) = request.query.as_deref() {
            builder = builder.query_string(query);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }
        builder.build()
    }

    fn framework_to_canonical(response: MiniResponse) -> Result<CanonicalResponse, AdapterError> {
        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let mimetype = content_type
            .as_deref()
            .map(|ct| split_content_type(ct).0);
        let builder = CanonicalResponse::builder()
            .status(response.status)
            .mimetype(mimetype)
            .content_type(content_type)
            .headers(Some(response.headers));
        let builder = match response.body {
            MiniBody::Empty => builder,
            MiniBody::Buffered(bytes) => builder.body(bytes),
            MiniBody::Streamed(stream) => builder.streamed(Some(stream)),
        };
        builder.build()
    }

    fn make_response(
        mut response: MiniResponse,
        status: Option<StatusCode>,
        headers: Option<HeaderMap>,
    ) -> Result<MiniResponse, AdapterError> {
        if let Some(status) = status {
            response.status = status;
        }
        if let Some(merged) = merge_headers(Some(std::mem::take(&mut response.headers)), headers) {
            response.headers = merged;
        }
        Ok(response)
    }

    fn response_class(parts: ResponseParts) -> Result<MiniResponse, AdapterError> {
        let mut headers = parts.headers.unwrap_or_default();
        let has_body = !matches!(parts.body, ResponseBody::Empty);
        let content_type = match parts.verbatim {
            true => None,
            false => parts.content_type.or(parts.mimetype).or_else(|| {
                (has_body && !headers.contains_key(CONTENT_TYPE))
                    .then(|| MINIHTTP_DEFAULT_MIMETYPE.to_string())
            }),
        };
        if let Some(content_type) = content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type)?);
        }
        let body = match parts.body {
            ResponseBody::Empty => MiniBody::Empty,
            ResponseBody::Buffered(bytes) => MiniBody::Buffered(bytes),
            ResponseBody::Streamed(stream) => MiniBody::Streamed(stream),
        };
        Ok(MiniResponse {
            status: parts.status.unwrap_or(StatusCode::OK),
            headers,
            body,
        })
    }
}
