//! Content-type driven request body extraction.

use crate::http_facts::{is_form_mimetype, is_json_mimetype};
use crate::lifecycle::{CanonicalRequest, FormData};
use bytes::Bytes;
use serde_json::Value;

/// Decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(FormData),
    Raw(Bytes),
}

impl RequestBody {
    /// JSON view used when binding the body as a handler argument.
    ///
    /// Raw bytes become a string when they are UTF-8; otherwise `None`.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            RequestBody::Json(v) => Some(v.clone()),
            RequestBody::Form(form) => Some(form.to_json()),
            RequestBody::Raw(bytes) => std::str::from_utf8(bytes)
                .ok()
                .map(|s| Value::String(s.to_string())),
        }
    }

    pub fn as_form(&self) -> Option<&FormData> {
        match self {
            RequestBody::Form(form) => Some(form),
            _ => None,
        }
    }
}

/// Pick the body decoding from the request's content type.
///
/// - JSON content types decode silently: invalid JSON yields `None`.
/// - Form mimetypes yield the parsed form.
/// - Anything else yields the raw bytes, or `None` when there are none.
///
/// Never fails; callers needing a body must treat `None` as absent.
pub fn extract_body(request: &CanonicalRequest) -> Option<RequestBody> {
    if is_json_mimetype(request.content_type()) {
        request.get_json_silent().map(RequestBody::Json)
    } else if is_form_mimetype(request.mimetype()) {
        request.form().map(RequestBody::Form)
    } else {
        request.get_data().cloned().map(RequestBody::Raw)
    }
}
