use super::payload::{HandlerReturn, Payload};
use crate::error::AdapterError;
use crate::framework::{merge_headers, Framework, NativeResponse, ResponseBody, ResponseParts};
use crate::http_facts::DEFAULT_MIMETYPE;
use crate::jsonifier::Jsonifier;
use crate::lifecycle::CanonicalResponse;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use tracing::debug;

/// Serialized body with the status and mimetype it implies.
#[derive(Debug)]
pub struct PreparedBody {
    pub body: ResponseBody,
    pub status: StatusCode,
    pub mimetype: Option<String>,
}

/// Serialize a non-native payload and settle its status.
///
/// - `NoContent` without a status becomes `204` with no mimetype.
/// - Text and bytes pass through untouched.
/// - JSON values are encoded with `jsonifier`; the mimetype defaults to
///   `application/json`.
/// - Streams pass through.
///
/// A missing status otherwise defaults to `200`.
pub fn prepare_body_and_status_code<R>(
    payload: Payload<R>,
    mimetype: Option<&str>,
    status: Option<StatusCode>,
    jsonifier: &Jsonifier,
) -> Result<PreparedBody, AdapterError> {
    let mimetype = mimetype.map(str::to_string);
    let prepared = match payload {
        Payload::NoContent => match status {
            Some(status) => PreparedBody {
                body: ResponseBody::Empty,
                status,
                mimetype,
            },
            None => PreparedBody {
                body: ResponseBody::Empty,
                status: StatusCode::NO_CONTENT,
                mimetype: None,
            },
        },
        Payload::Text(text) => PreparedBody {
            body: ResponseBody::Buffered(Bytes::from(text)),
            status: status.unwrap_or(StatusCode::OK),
            mimetype,
        },
        Payload::Bytes(bytes) => PreparedBody {
            body: ResponseBody::Buffered(bytes),
            status: status.unwrap_or(StatusCode::OK),
            mimetype,
        },
        Payload::Json(value) => PreparedBody {
            body: ResponseBody::Buffered(Bytes::from(jsonifier.to_vec(&value)?)),
            status: status.unwrap_or(StatusCode::OK),
            mimetype: mimetype.or_else(|| Some(DEFAULT_MIMETYPE.to_string())),
        },
        Payload::Stream(stream) => PreparedBody {
            body: ResponseBody::Streamed(stream),
            status: status.unwrap_or(StatusCode::OK),
            mimetype,
        },
        Payload::Native(_) => {
            return Err(AdapterError::InvalidReturn(
                "a framework response cannot be serialized as a body".into(),
            ))
        }
    };
    Ok(prepared)
}

/// Normalize a handler result into a [`CanonicalResponse`].
///
/// A native framework response is copied field by field; an explicit status
/// in the surrounding tuple overrides its status and tuple headers replace
/// its same-named headers. Any other payload is serialized with
/// [`prepare_body_and_status_code`].
pub fn get_response<F, R>(
    handler_return: HandlerReturn<R>,
    mimetype: Option<&str>,
    jsonifier: &Jsonifier,
) -> Result<CanonicalResponse, AdapterError>
where
    F: Framework,
    R: NativeResponse<F>,
{
    let (payload, status, headers) = handler_return.into_parts();

    let payload = if F::is_framework_response(&payload) {
        match payload {
            Payload::Native(native) => {
                return native_to_canonical::<F, R>(native, status, headers);
            }
            other => other,
        }
    } else {
        payload
    };

    let prepared = prepare_body_and_status_code(payload, mimetype, status, jsonifier)?;
    let builder = CanonicalResponse::builder()
        .status(prepared.status)
        .mimetype(prepared.mimetype)
        .headers(Some(headers.unwrap_or_default()));
    let builder = match prepared.body {
        ResponseBody::Empty => builder,
        ResponseBody::Buffered(bytes) => builder.body(bytes),
        ResponseBody::Streamed(stream) => builder.streamed(Some(stream)),
    };
    builder.build()
}

fn native_to_canonical<F, R>(
    native: R,
    status: Option<StatusCode>,
    headers: Option<HeaderMap>,
) -> Result<CanonicalResponse, AdapterError>
where
    F: Framework,
    R: NativeResponse<F>,
{
    let canonical = F::framework_to_canonical(native.into_native())?;
    let merged = merge_headers(canonical.headers().cloned(), headers);
    let status = status.or(canonical.status_code());
    debug!(
        framework = F::name(),
        status = ?status,
        streamed = canonical.is_streamed(),
        "Copied framework response into canonical response"
    );
    canonical
        .into_builder()
        .maybe_status(status)
        .headers(merged)
        .passthrough(true)
        .build()
}

/// Convert a canonical response into a framework response.
///
/// The canonical mimetype wins over `mimetype`; absent fields are left for
/// the framework to default. A streamed response forwards its stream. A
/// response copied from a framework response goes back out with exactly
/// its own headers.
pub fn build_response<F: Framework>(
    canonical: CanonicalResponse,
    mimetype: Option<&str>,
) -> Result<F::Response, AdapterError> {
    let parts = canonical.into_parts();
    let body = match (parts.stream, parts.body) {
        (Some(stream), _) => ResponseBody::Streamed(stream),
        (None, Some(bytes)) => ResponseBody::Buffered(bytes),
        (None, None) => ResponseBody::Empty,
    };
    let mimetype = match parts.passthrough {
        true => parts.mimetype,
        false => parts.mimetype.or_else(|| mimetype.map(str::to_string)),
    };
    F::response_class(ResponseParts {
        body,
        status: parts.status_code,
        headers: parts.headers,
        content_type: parts.content_type,
        mimetype,
        verbatim: parts.passthrough,
    })
}

/// Build a framework response straight from a payload.
///
/// Native payloads are re-issued through [`Framework::make_response`] with
/// the overrides; everything else is serialized and passed to
/// [`Framework::response_class`].
pub fn build_framework_response<F, R>(
    payload: Payload<R>,
    mimetype: Option<&str>,
    content_type: Option<String>,
    headers: Option<HeaderMap>,
    status: Option<StatusCode>,
    jsonifier: &Jsonifier,
) -> Result<F::Response, AdapterError>
where
    F: Framework,
    R: NativeResponse<F>,
{
    if let Payload::Native(native) = payload {
        return F::make_response(native.into_native(), status, headers);
    }
    let prepared = prepare_body_and_status_code(payload, mimetype, status, jsonifier)?;
    F::response_class(ResponseParts {
        body: prepared.body,
        status: Some(prepared.status),
        headers,
        content_type,
        mimetype: mimetype.map(str::to_string).or(prepared.mimetype),
        verbatim: false,
    })
}

/// Handler result straight to framework response, without the canonical step.
pub fn response_from_handler<F, R>(
    handler_return: HandlerReturn<R>,
    mimetype: Option<&str>,
    jsonifier: &Jsonifier,
) -> Result<F::Response, AdapterError>
where
    F: Framework,
    R: NativeResponse<F>,
{
    let (payload, status, headers) = handler_return.into_parts();
    build_framework_response::<F, R>(payload, mimetype, None, headers, status, jsonifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::Portable;
    use serde_json::json;

    #[test]
    fn test_no_content_defaults_to_204() {
        let p = prepare_body_and_status_code::<Portable>(
            Payload::NoContent,
            Some("application/json"),
            None,
            &Jsonifier::default(),
        )
        .unwrap();
        assert_eq!(p.status, StatusCode::NO_CONTENT);
        assert!(p.mimetype.is_none());
        assert!(matches!(p.body, ResponseBody::Empty));
    }

    #[test]
    fn test_no_content_keeps_explicit_status() {
        let p = prepare_body_and_status_code::<Portable>(
            Payload::NoContent,
            None,
            Some(StatusCode::ACCEPTED),
            &Jsonifier::default(),
        )
        .unwrap();
        assert_eq!(p.status, StatusCode::ACCEPTED);
    }

    #[test]
    fn test_text_passes_through_with_json_mimetype() {
        let p = prepare_body_and_status_code::<Portable>(
            Payload::Text("hello".into()),
            Some("application/json"),
            None,
            &Jsonifier::default(),
        )
        .unwrap();
        match p.body {
            ResponseBody::Buffered(b) => assert_eq!(&b[..], b"hello"),
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(p.mimetype.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_json_uses_jsonifier() {
        let p = prepare_body_and_status_code::<Portable>(
            Payload::Json(json!({"a": 1})),
            None,
            None,
            &Jsonifier::new(0),
        )
        .unwrap();
        match p.body {
            ResponseBody::Buffered(b) => assert_eq!(&b[..], b"{\"a\":1}\n"),
            other => panic!("unexpected body {other:?}"),
        }
        assert_eq!(p.status, StatusCode::OK);
        assert_eq!(p.mimetype.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_caller_mimetype_wins_for_json() {
        let p = prepare_body_and_status_code::<Portable>(
            Payload::Json(json!([1])),
            Some("application/vnd.api+json"),
            Some(StatusCode::CREATED),
            &Jsonifier::default(),
        )
        .unwrap();
        assert_eq!(p.mimetype.as_deref(), Some("application/vnd.api+json"));
        assert_eq!(p.status, StatusCode::CREATED);
    }
}
