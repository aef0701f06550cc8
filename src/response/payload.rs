use crate::error::AdapterError;
use crate::framework::Portable;
use crate::stream::BodyStream;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Body value returned by a handler.
///
/// `R` is the framework-native response type the handler may return
/// directly; portable handlers use [`Portable`], which has no values.
#[derive(Debug)]
pub enum Payload<R = Portable> {
    /// No body; answered with `204 No Content` unless a status is given
    NoContent,
    Text(String),
    Bytes(Bytes),
    /// Structured value serialized with the API's jsonifier
    Json(Value),
    /// Incremental body, forwarded without buffering
    Stream(BodyStream),
    /// Already-built framework response
    Native(R),
}

impl<R> Payload<R> {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, AdapterError> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Payload::Native(_))
    }

    /// Swap the native response type.
    pub fn map_native<S>(self, f: impl FnOnce(R) -> S) -> Payload<S> {
        match self {
            Payload::NoContent => Payload::NoContent,
            Payload::Text(s) => Payload::Text(s),
            Payload::Bytes(b) => Payload::Bytes(b),
            Payload::Json(v) => Payload::Json(v),
            Payload::Stream(s) => Payload::Stream(s),
            Payload::Native(r) => Payload::Native(f(r)),
        }
    }
}

impl<R> From<Value> for Payload<R> {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl<R> From<String> for Payload<R> {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl<R> From<&str> for Payload<R> {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl<R> From<Bytes> for Payload<R> {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl<R> From<Vec<u8>> for Payload<R> {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

impl<R> From<BodyStream> for Payload<R> {
    fn from(value: BodyStream) -> Self {
        Payload::Stream(value)
    }
}

impl<R> From<()> for Payload<R> {
    fn from(_: ()) -> Self {
        Payload::NoContent
    }
}

/// Every shape a handler may return.
///
/// Positional tuples convert through `From`; [`HandlerReturn::from_tuple`]
/// resolves a dynamically-sized tuple where the meaning of the second
/// element depends on its type.
#[derive(Debug)]
pub enum HandlerReturn<R = Portable> {
    Body(Payload<R>),
    BodyStatus(Payload<R>, StatusCode),
    BodyHeaders(Payload<R>, HeaderMap),
    BodyStatusHeaders(Payload<R>, StatusCode, HeaderMap),
    NativeResponse(R),
}

impl<R> HandlerReturn<R> {
    pub fn native(response: R) -> Self {
        HandlerReturn::NativeResponse(response)
    }

    pub fn no_content() -> Self {
        HandlerReturn::Body(Payload::NoContent)
    }

    /// Resolve a tuple by arity and element type.
    ///
    /// - `[body]`
    /// - `[body, status]` when the second element is a JSON integer
    /// - `[body, headers]` when the second element is a JSON object
    /// - `[body, status, headers]` in exactly that order
    ///
    /// Any other shape is a programming error in the handler.
    pub fn from_tuple(items: Vec<Payload<R>>) -> Result<Self, AdapterError> {
        let arity = items.len();
        let mut items = items.into_iter();
        match (items.next(), items.next(), items.next(), items.next()) {
            (Some(body), None, None, None) => Ok(HandlerReturn::Body(body)),
            (Some(body), Some(Payload::Json(second)), None, None) => match second {
                Value::Number(_) => {
                    Ok(HandlerReturn::BodyStatus(body, status_from_json(&second)?))
                }
                Value::Object(_) => {
                    Ok(HandlerReturn::BodyHeaders(body, headers_from_json(&second)?))
                }
                other => Err(AdapterError::InvalidReturn(format!(
                    "second element of a 2-tuple must be a status code or a headers map, \
                     got {other}"
                ))),
            },
            (Some(body), Some(Payload::Json(status)), Some(Payload::Json(headers)), None) => {
                Ok(HandlerReturn::BodyStatusHeaders(
                    body,
                    status_from_json(&status)?,
                    headers_from_json(&headers)?,
                ))
            }
            (Some(_), Some(_), _, None) => Err(AdapterError::InvalidReturn(
                "status and headers elements must be JSON values".into(),
            )),
            _ => Err(AdapterError::InvalidReturn(format!(
                "handler returned a {arity}-tuple; expected 1 to 3 elements"
            ))),
        }
    }

    /// `(body, status, headers)` with absent parts as `None`.
    pub fn into_parts(self) -> (Payload<R>, Option<StatusCode>, Option<HeaderMap>) {
        match self {
            HandlerReturn::Body(body) => (body, None, None),
            HandlerReturn::BodyStatus(body, status) => (body, Some(status), None),
            HandlerReturn::BodyHeaders(body, headers) => (body, None, Some(headers)),
            HandlerReturn::BodyStatusHeaders(body, status, headers) => {
                (body, Some(status), Some(headers))
            }
            HandlerReturn::NativeResponse(native) => (Payload::Native(native), None, None),
        }
    }

    pub fn map_native<S>(self, f: impl FnOnce(R) -> S) -> HandlerReturn<S> {
        match self {
            HandlerReturn::Body(b) => HandlerReturn::Body(b.map_native(f)),
            HandlerReturn::BodyStatus(b, s) => HandlerReturn::BodyStatus(b.map_native(f), s),
            HandlerReturn::BodyHeaders(b, h) => HandlerReturn::BodyHeaders(b.map_native(f), h),
            HandlerReturn::BodyStatusHeaders(b, s, h) => {
                HandlerReturn::BodyStatusHeaders(b.map_native(f), s, h)
            }
            HandlerReturn::NativeResponse(r) => HandlerReturn::NativeResponse(f(r)),
        }
    }
}

fn status_from_json(value: &Value) -> Result<StatusCode, AdapterError> {
    let code = value
        .as_u64()
        .and_then(|c| u16::try_from(c).ok())
        .ok_or_else(|| AdapterError::InvalidStatus(value.to_string()))?;
    Ok(StatusCode::from_u16(code)?)
}

fn headers_from_json(value: &Value) -> Result<HeaderMap, AdapterError> {
    let mut headers = HeaderMap::new();
    let Some(map) = value.as_object() else {
        return Err(AdapterError::InvalidHeader(format!(
            "headers must be a JSON object, got {value}"
        )));
    };
    for (name, v) in map {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let rendered = match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        headers.append(name, HeaderValue::from_str(&rendered)?);
    }
    Ok(headers)
}

impl<R> From<Payload<R>> for HandlerReturn<R> {
    fn from(body: Payload<R>) -> Self {
        HandlerReturn::Body(body)
    }
}

macro_rules! body_conversions {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<R> From<$ty> for HandlerReturn<R> {
                fn from(body: $ty) -> Self {
                    HandlerReturn::Body(body.into())
                }
            }
        )*
    };
}

body_conversions!(Value, String, &str, Bytes, Vec<u8>, BodyStream, ());

impl<R, P: Into<Payload<R>>> From<(P,)> for HandlerReturn<R> {
    fn from((body,): (P,)) -> Self {
        HandlerReturn::Body(body.into())
    }
}

impl<R, P: Into<Payload<R>>> From<(P, StatusCode)> for HandlerReturn<R> {
    fn from((body, status): (P, StatusCode)) -> Self {
        HandlerReturn::BodyStatus(body.into(), status)
    }
}

impl<R, P: Into<Payload<R>>> From<(P, HeaderMap)> for HandlerReturn<R> {
    fn from((body, headers): (P, HeaderMap)) -> Self {
        HandlerReturn::BodyHeaders(body.into(), headers)
    }
}

impl<R, P: Into<Payload<R>>> From<(P, StatusCode, HeaderMap)> for HandlerReturn<R> {
    fn from((body, status, headers): (P, StatusCode, HeaderMap)) -> Self {
        HandlerReturn::BodyStatusHeaders(body.into(), status, headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    type Ret = HandlerReturn<Portable>;

    #[test]
    fn test_tuple_conversions() {
        assert!(matches!(Ret::from(json!({"a": 1})), HandlerReturn::Body(Payload::Json(_))));
        assert!(matches!(
            Ret::from(("created", StatusCode::CREATED)),
            HandlerReturn::BodyStatus(Payload::Text(_), StatusCode::CREATED)
        ));
        assert!(matches!(Ret::from(((),)), HandlerReturn::Body(Payload::NoContent)));
    }

    #[test]
    fn test_from_tuple_two_elements_by_type() {
        let status = Ret::from_tuple(vec![Payload::from("x"), Payload::Json(json!(201))]).unwrap();
        assert!(matches!(status, HandlerReturn::BodyStatus(_, StatusCode::CREATED)));

        let headers =
            Ret::from_tuple(vec![Payload::from("x"), Payload::Json(json!({"X-A": "1"}))]).unwrap();
        match headers {
            HandlerReturn::BodyHeaders(_, h) => assert_eq!(h["x-a"], "1"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_tuple_rejects_ambiguous_shapes() {
        let bad_second = Ret::from_tuple(vec![Payload::from("x"), Payload::Json(json!("404"))]);
        assert!(matches!(bad_second, Err(AdapterError::InvalidReturn(_))));

        let text_second = Ret::from_tuple(vec![Payload::from("x"), Payload::from("y")]);
        assert!(matches!(text_second, Err(AdapterError::InvalidReturn(_))));

        let four = Ret::from_tuple(vec![
            Payload::from("x"),
            Payload::Json(json!(200)),
            Payload::Json(json!({})),
            Payload::Json(json!({})),
        ]);
        assert!(matches!(four, Err(AdapterError::InvalidReturn(_))));

        assert!(Ret::from_tuple(Vec::new()).is_err());
    }

    #[test]
    fn test_from_tuple_invalid_status() {
        let err = Ret::from_tuple(vec![Payload::from("x"), Payload::Json(json!(42))]).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidStatus(_)));
    }

    #[test]
    fn test_into_parts() {
        let mut h = HeaderMap::new();
        h.insert("x-b", HeaderValue::from_static("2"));
        let (body, status, headers) =
            Ret::from((json!([1]), StatusCode::NOT_FOUND, h)).into_parts();
        assert!(matches!(body, Payload::Json(_)));
        assert_eq!(status, Some(StatusCode::NOT_FOUND));
        assert_eq!(headers.unwrap()["x-b"], "2");
    }
}
