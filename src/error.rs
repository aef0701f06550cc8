//! Error types for the adapter layer.
//!
//! [`AdapterError`] covers programming and infrastructure failures: an
//! ambiguous handler return, a body that cannot be serialized, a handler
//! that failed. [`Problem`] is the client-facing rejection produced by
//! pipeline stages and rendered as `application/problem+json`.

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The handler returned a shape that cannot be disambiguated
    #[error("invalid handler return: {0}")]
    InvalidReturn(String),

    #[error("invalid status code: {0}")]
    InvalidStatus(String),

    #[error("invalid response header: {0}")]
    InvalidHeader(String),

    #[error("a streamed response cannot carry a buffered body")]
    StreamedBodyBuffered,

    #[error("failed to serialize response body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("handler for operation '{operation_id}' failed: {cause:#}")]
    Handler {
        operation_id: String,
        cause: anyhow::Error,
    },

    #[error("invalid schema for {context}: {message}")]
    Schema { context: String, message: String },

    #[error("endpoint '{0}' is already registered")]
    DuplicateEndpoint(String),

    #[error("no endpoint named '{0}'")]
    UnknownEndpoint(String),

    #[error(transparent)]
    Http(#[from] http::Error),

    #[error("multipart body is malformed: {0}")]
    Multipart(String),
}

impl From<http::status::InvalidStatusCode> for AdapterError {
    fn from(err: http::status::InvalidStatusCode) -> Self {
        AdapterError::InvalidStatus(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for AdapterError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        AdapterError::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for AdapterError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        AdapterError::InvalidHeader(err.to_string())
    }
}

/// RFC 7807 problem detail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: StatusCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl Problem {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            type_: "about:blank".to_string(),
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status,
            detail: Some(detail.into()),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, detail)
    }

    pub fn forbidden(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = type_.into();
        self
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} {}: {}", self.status.as_u16(), self.title, detail),
            None => write!(f, "{} {}", self.status.as_u16(), self.title),
        }
    }
}

impl std::error::Error for Problem {}
