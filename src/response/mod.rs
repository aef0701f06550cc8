//! # Response Normalization
//!
//! Handlers return a [`HandlerReturn`]: a bare body, a body with a status
//! and/or headers, or an already-built framework response. This module
//! turns that into something a framework can send, in two directions:
//!
//! - [`get_response`]: handler result to [`CanonicalResponse`](crate::lifecycle::CanonicalResponse),
//!   where response validation runs
//! - [`build_response`]: canonical response to framework response
//!
//! [`response_from_handler`] skips the canonical step when response
//! coercion is disabled.
//!
//! ## Precedence
//!
//! | Field | Rule |
//! |-------|------|
//! | status | tuple status, else native response status, else `204` for no content, else `200` |
//! | headers | tuple headers replace same-named native headers |
//! | mimetype | canonical/native mimetype, else operation mimetype, else `application/json` for JSON bodies |
//!
//! ## Example
//!
//! ```rust
//! use oasbridge::framework::HttpFramework;
//! use oasbridge::jsonifier::Jsonifier;
//! use oasbridge::response::{build_response, get_response, HandlerReturn};
//! use http::StatusCode;
//! use serde_json::json;
//!
//! let ret: HandlerReturn = (json!({"a": 1}), StatusCode::CREATED).into();
//! let canonical = get_response::<HttpFramework, _>(ret, None, &Jsonifier::default()).unwrap();
//! assert_eq!(canonical.status_code(), Some(StatusCode::CREATED));
//! let response = build_response::<HttpFramework>(canonical, None).unwrap();
//! assert_eq!(response.headers()["content-type"], "application/json");
//! ```

mod normalize;
mod payload;

pub use normalize::{
    build_framework_response, build_response, get_response, prepare_body_and_status_code,
    response_from_handler, PreparedBody,
};
pub use payload::{HandlerReturn, Payload};
