//! # Operations and Adapters
//!
//! An [`Operation`] pairs an [`OperationSpec`](crate::spec::OperationSpec)
//! with the [`Handler`] implementing it. It knows nothing about the serving
//! framework.
//!
//! An [`OperationAdapter`] binds a shared operation to one [`Framework`](crate::framework::Framework).
//! Per request it:
//!
//! 1. captures the framework request as a canonical request
//! 2. extracts the body by content type
//! 3. runs the request stages of the decorator pipeline
//! 4. invokes the handler with the bound [`HandlerArgs`]
//! 5. normalizes the return value into a framework response
//!
//! Stage rejections come back as `application/problem+json` responses;
//! handler errors come back as [`AdapterError::Handler`](crate::error::AdapterError::Handler).
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use oasbridge::api::ApiContext;
//! use oasbridge::config::ApiOptions;
//! use oasbridge::framework::HttpFramework;
//! use oasbridge::operation::{Handler, Operation, OperationAdapter};
//! use oasbridge::spec::OperationSpec;
//! use bytes::Bytes;
//! use http::{Method, StatusCode};
//! use serde_json::json;
//!
//! let op = Arc::new(Operation::new(
//!     OperationSpec::new("ping", Method::GET, "/ping"),
//!     Handler::from_fn(|_args| Ok((json!({"pong": true}), StatusCode::ACCEPTED))),
//! ));
//! let context = Arc::new(ApiContext::new(ApiOptions::default()));
//! let adapter = OperationAdapter::<HttpFramework>::from_operation(op, context, false).unwrap();
//!
//! let request = http::Request::get("/ping").body(Bytes::new()).unwrap();
//! let response = adapter.call(request).unwrap();
//! assert_eq!(response.status(), StatusCode::ACCEPTED);
//! ```

mod adapter;
mod handler;

pub use adapter::{DecoratorFlags, Endpoint, OperationAdapter};
pub use handler::{Handler, HandlerArgs, HandlerResult, Operation};
