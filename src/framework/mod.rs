//! # Framework Bindings
//!
//! A [`Framework`] is the seam between the canonical request/response model
//! and one concrete web framework. It captures inbound requests with
//! [`Framework::get_request`] and builds outbound responses with
//! [`Framework::response_class`] and [`Framework::make_response`].
//!
//! Bindings are zero-sized markers, so an adapter carries no framework
//! state and the same operation can be mounted on several bindings at once.
//!
//! ## Shipped bindings
//!
//! | Binding | Request | Response | Default mimetype |
//! |---------|---------|----------|------------------|
//! | [`HttpFramework`] | `http::Request<Bytes>` | `http::Response<HttpBody>` | `text/plain; charset=utf-8` |
//! | [`MiniHttp`] | [`MiniRequest`] | [`MiniResponse`] | `text/plain` |
//!
//! ## Native responses
//!
//! Handlers may return a response that is already native to the serving
//! framework via [`Payload::Native`](crate::response::Payload::Native).
//! The [`NativeResponse`] trait ties a native type to its framework;
//! [`Portable`] is the uninhabited native type of framework-agnostic handlers.

mod core;
mod http;
mod minihttp;

pub use self::core::{
    merge_headers, Framework, NativeResponse, Portable, ResponseBody, ResponseParts,
};
pub use self::http::{
    HttpBody, HttpFramework, HttpRequest, HttpResponse, PathParams, HTTP_DEFAULT_MIMETYPE,
};
pub use self::minihttp::{MiniBody, MiniHttp, MiniRequest, MiniResponse, MINIHTTP_DEFAULT_MIMETYPE};
