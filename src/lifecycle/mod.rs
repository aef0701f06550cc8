//! # Canonical Request/Response Model
//!
//! Framework-independent structs exchanged inside the adapter layer.
//!
//! - [`CanonicalRequest`] is captured once from a framework request and is
//!   immutable afterwards. Query parameters keep repeats and order so URI
//!   parsers can apply collection formats.
//! - [`CanonicalResponse`] is the normalized handler result. A streamed
//!   response never carries a buffered body; the builder rejects that
//!   combination.
//! - [`FormData`] is the decoded `application/x-www-form-urlencoded` or
//!   `multipart/form-data` body.

mod form;
mod request;
mod response;

pub use form::{FormData, UploadedFile};
pub use request::{CanonicalRequest, CanonicalRequestBuilder, ParamVec, MAX_INLINE_PARAMS};
pub use response::{CanonicalResponse, CanonicalResponseBuilder};
