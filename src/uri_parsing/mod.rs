//! # URI Parameter Parsing
//!
//! Parsers turn the raw strings of a request (query pairs, path segments,
//! form fields, headers, cookies) into JSON values typed by the declared
//! parameter schemas.
//!
//! ## Parser Families
//!
//! | Kind | Repeated array keys | Delimiter |
//! |------|---------------------|-----------|
//! | [`OpenApiUriParser`] | collected when `explode` (form styles) | from `style` |
//! | [`Swagger2UriParser`] | collected for `collectionFormat: multi` | from `collectionFormat` |
//! | [`FirstValueUriParser`] | first occurrence wins | from `collectionFormat` |
//! | [`AlwaysMultiUriParser`] | always collected | from `collectionFormat` |
//!
//! Every operation carries its own parser ([`UriParserKind::build`]), so one
//! API can mix families.
//!
//! ## Typing
//!
//! Scalars are converted according to the schema `type` (`integer`,
//! `number`, `boolean`). Values that fail to convert stay strings; the
//! parameter binding stage reports them as bad requests. Empty array items
//! are dropped.
//!
//! ```rust
//! use oasbridge::spec::ParameterMeta;
//! use oasbridge::uri_parsing::{UriParser, UriParserKind};
//! use oasbridge::lifecycle::ParamVec;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let limit = ParameterMeta::query("limit").schema(json!({"type": "integer"}));
//! let parser = UriParserKind::OpenApi.build(vec![limit], None);
//! let mut query = ParamVec::new();
//! query.push((Arc::from("limit"), "10".to_string()));
//! assert_eq!(parser.resolve_query(&query)["limit"], json!(10));
//! ```

mod core;
mod openapi;
mod swagger2;

pub use core::{coerce_primitive, decode_object, group_pairs, Grouped, UriParser, UriParserKind};
pub use openapi::OpenApiUriParser;
pub use swagger2::{AlwaysMultiUriParser, FirstValueUriParser, Swagger2UriParser};
