use super::form::FormData;
use crate::http_facts::{is_form_mimetype, is_json_mimetype, split_content_type};
use crate::uri_parsing::UriParser;
use bytes::Bytes;
use http::header::{HeaderMap, CONTENT_TYPE, COOKIE};
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maximum inline query/path params before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered name/value pairs; repeated names are kept in arrival order.
///
/// Names are `Arc<str>` since path parameter names come from the route
/// definition and are shared across requests.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Framework-independent view of one inbound request.
///
/// Built once by a framework binding and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CanonicalRequest {
    method: Method,
    path: String,
    path_params: ParamVec,
    query: ParamVec,
    headers: HeaderMap,
    body: Option<Bytes>,
    mimetype: String,
    content_type: String,
    uri_parser: Arc<dyn UriParser>,
}

impl CanonicalRequest {
    pub fn builder(
        method: Method,
        path: impl Into<String>,
        uri_parser: Arc<dyn UriParser>,
    ) -> CanonicalRequestBuilder {
        CanonicalRequestBuilder {
            method,
            path: path.into(),
            path_params: ParamVec::new(),
            query: ParamVec::new(),
            headers: HeaderMap::new(),
            body: None,
            uri_parser,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn path_params(&self) -> &ParamVec {
        &self.path_params
    }

    pub fn query(&self) -> &ParamVec {
        &self.query
    }

    /// Query values grouped by name, each group in arrival order.
    pub fn query_multimap(&self) -> HashMap<&str, Vec<&str>> {
        let mut out: HashMap<&str, Vec<&str>> = HashMap::new();
        for (k, v) in &self.query {
            out.entry(k.as_ref()).or_default().push(v.as_str());
        }
        out
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Cookies from every `Cookie` header, later values winning.
    pub fn cookies(&self) -> HashMap<String, String> {
        self.headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|c| c.split(';'))
            .filter_map(|pair| {
                let mut parts = pair.trim().splitn(2, '=');
                let name = parts.next()?.trim();
                if name.is_empty() {
                    return None;
                }
                let value = parts.next().unwrap_or("").trim();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Bare mimetype, lowercased, without parameters.
    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    /// Full `Content-Type` header value (empty when absent).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn uri_parser(&self) -> &Arc<dyn UriParser> {
        &self.uri_parser
    }

    /// Raw body; `None` when the request carried no bytes.
    pub fn get_data(&self) -> Option<&Bytes> {
        self.body.as_ref().filter(|b| !b.is_empty())
    }

    /// Decode the body as JSON without failing.
    ///
    /// Returns `None` for a non-JSON content type, an empty body, or bytes
    /// that are not valid JSON.
    pub fn get_json_silent(&self) -> Option<Value> {
        if !is_json_mimetype(&self.content_type) {
            return None;
        }
        let data = self.get_data()?;
        match serde_json::from_slice(data) {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(
                    path = %self.path,
                    error = %err,
                    body_size_bytes = data.len(),
                    "JSON body parse failed; treating as absent"
                );
                None
            }
        }
    }

    /// Decode a form body. Malformed multipart yields `None`.
    pub fn form(&self) -> Option<FormData> {
        if !is_form_mimetype(&self.mimetype) {
            return None;
        }
        let data = self.body.as_deref().unwrap_or_default();
        if self.mimetype == "multipart/form-data" {
            match FormData::from_multipart(&self.content_type, data) {
                Ok(form) => Some(form),
                Err(err) => {
                    debug!(path = %self.path, error = %err, "Multipart body parse failed");
                    None
                }
            }
        } else {
            Some(FormData::from_urlencoded(data))
        }
    }
}

pub struct CanonicalRequestBuilder {
    method: Method,
    path: String,
    path_params: ParamVec,
    query: ParamVec,
    headers: HeaderMap,
    body: Option<Bytes>,
    uri_parser: Arc<dyn UriParser>,
}

impl CanonicalRequestBuilder {
    pub fn path_param(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.path_params.push((name.into(), value.into()));
        self
    }

    pub fn path_params(mut self, params: ParamVec) -> Self {
        self.path_params = params;
        self
    }

    pub fn query_param(mut self, name: impl Into<Arc<str>>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Parse a raw query string (without the leading `?`), keeping repeats in order.
    pub fn query_string(mut self, raw: &str) -> Self {
        self.query.extend(
            url::form_urlencoded::parse(raw.as_bytes())
                .map(|(k, v)| (Arc::<str>::from(k.as_ref()), v.into_owned())),
        );
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> CanonicalRequest {
        let content_type = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let (mimetype, _) = split_content_type(&content_type);
        CanonicalRequest {
            method: self.method,
            path: self.path,
            path_params: self.path_params,
            query: self.query,
            headers: self.headers,
            body: self.body,
            mimetype,
            content_type,
            uri_parser: self.uri_parser,
        }
    }
}
