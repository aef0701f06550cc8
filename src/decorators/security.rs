use super::{Invocation, Stage};
use crate::error::Problem;
use crate::lifecycle::CanonicalRequest;
use crate::spec::OperationSpec;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Validates one named security scheme against a request.
///
/// Register handlers by scheme name on the [`Api`](crate::api::Api); the
/// security stage consults them for every requirement an operation lists.
pub trait SecurityHandler: Send + Sync {
    /// `true` when the request carries valid credentials for `scopes`.
    fn validate(&self, scopes: &[String], request: &CanonicalRequest) -> bool;

    /// Claims to expose to the handler once `validate` succeeded.
    fn extract_claims(&self, request: &CanonicalRequest) -> Option<Value> {
        let _ = request;
        None
    }
}

/// Where a [`StaticApiKey`] is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header(String),
    Query(String),
    Cookie(String),
}

/// API key compared against a fixed set of accepted keys.
#[derive(Debug, Clone)]
pub struct StaticApiKey {
    location: ApiKeyLocation,
    keys: Vec<String>,
}

impl StaticApiKey {
    pub fn header(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            location: ApiKeyLocation::Header(name.into()),
            keys: vec![key.into()],
        }
    }

    pub fn query(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            location: ApiKeyLocation::Query(name.into()),
            keys: vec![key.into()],
        }
    }

    pub fn cookie(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            location: ApiKeyLocation::Cookie(name.into()),
            keys: vec![key.into()],
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    fn presented(&self, request: &CanonicalRequest) -> Option<String> {
        match &self.location {
            ApiKeyLocation::Header(name) => request.header(name).map(str::to_string),
            ApiKeyLocation::Query(name) => request
                .query()
                .iter()
                .find(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.clone()),
            ApiKeyLocation::Cookie(name) => request.cookies().remove(name),
        }
    }
}

impl SecurityHandler for StaticApiKey {
    fn validate(&self, _scopes: &[String], request: &CanonicalRequest) -> bool {
        self.presented(request)
            .is_some_and(|key| self.keys.iter().any(|k| *k == key))
    }
}

/// Enforces an operation's `security` list.
///
/// The requirements are alternatives: the request passes when every scheme
/// of at least one requirement validates. A scheme with no registered
/// handler never validates.
#[derive(Clone)]
pub struct SecurityStage {
    handlers: HashMap<String, Arc<dyn SecurityHandler>>,
}

impl SecurityStage {
    pub fn new(handlers: HashMap<String, Arc<dyn SecurityHandler>>) -> Self {
        Self { handlers }
    }
}

impl fmt::Debug for SecurityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&String> = self.handlers.keys().collect();
        schemes.sort();
        f.debug_struct("SecurityStage")
            .field("schemes", &schemes)
            .finish()
    }
}

impl Stage for SecurityStage {
    fn name(&self) -> &'static str {
        "security"
    }

    fn on_request(&self, spec: &OperationSpec, invocation: &mut Invocation) -> Result<(), Problem> {
        let request = invocation.request.as_ref();
        for requirement in &spec.security {
            let mut claims = None;
            let satisfied = requirement.iter().all(|(scheme, scopes)| {
                let Some(handler) = self.handlers.get(scheme) else {
                    debug!(scheme = %scheme, "No security handler registered");
                    return false;
                };
                if !handler.validate(scopes, request) {
                    return false;
                }
                if claims.is_none() {
                    claims = handler.extract_claims(request);
                }
                true
            });
            if satisfied {
                invocation.claims = claims;
                return Ok(());
            }
        }
        Err(Problem::unauthorized("No valid credentials for this operation"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri_parsing::UriParserKind;
    use http::header::HeaderValue;
    use http::{HeaderMap, Method};

    fn request(key: Option<&'static str>) -> Arc<CanonicalRequest> {
        let mut headers = HeaderMap::new();
        if let Some(key) = key {
            headers.insert("x-api-key", HeaderValue::from_static(key));
        }
        let parser = UriParserKind::OpenApi.build(Vec::new(), None);
        Arc::new(
            CanonicalRequest::builder(Method::GET, "/", parser)
                .headers(headers)
                .build(),
        )
    }

    fn spec(schemes: &[&[&str]]) -> OperationSpec {
        schemes.iter().fold(OperationSpec::new("op", Method::GET, "/"), |spec, names| {
            let requirement = names.iter().map(|n| (n.to_string(), Vec::new())).collect();
            spec.with_security(requirement)
        })
    }

    fn stage() -> SecurityStage {
        let mut handlers: HashMap<String, Arc<dyn SecurityHandler>> = HashMap::new();
        handlers.insert("api_key".into(), Arc::new(StaticApiKey::header("x-api-key", "secret")));
        SecurityStage::new(handlers)
    }

    #[test]
    fn test_valid_key_passes() {
        let mut inv = Invocation::new(request(Some("secret")), None);
        assert!(stage().on_request(&spec(&[&["api_key"]]), &mut inv).is_ok());
    }

    #[test]
    fn test_missing_key_is_401() {
        let mut inv = Invocation::new(request(None), None);
        let err = stage().on_request(&spec(&[&["api_key"]]), &mut inv).unwrap_err();
        assert_eq!(err.status.as_u16(), 401);
    }

    #[test]
    fn test_alternative_requirement() {
        let mut inv = Invocation::new(request(Some("secret")), None);
        let spec = spec(&[&["oauth"], &["api_key"]]);
        assert!(stage().on_request(&spec, &mut inv).is_ok());
    }

    #[test]
    fn test_unregistered_scheme_fails() {
        let mut inv = Invocation::new(request(Some("secret")), None);
        let spec = spec(&[&["api_key", "oauth"]]);
        assert!(stage().on_request(&spec, &mut inv).is_err());
    }
}
