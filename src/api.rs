//! # API Registration
//!
//! An [`Api`] is the set of operations served by one framework under one
//! base path. Registering an operation computes its route rule and endpoint
//! name and builds its [`OperationAdapter`]; the adapter is stored behind
//! the object-safe [`Endpoint`] trait so operations with different native
//! response types can share one API.
//!
//! ```rust
//! use std::sync::Arc;
//! use oasbridge::api::Api;
//! use oasbridge::config::ApiOptions;
//! use oasbridge::framework::HttpFramework;
//! use oasbridge::operation::{Handler, Operation};
//! use oasbridge::spec::{OperationSpec, ParameterMeta};
//! use http::Method;
//! use serde_json::json;
//!
//! let mut api = Api::<HttpFramework>::builder(ApiOptions::default().base_path("/v1")).build();
//! let spec = OperationSpec::new("get_pet", Method::GET, "/pets/{petId}")
//!     .with_parameter(ParameterMeta::path("petId").schema(json!({"type": "integer"})));
//! let handler = Handler::from_fn(|args| Ok(args.get("petId").cloned().unwrap_or_default()));
//! let op = Arc::new(Operation::new(spec, handler));
//! let route = api.add_operation(op).unwrap();
//! assert_eq!(route.rule, "/v1/pets/{petId}");
//! assert_eq!(route.endpoint, "get_pet");
//! ```

use crate::config::ApiOptions;
use crate::decorators::SecurityHandler;
use crate::error::AdapterError;
use crate::framework::{Framework, NativeResponse};
use crate::jsonifier::Jsonifier;
use crate::lifecycle::ParamVec;
use crate::operation::{DecoratorFlags, Endpoint, Operation, OperationAdapter};
use crate::sanitize::{endpoint_name, route_path};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// Settings and services shared by every adapter of one API.
pub struct ApiContext {
    pub base_path: String,
    pub blueprint: String,
    pub jsonifier: Jsonifier,
    pub options: ApiOptions,
    pub security: HashMap<String, Arc<dyn SecurityHandler>>,
}

impl ApiContext {
    pub fn new(options: ApiOptions) -> Self {
        let base_path = normalize_base_path(&options.base_path);
        Self {
            blueprint: endpoint_name(&base_path, None),
            jsonifier: Jsonifier::new(options.json_indent),
            base_path,
            options,
            security: HashMap::new(),
        }
    }

    pub fn with_security_handler(
        mut self,
        scheme: impl Into<String>,
        handler: Arc<dyn SecurityHandler>,
    ) -> Self {
        self.security.insert(scheme.into(), handler);
        self
    }
}

impl fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut schemes: Vec<&String> = self.security.keys().collect();
        schemes.sort();
        f.debug_struct("ApiContext")
            .field("base_path", &self.base_path)
            .field("blueprint", &self.blueprint)
            .field("jsonifier", &self.jsonifier)
            .field("options", &self.options)
            .field("security_schemes", &schemes)
            .finish()
    }
}

/// `"v1/"` becomes `"/v1"`; an empty or `"/"` base path becomes `""`.
fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    /// Route rule, e.g. `/v1/pets/{petId}` or `/v1/files/{*path}`
    pub rule: String,
    pub endpoint: String,
    pub operation_id: String,
    /// Declared names of the rule's parameters, in rule order
    pub param_names: Vec<String>,
}

impl Route {
    /// Match a request path against the rule, returning percent-decoded
    /// path parameters under their declared names.
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let mut params = ParamVec::new();
        let mut names = self.param_names.iter();
        let mut segments = path.trim_start_matches('/').split('/');
        for part in self.rule.trim_start_matches('/').split('/') {
            if let Some(inner) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                let name = names.next()?;
                if inner.starts_with('*') {
                    let rest: Vec<&str> = segments.by_ref().collect();
                    if rest.iter().all(|s| s.is_empty()) {
                        return None;
                    }
                    let rest: Vec<String> = rest.into_iter().map(decode_segment).collect();
                    params.push((Arc::from(name.as_str()), rest.join("/")));
                    return Some(params);
                }
                let segment = segments.next().filter(|s| !s.is_empty())?;
                params.push((Arc::from(name.as_str()), decode_segment(segment)));
            } else if segments.next()? != part {
                return None;
            }
        }
        segments.next().is_none().then_some(params)
    }
}

/// Segments that do not decode to UTF-8 are kept as sent.
fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

fn rule_param_names(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|part| part.strip_prefix('{').and_then(|p| p.strip_suffix('}')))
        .map(str::to_string)
        .collect()
}

pub struct ApiBuilder<F: Framework> {
    context: ApiContext,
    _framework: PhantomData<fn() -> F>,
}

impl<F: Framework> ApiBuilder<F> {
    pub fn security_handler(
        mut self,
        scheme: impl Into<String>,
        handler: impl SecurityHandler + 'static,
    ) -> Self {
        self.context.security.insert(scheme.into(), Arc::new(handler));
        self
    }

    pub fn build(self) -> Api<F> {
        info!(
            framework = F::name(),
            base_path = %self.context.base_path,
            blueprint = %self.context.blueprint,
            security_schemes = self.context.security.len(),
            "Created API"
        );
        Api {
            context: Arc::new(self.context),
            routes: Vec::new(),
            endpoints: HashMap::new(),
        }
    }
}

/// Operations served by framework `F` under one base path.
pub struct Api<F: Framework> {
    context: Arc<ApiContext>,
    routes: Vec<Route>,
    endpoints: HashMap<String, Arc<dyn Endpoint<F>>>,
}

impl<F: Framework> Api<F> {
    pub fn builder(options: ApiOptions) -> ApiBuilder<F> {
        ApiBuilder {
            context: ApiContext::new(options),
            _framework: PhantomData,
        }
    }

    pub fn new(options: ApiOptions) -> Self {
        Self::builder(options).build()
    }

    pub fn context(&self) -> &Arc<ApiContext> {
        &self.context
    }

    pub fn base_path(&self) -> &str {
        &self.context.base_path
    }

    pub fn blueprint(&self) -> &str {
        &self.context.blueprint
    }

    /// Register an operation with the API-wide `pythonic_params` setting.
    pub fn add_operation<R>(&mut self, operation: Arc<Operation<R>>) -> Result<&Route, AdapterError>
    where
        R: NativeResponse<F>,
    {
        let flags = DecoratorFlags {
            pythonic_params: self.context.options.pythonic_params,
            ..DecoratorFlags::default()
        };
        self.add_operation_with_flags(operation, flags)
    }

    pub fn add_operation_with_flags<R>(
        &mut self,
        operation: Arc<Operation<R>>,
        flags: DecoratorFlags,
    ) -> Result<&Route, AdapterError>
    where
        R: NativeResponse<F>,
    {
        let spec = operation.spec();
        debug!(
            framework = F::name(),
            method = %spec.method,
            path = %spec.path,
            operation_id = %spec.operation_id,
            "Adding {} {} -> {}",
            spec.method,
            spec.path,
            spec.operation_id
        );

        let types = spec.get_path_parameter_types();
        let rule = format!("{}{}", self.context.base_path, route_path(&spec.path, &types));
        let endpoint = endpoint_name(&spec.operation_id, spec.randomize_endpoint);
        if self.endpoints.contains_key(&endpoint) {
            return Err(AdapterError::DuplicateEndpoint(endpoint));
        }

        let route = Route {
            method: spec.method.clone(),
            rule,
            endpoint: endpoint.clone(),
            operation_id: spec.operation_id.clone(),
            param_names: rule_param_names(&spec.path),
        };
        let adapter =
            OperationAdapter::<F, R>::with_flags(operation, Arc::clone(&self.context), flags)?;
        self.endpoints.insert(endpoint, Arc::new(adapter));
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&self.routes[index])
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn endpoint(&self, name: &str) -> Option<&Arc<dyn Endpoint<F>>> {
        self.endpoints.get(name)
    }

    /// First route whose method and rule match, with its path parameters.
    pub fn find_route(&self, method: &Method, path: &str) -> Option<(&Route, ParamVec)> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| r.match_path(path).map(|params| (r, params)))
    }

    /// Invoke a registered endpoint by name.
    pub fn dispatch(
        &self,
        endpoint: &str,
        request: F::Request,
    ) -> Result<F::Response, AdapterError> {
        self.endpoints
            .get(endpoint)
            .ok_or_else(|| AdapterError::UnknownEndpoint(endpoint.to_string()))?
            .call(request)
    }

    pub async fn dispatch_async(
        &self,
        endpoint: &str,
        request: F::Request,
    ) -> Result<F::Response, AdapterError> {
        let target = self
            .endpoints
            .get(endpoint)
            .ok_or_else(|| AdapterError::UnknownEndpoint(endpoint.to_string()))?;
        target.call_async(request).await
    }
}

impl<F: Framework> fmt::Debug for Api<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("framework", &F::name())
            .field("context", &self.context)
            .field("routes", &self.routes)
            .finish()
    }
}
