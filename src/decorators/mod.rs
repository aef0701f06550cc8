//! # Decorator Pipeline
//!
//! Every operation adapter wraps its handler in an ordered chain of
//! [`Stage`]s. Request hooks run in order before the handler; response hooks
//! run in order on the canonical response afterwards:
//!
//! 1. [`SecurityStage`] when the operation declares security requirements
//! 2. [`RequestValidationStage`] when request validation is enabled
//! 3. [`ParameterBinding`] when parameter decoration is enabled
//! 4. [`ResponseValidationStage`] when response validation is enabled
//!
//! A stage rejects a request by returning a [`Problem`]; the adapter renders
//! it through the framework's problem response and the handler never runs.
//!
//! Stages are immutable after construction. Per-request state lives in the
//! [`Invocation`] each hook receives.

mod parameter;
mod security;
mod validation;

pub use parameter::{pythonic, sanitize_param, ParameterBinding};
pub use security::{ApiKeyLocation, SecurityHandler, SecurityStage, StaticApiKey};
pub use validation::{RequestValidationStage, ResponseValidationStage, SchemaValidator};

use crate::body::RequestBody;
use crate::error::{AdapterError, Problem};
use crate::lifecycle::{CanonicalRequest, CanonicalResponse, UploadedFile};
use crate::spec::OperationSpec;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Per-request state threaded through the request hooks.
#[derive(Debug)]
pub struct Invocation {
    pub request: Arc<CanonicalRequest>,
    pub body: Option<RequestBody>,
    /// Handler arguments by (possibly pythonic) name
    pub args: Map<String, Value>,
    pub files: Vec<UploadedFile>,
    /// Claims reported by the security handler that authorized the request
    pub claims: Option<Value>,
}

impl Invocation {
    pub fn new(request: Arc<CanonicalRequest>, body: Option<RequestBody>) -> Self {
        Self {
            request,
            body,
            args: Map::new(),
            files: Vec::new(),
            claims: None,
        }
    }
}

/// One step of the decorator chain.
pub trait Stage: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn on_request(
        &self,
        _spec: &OperationSpec,
        _invocation: &mut Invocation,
    ) -> Result<(), Problem> {
        Ok(())
    }

    fn on_response(
        &self,
        _spec: &OperationSpec,
        _response: &CanonicalResponse,
    ) -> Result<(), Problem> {
        Ok(())
    }
}

/// Which stages a pipeline is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub validate_requests: bool,
    pub bind_parameters: bool,
    pub pythonic_params: bool,
    pub validate_responses: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            validate_requests: true,
            bind_parameters: true,
            pythonic_params: false,
            validate_responses: false,
        }
    }
}

/// Ordered, immutable chain of stages for one operation.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    /// Assemble the stages an operation needs, compiling its schemas.
    pub fn build(
        spec: &OperationSpec,
        config: PipelineConfig,
        security: &HashMap<String, Arc<dyn SecurityHandler>>,
    ) -> Result<Self, AdapterError> {
        let mut stages: Vec<Arc<dyn Stage>> = Vec::new();
        if !spec.security.is_empty() {
            stages.push(Arc::new(SecurityStage::new(security.clone())));
        }
        if config.validate_requests {
            stages.push(Arc::new(RequestValidationStage::compile(spec)?));
        }
        if config.bind_parameters {
            stages.push(Arc::new(ParameterBinding::new(config.pythonic_params)));
        }
        if config.validate_responses {
            stages.push(Arc::new(ResponseValidationStage::compile(spec)?));
        }
        Ok(Self { stages })
    }

    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn run_request(
        &self,
        spec: &OperationSpec,
        invocation: &mut Invocation,
    ) -> Result<(), Problem> {
        for stage in &self.stages {
            if let Err(problem) = stage.on_request(spec, invocation) {
                warn!(
                    operation_id = %spec.operation_id,
                    stage = stage.name(),
                    status = problem.status.as_u16(),
                    detail = problem.detail.as_deref().unwrap_or(""),
                    "Request rejected"
                );
                return Err(problem);
            }
        }
        Ok(())
    }

    pub fn run_response(
        &self,
        spec: &OperationSpec,
        response: &CanonicalResponse,
    ) -> Result<(), Problem> {
        for stage in &self.stages {
            if let Err(problem) = stage.on_response(spec, response) {
                warn!(
                    operation_id = %spec.operation_id,
                    stage = stage.name(),
                    status = problem.status.as_u16(),
                    "Response rejected"
                );
                return Err(problem);
            }
        }
        Ok(())
    }
}
