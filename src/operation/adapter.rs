use super::handler::{HandlerArgs, HandlerResult, Operation};
use crate::api::ApiContext;
use crate::decorators::{Invocation, Pipeline, PipelineConfig};
use crate::error::{AdapterError, Problem};
use crate::framework::{Framework, NativeResponse, Portable};
use crate::response::{build_response, get_response, response_from_handler};
use crate::spec::OperationSpec;
use crate::uri_parsing::{UriParser, UriParserKind};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error};

/// Toggles for the optional decoration steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratorFlags {
    /// Bind parameters and body into handler arguments
    pub parameter: bool,
    /// Normalize through the canonical response (and validate it)
    pub response: bool,
    pub pythonic_params: bool,
}

impl Default for DecoratorFlags {
    fn default() -> Self {
        Self {
            parameter: true,
            response: true,
            pythonic_params: false,
        }
    }
}

/// Object-safe view of an adapter, as stored in an [`Api`](crate::api::Api).
pub trait Endpoint<F: Framework>: Send + Sync {
    fn operation_id(&self) -> &str;

    fn spec(&self) -> &OperationSpec;

    fn call(&self, request: F::Request) -> Result<F::Response, AdapterError>;

    fn call_async(&self, request: F::Request) -> BoxFuture<'_, Result<F::Response, AdapterError>>;
}

/// Binds one operation to framework `F`.
///
/// Immutable after construction; every call builds its own canonical
/// request and response, so one adapter serves any number of concurrent
/// requests.
pub struct OperationAdapter<F: Framework, R = Portable> {
    operation: Arc<Operation<R>>,
    context: Arc<ApiContext>,
    uri_parser_kind: UriParserKind,
    uri_parser: Arc<dyn UriParser>,
    mimetype: String,
    flags: DecoratorFlags,
    pipeline: Pipeline,
    _framework: PhantomData<fn() -> F>,
}

impl<F, R> OperationAdapter<F, R>
where
    F: Framework,
    R: NativeResponse<F>,
{
    pub fn from_operation(
        operation: Arc<Operation<R>>,
        context: Arc<ApiContext>,
        pythonic_params: bool,
    ) -> Result<Self, AdapterError> {
        let flags = DecoratorFlags {
            pythonic_params,
            ..DecoratorFlags::default()
        };
        Self::with_flags(operation, context, flags)
    }

    pub fn with_flags(
        operation: Arc<Operation<R>>,
        context: Arc<ApiContext>,
        flags: DecoratorFlags,
    ) -> Result<Self, AdapterError> {
        let spec = operation.spec();
        let uri_parser_kind = spec.uri_parser.unwrap_or(context.options.uri_parser);
        let body_schema = spec.request_body.as_ref().and_then(|b| b.schema.clone());
        let uri_parser = uri_parser_kind.build(spec.parameters.clone(), body_schema);
        let config = PipelineConfig {
            validate_requests: context.options.validate_requests,
            bind_parameters: flags.parameter,
            pythonic_params: flags.pythonic_params,
            validate_responses: context.options.validate_responses && flags.response,
        };
        let pipeline = Pipeline::build(spec, config, &context.security)?;
        let mimetype = spec.get_mimetype();
        debug!(
            framework = F::name(),
            operation_id = %spec.operation_id,
            uri_parser = %uri_parser_kind,
            mimetype = %mimetype,
            stages = ?pipeline.stage_names(),
            "Built operation adapter"
        );
        Ok(Self {
            operation,
            context,
            uri_parser_kind,
            uri_parser,
            mimetype,
            flags,
            pipeline,
            _framework: PhantomData,
        })
    }

    pub fn operation(&self) -> &Arc<Operation<R>> {
        &self.operation
    }

    pub fn operation_id(&self) -> &str {
        self.operation.operation_id()
    }

    pub fn mimetype(&self) -> &str {
        &self.mimetype
    }

    pub fn uri_parser_kind(&self) -> UriParserKind {
        self.uri_parser_kind
    }

    pub fn flags(&self) -> DecoratorFlags {
        self.flags
    }

    pub fn pythonic_params(&self) -> bool {
        self.flags.pythonic_params
    }

    /// Serve one request, running the handler on the current thread.
    pub fn call(&self, request: F::Request) -> Result<F::Response, AdapterError> {
        let args = match self.prepare(request) {
            Ok(args) => args,
            Err(problem) => return self.problem(&problem),
        };
        let result = self.operation.handler().call(args);
        self.finish(result)
    }

    /// Serve one request, awaiting an async handler.
    pub async fn call_async(&self, request: F::Request) -> Result<F::Response, AdapterError> {
        let args = match self.prepare(request) {
            Ok(args) => args,
            Err(problem) => return self.problem(&problem),
        };
        let result = self.operation.handler().call_async(args).await;
        self.finish(result)
    }

    fn prepare(&self, request: F::Request) -> Result<HandlerArgs, Problem> {
        let request = F::get_request(request, Arc::clone(&self.uri_parser));
        let body = F::get_body(&request);
        let mut invocation = Invocation::new(Arc::new(request), body);
        self.pipeline
            .run_request(self.operation.spec(), &mut invocation)?;
        Ok(HandlerArgs::from(invocation))
    }

    fn finish(&self, result: HandlerResult<R>) -> Result<F::Response, AdapterError> {
        let handler_return = result.map_err(|cause| {
            error!(
                framework = F::name(),
                operation_id = %self.operation_id(),
                error = %format!("{cause:#}"),
                "Handler failed"
            );
            AdapterError::Handler {
                operation_id: self.operation_id().to_string(),
                cause,
            }
        })?;

        let jsonifier = &self.context.jsonifier;
        if !self.flags.response {
            return response_from_handler::<F, R>(handler_return, Some(&self.mimetype), jsonifier);
        }
        let canonical = get_response::<F, R>(handler_return, Some(&self.mimetype), jsonifier)?;
        if let Err(problem) = self
            .pipeline
            .run_response(self.operation.spec(), &canonical)
        {
            return self.problem(&problem);
        }
        build_response::<F>(canonical, Some(&self.mimetype))
    }

    fn problem(&self, problem: &Problem) -> Result<F::Response, AdapterError> {
        F::problem_response(problem, &self.context.jsonifier)
    }
}

impl<F: Framework, R> fmt::Debug for OperationAdapter<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationAdapter")
            .field("framework", &F::name())
            .field("operation_id", &self.operation.spec().operation_id)
            .field("mimetype", &self.mimetype)
            .field("uri_parser", &self.uri_parser_kind)
            .field("flags", &self.flags)
            .field("stages", &self.pipeline.stage_names())
            .finish()
    }
}

impl<F, R> Endpoint<F> for OperationAdapter<F, R>
where
    F: Framework,
    R: NativeResponse<F>,
{
    fn operation_id(&self) -> &str {
        OperationAdapter::operation_id(self)
    }

    fn spec(&self) -> &OperationSpec {
        self.operation.spec()
    }

    fn call(&self, request: F::Request) -> Result<F::Response, AdapterError> {
        OperationAdapter::call(self, request)
    }

    fn call_async(&self, request: F::Request) -> BoxFuture<'_, Result<F::Response, AdapterError>> {
        OperationAdapter::call_async(self, request).boxed()
    }
}
