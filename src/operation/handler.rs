use crate::body::RequestBody;
use crate::decorators::Invocation;
use crate::framework::Portable;
use crate::lifecycle::{CanonicalRequest, UploadedFile};
use crate::response::HandlerReturn;
use crate::spec::OperationSpec;
use anyhow::{anyhow, Context};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

pub type HandlerResult<R = Portable> = anyhow::Result<HandlerReturn<R>>;

type BlockingFn<R> = dyn Fn(HandlerArgs) -> HandlerResult<R> + Send + Sync;
type AsyncFn<R> = dyn Fn(HandlerArgs) -> BoxFuture<'static, HandlerResult<R>> + Send + Sync;

/// Arguments handed to a handler for one request.
///
/// `values` holds the bound parameters and body under their argument
/// names; the canonical request stays available for anything else.
#[derive(Debug, Clone)]
pub struct HandlerArgs {
    values: Map<String, Value>,
    body: Option<RequestBody>,
    files: Vec<UploadedFile>,
    claims: Option<Value>,
    request: Arc<CanonicalRequest>,
}

impl HandlerArgs {
    pub fn new(request: Arc<CanonicalRequest>) -> Self {
        Self {
            values: Map::new(),
            body: None,
            files: Vec::new(),
            claims: None,
            request,
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Deserialize one argument.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| anyhow!("missing argument '{name}'"))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("argument '{name}' has the wrong shape"))
    }

    /// Deserialize every argument into one struct, keyed by argument name.
    pub fn into_typed<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .context("handler arguments do not match the requested type")
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn file(&self, field_name: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.field_name == field_name)
    }

    pub fn claims(&self) -> Option<&Value> {
        self.claims.as_ref()
    }

    pub fn request(&self) -> &CanonicalRequest {
        &self.request
    }
}

impl From<Invocation> for HandlerArgs {
    fn from(invocation: Invocation) -> Self {
        Self {
            values: invocation.args,
            body: invocation.body,
            files: invocation.files,
            claims: invocation.claims,
            request: invocation.request,
        }
    }
}

/// User function bound to an operation.
///
/// Blocking handlers run on the calling coroutine or thread; async handlers
/// are awaited by `call_async` and driven to completion by `call`.
pub enum Handler<R = Portable> {
    Blocking(Arc<BlockingFn<R>>),
    Async(Arc<AsyncFn<R>>),
}

impl<R> Clone for Handler<R> {
    fn clone(&self) -> Self {
        match self {
            Handler::Blocking(f) => Handler::Blocking(Arc::clone(f)),
            Handler::Async(f) => Handler::Async(Arc::clone(f)),
        }
    }
}

impl<R> fmt::Debug for Handler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Blocking(_) => f.write_str("Handler::Blocking"),
            Handler::Async(_) => f.write_str("Handler::Async"),
        }
    }
}

impl Handler {
    /// Blocking handler returning portable values.
    pub fn from_fn<H, T>(handler: H) -> Self
    where
        H: Fn(HandlerArgs) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Into<HandlerReturn> + 'static,
    {
        Handler::native_fn(handler)
    }

    pub fn from_async<H, Fut, T>(handler: H) -> Self
    where
        H: Fn(HandlerArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<HandlerReturn> + 'static,
    {
        Handler::native_async(handler)
    }
}

impl<R: Send + 'static> Handler<R> {
    /// Blocking handler that may return framework responses of type `R`.
    pub fn native_fn<H, T>(handler: H) -> Self
    where
        H: Fn(HandlerArgs) -> anyhow::Result<T> + Send + Sync + 'static,
        T: Into<HandlerReturn<R>> + 'static,
    {
        Handler::Blocking(Arc::new(move |args: HandlerArgs| -> HandlerResult<R> {
            handler(args).map(Into::into)
        }))
    }

    pub fn native_async<H, Fut, T>(handler: H) -> Self
    where
        H: Fn(HandlerArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<HandlerReturn<R>> + 'static,
    {
        Handler::Async(Arc::new(
            move |args: HandlerArgs| -> BoxFuture<'static, HandlerResult<R>> {
                handler(args).map(|result| result.map(Into::into)).boxed()
            },
        ))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Handler::Async(_))
    }

    /// Run to completion on the current thread.
    ///
    /// A panicking handler, blocking or async, is reported as an error.
    pub fn call(&self, args: HandlerArgs) -> HandlerResult<R> {
        match self {
            Handler::Blocking(f) => catch_unwind(AssertUnwindSafe(|| f(args)))
                .unwrap_or_else(|panic| Err(panicked(panic))),
            Handler::Async(f) => futures::executor::block_on(call_guarded(f.as_ref(), args)),
        }
    }

    pub async fn call_async(&self, args: HandlerArgs) -> HandlerResult<R> {
        match self {
            Handler::Blocking(_) => self.call(args),
            Handler::Async(f) => call_guarded(f.as_ref(), args).await,
        }
    }
}

/// Panics while building the future or while polling it become errors.
async fn call_guarded<R>(f: &AsyncFn<R>, args: HandlerArgs) -> HandlerResult<R> {
    let future = catch_unwind(AssertUnwindSafe(|| f(args))).map_err(panicked)?;
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(panicked(panic)))
}

fn panicked(panic: Box<dyn Any + Send>) -> anyhow::Error {
    anyhow!("handler panicked: {}", panic_message(panic.as_ref()))
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// A described operation and the handler that implements it.
///
/// Operations are framework-agnostic; wrap one in an `Arc` to mount it on
/// several APIs or frameworks.
#[derive(Debug, Clone)]
pub struct Operation<R = Portable> {
    spec: OperationSpec,
    handler: Handler<R>,
}

impl<R> Operation<R> {
    pub fn new(spec: OperationSpec, handler: Handler<R>) -> Self {
        Self { spec, handler }
    }

    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn handler(&self) -> &Handler<R> {
        &self.handler
    }

    pub fn operation_id(&self) -> &str {
        &self.spec.operation_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Payload;
    use crate::uri_parsing::UriParserKind;
    use http::Method;
    use serde::Deserialize;
    use serde_json::json;

    fn args() -> HandlerArgs {
        let parser = UriParserKind::OpenApi.build(Vec::new(), None);
        let request = CanonicalRequest::builder(Method::GET, "/", parser).build();
        HandlerArgs::new(Arc::new(request))
            .with_value("pet_id", json!(7))
            .with_value("tag", json!("cat"))
    }

    #[test]
    fn test_get_as_and_typed() {
        #[derive(Deserialize)]
        struct Query {
            pet_id: u32,
            tag: String,
        }
        let args = args();
        assert_eq!(args.get_as::<u32>("pet_id").unwrap(), 7);
        assert!(args.get_as::<u32>("missing").is_err());
        let q: Query = args.into_typed().unwrap();
        assert_eq!((q.pet_id, q.tag.as_str()), (7, "cat"));
    }

    #[test]
    fn test_blocking_panic_becomes_error() {
        let handler: Handler =
            Handler::from_fn(|_args| -> anyhow::Result<Value> { panic!("boom") });
        let err = handler.call(args()).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_async_panic_becomes_error() {
        let handler: Handler = Handler::from_async(|_args: HandlerArgs| async move {
            if true {
                panic!("kaboom");
            }
            Ok::<_, anyhow::Error>(json!(null))
        });
        let err = handler.call(args()).unwrap_err();
        assert_eq!(err.to_string(), "handler panicked: kaboom");

        let err = futures::executor::block_on(handler.call_async(args())).unwrap_err();
        assert!(err.to_string().contains("kaboom"));
    }

    #[test]
    fn test_async_handler_joined_by_call() {
        let handler: Handler = Handler::from_async(|args: HandlerArgs| async move {
            Ok::<_, anyhow::Error>(json!({"id": args.get_as::<u32>("pet_id")?}))
        });
        assert!(handler.is_async());
        match handler.call(args()).unwrap() {
            HandlerReturn::Body(Payload::Json(v)) => assert_eq!(v, json!({"id": 7})),
            other => panic!("unexpected return {other:?}"),
        }
    }
}
