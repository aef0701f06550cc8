use crate::api::Api;
use crate::error::Problem;
use crate::framework::{Framework, MiniHttp, MiniRequest, MiniResponse};
use http::StatusCode;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// `may_minihttp` service dispatching to an [`Api<MiniHttp>`].
#[derive(Clone)]
pub struct MiniHttpService {
    api: Arc<Api<MiniHttp>>,
}

impl MiniHttpService {
    pub fn new(api: Arc<Api<MiniHttp>>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<Api<MiniHttp>> {
        &self.api
    }

    /// Route and serve one captured request.
    pub fn handle(&self, request: MiniRequest) -> MiniResponse {
        let method = request.method().clone();
        let path = request.path().to_string();

        let Some((route, params)) = self.api.find_route(&method, &path) else {
            let path_known = self.api.routes().iter().any(|r| r.match_path(&path).is_some());
            let (status, detail) = if path_known {
                (StatusCode::METHOD_NOT_ALLOWED, format!("{method} is not allowed on {path}"))
            } else {
                (StatusCode::NOT_FOUND, format!("No route for {method} {path}"))
            };
            debug!(method = %method, path = %path, status = status.as_u16(), "No matching route");
            return self.problem(&Problem::new(status, detail));
        };

        let started = Instant::now();
        let endpoint = route.endpoint.clone();
        match self.api.dispatch(&endpoint, request.with_path_params(params)) {
            Ok(response) => {
                info!(
                    method = %method,
                    path = %path,
                    endpoint = %endpoint,
                    status = response.status().as_u16(),
                    latency_ms = started.elapsed().as_millis() as u64,
                    "Request served"
                );
                response
            }
            Err(err) => {
                error!(
                    method = %method,
                    path = %path,
                    endpoint = %endpoint,
                    error = %err,
                    "Request failed"
                );
                self.problem(&Problem::internal(err.to_string()))
            }
        }
    }

    fn problem(&self, problem: &Problem) -> MiniResponse {
        match MiniHttp::problem_response(problem, &self.api.context().jsonifier) {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, "Failed to render problem response");
                MiniResponse::new(problem.status)
            }
        }
    }
}

impl HttpService for MiniHttpService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let request = match MiniRequest::from_minihttp(req) {
            Ok(request) => request,
            Err(err) => {
                debug!(error = %err, "Unreadable request");
                self.problem(&Problem::bad_request(err.to_string())).write_to(res);
                return Ok(());
            }
        };
        self.handle(request).write_to(res);
        Ok(())
    }
}
