use std::time::Instant;

use tracing::{info, warn};

use crate::error::Result;
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Logs one event per request with its outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLog;

impl Middleware for RequestLog {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        let method = request.method;
        let path = request.path.clone();

        Box::pin(async move {
            let start = Instant::now();
            let result = next.run(request, response).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(res) => info!(%method, %path, status = res.status, ?elapsed, "Request handled"),
                Err(err) => warn!(%method, %path, error = %err, ?elapsed, "Request failed"),
            }

            result
        })
    }
}
