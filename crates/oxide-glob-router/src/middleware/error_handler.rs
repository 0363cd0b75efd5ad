use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::error::{Result, RouterError};
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;

/// Turns errors and panics further down the pipeline into a 500
/// `Unexpected error` response.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

impl Middleware for ErrorHandler {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(async move {
            let fallback = response.clone();
            let method = request.method;
            let path = request.path.clone();

            let err = match AssertUnwindSafe(next.run(request, response))
                .catch_unwind()
                .await
            {
                Ok(Ok(res)) => return Ok(res),
                Ok(Err(err)) => err,
                Err(panic) => RouterError::Panic(panic_message(panic.as_ref())),
            };

            error!(method = %method, path = %path, error = %err, "Unexpected error");
            Ok(fallback.with_status(500).body("Unexpected error"))
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler;

    #[tokio::test]
    async fn test_passes_response() {
        let next = Next::terminal(handler(|_req, res: Response| async move { Ok(res.body("fine")) }));
        let res = ErrorHandler.handle(Request::get("/"), Response::ok(), next).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(res.body_string(), Some("fine".to_string()));
    }

    #[tokio::test]
    async fn test_catches_error() {
        let next = Next::terminal(handler(|_req, _res| async move {
            Err(RouterError::handler("database is down"))
        }));
        let res = ErrorHandler
            .handle(Request::get("/"), Response::ok().header("X-Id", "1"), next)
            .await
            .unwrap();
        assert_eq!(res.status, 500);
        assert_eq!(res.body_string(), Some("Unexpected error".to_string()));
        assert_eq!(res.get_header("X-Id"), Some("1"));
    }

    #[tokio::test]
    async fn test_catches_panic() {
        let next = Next::terminal(handler(|req: Request, res: Response| async move {
            if req.path == "/boom" {
                panic!("boom");
            }
            Ok(res)
        }));
        let res = ErrorHandler.handle(Request::get("/boom"), Response::ok(), next).await.unwrap();
        assert_eq!(res.status, 500);
    }
}
