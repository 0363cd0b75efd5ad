use crate::error::{Result, RouterError};
use crate::pipeline::BoxFuture;
use crate::request::Request;
use crate::response::Response;

use super::Runner;

/// Calls the handler stored in the route's `fn` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackRunner;

impl Runner for CallbackRunner {
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>> {
        let callback = request
            .route()
            .and_then(|route| route.get("fn"))
            .and_then(|value| value.as_handler())
            .cloned();

        match callback {
            Some(callback) => callback(request, response),
            None => Box::pin(async move {
                Err(RouterError::InvalidAction {
                    field: "fn",
                    reason: "should be a callable".to_string(),
                })
            }),
        }
    }
}
