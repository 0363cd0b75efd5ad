use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::runner::Runner;
use crate::table::SharedRoutes;

/// Renders error responses through a route named after the status.
///
/// When the rest of the pipeline answers with a 4xx or 5xx status, the
/// route for `/{status}` is looked up and run with the error response. If
/// there is no such route the error response is returned as it is.
#[derive(Clone)]
pub struct ErrorPage {
    routes: SharedRoutes,
    runner: Arc<dyn Runner>,
}

impl ErrorPage {
    /// Creates the middleware.
    pub fn new(routes: SharedRoutes, runner: Arc<dyn Runner>) -> Self {
        Self { routes, runner }
    }
}

impl Middleware for ErrorPage {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(async move {
            let original = request.clone();
            let response = next.run(request, response).await?;

            if !response.is_error() {
                return Ok(response);
            }

            let error_request = original
                .clone()
                .with_path(format!("/{}", response.status))
                .without_query();

            match self.routes.load().lookup(&error_request)? {
                Some(route) => {
                    debug!(status = response.status, "Routing to error page");
                    self.runner.run(original.with_route(route), response).await
                }
                None => Ok(response),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::handler;
    use crate::runner::DelegateRunner;
    use crate::table::RouteTable;
    use crate::template::RouteTemplate;

    fn error_page() -> ErrorPage {
        let page = handler(|req: Request, res: Response| async move {
            let path = req.path.clone();
            Ok(res.body(format!("Sorry, {path} does not exist")))
        });
        let routes =
            RouteTable::from_routes([("/404", RouteTemplate::map().with("fn", page))]).unwrap();

        ErrorPage::new(routes.into(), Arc::new(DelegateRunner::new()))
    }

    fn answer(status: u16) -> Next {
        Next::terminal(handler(move |_req, res: Response| async move {
            Ok(res.with_status(status).body("original"))
        }))
    }

    #[tokio::test]
    async fn test_routes_to_error_page() {
        let res = error_page()
            .handle(Request::get("/missing?x=1"), Response::ok(), answer(404))
            .await
            .unwrap();
        assert_eq!(res.status, 404);
        assert_eq!(res.body_string(), Some("Sorry, /missing does not exist".to_string()));
    }

    #[tokio::test]
    async fn test_keeps_response_without_error_route() {
        let res = error_page()
            .handle(Request::get("/"), Response::ok(), answer(500))
            .await
            .unwrap();
        assert_eq!(res.status, 500);
        assert_eq!(res.body_string(), Some("original".to_string()));

        let res = error_page()
            .handle(Request::get("/"), Response::ok(), answer(200))
            .await
            .unwrap();
        assert_eq!(res.body_string(), Some("original".to_string()));
    }
}
