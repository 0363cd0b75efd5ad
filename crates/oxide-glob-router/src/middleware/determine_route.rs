use crate::error::Result;
use crate::pipeline::{BoxFuture, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::table::SharedRoutes;

/// Looks up the route before the rest of the pipeline runs, so later
/// middleware can inspect [`Request::route`].
#[derive(Debug, Clone)]
pub struct DetermineRoute {
    routes: SharedRoutes,
}

impl DetermineRoute {
    /// Creates the middleware.
    pub const fn new(routes: SharedRoutes) -> Self {
        Self { routes }
    }

    /// Returns the routes.
    pub const fn routes(&self) -> &SharedRoutes {
        &self.routes
    }
}

impl Middleware for DetermineRoute {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(async move {
            let request = match self.routes.load().lookup(&request)? {
                Some(route) => request.with_route(route),
                None => request,
            };
            next.run(request, response).await
        })
    }
}
