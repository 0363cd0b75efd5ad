use std::fmt;

use tracing::debug;

use crate::error::{Result, RouterError};
use crate::pipeline::{BoxFuture, Handler, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::table::SharedRoutes;

/// What to answer when a request has no route.
#[derive(Clone)]
pub enum Fallback {
    /// A bare response with this status.
    Status(u16),
    /// A handler that builds the response.
    Handler(Handler),
}

impl Fallback {
    /// A bare status response. The code must be in range 100-599.
    pub fn status(code: u16) -> Result<Self> {
        let fallback = Self::Status(code);
        fallback.validate()?;
        Ok(fallback)
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Status(code) if !(100..=599).contains(code) => {
                Err(RouterError::InvalidStatus(*code))
            }
            _ => Ok(()),
        }
    }

    fn respond(&self, request: Request, response: Response) -> BoxFuture<'static, Result<Response>> {
        match self {
            Self::Status(code) => {
                let code = *code;
                Box::pin(async move { Ok(response.with_reason(code)) })
            }
            Self::Handler(handler) => handler(request, response),
        }
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => f.debug_tuple("Status").field(code).finish(),
            Self::Handler(_) => f.write_str("Handler"),
        }
    }
}

impl From<Handler> for Fallback {
    fn from(handler: Handler) -> Self {
        Self::Handler(handler)
    }
}

/// Answers requests that have no route without running the rest of the
/// pipeline.
///
/// When a method-not-allowed fallback is set, requests whose path matches a
/// route but whose method does not get that fallback instead.
#[derive(Debug, Clone)]
pub struct NotFound {
    routes: SharedRoutes,
    not_found: Fallback,
    method_not_allowed: Option<Fallback>,
}

impl NotFound {
    /// Creates the middleware, answering 404 `Not Found`.
    pub const fn new(routes: SharedRoutes) -> Self {
        Self {
            routes,
            not_found: Fallback::Status(404),
            method_not_allowed: None,
        }
    }

    /// Sets the answer for requests without a route.
    pub fn with_not_found(mut self, fallback: impl Into<Fallback>) -> Result<Self> {
        let fallback = fallback.into();
        fallback.validate()?;
        self.not_found = fallback;
        Ok(self)
    }

    /// Sets the answer for requests with a route for another method.
    pub fn with_method_not_allowed(mut self, fallback: impl Into<Fallback>) -> Result<Self> {
        let fallback = fallback.into();
        fallback.validate()?;
        self.method_not_allowed = Some(fallback);
        Ok(self)
    }

    /// Returns the answer for requests without a route.
    pub const fn not_found(&self) -> &Fallback {
        &self.not_found
    }

    /// Returns the answer for requests with a route for another method.
    pub const fn method_not_allowed(&self) -> Option<&Fallback> {
        self.method_not_allowed.as_ref()
    }
}

impl Middleware for NotFound {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        let routes = self.routes.load();

        if routes.has_route(&request, true) {
            return next.run(request, response);
        }

        let fallback = match &self.method_not_allowed {
            Some(fallback) if routes.has_route(&request, false) => fallback,
            _ => &self.not_found,
        };

        debug!(method = %request.method, path = %request.path, fallback = ?fallback, "No route");
        fallback.respond(request, response)
    }
}
