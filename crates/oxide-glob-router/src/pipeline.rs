//! Middleware pipeline.
//!
//! Middleware run in registration order. Each one receives the request, the
//! response built so far and a [`Next`] continuation. Calling `next.run`
//! passes control to the rest of the chain and eventually to the terminal
//! handler; not calling it short-circuits the chain.
//!
//! ```ignore
//! use oxide_glob_router::{middleware_fn, Pipeline};
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.add(middleware_fn(|req, res, next: Next| async move {
//!     let res = next.run(req, res).await?;
//!     Ok(res.header("X-Powered-By", "oxide"))
//! }));
//! pipeline.add_scoped("/admin", AuthCheck::new());
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::request::Request;
use crate::response::Response;

/// A boxed future for async middleware operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed async request handler.
pub type Handler =
    Arc<dyn Fn(Request, Response) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// Boxes an async function as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    Arc::new(move |req, res| Box::pin(f(req, res)))
}

/// Trait for middleware that wraps the rest of the pipeline.
///
/// Middleware can:
/// - Modify the request before passing it on
/// - Short-circuit processing and return a response
/// - Modify the response returned by `next`
pub trait Middleware: Send + Sync {
    /// Handles the request, optionally delegating to `next`.
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>>;
}

impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        (**self).handle(request, response, next)
    }
}

/// Middleware built from an async function.
pub struct MiddlewareFn<F> {
    f: F,
}

/// Wraps an async function `(request, response, next) -> response` as
/// middleware.
pub const fn middleware_fn<F, Fut>(f: F) -> MiddlewareFn<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    MiddlewareFn { f }
}

impl<F, Fut> Middleware for MiddlewareFn<F>
where
    F: Fn(Request, Response, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin((self.f)(request, response, next))
    }
}

/// The rest of the pipeline, as seen from one middleware.
#[derive(Clone)]
pub struct Next {
    index: usize,
    stack: Arc<[Arc<dyn Middleware>]>,
    terminal: Handler,
}

impl Next {
    /// Creates a continuation that only runs the terminal handler.
    pub fn terminal(terminal: Handler) -> Self {
        Self {
            index: 0,
            stack: Arc::new([]),
            terminal,
        }
    }

    /// Returns the number of middleware still ahead of the terminal handler.
    pub fn remaining(&self) -> usize {
        self.stack.len().saturating_sub(self.index)
    }

    /// Continues with the next middleware, or the terminal handler when
    /// every middleware has run.
    pub fn run(self, request: Request, response: Response) -> BoxFuture<'static, Result<Response>> {
        match self.stack.get(self.index).cloned() {
            Some(middleware) => {
                let next = Self {
                    index: self.index + 1,
                    ..self
                };
                Box::pin(async move { middleware.handle(request, response, next).await })
            }
            None => (self.terminal)(request, response),
        }
    }
}

/// An ordered list of middleware.
#[derive(Clone)]
pub struct Pipeline {
    stack: Arc<[Arc<dyn Middleware>]>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self {
            stack: Arc::new([]),
        }
    }

    /// Appends middleware that runs for every request.
    pub fn add(&mut self, middleware: impl Middleware + 'static) {
        self.push(Arc::new(middleware));
    }

    /// Appends middleware that only runs for `path` and paths below it.
    ///
    /// An empty path registers the middleware for every request.
    pub fn add_scoped(&mut self, path: &str, middleware: impl Middleware + 'static) {
        if path.is_empty() {
            self.add(middleware);
        } else {
            self.add(PathScoped::new(path, middleware));
        }
    }

    fn push(&mut self, middleware: Arc<dyn Middleware>) {
        let mut stack = self.stack.to_vec();
        stack.push(middleware);
        self.stack = stack.into();
    }

    /// Returns the number of middleware.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns true if no middleware is registered.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns the continuation that starts the pipeline and ends with
    /// `terminal`.
    pub fn start(&self, terminal: Handler) -> Next {
        Next {
            index: 0,
            stack: Arc::clone(&self.stack),
            terminal,
        }
    }

    /// Composes the middleware and `terminal` into a single handler.
    pub fn build(&self, terminal: Handler) -> Handler {
        let stack = Arc::clone(&self.stack);
        Arc::new(move |request, response| {
            Next {
                index: 0,
                stack: Arc::clone(&stack),
                terminal: Arc::clone(&terminal),
            }
            .run(request, response)
        })
    }
}

/// Middleware that only applies below a path prefix.
pub struct PathScoped<M> {
    prefix: String,
    inner: M,
}

impl<M: Middleware> PathScoped<M> {
    /// Scopes `inner` to `prefix`.
    pub fn new(prefix: impl Into<String>, inner: M) -> Self {
        let prefix = prefix.into();
        if !prefix.starts_with('/') {
            warn!(prefix = %prefix, "Middleware path doesn't start with a '/'");
        }
        Self { prefix, inner }
    }

    /// Returns the path prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Checks if the middleware applies to a request path.
    pub fn applies_to(&self, path: &str) -> bool {
        path == self.prefix
            || path.starts_with(&format!("{}/", self.prefix.trim_end_matches('/')))
    }
}

impl<M: Middleware> Middleware for PathScoped<M> {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        if self.applies_to(&request.path) {
            self.inner.handle(request, response, next)
        } else {
            next.run(request, response)
        }
    }
}
