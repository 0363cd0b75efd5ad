//! Main router implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::middleware::{BasePath, ErrorHandler, ErrorPage, Fallback, NotFound, RequestLog};
use crate::pipeline::{handler, BoxFuture, Handler, Middleware, Next, Pipeline};
use crate::request::Request;
use crate::response::Response;
use crate::runner::{DelegateRunner, Runner};
use crate::table::{RouteTable, SharedRoutes};
use crate::template::RouteTemplate;

/// What the router does when a matched route can't be run.
///
/// A route without `controller`, `fn` or `file` always gets a 404; the
/// policy covers routes whose target is missing, misnamed or not callable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Log a warning and answer 404 `Not Found`.
    #[default]
    NotFound,
    /// Return the error to the caller.
    Propagate,
}

/// Steps of a dispatch, as they show up in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Matched,
    Unmatched,
    Bound,
    Dispatched,
    Responded,
    NotFoundResponded,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Matched => "matched",
            Self::Unmatched => "unmatched",
            Self::Bound => "bound",
            Self::Dispatched => "dispatched",
            Self::Responded => "responded",
            Self::NotFoundResponded => "not-found-responded",
        };
        f.write_str(name)
    }
}

/// The terminal step of the pipeline: finds the route and runs it.
#[derive(Clone)]
struct Dispatcher {
    routes: SharedRoutes,
    runner: Arc<dyn Runner>,
    faults: FaultPolicy,
}

impl Dispatcher {
    /// Runs the route for a request.
    ///
    /// When `next` is given it is called after the route ran, with the
    /// request the route was attached to. A request without a route, or
    /// with a route that can't be run, ends here.
    async fn run(
        &self,
        request: Request,
        response: Response,
        next: Option<Next>,
    ) -> Result<Response> {
        let request = if request.route().is_some() {
            request
        } else {
            let Some(route) = self.routes.load().lookup(&request)? else {
                trace(DispatchState::Unmatched, &request);
                trace(DispatchState::NotFoundResponded, &request);
                return Ok(response.with_reason(404));
            };
            trace(DispatchState::Matched, &request);
            let request = request.with_route(route);
            trace(DispatchState::Bound, &request);
            request
        };

        trace(DispatchState::Dispatched, &request);
        let routed = next.is_some().then(|| request.clone());
        let method = request.method;
        let path = request.path.clone();

        let res = match self.runner.run(request, response.clone()).await {
            Ok(res) => res,
            Err(err) if self.degrades(&err) => {
                warn!(%method, %path, error = %err, "Can't run route");
                return Ok(response.with_reason(404));
            }
            Err(err) => return Err(err),
        };
        debug!(state = %DispatchState::Responded, %method, %path, status = res.status);

        match (next, routed) {
            (Some(next), Some(request)) => next.run(request, res).await,
            _ => Ok(res),
        }
    }

    fn degrades(&self, err: &RouterError) -> bool {
        matches!(err, RouterError::NoAction)
            || (err.is_runner_fault() && self.faults == FaultPolicy::NotFound)
    }
}

fn trace(state: DispatchState, request: &Request) {
    debug!(state = %state, method = %request.method, path = %request.path);
}

/// The main router for handling HTTP requests.
///
/// ```
/// use oxide_glob_router::{Request, Response, RouteTable, Router};
///
/// let router = Router::new(RouteTable::new())
///     .get("/hello/*", |_req: Request, res: Response| async move {
///         Ok(res.body("Hello, World!"))
///     })
///     .unwrap();
///
/// assert!(router.routes().load().contains("/hello/* +GET"));
/// ```
#[derive(Clone)]
pub struct Router {
    routes: SharedRoutes,
    pipeline: Pipeline,
    runner: Arc<dyn Runner>,
    faults: FaultPolicy,
}

impl Router {
    /// Creates a router for a route table.
    pub fn new(routes: RouteTable) -> Self {
        Self::shared(routes.into())
    }

    /// Creates a router for a route table that is shared with others.
    pub fn shared(routes: SharedRoutes) -> Self {
        Self {
            routes,
            pipeline: Pipeline::new(),
            runner: Arc::new(DelegateRunner::new()),
            faults: FaultPolicy::default(),
        }
    }

    /// Creates a router from its configuration.
    ///
    /// Middleware are installed in this order: error handler, request log,
    /// base path, error page, not found.
    pub fn from_config(config: RouterConfig, runner: impl Runner + 'static) -> Result<Self> {
        config.validate()?;

        let mut router = Self::new(RouteTable::from_json(config.routes.clone())?)
            .with_runner(runner)
            .with_fault_policy(config.runner_faults);

        if config.catch_errors {
            router = router.middleware(ErrorHandler);
        }
        router = router.middleware(RequestLog);

        if let Some(base) = &config.base_path {
            router = router.middleware(BasePath::new(base)?);
        }

        if config.error_page {
            let error_page = ErrorPage::new(router.routes.clone(), Arc::clone(&router.runner));
            router = router.middleware(error_page);
        }

        let mut not_found = NotFound::new(router.routes.clone())
            .with_not_found(Fallback::status(config.not_found)?)?;
        if let Some(status) = config.method_not_allowed {
            not_found = not_found.with_method_not_allowed(Fallback::status(status)?)?;
        }

        Ok(router.middleware(not_found))
    }

    /// Adds a route.
    pub fn route(self, key: &str, template: impl Into<RouteTemplate>) -> Result<Self> {
        let template = template.into();
        self.routes
            .update(|table| table.insert(key, template.clone()).map(drop))?;
        Ok(self)
    }

    /// Adds a GET route calling `f`.
    pub fn get<F, Fut>(self, path: &str, f: F) -> Result<Self>
    where
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        self.callback_route(&format!("{path} +GET"), handler(f))
    }

    /// Adds a POST route calling `f`.
    pub fn post<F, Fut>(self, path: &str, f: F) -> Result<Self>
    where
        F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        self.callback_route(&format!("{path} +POST"), handler(f))
    }

    fn callback_route(self, key: &str, callback: Handler) -> Result<Self> {
        self.route(key, RouteTemplate::map().with("fn", callback))
    }

    /// Returns the routes.
    pub const fn routes(&self) -> &SharedRoutes {
        &self.routes
    }

    /// Returns the runner.
    pub const fn runner(&self) -> &Arc<dyn Runner> {
        &self.runner
    }

    /// Sets the runner.
    #[must_use]
    pub fn with_runner(mut self, runner: impl Runner + 'static) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Sets what happens when a matched route can't be run.
    #[must_use]
    pub fn with_fault_policy(mut self, faults: FaultPolicy) -> Self {
        self.faults = faults;
        self
    }

    /// Adds global middleware.
    #[must_use]
    pub fn middleware(mut self, mw: impl Middleware + 'static) -> Self {
        self.pipeline.add(mw);
        self
    }

    /// Adds middleware that only runs for `path` and the paths below it.
    #[must_use]
    pub fn middleware_at(mut self, path: &str, mw: impl Middleware + 'static) -> Self {
        self.pipeline.add_scoped(path, mw);
        self
    }

    /// Returns the number of middleware.
    pub fn middlewares(&self) -> usize {
        self.pipeline.len()
    }

    fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            routes: self.routes.clone(),
            runner: Arc::clone(&self.runner),
            faults: self.faults,
        }
    }

    fn terminal(&self, next: Option<Next>) -> Handler {
        let dispatcher = self.dispatcher();
        handler(move |request, response| {
            let dispatcher = dispatcher.clone();
            let next = next.clone();
            async move { dispatcher.run(request, response, next).await }
        })
    }

    /// Handles a request: runs the middleware, then the route.
    pub fn handle(
        &self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'static, Result<Response>> {
        self.pipeline.start(self.terminal(None)).run(request, response)
    }

    /// Runs the route for a request without the middleware.
    ///
    /// A route already attached to the request is used as it is.
    pub async fn run(&self, request: Request, response: Response) -> Result<Response> {
        self.dispatcher().run(request, response, None).await
    }
}

/// A router used as middleware runs its own pipeline. Once a route ran, the
/// outer pipeline continues with the routed request and the response it
/// produced. Requests without a route get the 404 and go no further.
impl Middleware for Router {
    fn handle<'a>(
        &'a self,
        request: Request,
        response: Response,
        next: Next,
    ) -> BoxFuture<'a, Result<Response>> {
        self.pipeline
            .start(self.terminal(Some(next)))
            .run(request, response)
    }
}
