//! Runners turn a bound route into a response.
//!
//! The router attaches the [`RouteRecord`](crate::RouteRecord) to the
//! request before it calls the runner. [`DelegateRunner`] looks at the
//! record's action and hands the request to the matching runner:
//!
//! - `controller` → [`ControllerRunner`]
//! - `fn` → [`CallbackRunner`]
//! - `file` → [`ScriptRunner`]

mod callback;
mod controller;
mod script;

use std::future::Future;

pub use callback::CallbackRunner;
pub use controller::{controller_class, ControllerFactory, ControllerRunner};
pub use script::{ScriptHandler, ScriptRunner};

use crate::error::{Result, RouterError};
use crate::pipeline::BoxFuture;
use crate::record::RouteAction;
use crate::request::Request;
use crate::response::Response;

/// Executes the route attached to a request.
pub trait Runner: Send + Sync {
    /// Runs the route.
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>>;
}

/// A runner built from an async function.
pub struct RunnerFn<F> {
    f: F,
}

/// Wraps an async function `(request, response) -> response` as a runner.
pub const fn runner_fn<F, Fut>(f: F) -> RunnerFn<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    RunnerFn { f }
}

impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin((self.f)(request, response))
    }
}

/// Picks a runner based on the route action.
#[derive(Clone, Default)]
pub struct DelegateRunner {
    controller: ControllerRunner,
    callback: CallbackRunner,
    script: ScriptRunner,
}

impl DelegateRunner {
    /// Creates a runner with no controllers, running scripts from the
    /// current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the controllers.
    #[must_use]
    pub fn with_controllers(mut self, factory: ControllerFactory) -> Self {
        self.controller = ControllerRunner::new(factory);
        self
    }

    /// Sets the script runner.
    #[must_use]
    pub fn with_scripts(mut self, script: ScriptRunner) -> Self {
        self.script = script;
        self
    }
}

impl Runner for DelegateRunner {
    fn run<'a>(
        &'a self,
        request: Request,
        response: Response,
    ) -> BoxFuture<'a, Result<Response>> {
        Box::pin(async move {
            let action = request.route().ok_or(RouterError::NoAction)?.action()?;

            match action {
                RouteAction::Controller(_) => self.controller.run(request, response).await,
                RouteAction::Callback(_) => self.callback.run(request, response).await,
                RouteAction::Script(_) => self.script.run(request, response).await,
            }
        })
    }
}
