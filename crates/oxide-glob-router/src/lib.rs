//! # oxide-glob-router
//!
//! URL routing with glob patterns, variable binding and a middleware
//! pipeline.
//!
//! This crate provides:
//! - Glob patterns (`*`, `?`, `#`, `/**`, `[a-z]`, `{a,b}`) with method filters
//! - Route templates whose fields are bound from the URL and the request
//! - First-match-wins route tables that can be swapped at runtime
//! - An ordered middleware pipeline with path-scoped middleware
//! - Runners for controllers, callbacks and scripts
//!
//! ## Quick Start
//!
//! ```
//! use oxide_glob_router::{Request, Response, RouteTable, RouteTemplate, Router, handler};
//!
//! async fn user_handler(req: Request, res: Response) -> oxide_glob_router::Result<Response> {
//!     let id = req.route().and_then(|r| r.get_str("id")).unwrap_or("unknown");
//!     Ok(res.body(format!("User {id}")))
//! }
//!
//! let router = Router::new(RouteTable::new())
//!     .route(
//!         "/users/# +GET",
//!         RouteTemplate::map().with("fn", handler(user_handler)).with("id", "$2"),
//!     )
//!     .unwrap();
//!
//! // Handle a request
//! let response = router.handle(Request::get("/users/123"), Response::ok());
//! ```
//!
//! ## Route Keys
//!
//! A route key is a glob pattern optionally followed by method filters.
//! `+GET` allows a method, `-OPTIONS` excludes one:
//!
//! ```text
//! /                      the root only
//! /users/#               /users/1, /users/42
//! /files/**              /files, /files/a, /files/a/b
//! /{en,nl}/about +GET    GET /en/about, GET /nl/about
//! /api/** -OPTIONS       every method except OPTIONS
//! ```
//!
//! ## Bind Expressions
//!
//! Template strings starting with `$` are resolved when a route matches:
//!
//! ```text
//! $2                 second URL segment
//! $2...              second segment and all after it (lists only)
//! $_GET[q]           query parameter
//! $_POST[name]       parsed body field
//! $_COOKIE[sid]      cookie
//! $HTTP_ACCEPT       request header
//! $3|index           alternatives, the first one that resolves wins
//! ~$2~.~$3~          concatenation
//! ```
//!
//! ## Configuration
//!
//! ```
//! use oxide_glob_router::{DelegateRunner, Router, RouterConfig};
//!
//! let config = RouterConfig::from_json(r#"{
//!     "method_not_allowed": 405,
//!     "routes": {"/users/# +GET": {"controller": "user", "id": "$2"}}
//! }"#).unwrap();
//!
//! let router = Router::from_config(config, DelegateRunner::new()).unwrap();
//! assert_eq!(router.middlewares(), 2);
//! ```

mod binding;
mod config;
mod error;
pub mod middleware;
pub mod pattern;
mod pipeline;
mod record;
mod request;
mod response;
mod router;
pub mod runner;
mod table;
mod template;
pub mod url;

pub use binding::{bind, bind_record};
pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use pattern::{fnmatch, RoutePattern};
pub use pipeline::{
    handler, middleware_fn, BoxFuture, Handler, Middleware, MiddlewareFn, Next, PathScoped, Pipeline,
};
pub use record::{RouteAction, RouteRecord, RouteValue};
pub use request::{Method, Request};
pub use response::Response;
pub use router::{FaultPolicy, Router};
pub use runner::{runner_fn, DelegateRunner, Runner};
pub use table::{RouteEntry, RouteTable, SharedRoutes};
pub use template::{BindExpr, BindOption, RouteTemplate};
