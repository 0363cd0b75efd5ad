//! Middleware that ship with the router.
//!
//! [`Router::from_config`](crate::Router::from_config) installs them in this
//! order:
//!
//! 1. [`ErrorHandler`] turns failures further down into a 500 response
//! 2. [`RequestLog`] logs every request
//! 3. [`BasePath`] strips the base path from the request path
//! 4. [`ErrorPage`] renders error responses through the `/{status}` route
//! 5. [`NotFound`] answers requests that have no route

mod base_path;
mod determine_route;
mod error_handler;
mod error_page;
mod not_found;
mod request_log;

pub use base_path::BasePath;
pub use determine_route::DetermineRoute;
pub use error_handler::ErrorHandler;
pub use error_page::ErrorPage;
pub use not_found::{Fallback, NotFound};
pub use request_log::RequestLog;
