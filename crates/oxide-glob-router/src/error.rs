//! Error types for routing.

use std::path::PathBuf;

use thiserror::Error;

/// Router-specific errors.
///
/// Expected routing outcomes (no route, wrong method, an expression that
/// binds to nothing) are not errors; they surface as responses, `None` or
/// omitted fields. What ends up here is either a configuration mistake,
/// a fault in the runner that was asked to execute a route, or a failure
/// raised by application code further down the pipeline.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A route was registered without a pattern.
    #[error("unable to add a route without a pattern")]
    EmptyPattern,

    /// The route key could not be parsed.
    #[error("invalid route key '{key}': {reason}")]
    InvalidRouteKey { key: String, reason: String },

    /// The route template has the wrong shape.
    #[error("invalid route template for '{key}': {reason}")]
    InvalidTemplate { key: String, reason: String },

    /// `$N...` was used where positional semantics are not available.
    #[error("binding multiple parts using '{0}' is only allowed in ordered lists")]
    MultiPartInMap(String),

    /// A configured status code is out of range.
    #[error("invalid status code {0}: expected a code in range 100-599")]
    InvalidStatus(u16),

    /// The base path does not contain a single URL segment.
    #[error("base path must have at least one url segment, got '{0}'")]
    InvalidBasePath(String),

    /// The derived controller name is not a valid name.
    #[error("can't route to controller '{0}': invalid name")]
    InvalidController(String),

    /// No controller is registered under the derived name.
    #[error("can't route to controller '{name}': {reason}")]
    ControllerNotFound { name: String, reason: String },

    /// The route has neither `controller`, `fn` nor `file`.
    #[error("route has neither 'controller', 'fn' or 'file' defined")]
    NoAction,

    /// The action field exists but holds the wrong kind of value.
    #[error("'{field}' property of route {reason}")]
    InvalidAction { field: &'static str, reason: String },

    /// The script referenced by the route cannot be run.
    #[error("failed to route using '{path}': {reason}")]
    Script { path: PathBuf, reason: String },

    /// Application code failed while producing a response.
    #[error("handler failed: {0}")]
    Handler(String),

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panic(String),

    /// Malformed JSON configuration.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (reading configuration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouterError {
    /// Creates a handler error from any displayable value.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }

    /// Returns true for mistakes in the router setup.
    ///
    /// These are raised while building tables, templates and middleware and
    /// are never turned into responses.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EmptyPattern
                | Self::InvalidRouteKey { .. }
                | Self::InvalidTemplate { .. }
                | Self::MultiPartInMap(_)
                | Self::InvalidStatus(_)
                | Self::InvalidBasePath(_)
                | Self::Json(_)
        )
    }

    /// Returns true when a matched route could not be turned into an
    /// invocation (missing, misnamed or non-invocable target).
    #[must_use]
    pub const fn is_runner_fault(&self) -> bool {
        matches!(
            self,
            Self::InvalidController(_)
                | Self::ControllerNotFound { .. }
                | Self::NoAction
                | Self::InvalidAction { .. }
                | Self::Script { .. }
        )
    }
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
