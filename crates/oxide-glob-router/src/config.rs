//! Declarative router configuration.
//!
//! ```json
//! {
//!     "base_path": "/app",
//!     "method_not_allowed": 405,
//!     "error_page": true,
//!     "routes": {
//!         "/ +GET": {"controller": "default"},
//!         "/users/# +GET": {"controller": "user", "id": "$2"}
//!     }
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Result, RouterError};
use crate::middleware::BasePath;
use crate::router::FaultPolicy;

/// Router configuration, usually loaded from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Serve the application below this path.
    pub base_path: Option<String>,
    /// Status for requests without a route.
    pub not_found: u16,
    /// Status for requests with a route for another method. Without it such
    /// requests get the not-found status.
    pub method_not_allowed: Option<u16>,
    /// Render error responses through the `/{status}` route.
    pub error_page: bool,
    /// Turn errors and panics into a 500 response.
    pub catch_errors: bool,
    /// What to do when a matched route can't be run.
    pub runner_faults: FaultPolicy,
    /// Route keys mapped to templates, in declaration order.
    pub routes: Value,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            not_found: 404,
            method_not_allowed: None,
            error_page: false,
            catch_errors: false,
            runner_faults: FaultPolicy::default(),
            routes: Value::Object(Map::new()),
        }
    }
}

impl RouterConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Checks the values serde can't check.
    pub fn validate(&self) -> Result<()> {
        for status in std::iter::once(self.not_found).chain(self.method_not_allowed) {
            if !(100..=599).contains(&status) {
                return Err(RouterError::InvalidStatus(status));
            }
        }

        if let Some(base) = &self.base_path {
            BasePath::new(base)?;
        }

        if !self.routes.is_object() {
            return Err(RouterError::InvalidTemplate {
                key: "routes".to_string(),
                reason: "expected an object of route keys".to_string(),
            });
        }

        Ok(())
    }
}
