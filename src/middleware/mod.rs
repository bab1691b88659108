//! Route surface for Axum: the Route Guard plus the portal's own routes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use coderunner_portal::middleware::{PortalRoutesConfig, portal_routes};
//!
//! // AUTH_SERVICE_URL / EXECUTOR_SERVICE_URL from the environment
//! let config = PortalRoutesConfig::from_env()?;
//!
//! let app = axum::Router::new().merge(portal_routes(config));
//! ```
//!
//! To guard routes of your own, wrap them with [`protect`] or use
//! [`RequireCredential`] as an extractor.

mod config;
mod cookies;
mod error;
mod extractor;
mod guard;
mod routes;
mod state;

pub use config::{GuardSettings, PortalRoutesConfig};
pub use error::PortalError;
pub use extractor::RequireCredential;
pub use guard::{protect, require_credential};
pub use routes::portal_routes;
