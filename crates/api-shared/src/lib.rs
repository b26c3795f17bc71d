//! # API Shared
//!
//! Shared wire definitions for the PMS APIs.
//!
//! Contains:
//! - Request and response bodies (`types` module) with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; kept free of core types so the wire format can be read on its own.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;
