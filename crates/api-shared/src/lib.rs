//! # API Shared
//!
//! Shared definitions for the quotes API surfaces.
//!
//! Contains:
//! - Wire schemas returned by the read API (`schema` module)
//! - Shared services like `HealthService`
//!
//! Used by `quotes-core` (to build responses from stored quotes) and `api-rest`.

pub mod health;
pub mod schema;

pub use health::HealthService;
pub use schema::*;
