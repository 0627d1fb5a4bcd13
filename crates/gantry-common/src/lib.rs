//! Common types for gantry: domain model, errors, and utilities

#![deny(missing_docs)]

pub mod error;
pub mod model;
pub mod retry;
pub mod telemetry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
