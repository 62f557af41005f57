//! HTTP surface of the school document generators, called by n8n workflows.

pub mod app;
pub mod error;
pub mod params;
pub mod routes;

pub use error::{ApiError, Result};
