pub mod config;
pub mod error;
pub mod logging;

pub use config::EscolaConfig;
pub use error::{ErrorCategory, EscolaError, Result};
