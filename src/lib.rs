pub mod cli;
pub mod commands;
pub mod config;
pub mod covariates;
pub mod error;
pub mod utils;

// Re-export main API
pub use covariates::*;
pub use error::CovariateError;
