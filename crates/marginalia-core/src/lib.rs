pub mod config;
pub mod error;
pub mod identity;
pub mod models;
pub mod normalize;

pub use config::{AppConfig, FilterOptions, MergeMode, ProcessOptions};
pub use error::{MarginaliaError, Result};
pub use models::*;
