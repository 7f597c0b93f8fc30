pub mod config;
pub mod error;

pub mod machine;
pub mod reactive;

pub use config::GraphConfig;
pub use error::{ConfigError, Error, Result};
