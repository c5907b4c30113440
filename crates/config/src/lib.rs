mod models;
mod defaults;
mod loader;
mod migration;
mod errors;
mod validation;

pub use models::*;
pub use defaults::DEFAULT_CONFIG_TEMPLATE;
pub use errors::ConfigError;
