//! Configuration module for listsync.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing `listsync.yaml`
//! - Environment variable overrides and `.env` loading
//! - Validation of configuration values

mod parser;
mod spec;
mod validator;

pub use parser::{
    find_config_file, ConfigParser, DEFAULT_CONFIG_FILES, ENV_API_URL, ENV_PAGE_SIZE,
    ENV_STATE_PATH,
};
pub use spec::{ApiConfig, ListConfig, PaginationConfig, StateConfig, SyncConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
