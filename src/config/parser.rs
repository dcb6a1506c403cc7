//! Configuration parser for loading configuration files.
//!
//! This module handles loading configuration from YAML files and environment
//! variables, with proper precedence and error handling.

use crate::error::{ConfigError, ListSyncError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::spec::SyncConfig;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "LISTSYNC_API_URL";

/// Environment variable overriding `pagination.page_size`.
pub const ENV_PAGE_SIZE: &str = "LISTSYNC_PAGE_SIZE";

/// Environment variable overriding `state.path`.
pub const ENV_STATE_PATH: &str = "LISTSYNC_STATE_PATH";

/// Configuration parser.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving the `.env` file.
    base_path: Option<PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving the `.env` file.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SyncConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ListSyncError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ListSyncError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<SyncConfig> {
        debug!("Parsing YAML configuration");

        let config: SyncConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ListSyncError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!(
            "Parsed configuration for {} with {} lists",
            config.api.base_url,
            config.lists.len()
        );
        Ok(config)
    }

    /// Loads configuration with environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override holds an invalid value.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<SyncConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_overrides(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name.
    fn apply_overrides(
        config: &mut SyncConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!("Overriding api.base_url from environment");
            config.api.base_url = url;
        }

        if let Some(size) = lookup(ENV_PAGE_SIZE) {
            debug!("Overriding pagination.page_size from environment");
            config.pagination.page_size = size.trim().parse().map_err(|_| {
                ListSyncError::Config(ConfigError::InvalidEnvVar {
                    name: ENV_PAGE_SIZE.to_string(),
                    value: size.clone(),
                })
            })?;
        }

        if let Some(path) = lookup(ENV_STATE_PATH) {
            debug!("Overriding state.path from environment");
            config.state.path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ListSyncError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["listsync.yaml", "listsync.yml"];

/// Finds the configuration file in the given directory or its parents.
///
/// # Errors
///
/// Returns an error if no configuration file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ListSyncError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"
api:
  base_url: https://idp.example.com/api/v3
  timeout_secs: 10
  headers:
    Accept: application/json

pagination:
  page_size: 50
  max_retries: 2
  initial_backoff_ms: 250

state:
  path: /var/lib/listsync/state.json

lists:
  - name: admins-members
    path: /core/users/
    key: pk
    query:
      groups_by_name: admins
  - name: oauth-mappings
    path: /propertymappings/all/
    page_size: 20
"#;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r"
api:
  base_url: http://localhost:9000/api
";
        let config = ConfigParser::new().parse_yaml(yaml, None).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:9000/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.pagination.page_size, 100);
        assert!(config.lists.is_empty());
        assert!(config.state.path.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let config = ConfigParser::new().parse_yaml(FULL_CONFIG, None).unwrap();

        assert_eq!(config.pagination.page_size, 50);
        assert_eq!(config.pagination.max_backoff_ms, 10_000);
        assert_eq!(config.lists.len(), 2);

        let members = config.list("admins-members").unwrap();
        assert_eq!(members.key, "pk");
        assert_eq!(members.query.get("groups_by_name").map(String::as_str), Some("admins"));

        let mappings = config.list("oauth-mappings").unwrap();
        assert_eq!(mappings.key, "pk");
        assert_eq!(config.fetch_options_for(mappings).unwrap().page_size.get(), 20);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = ConfigParser::new().parse_yaml("api: [", None);
        assert!(matches!(
            result,
            Err(ListSyncError::Config(ConfigError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ConfigParser::new().parse_yaml(FULL_CONFIG, None).unwrap();
        let vars: HashMap<&str, &str> = [
            (ENV_API_URL, "http://127.0.0.1:8080/api"),
            (ENV_PAGE_SIZE, " 25 "),
            (ENV_STATE_PATH, "state.json"),
        ]
        .into_iter()
        .collect();

        ConfigParser::apply_overrides(&mut config, |name| {
            vars.get(name).map(|v| (*v).to_string())
        })
        .unwrap();

        assert_eq!(config.api.base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.pagination.page_size, 25);
        assert_eq!(config.state.path, Some(PathBuf::from("state.json")));
    }

    #[test]
    fn test_invalid_page_size_override() {
        let mut config = ConfigParser::new().parse_yaml(FULL_CONFIG, None).unwrap();

        let result = ConfigParser::apply_overrides(&mut config, |name| {
            (name == ENV_PAGE_SIZE).then(|| String::from("lots"))
        });

        assert!(matches!(
            result,
            Err(ListSyncError::Config(ConfigError::InvalidEnvVar { .. }))
        ));
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join("listsync.yml"), FULL_CONFIG).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, temp.path().join("listsync.yml"));

        let config = ConfigParser::new().load_file(&found).unwrap();
        assert_eq!(config.lists.len(), 2);
    }
}
