//! Configuration validation.
//!
//! Checks a parsed configuration for values that would make every fetch
//! fail or every reconciliation ambiguous, before any request is made.

use crate::error::{ConfigError, ListSyncError, Result};
use std::collections::HashSet;
use tracing::debug;

use super::spec::{ApiConfig, ListConfig, PaginationConfig, SyncConfig};

/// Page sizes above this are accepted but most list APIs clamp them.
const LARGE_PAGE_SIZE: u32 = 1000;

/// Validator for configurations.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, config: &SyncConfig) -> Result<ValidationResult> {
        let result = self.check(config);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ListSyncError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    /// Runs every check and collects all errors and warnings.
    #[must_use]
    pub fn check(&self, config: &SyncConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_api(&config.api, &mut result);
        Self::validate_pagination(&config.pagination, &mut result);
        Self::validate_lists(&config.lists, &mut result);

        result
    }

    /// Validates API settings.
    fn validate_api(api: &ApiConfig, result: &mut ValidationResult) {
        if api.base_url.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("api.base_url"),
                message: String::from("Base URL cannot be empty"),
            });
        } else if !api.base_url.starts_with("http://") && !api.base_url.starts_with("https://") {
            result.errors.push(ValidationError {
                field: String::from("api.base_url"),
                message: format!("Base URL '{}' must use http or https", api.base_url),
            });
        } else if api.base_url.starts_with("http://") {
            result
                .warnings
                .push(format!("Base URL '{}' is not using TLS", api.base_url));
        }

        if api.timeout_secs == 0 {
            result.errors.push(ValidationError {
                field: String::from("api.timeout_secs"),
                message: String::from("Timeout must be at least 1 second"),
            });
        }
    }

    /// Validates pagination settings.
    fn validate_pagination(pagination: &PaginationConfig, result: &mut ValidationResult) {
        validate_page_size(pagination.page_size, "pagination.page_size", result);

        if pagination.max_backoff_ms < pagination.initial_backoff_ms {
            result.errors.push(ValidationError {
                field: String::from("pagination.max_backoff_ms"),
                message: format!(
                    "Maximum backoff ({}ms) is lower than initial backoff ({}ms)",
                    pagination.max_backoff_ms, pagination.initial_backoff_ms
                ),
            });
        }

        if pagination.max_pages == Some(0) {
            result.errors.push(ValidationError {
                field: String::from("pagination.max_pages"),
                message: String::from("Page limit must be at least 1"),
            });
        } else if pagination.max_pages.is_some() {
            result.warnings.push(String::from(
                "A page limit is set; lists longer than the limit will be truncated",
            ));
        }
    }

    /// Validates list definitions.
    fn validate_lists(lists: &[ListConfig], result: &mut ValidationResult) {
        if lists.is_empty() {
            result.warnings.push(String::from("No lists defined in configuration"));
            return;
        }

        let mut seen_names = HashSet::new();

        for (i, list) in lists.iter().enumerate() {
            let prefix = format!("lists[{i}]");

            if !seen_names.insert(list.name.as_str()) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!("Duplicate list name: {}", list.name),
                });
            }

            if !is_valid_name(&list.name) {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.name"),
                    message: format!(
                        "List name '{}' is invalid. Must be lowercase alphanumeric with hyphens.",
                        list.name
                    ),
                });
            }

            if list.path.trim_matches('/').is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.path"),
                    message: String::from("Path cannot be empty"),
                });
            }

            if list.key.is_empty() {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.key"),
                    message: String::from("Key field cannot be empty"),
                });
            }

            if list.query.keys().any(|k| k == "page" || k == "page_size") {
                result.errors.push(ValidationError {
                    field: format!("{prefix}.query"),
                    message: String::from("Query cannot set 'page' or 'page_size'"),
                });
            }

            if let Some(size) = list.page_size {
                validate_page_size(size, &format!("{prefix}.page_size"), result);
            }
        }
    }
}

/// Validates a page size value.
fn validate_page_size(size: u32, field: &str, result: &mut ValidationResult) {
    if size == 0 {
        result.errors.push(ValidationError {
            field: field.to_string(),
            message: String::from("Page size must be a positive integer"),
        });
    } else if size > LARGE_PAGE_SIZE {
        result.warnings.push(format!(
            "{field} is {size}; the API may clamp pages above {LARGE_PAGE_SIZE}"
        ));
    }
}

/// Validates that a name follows the naming convention.
/// Names must be lowercase alphanumeric with hyphens, starting with a letter.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };

    if !first.is_ascii_lowercase() {
        return false;
    }

    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
        return false;
    }

    !name.ends_with('-') && !name.contains("--")
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of errors.
    #[must_use]
    pub const fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn list(name: &str, path: &str) -> ListConfig {
        ListConfig {
            name: name.to_string(),
            path: path.to_string(),
            key: String::from("pk"),
            query: BTreeMap::new(),
            page_size: None,
        }
    }

    fn config(lists: Vec<ListConfig>) -> SyncConfig {
        SyncConfig {
            api: ApiConfig {
                base_url: String::from("https://idp.example.com/api/v3"),
                timeout_secs: 30,
                headers: BTreeMap::new(),
            },
            pagination: PaginationConfig::default(),
            state: crate::config::StateConfig::default(),
            lists,
        }
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("group-members"));
        assert!(is_valid_name("mappings2"));
        assert!(is_valid_name("a"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Group")); // uppercase
        assert!(!is_valid_name("1-group")); // starts with number
        assert!(!is_valid_name("group_members")); // underscore
        assert!(!is_valid_name("group-")); // ends with hyphen
        assert!(!is_valid_name("group--members")); // consecutive hyphens
    }

    #[test]
    fn test_valid_config() {
        let validator = ConfigValidator::new();
        let result = validator
            .validate(&config(vec![list("members", "/core/users/")]))
            .unwrap();

        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_duplicate_and_invalid_lists() {
        let mut bad = list("members", "/");
        bad.query.insert(String::from("page"), String::from("2"));
        bad.page_size = Some(0);

        let result = ConfigValidator::new().check(&config(vec![
            list("members", "/core/users/"),
            bad,
        ]));

        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["lists[1].name", "lists[1].path", "lists[1].query", "lists[1].page_size"]
        );
    }

    #[test]
    fn test_pagination_checks() {
        let mut cfg = config(vec![list("members", "/core/users/")]);
        cfg.pagination.page_size = 0;
        cfg.pagination.initial_backoff_ms = 2_000;
        cfg.pagination.max_backoff_ms = 1_000;

        let result = ConfigValidator::new().check(&cfg);
        assert_eq!(result.error_count(), 2);
        assert!(ConfigValidator::new().validate(&cfg).is_err());
    }

    #[test]
    fn test_api_checks() {
        let mut cfg = config(vec![list("members", "/core/users/")]);
        cfg.api.base_url = String::from("ftp://idp.example.com");
        assert_eq!(ConfigValidator::new().check(&cfg).error_count(), 1);

        cfg.api.base_url = String::from("http://localhost:9000/api");
        let result = ConfigValidator::new().check(&cfg);
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_no_lists_warns() {
        let result = ConfigValidator::new().check(&config(vec![]));
        assert!(result.is_valid());
        assert_eq!(result.warnings, vec![String::from("No lists defined in configuration")]);
    }
}
