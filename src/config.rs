use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::entity_catalog::is_plain_identifier;

pub const ENV_ALIAS_SEPARATOR: &str = "RELNEST_ALIAS_SEPARATOR";
pub const ENV_BASE_ALIAS: &str = "RELNEST_BASE_ALIAS";
pub const ENV_DEFAULT_LIMIT: &str = "RELNEST_DEFAULT_LIMIT";
pub const ENV_MAX_LIMIT: &str = "RELNEST_MAX_LIMIT";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Compiler configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[validate(schema(function = "validate_limits"))]
#[serde(default)]
pub struct CompilerConfig {
    /// Separator between table alias and field in projected column names
    #[validate(custom(function = "validate_separator"))]
    pub alias_separator: String,

    /// Table alias of the root entity
    #[validate(custom(function = "validate_base_alias"))]
    pub base_alias: String,

    /// Limit applied when a request sets none
    #[validate(range(min = 1, message = "default_limit must be at least 1"))]
    pub default_limit: Option<u64>,

    /// Upper bound for any limit
    #[validate(range(min = 1, message = "max_limit must be at least 1"))]
    pub max_limit: Option<u64>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            alias_separator: "___".to_string(),
            base_alias: "base".to_string(),
            default_limit: None,
            max_limit: None,
        }
    }
}

impl CompilerConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            alias_separator: env::var(ENV_ALIAS_SEPARATOR).unwrap_or(defaults.alias_separator),
            base_alias: env::var(ENV_BASE_ALIAS).unwrap_or(defaults.base_alias),
            default_limit: parse_optional_env_var(ENV_DEFAULT_LIMIT)?,
            max_limit: parse_optional_env_var(ENV_MAX_LIMIT)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI overrides on top of this configuration (CLI wins) and validate
    pub fn merge_cli(mut self, cli: CliConfig) -> Result<Self, ConfigError> {
        if let Some(separator) = cli.alias_separator {
            self.alias_separator = separator;
        }
        if let Some(base_alias) = cli.base_alias {
            self.base_alias = base_alias;
        }
        if cli.default_limit.is_some() {
            self.default_limit = cli.default_limit;
        }
        if cli.max_limit.is_some() {
            self.max_limit = cli.max_limit;
        }

        self.validate()?;
        Ok(self)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub alias_separator: Option<String>,
    pub base_alias: Option<String>,
    pub default_limit: Option<u64>,
    pub max_limit: Option<u64>,
}

fn validate_separator(separator: &str) -> Result<(), ValidationError> {
    // aliases and fields are alphanumeric, so the separator must not be
    if separator.chars().count() < 2 || separator.chars().any(char::is_alphanumeric) {
        let mut error = ValidationError::new("alias_separator");
        error.message =
            Some("alias separator needs at least two non-alphanumeric characters".into());
        return Err(error);
    }
    Ok(())
}

fn validate_base_alias(alias: &str) -> Result<(), ValidationError> {
    if !is_plain_identifier(alias) {
        let mut error = ValidationError::new("base_alias");
        error.message = Some("base alias must be a plain identifier".into());
        return Err(error);
    }
    Ok(())
}

fn validate_limits(config: &CompilerConfig) -> Result<(), ValidationError> {
    if let (Some(default), Some(max)) = (config.default_limit, config.max_limit) {
        if default > max {
            let mut error = ValidationError::new("default_limit");
            error.message = Some("default_limit cannot exceed max_limit".into());
            return Err(error);
        }
    }
    Ok(())
}

/// Parse an environment variable that may be unset
fn parse_optional_env_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = match env::var(key) {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    value.parse().map(Some).map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
