// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for toolbridge.
//!
//! [`BridgeConfig`] is read from a `toolbridge.toml` file, overridden from
//! `TOOLBRIDGE_*` environment variables and checked with
//! [`validate_config`], which separates hard errors from advisory
//! [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tb_core::{ModelInfo, ModelInfoSource};
use tb_error::{BridgeError, ErrorCode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

impl From<ConfigError> for BridgeError {
    fn from(err: ConfigError) -> Self {
        let base = BridgeError::new(ErrorCode::ConfigInvalid, err.to_string());
        match &err {
            ConfigError::FileNotFound { path } => base.with_context("path", path),
            ConfigError::ParseError { .. } => base,
            ConfigError::ValidationError { reasons } => base.with_context("reasons", reasons),
        }
    }
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// The default framework is switched off in its own table.
    DisabledDefaultFramework {
        /// Framework id.
        framework: String,
    },
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::DisabledDefaultFramework { framework } => {
                write!(f, "default framework '{framework}' is disabled")
            }
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Top-level toolbridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Framework used when a command does not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_framework: Option<String>,

    /// Append a structural `Args:` section to synthesized docstrings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_type_docstring: Option<bool>,

    /// Per-framework settings, keyed by framework id.
    #[serde(default)]
    pub frameworks: BTreeMap<String, FrameworkEntry>,

    /// Model endpoint handed to framework model adapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelEntry>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".into()),
            default_framework: None,
            include_type_docstring: None,
            frameworks: BTreeMap::new(),
            model: None,
        }
    }
}

impl BridgeConfig {
    /// Whether `framework` may be used. Frameworks without a table are on.
    #[must_use]
    pub fn is_enabled(&self, framework: &str) -> bool {
        self.frameworks.get(framework).is_none_or(|f| f.enabled)
    }

    /// Docstring setting for `framework`: its own override, else the global
    /// default, else `false`.
    #[must_use]
    pub fn include_type_docstring_for(&self, framework: &str) -> bool {
        self.frameworks
            .get(framework)
            .and_then(|f| f.include_type_docstring)
            .or(self.include_type_docstring)
            .unwrap_or(false)
    }
}

/// Settings for one framework.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct FrameworkEntry {
    /// Whether the framework may be used.
    #[serde(default = "enabled_default")]
    pub enabled: bool,

    /// Override of the global docstring setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_type_docstring: Option<bool>,
}

fn enabled_default() -> bool {
    true
}

impl Default for FrameworkEntry {
    fn default() -> Self {
        Self {
            enabled: true,
            include_type_docstring: None,
        }
    }
}

/// An OpenAI-compatible model endpoint.
///
/// The API key itself is never stored; `api_key_env` names the variable
/// holding it.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ModelEntry {
    /// Provider id for `provider/model` names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Endpoint base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Extra HTTP headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl ModelEntry {
    /// Connection info, with the API key read through `lookup`.
    pub fn to_model_info_with(&self, lookup: impl Fn(&str) -> Option<String>) -> ModelInfo {
        ModelInfo {
            api_key: self.api_key_env.as_deref().and_then(lookup),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            headers: self.headers.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl ModelInfoSource for ModelEntry {
    fn model_info(&self) -> Result<ModelInfo, BridgeError> {
        Ok(self.to_model_info_with(|var| std::env::var(var).ok()))
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Conventional config file name.
pub const CONFIG_FILE_NAME: &str = "toolbridge.toml";

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`BridgeConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`BridgeConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => BridgeConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`BridgeConfig`].
pub fn parse_toml(content: &str) -> Result<BridgeConfig, ConfigError> {
    toml::from_str::<BridgeConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `TOOLBRIDGE_LOG_LEVEL`
/// - `TOOLBRIDGE_DEFAULT_FRAMEWORK`
/// - `TOOLBRIDGE_TYPE_DOCSTRING` (`1`/`true`/`yes` or `0`/`false`/`no`)
pub fn apply_env_overrides(config: &mut BridgeConfig) {
    apply_overrides_from(config, |var| std::env::var(var).ok());
}

/// [`apply_env_overrides`] over an arbitrary variable source.
pub fn apply_overrides_from(config: &mut BridgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("TOOLBRIDGE_LOG_LEVEL") {
        config.log_level = Some(val);
    }
    if let Some(val) = lookup("TOOLBRIDGE_DEFAULT_FRAMEWORK") {
        config.default_framework = Some(val);
    }
    if let Some(flag) = lookup("TOOLBRIDGE_TYPE_DOCSTRING").as_deref().and_then(parse_flag) {
        config.include_type_docstring = Some(flag);
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (unknown log level, empty framework ids) are returned as a
/// [`ConfigError::ValidationError`]; soft issues come back as warnings.
pub fn validate_config(config: &BridgeConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(ref level) = config.log_level
        && !VALID_LOG_LEVELS.contains(&level.as_str())
    {
        errors.push(format!("invalid log_level '{level}'"));
    }

    for name in config.frameworks.keys() {
        if name.trim().is_empty() {
            errors.push("framework id must not be empty".into());
        }
    }
    if let Some(ref default) = config.default_framework {
        if default.trim().is_empty() {
            errors.push("default_framework must not be empty".into());
        } else if !config.is_enabled(default) {
            warnings.push(ConfigWarning::DisabledDefaultFramework {
                framework: default.clone(),
            });
        }
    }

    if let Some(ref model) = config.model
        && model.base_url.as_deref().is_none_or(|u| u.trim().is_empty())
    {
        warnings.push(ConfigWarning::MissingOptionalField {
            field: "model.base_url".into(),
            hint: "framework model wraps will fail without an endpoint".into(),
        });
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
///
/// Framework maps are combined; on id collisions the overlay entry wins. The
/// model table is replaced as a whole.
pub fn merge_configs(base: BridgeConfig, overlay: BridgeConfig) -> BridgeConfig {
    let mut frameworks = base.frameworks;
    frameworks.extend(overlay.frameworks);
    BridgeConfig {
        log_level: overlay.log_level.or(base.log_level),
        default_framework: overlay.default_framework.or(base.default_framework),
        include_type_docstring: overlay.include_type_docstring.or(base.include_type_docstring),
        frameworks,
        model: overlay.model.or(base.model),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
