//! Run configuration.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional YAML file, then `REAP_*` environment variables
//! (`REAP_NETWORK__TIMEOUT=60`, `REAP_KEEP__EXTRA_TAGS=dev,edge`).

use crate::error::{ReapError, Result};
use crate::matrix::DEFAULT_MATRIX_KEY;
use config::{Config as ConfigRs, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;


/// Prefix of environment variables that override configuration.
pub const ENV_PREFIX: &str = "REAP";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub github: Github,
    #[serde(default)]
    pub keep: Keep,
}

impl Config {
    /// Parses a `Config` from a YAML string layered over the defaults.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = Self::defaults_builder()?.add_source(File::from_str(s, FileFormat::Yaml));
        Self::from_builder(builder)
    }

    /// Loads configuration from an optional file plus the process
    /// environment.
    ///
    /// A missing file at `path` is an error; pass `None` to skip the file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`Config::load`], reading environment overrides from `env`
    /// instead of the process environment when given.
    pub fn load_with_env(path: Option<&Path>, env: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = Self::defaults_builder()?;

        if let Some(p) = path {
            if !p.exists() {
                return Err(ReapError::config(
                    "Config file does not exist".to_string(),
                    Some(p.display().to_string()),
                ));
            }
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("keep.releases")
            .with_list_parse_key("keep.extra_tags")
            .source(env);

        Self::from_builder(builder.add_source(environment))
    }

    fn defaults_builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = ConfigRs::try_from(&Config::default()).map_err(|e| {
            ReapError::config_with_source(
                "Failed to build default configuration",
                None::<String>,
                e,
            )
        })?;
        Ok(ConfigRs::builder().add_source(defaults))
    }

    fn from_builder(builder: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                ReapError::config_with_source(
                    "Failed to deserialize configuration",
                    None::<String>,
                    e,
                )
            })
    }
}

/// Output formatting settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Output {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorChoice,
}

/// Output formats for plans and reports.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,

    Json,

    Yaml,
}

impl FromStr for OutputFormat {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(ReapError::validation(format!(
                "Unknown output format '{}' (expected pretty, json or yaml)",
                other
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

/// Color output choices.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,

    Always,

    Never,
}

impl FromStr for ColorChoice {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(ReapError::validation(format!(
                "Unknown color choice '{}' (expected auto, always or never)",
                other
            ))),
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Always => f.write_str("always"),
            Self::Never => f.write_str("never"),
        }
    }
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Network {
    /// Request timeout in seconds
    #[serde(default = "default_network_timeout")]
    pub timeout: u64,

    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            timeout: default_network_timeout(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

fn default_network_timeout() -> u64 {
    30
}

fn default_max_idle_per_host() -> usize {
    10
}

/// Which registry API a run talks to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OCI Distribution v2 (`/v2/...`)
    #[default]
    Oci,
    /// GitHub Packages REST API
    Github,
}

impl FromStr for BackendKind {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "oci" => Ok(Self::Oci),
            "github" | "ghcr" => Ok(Self::Github),
            other => Err(ReapError::validation(format!(
                "Unknown backend '{}' (expected oci or github)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oci => f.write_str("oci"),
            Self::Github => f.write_str("github"),
        }
    }
}

/// Registry connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RegistrySettings {
    #[serde(default)]
    pub backend: BackendKind,

    /// Use plain HTTP for OCI registries
    #[serde(default)]
    pub insecure: bool,

    /// The OCI registry accepts `DELETE /v2/<name>/manifests/<tag>`
    #[serde(default)]
    pub tag_deletion: bool,
}

/// Whose namespace a GitHub package lives in.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    /// `/orgs/<owner>/packages/...`
    #[default]
    Org,
    /// `/users/<owner>/packages/...`
    User,
    /// `/user/packages/...` (the token's own account)
    Authenticated,
}

impl FromStr for OwnerKind {
    type Err = ReapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "org" | "organization" => Ok(Self::Org),
            "user" => Ok(Self::User),
            "authenticated" | "self" => Ok(Self::Authenticated),
            other => Err(ReapError::validation(format!(
                "Unknown owner kind '{}' (expected org, user or authenticated)",
                other
            ))),
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Org => f.write_str("org"),
            Self::User => f.write_str("user"),
            Self::Authenticated => f.write_str("authenticated"),
        }
    }
}

/// GitHub Packages settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Github {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    #[serde(default)]
    pub owner_kind: OwnerKind,

    /// Registry serving the package's manifests; the image's registry
    /// (`ghcr.io`) when unset
    #[serde(default)]
    pub registry_url: Option<String>,
}

impl Default for Github {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            owner_kind: OwnerKind::default(),
            registry_url: None,
        }
    }
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

/// Keep-set sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Keep {
    /// Supported releases listed directly
    #[serde(default)]
    pub releases: Vec<String>,

    /// Extra tags to preserve
    #[serde(default)]
    pub extra_tags: Vec<String>,

    /// JSON build matrix listing supported releases
    #[serde(default)]
    pub matrix_file: Option<PathBuf>,

    /// Field naming the release in matrix entries
    #[serde(default = "default_matrix_key")]
    pub matrix_key: String,
}

impl Default for Keep {
    fn default() -> Self {
        Self {
            releases: Vec::new(),
            extra_tags: Vec::new(),
            matrix_file: None,
            matrix_key: default_matrix_key(),
        }
    }
}

fn default_matrix_key() -> String {
    DEFAULT_MATRIX_KEY.to_string()
}
