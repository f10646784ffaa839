//! Routing configuration loaded from TOML.
//!
//! The document at `~/.rudder/rudder.toml` is hand-maintained: reads go
//! through serde here, while mutations go through [`crate::ConfigEditor`]
//! so comments and key order survive. The resolver re-reads the file on
//! every resolution — external edits must be visible immediately, so no
//! in-process copy of the document is kept.

use crate::AdapterKind;
use anyhow::{Context, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Routing configuration filename.
pub const CONFIG_FILE: &str = "rudder.toml";

/// Resolve the global configuration directory (`~/.rudder/`).
pub fn global_config_dir() -> PathBuf {
    dirs::home_dir().expect("no home directory").join(".rudder")
}

/// Pinned routing configuration path (`~/.rudder/rudder.toml`).
pub fn config_path() -> PathBuf {
    global_config_dir().join(CONFIG_FILE)
}

/// Top-level routing configuration document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// The `[routing]` section.
    #[serde(default)]
    pub routing: RoutingSection,
}

/// The `[routing]` section: profile mappings, remote API providers, and
/// defaults.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RoutingSection {
    /// Credential-profile name → settings file path.
    #[serde(default)]
    pub profiles: BTreeMap<CompactString, String>,
    /// Remote API provider definitions.
    #[serde(default)]
    pub providers: BTreeMap<CompactString, RemoteProviderConfig>,
    /// Routing defaults applied when the caller names no provider.
    #[serde(default)]
    pub defaults: RoutingDefaults,
}

/// A remote API provider fully described in the routing document. The
/// credential itself stays out of the file — only the name of the
/// environment variable holding it is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteProviderConfig {
    /// Endpoint base URL.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub auth_env: String,
    /// Wire-format adapter for this provider.
    #[serde(default)]
    pub adapter: AdapterKind,
    /// Extra HTTP headers sent with every request.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<CompactString, String>,
}

/// Routing defaults. All fields optional — [`crate::ConfigEditor`] merges
/// partial updates into the existing table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDefaults {
    /// Default provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<CompactString>,
    /// Default model identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<CompactString>,
}

impl RoutingConfig {
    /// Parse a TOML string into a `RoutingConfig`.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).context("failed to parse routing config")?;
        Ok(config)
    }

    /// Load configuration from a file path. A missing file is an empty
    /// configuration, not an error — the document is created on first edit.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }
}

/// Default routing document written on first run.
const DEFAULT_CONFIG_TOML: &str = r#"# rudder routing configuration.
#
# [routing.profiles] maps a provider name to a settings file on disk:
#   glm = "/home/me/.claude/settings-glm.json"
#
# [routing.providers.<name>] defines a remote API provider inline:
#   base_url = "https://api.example.com/v1"
#   auth_env = "EXAMPLE_API_KEY"

[routing.defaults]
# provider = "agy"
"#;

/// Scaffold the config directory and a commented default document on first
/// run. Existing files are left untouched.
pub fn scaffold_config_dir(config_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("failed to create {}", config_dir.display()))?;

    let config_file = config_dir.join(CONFIG_FILE);
    if !config_file.exists() {
        std::fs::write(&config_file, DEFAULT_CONFIG_TOML)
            .with_context(|| format!("failed to write {}", config_file.display()))?;
        tracing::info!("scaffolded {}", config_file.display());
    }
    Ok(())
}
