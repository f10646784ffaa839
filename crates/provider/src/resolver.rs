//! Provider name resolution.
//!
//! Three sources, checked in order with no fallthrough once one matches:
//! built-in multiplexer identifiers, credential-profile entries in the
//! routing document, then remote API entries. The routing document is
//! re-read on every call so external edits take effect immediately.

use crate::config::{RemoteProviderConfig, RoutingConfig};
use crate::{AdapterKind, ProviderDescriptor, ProviderKind};
use compact_str::CompactString;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Fixed local port the multiplexer listens on.
pub const MULTIPLEXER_PORT: u16 = 3456;

/// Built-in provider identifiers fronted by the multiplexer.
pub const MULTIPLEXER_PROVIDERS: &[&str] = &["agy", "codex", "gemini", "qwen"];

/// Base URL used for credential profiles whose settings file names none.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Per-provider base URL on the local multiplexer.
pub fn multiplexer_base_url(name: &str) -> String {
    format!("http://127.0.0.1:{MULTIPLEXER_PORT}/api/provider/{name}/v1")
}

/// Why a provider name could not be resolved. Callers treat every variant
/// as "provider not found/unusable" — none of these reach the request path
/// as a panic or a raw IO error.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The name matched none of the three sources.
    #[error("provider '{0}' not found")]
    UnknownProvider(CompactString),
    /// The name matched a credential profile whose settings file is
    /// missing or unparsable. Resolution stops here — profile hits never
    /// fall through to the remote API map.
    #[error("profile '{name}' is unusable: {reason}")]
    ProfileUnusable { name: CompactString, reason: String },
    /// A configured base URL failed to parse.
    #[error("provider '{name}' has an invalid base url '{url}'")]
    InvalidBaseUrl {
        name: CompactString,
        url: String,
        #[source]
        source: url::ParseError,
    },
    /// The routing document itself could not be read or parsed.
    #[error("unusable routing config: {0}")]
    Config(String),
}

/// Summary of one provider entry, cheap to enumerate (no settings-file
/// reads, no env lookups).
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    /// Provider name.
    pub name: CompactString,
    /// Resolution source the name would hit.
    pub kind: ProviderKind,
}

/// Resolves provider names against the three routing sources.
pub struct Resolver {
    config_path: PathBuf,
}

/// Well-known fields inside a credential-profile settings file.
#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    env: SettingsEnv,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsEnv {
    #[serde(rename = "ANTHROPIC_BASE_URL")]
    base_url: Option<String>,
    #[serde(rename = "ANTHROPIC_AUTH_TOKEN")]
    auth_token: Option<String>,
}

impl Resolver {
    /// Create a resolver reading the routing document at `config_path`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Create a resolver on the global config path (`~/.rudder/rudder.toml`).
    pub fn global() -> Self {
        Self::new(crate::config::config_path())
    }

    /// Resolve a provider name to a descriptor. First matching source
    /// wins; a match that turns out unusable is an error, not a reason to
    /// try the next source.
    pub fn resolve(&self, name: &str) -> Result<ProviderDescriptor, ResolveError> {
        if MULTIPLEXER_PROVIDERS.contains(&name) {
            let descriptor = self.multiplexer_descriptor(name)?;
            tracing::debug!(provider = name, "resolved built-in multiplexer provider");
            return Ok(descriptor);
        }

        let config = self.load_config()?;
        if let Some(settings_path) = config.routing.profiles.get(name) {
            let descriptor = self.profile_descriptor(name, settings_path)?;
            tracing::debug!(provider = name, "resolved credential profile");
            return Ok(descriptor);
        }
        if let Some(remote) = config.routing.providers.get(name) {
            let descriptor = self.remote_descriptor(name, remote)?;
            tracing::debug!(provider = name, "resolved remote API provider");
            return Ok(descriptor);
        }

        Err(ResolveError::UnknownProvider(name.into()))
    }

    /// Resolve every provider from all three sources. First source wins on
    /// a name collision. Profiles whose settings file is unusable are
    /// omitted rather than failing the whole enumeration.
    pub fn all_providers(&self) -> Result<Vec<ProviderDescriptor>, ResolveError> {
        let config = self.load_config()?;
        let mut seen = BTreeSet::new();
        let mut providers = Vec::new();

        for name in MULTIPLEXER_PROVIDERS {
            seen.insert(CompactString::from(*name));
            providers.push(self.multiplexer_descriptor(name)?);
        }
        for (name, settings_path) in &config.routing.profiles {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.profile_descriptor(name, settings_path) {
                Ok(descriptor) => providers.push(descriptor),
                Err(err) => tracing::debug!(provider = %name, "skipping profile: {err}"),
            }
        }
        for (name, remote) in &config.routing.providers {
            if !seen.insert(name.clone()) {
                continue;
            }
            providers.push(self.remote_descriptor(name, remote)?);
        }
        Ok(providers)
    }

    /// Enumerate provider names and kinds without resolving endpoints or
    /// credentials. Collisions follow the same first-source-wins rule as
    /// [`Self::resolve`].
    pub fn list(&self) -> Result<Vec<ProviderEntry>, ResolveError> {
        let config = self.load_config()?;
        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();

        for name in MULTIPLEXER_PROVIDERS {
            seen.insert(CompactString::from(*name));
            entries.push(ProviderEntry {
                name: CompactString::from(*name),
                kind: ProviderKind::Multiplexer,
            });
        }
        for name in config.routing.profiles.keys() {
            if seen.insert(name.clone()) {
                entries.push(ProviderEntry {
                    name: name.clone(),
                    kind: ProviderKind::CredentialProfile,
                });
            }
        }
        for name in config.routing.providers.keys() {
            if seen.insert(name.clone()) {
                entries.push(ProviderEntry {
                    name: name.clone(),
                    kind: ProviderKind::RemoteApi,
                });
            }
        }
        Ok(entries)
    }

    fn load_config(&self) -> Result<RoutingConfig, ResolveError> {
        RoutingConfig::load(&self.config_path).map_err(|err| ResolveError::Config(format!("{err:#}")))
    }

    fn multiplexer_descriptor(&self, name: &str) -> Result<ProviderDescriptor, ResolveError> {
        // The multiplexer holds its own credentials; no token travels with
        // the descriptor.
        let base_url = parse_base_url(name, &multiplexer_base_url(name))?;
        Ok(ProviderDescriptor::new(
            name,
            ProviderKind::Multiplexer,
            AdapterKind::AnthropicPassthrough,
            base_url,
        ))
    }

    fn profile_descriptor(
        &self,
        name: &str,
        settings_path: &str,
    ) -> Result<ProviderDescriptor, ResolveError> {
        let raw = std::fs::read_to_string(settings_path).map_err(|err| {
            ResolveError::ProfileUnusable {
                name: name.into(),
                reason: format!("cannot read {settings_path}: {err}"),
            }
        })?;
        let settings: SettingsFile =
            serde_json::from_str(&raw).map_err(|err| ResolveError::ProfileUnusable {
                name: name.into(),
                reason: format!("cannot parse {settings_path}: {err}"),
            })?;

        let base = settings
            .env
            .base_url
            .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_owned());
        let base_url = parse_base_url(name, &base)?;
        Ok(ProviderDescriptor::new(
            name,
            ProviderKind::CredentialProfile,
            AdapterKind::AnthropicPassthrough,
            base_url,
        )
        .with_auth_token(settings.env.auth_token))
    }

    fn remote_descriptor(
        &self,
        name: &str,
        remote: &RemoteProviderConfig,
    ) -> Result<ProviderDescriptor, ResolveError> {
        // A missing credential variable is not an error — the descriptor
        // travels unauthenticated and the upstream rejects it.
        let token = std::env::var(&remote.auth_env)
            .ok()
            .filter(|token| !token.is_empty());
        if token.is_none() {
            tracing::debug!(provider = name, env = %remote.auth_env, "auth env var unset");
        }
        let base_url = parse_base_url(name, &remote.base_url)?;
        Ok(ProviderDescriptor::new(
            name,
            ProviderKind::RemoteApi,
            remote.adapter,
            base_url,
        )
        .with_auth_token(token)
        .with_headers(remote.headers.clone()))
    }
}

fn parse_base_url(name: &str, url: &str) -> Result<Url, ResolveError> {
    Url::parse(url).map_err(|source| ResolveError::InvalidBaseUrl {
        name: name.into(),
        url: url.to_owned(),
        source,
    })
}
