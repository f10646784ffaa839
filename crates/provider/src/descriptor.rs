//! Resolved provider descriptor and its discriminant tags.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// Which resolution source produced a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Fronted by the shared local multiplexer process.
    Multiplexer,
    /// Connection details stored in a settings file on disk.
    CredentialProfile,
    /// Fully described in the routing document, credential via env var.
    RemoteApi,
}

impl ProviderKind {
    /// Human-readable kind string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multiplexer => "multiplexer",
            Self::CredentialProfile => "credential-profile",
            Self::RemoteApi => "remote-api",
        }
    }
}

/// Which wire-format adapter a descriptor requires.
///
/// Callers dispatch on this tag alone — never on [`ProviderKind`]. Adding a
/// provider wire format means adding one variant here plus one arm per
/// transform in `adapter.rs`; call sites stay untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// Upstream already speaks the unified format; requests and responses
    /// pass through unchanged.
    #[default]
    AnthropicPassthrough,
}

/// A resolved, ready-to-use provider. Constructed fresh on every
/// resolution, immutable afterwards, never persisted.
#[derive(Clone)]
pub struct ProviderDescriptor {
    /// Caller-supplied provider name.
    pub name: CompactString,
    /// Resolution source.
    pub kind: ProviderKind,
    /// Wire-format adapter tag.
    pub adapter: AdapterKind,
    /// Endpoint base URL. Parsed at construction — always a valid
    /// absolute URL.
    pub base_url: Url,
    /// Bearer credential. Private: read via [`Self::auth_token`], masked
    /// in `Debug` so it can never reach a log line.
    auth_token: Option<String>,
    /// Extra HTTP headers merged into every request.
    pub extra_headers: BTreeMap<CompactString, String>,
}

impl ProviderDescriptor {
    /// Create a descriptor with no auth token and no extra headers.
    pub fn new(
        name: impl Into<CompactString>,
        kind: ProviderKind,
        adapter: AdapterKind,
        base_url: Url,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            adapter,
            base_url,
            auth_token: None,
            extra_headers: BTreeMap::new(),
        }
    }

    /// Attach an auth token.
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }

    /// Attach extra headers.
    pub fn with_headers(mut self, headers: BTreeMap<CompactString, String>) -> Self {
        self.extra_headers = headers;
        self
    }

    /// The bearer credential, if any.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("adapter", &self.adapter)
            .field("base_url", &self.base_url.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("extra_headers", &self.extra_headers)
            .finish()
    }
}
