//! Provider routing crate — centralizes routing configuration, provider
//! resolution, and wire-format adapter dispatch.
//!
//! A caller hands [`Resolver`] a provider name and gets back a
//! [`ProviderDescriptor`]: the resolved endpoint, adapter kind, and auth
//! material, independent of which of the three sources (built-in
//! multiplexer, credential profile, remote API entry) produced it.
//! [`AdapterKind`] wraps the per-wire-format transforms behind enum
//! dispatch. [`ConfigEditor`] mutates the routing document on disk without
//! disturbing hand-written comments or key order.

pub mod config;
pub mod editor;
mod adapter;
mod descriptor;
mod resolver;

pub use {
    config::{RemoteProviderConfig, RoutingConfig, RoutingDefaults, RoutingSection},
    descriptor::{AdapterKind, ProviderDescriptor, ProviderKind},
    editor::ConfigEditor,
    resolver::{
        DEFAULT_ANTHROPIC_BASE_URL, MULTIPLEXER_PORT, MULTIPLEXER_PROVIDERS, ProviderEntry,
        ResolveError, Resolver, multiplexer_base_url,
    },
};
