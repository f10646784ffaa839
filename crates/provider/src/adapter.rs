//! Wire-format adapter dispatch.
//!
//! Every transform dispatches on [`AdapterKind`] via enum match, following
//! the same enum dispatch pattern as the resolver's kind handling. The
//! passthrough kind covers upstreams that already speak the unified
//! format; richer kinds remap fields per arm without changing any call
//! site.

use crate::{AdapterKind, ProviderDescriptor};
use anyhow::{Context, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

impl AdapterKind {
    /// Convert a unified request into the provider's native form, routing
    /// it at `model`.
    pub fn build_request(&self, unified: &Value, model: &str) -> Value {
        match self {
            Self::AnthropicPassthrough => passthrough::build_request(unified, model),
        }
    }

    /// Convert a provider-native response back into unified form.
    pub fn parse_response(&self, native: Value) -> Value {
        match self {
            Self::AnthropicPassthrough => native,
        }
    }

    /// Convert a provider-native stream chunk back into unified form.
    pub fn parse_stream_chunk(&self, chunk: Value) -> Value {
        match self {
            Self::AnthropicPassthrough => chunk,
        }
    }

    /// Request headers for the descriptor: JSON content type, a bearer
    /// authorization header when the descriptor carries a token, and the
    /// descriptor's extra headers merged last (extras may override both).
    pub fn headers(&self, descriptor: &ProviderDescriptor) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = descriptor.auth_token() {
            headers.insert(
                header::AUTHORIZATION,
                format!("Bearer {token}")
                    .parse()
                    .context("auth token is not a valid header value")?,
            );
        }
        for (name, value) in &descriptor.extra_headers {
            let name: HeaderName = name
                .as_str()
                .parse()
                .with_context(|| format!("invalid header name '{name}'"))?;
            let value: HeaderValue = value
                .parse()
                .with_context(|| format!("invalid value for header '{name}'"))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }

    /// The completion endpoint for the descriptor. Trailing slashes on the
    /// base are stripped, and a base already ending in the version prefix
    /// does not get it doubled.
    pub fn endpoint(&self, descriptor: &ProviderDescriptor) -> Result<Url> {
        let base = descriptor.base_url.as_str().trim_end_matches('/');
        let path = match self {
            Self::AnthropicPassthrough => {
                if base.ends_with("/v1") {
                    "/messages"
                } else {
                    "/v1/messages"
                }
            }
        };
        Url::parse(&format!("{base}{path}"))
            .with_context(|| format!("invalid endpoint for '{}'", descriptor.name))
    }
}

mod passthrough {
    use serde_json::Value;

    /// Pass the unified request through unchanged except for the model
    /// field, which is overwritten with the routing target.
    pub(super) fn build_request(unified: &Value, model: &str) -> Value {
        let mut request = unified.clone();
        if let Some(object) = request.as_object_mut() {
            object.insert("model".to_owned(), Value::String(model.to_owned()));
        }
        request
    }
}
