use std::fmt::Debug;
use std::net::SocketAddr;

use chat_relay_hf_model::{
    DEFAULT_MODEL, DEFAULT_PROVIDER, HfConfig, HfConfigBuilder,
};

/// The address the relay listens on unless told otherwise.
pub const DEFAULT_ADDR: &str = "0.0.0.0:3001";

/// Environment variables holding the provider credential, in lookup order.
pub const TOKEN_VARS: [&str; 2] = ["REACT_APP_HF_TOKEN", "HF_TOKEN"];

/// Builder for [`RelayConfig`].
#[derive(Clone, PartialEq)]
pub struct RelayConfigBuilder {
    api_token: Option<String>,
    addr: Option<SocketAddr>,
    base_url: Option<String>,
    model: Option<String>,
    provider: Option<String>,
}

impl RelayConfigBuilder {
    /// Creates a builder without a credential.
    #[inline]
    pub fn new() -> Self {
        Self {
            api_token: None,
            addr: None,
            base_url: None,
            model: None,
            provider: None,
        }
    }

    /// Creates a builder from the process environment.
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates a builder from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let addr = var("RELAY_ADDR").and_then(|addr| {
            match addr.parse::<SocketAddr>() {
                Ok(addr) => Some(addr),
                Err(err) => {
                    warn!("ignoring invalid RELAY_ADDR {addr:?}: {err}");
                    None
                }
            }
        });

        Self {
            api_token: TOKEN_VARS.iter().find_map(|name| var(*name)),
            addr,
            base_url: var("HF_BASE_URL"),
            model: var("HF_MODEL"),
            provider: var("HF_PROVIDER"),
        }
    }

    /// Sets the provider credential.
    #[inline]
    pub fn with_api_token<S: Into<String>>(mut self, token: S) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the listening address.
    #[inline]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets a custom base URL for the upstream router.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> RelayConfig {
        let addr = self.addr.unwrap_or_else(|| {
            DEFAULT_ADDR
                .parse()
                .unwrap_or(SocketAddr::from(([0, 0, 0, 0], 3001)))
        });
        RelayConfig {
            api_token: self.api_token,
            addr,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            stream_max_tokens: 500,
            completion_max_tokens: 200,
            temperature: 0.7,
        }
    }
}

impl Default for RelayConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RelayConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfigBuilder")
            .field("api_token", &self.api_token.as_ref().map(|_| "<deducted>"))
            .field("addr", &self.addr)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Configuration of the relay, fixed for the lifetime of the process.
#[derive(Clone, PartialEq)]
pub struct RelayConfig {
    api_token: Option<String>,
    addr: SocketAddr,
    base_url: Option<String>,
    model: String,
    provider: String,
    pub(crate) stream_max_tokens: u32,
    pub(crate) completion_max_tokens: u32,
    pub(crate) temperature: f32,
}

impl RelayConfig {
    /// Returns whether a provider credential is configured.
    #[inline]
    pub fn has_token(&self) -> bool {
        self.api_token.is_some()
    }

    /// Returns the listening address.
    #[inline]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the configuration of the upstream provider.
    ///
    /// Without a credential the provider is still created, but the relay
    /// never calls it.
    pub fn hf_config(&self) -> HfConfig {
        let api_key = self.api_token.clone().unwrap_or_default();
        let builder = HfConfigBuilder::with_api_key(api_key)
            .with_model(&self.model)
            .with_provider(&self.provider);
        match &self.base_url {
            Some(base_url) => builder.with_base_url(base_url).build(),
            None => builder.build(),
        }
    }

    /// Returns the human readable name of the served model.
    #[inline]
    pub fn model_name(&self) -> String {
        self.hf_config().display_name()
    }
}

impl Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<deducted>"))
            .field("addr", &self.addr)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("stream_max_tokens", &self.stream_max_tokens)
            .field("completion_max_tokens", &self.completion_max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}
