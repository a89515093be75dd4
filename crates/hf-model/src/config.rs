use std::fmt::Debug;

/// The model the relay serves unless told otherwise.
pub const DEFAULT_MODEL: &str = "NCSOFT/Llama-VARCO-8B-Instruct";
/// The inference provider the router should dispatch the model to.
pub const DEFAULT_PROVIDER: &str = "featherless-ai";
/// Base URL of the Hugging Face inference router.
pub const DEFAULT_BASE_URL: &str = "https://router.huggingface.co/v1";

/// Builder for [`HfConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HfConfigBuilder {
    api_key: String,
    model: Option<String>,
    provider: Option<String>,
    base_url: Option<String>,
}

impl HfConfigBuilder {
    /// Creates a builder with the given access token.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
            provider: None,
            base_url: None,
        }
    }

    /// Sets the model to use.
    #[inline]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the routing hint, i.e. which inference provider serves the
    /// model.
    #[inline]
    pub fn with_provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> HfConfig {
        HfConfig {
            api_key: self.api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            base_url: self
                .base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

impl Debug for HfConfigBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfConfigBuilder")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for the Hugging Face router provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HfConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) provider: String,
    pub(crate) base_url: String,
}

impl HfConfig {
    /// Returns the model identifier with the routing hint attached, in the
    /// `model:provider` form the router expects.
    pub fn routed_model(&self) -> String {
        if self.provider.is_empty() {
            self.model.clone()
        } else {
            format!("{}:{}", self.model, self.provider)
        }
    }

    /// Returns a human readable description of the served model.
    pub fn display_name(&self) -> String {
        if self.provider.is_empty() {
            self.model.clone()
        } else {
            format!("{} ({})", self.model, self.provider)
        }
    }
}

impl Debug for HfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HfConfig")
            .field("api_key", &"<deducted>")
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .finish()
    }
}
