//! Runtime configuration.
//!
//! [`AppConfig`] is the read-only snapshot the BCBox back end serves once per
//! session; it carries the identity provider directory. [`ClientConfig`]
//! holds the settings of the COMS HTTP client derived from it.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::batch::UrlBudget;
use crate::constants::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::error::{BcboxError, Result};
use crate::types::IdentityProvider;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComsConfig {
    /// Base URL of the COMS API, e.g. `https://coms.example/api/v1`.
    pub api_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OidcConfig {
    pub authority: String,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub coms: ComsConfig,
    #[serde(default)]
    pub idp_list: Vec<IdentityProvider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc: Option<OidcConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_banner: Option<String>,
}

impl AppConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read a snapshot saved to disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Fetch the snapshot from the back end's config endpoint.
    pub async fn fetch(url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let response = http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target = "bcbox::client",
                url,
                status = status.as_u16(),
                "config fetch failed"
            );
            return Err(BcboxError::Transport {
                message: format!("config fetch returned {status}"),
                status: Some(status.as_u16()),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|err| BcboxError::Decode {
            reason: format!("config snapshot: {err}"),
        })
    }

    #[must_use]
    pub fn find_idp(&self, key: &str) -> Option<&IdentityProvider> {
        self.idp_list.iter().find(|idp| idp.idp == key)
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Settings for [`crate::client::HttpComsClient`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub url_budget: UrlBudget,
    /// Access token from the OIDC session, sent as a bearer token.
    #[serde(default, skip_serializing)]
    pub bearer_token: Option<String>,
}

impl ClientConfig {
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            inner: ClientConfig {
                base_url: base_url.into(),
                timeout_ms: default_timeout_ms(),
                url_budget: UrlBudget::default(),
                bearer_token: None,
            },
        }
    }

    #[must_use]
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self::builder(app.coms.api_path.clone()).build()
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.base();
        if base.is_empty() {
            return Err(BcboxError::configuration("base_url must not be empty"));
        }
        reqwest::Url::parse(base).map_err(|err| {
            BcboxError::configuration(format!("base_url {base:?} is not a valid url: {err}"))
        })?;
        if self.timeout_ms == 0 {
            return Err(BcboxError::configuration("timeout_ms must be greater than zero"));
        }
        self.url_budget.group_size()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    inner: ClientConfig,
}

impl ClientConfigBuilder {
    #[must_use]
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.inner.timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn url_budget(mut self, budget: UrlBudget) -> Self {
        self.inner.url_budget = budget;
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.inner.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.inner
    }
}
