//! Client configuration with builder and presets.

use crate::auth::DEFAULT_RECV_WINDOW_MS;
use crate::error::RoboError;
use std::env;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";
pub const TESTNET_BASE_URL: &str = "https://testnet.binance.vision";

/// Environment variables read by [`Credentials::from_env`].
pub const API_KEY_VAR: &str = "BINANCE_API_KEY";
pub const SECRET_KEY_VAR: &str = "BINANCE_SECRET_KEY";

/// API key pair, supplied by whatever loads secrets for the caller.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &mask(&self.api_key))
            .field("secret_key", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read `BINANCE_API_KEY` / `BINANCE_SECRET_KEY`, loading `.env` first if present.
    pub fn from_env() -> Result<Self, RoboError> {
        dotenvy::dotenv().ok();
        let api_key = env_required(API_KEY_VAR)?;
        let secret_key = env_required(SECRET_KEY_VAR)?;
        Ok(Self::new(api_key, secret_key))
    }
}

fn env_required(name: &str) -> Result<String, RoboError> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RoboError::config(format!("{} not set", name)))
}

fn mask(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{}...", prefix)
}

/// Configuration for [`RestClient`](crate::client::RestClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL (default: https://api.binance.com)
    pub base_url: String,
    /// Sent as `X-MBX-APIKEY` when present
    pub api_key: Option<String>,
    /// Needed only for signed endpoints
    pub secret_key: Option<String>,
    /// `recvWindow` for signed requests (default: 5000ms)
    pub recv_window_ms: u64,
    /// Per-request timeout (default: 10000ms)
    pub timeout_ms: u64,
    /// Route orders to `/api/v3/order/test` (default: true)
    pub test_orders: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            secret_key: None,
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            timeout_ms: 10_000,
            test_orders: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Default config carrying both keys.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            api_key: Some(credentials.api_key),
            secret_key: Some(credentials.secret_key),
            ..Default::default()
        }
    }

    /// Spot testnet with both keys.
    pub fn testnet(credentials: Credentials) -> Self {
        Self {
            base_url: TESTNET_BASE_URL.to_string(),
            ..Self::with_credentials(credentials)
        }
    }

    /// Check the base URL and that keys, when given, are not blank.
    ///
    /// The returned URL always ends in `/`, so endpoint paths resolve under
    /// any prefix it carries (`https://proxy.local/binance/`).
    pub fn validate(&self) -> Result<Url, RoboError> {
        let mut url = Url::parse(&self.base_url)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        if let Some(key) = &self.api_key {
            if key.trim().is_empty() {
                return Err(RoboError::config("api key is empty"));
            }
        }
        if let Some(secret) = &self.secret_key {
            if secret.trim().is_empty() {
                return Err(RoboError::config("secret key is empty"));
            }
        }
        Ok(url)
    }
}

#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn secret_key(mut self, secret: impl Into<String>) -> Self {
        self.config.secret_key = Some(secret.into());
        self
    }

    pub fn credentials(self, credentials: Credentials) -> Self {
        self.api_key(credentials.api_key)
            .secret_key(credentials.secret_key)
    }

    pub fn recv_window_ms(mut self, ms: u64) -> Self {
        self.config.recv_window_ms = ms;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Send orders to the live endpoint instead of the test one.
    pub fn live_orders(mut self) -> Self {
        self.config.test_orders = false;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
