//! Application configuration loaded from environment variables.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Polymarket Credentials ===
    /// Wallet private key (hex, starts with 0x).
    #[serde(default)]
    pub polymarket_private_key: String,

    /// Optional pre-generated API key.
    #[serde(default)]
    pub polymarket_api_key: Option<String>,

    /// Optional API secret.
    #[serde(default)]
    pub polymarket_api_secret: Option<String>,

    /// Optional API passphrase.
    #[serde(default)]
    pub polymarket_api_passphrase: Option<String>,

    // === Wallet Configuration ===
    /// Signature type: 0=EOA, 1=Magic.link, 2=Gnosis Safe.
    #[serde(default)]
    pub polymarket_signature_type: u8,

    /// Funding (proxy) wallet address.
    #[serde(default)]
    pub polymarket_funder: Option<String>,

    // === Venue ===
    /// CLOB API base URL.
    #[serde(default = "default_clob_url")]
    pub polymarket_clob_url: String,

    /// Chain ID (137 for Polygon mainnet).
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    // === Hunting Parameters ===
    /// Lowest price (inclusive) considered a tail outcome.
    #[serde(default = "default_price_min")]
    pub price_min: Decimal,

    /// Highest price (inclusive) considered a tail outcome.
    #[serde(default = "default_price_max")]
    pub price_max: Decimal,

    /// Capital risked per order; quantity = downside_limit / price.
    #[serde(default = "default_downside_limit")]
    pub downside_limit: Decimal,

    /// Outcome label to buy (matched case-insensitively).
    #[serde(default = "default_target_outcome")]
    pub target_outcome: String,

    /// Optional cap on total notional placed within a single cycle.
    #[serde(default)]
    pub max_cycle_spend: Option<Decimal>,

    // === Loop Timing ===
    /// Seconds to sleep after a completed cycle.
    #[serde(default = "default_scan_interval")]
    pub scan_interval_seconds: u64,

    /// Seconds to sleep after a failed cycle.
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,

    // === Market Listing ===
    /// Optional bound on `/markets` pages fetched per cycle; unset walks to the end cursor.
    #[serde(default)]
    pub max_market_pages: Option<u32>,

    // === Timeouts ===
    /// Per-request HTTP timeout in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Upper bound on a single order submission in milliseconds.
    #[serde(default = "default_order_timeout_ms")]
    pub order_timeout_ms: u64,

    // === Operation Modes ===
    /// Simulation mode (no real orders).
    #[serde(default = "default_true")]
    pub dry_run: bool,

    // === Server Configuration ===
    /// HTTP server port for health/status endpoints.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_clob_url() -> String {
    "https://clob.polymarket.com".to_string()
}

fn default_chain_id() -> u64 {
    137
}

fn default_price_min() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_price_max() -> Decimal {
    Decimal::new(3, 2) // 0.03
}

fn default_downside_limit() -> Decimal {
    Decimal::new(20, 1) // $2.0
}

fn default_target_outcome() -> String {
    "YES".to_string()
}

fn default_scan_interval() -> u64 {
    60
}

fn default_error_backoff() -> u64 {
    10
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_order_timeout_ms() -> u64 {
    15_000
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            polymarket_private_key: String::new(),
            polymarket_api_key: None,
            polymarket_api_secret: None,
            polymarket_api_passphrase: None,
            polymarket_signature_type: 0,
            polymarket_funder: None,
            polymarket_clob_url: default_clob_url(),
            chain_id: default_chain_id(),
            price_min: default_price_min(),
            price_max: default_price_max(),
            downside_limit: default_downside_limit(),
            target_outcome: default_target_outcome(),
            max_cycle_spend: None,
            scan_interval_seconds: default_scan_interval(),
            error_backoff_seconds: default_error_backoff(),
            max_market_pages: None,
            http_timeout_ms: default_http_timeout_ms(),
            order_timeout_ms: default_order_timeout_ms(),
            dry_run: default_true(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.polymarket_private_key.is_empty() {
            return Err("POLYMARKET_PRIVATE_KEY is required".to_string());
        }

        if !self.polymarket_private_key.starts_with("0x") {
            return Err("POLYMARKET_PRIVATE_KEY must start with 0x".to_string());
        }

        if let Err(e) = url::Url::parse(&self.polymarket_clob_url) {
            return Err(format!("POLYMARKET_CLOB_URL is not a valid URL: {}", e));
        }

        if self.price_min <= Decimal::ZERO {
            return Err("PRICE_MIN must be greater than 0".to_string());
        }

        if self.price_min > self.price_max {
            return Err("PRICE_MIN must not exceed PRICE_MAX".to_string());
        }

        if self.price_max >= Decimal::ONE {
            return Err("PRICE_MAX must be below 1.0".to_string());
        }

        if self.downside_limit <= Decimal::ZERO {
            return Err("DOWNSIDE_LIMIT must be positive".to_string());
        }

        if self.target_outcome.trim().is_empty() {
            return Err("TARGET_OUTCOME must not be empty".to_string());
        }

        if let Some(cap) = self.max_cycle_spend {
            if cap <= Decimal::ZERO {
                return Err("MAX_CYCLE_SPEND must be positive when set".to_string());
            }
        }

        if self.scan_interval_seconds == 0 {
            return Err("SCAN_INTERVAL_SECONDS must be at least 1".to_string());
        }

        if self.error_backoff_seconds == 0 {
            return Err("ERROR_BACKOFF_SECONDS must be at least 1".to_string());
        }

        if self.error_backoff_seconds > self.scan_interval_seconds {
            return Err("ERROR_BACKOFF_SECONDS must not exceed SCAN_INTERVAL_SECONDS".to_string());
        }

        if self.max_market_pages == Some(0) {
            return Err("MAX_MARKET_PAGES must be at least 1".to_string());
        }

        if self.http_timeout_ms == 0 || self.order_timeout_ms == 0 {
            return Err("HTTP_TIMEOUT_MS and ORDER_TIMEOUT_MS must be positive".to_string());
        }

        let creds = [
            self.polymarket_api_key.is_some(),
            self.polymarket_api_secret.is_some(),
            self.polymarket_api_passphrase.is_some(),
        ];
        if creds.iter().any(|c| *c) && !creds.iter().all(|c| *c) {
            return Err(
                "POLYMARKET_API_KEY, POLYMARKET_API_SECRET and POLYMARKET_API_PASSPHRASE must be set together"
                    .to_string(),
            );
        }

        if let Some(key) = &self.polymarket_api_key {
            if let Err(e) = Uuid::parse_str(key) {
                return Err(format!("POLYMARKET_API_KEY must be a UUID: {}", e));
            }
        }

        Ok(())
    }

    /// Whether a full API credential triple was supplied.
    pub fn has_api_credentials(&self) -> bool {
        self.polymarket_api_key.is_some()
            && self.polymarket_api_secret.is_some()
            && self.polymarket_api_passphrase.is_some()
    }

    /// Sleep between successful cycles.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_seconds)
    }

    /// Sleep after a failed cycle.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_seconds)
    }

    /// Per-request HTTP timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Per-order submission timeout.
    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }
}
