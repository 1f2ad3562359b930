//! Daemon configuration, read from the environment.

use std::net::SocketAddr;

use escrowmatch_types::{EngineConfig, EscrowError, Result, constants};
use rust_decimal::Decimal;

/// Where to fetch live prices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteSettings {
    pub url: String,
    /// CoinGecko coin id, e.g. `stellar`.
    pub coin: String,
    /// CoinGecko fiat code, lower-case, e.g. `inr`.
    pub fiat: String,
}

impl Default for QuoteSettings {
    fn default() -> Self {
        Self {
            url: constants::DEFAULT_QUOTE_URL.to_string(),
            coin: constants::DEFAULT_QUOTE_COIN.to_string(),
            fiat: constants::DEFAULT_QUOTE_FIAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub listen_addr: SocketAddr,
    pub quote: QuoteSettings,
    /// When set, replaces the live quote source with a constant price.
    pub fixed_quote: Option<Decimal>,
    pub engine: EngineConfig,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl DaemonConfig {
    /// Read `ESCROWMATCH_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = parse_var(
            "ESCROWMATCH_ADDR",
            &var("ESCROWMATCH_ADDR").unwrap_or_else(|| constants::DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        let defaults = QuoteSettings::default();
        let quote = QuoteSettings {
            url: var("ESCROWMATCH_QUOTE_URL").unwrap_or(defaults.url),
            coin: var("ESCROWMATCH_QUOTE_COIN").unwrap_or(defaults.coin),
            fiat: var("ESCROWMATCH_QUOTE_FIAT")
                .map(|f| f.to_lowercase())
                .unwrap_or(defaults.fiat),
        };

        let fixed_quote = var("ESCROWMATCH_FIXED_QUOTE")
            .map(|raw| parse_var::<Decimal>("ESCROWMATCH_FIXED_QUOTE", &raw))
            .transpose()?;

        let mut engine = EngineConfig::default();
        if let Some(raw) = var("ESCROWMATCH_QUOTE_TIMEOUT_MS") {
            engine.quote_timeout_ms = parse_var("ESCROWMATCH_QUOTE_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = var("ESCROWMATCH_CHANNEL_CAPACITY") {
            engine.channel_capacity = parse_var("ESCROWMATCH_CHANNEL_CAPACITY", &raw)?;
        }
        engine.fiat_currency = quote.fiat.to_uppercase();
        engine.validate()?;

        let log_json = var("ESCROWMATCH_LOG_JSON").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Ok(Self {
            listen_addr,
            quote,
            fixed_quote,
            engine,
            log_json,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| EscrowError::Configuration(format!("{key}={raw}: {e}")))
}
