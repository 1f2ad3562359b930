//! Configuration types for the lifecycle engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result, constants};

/// Tunables shared by the engine and the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound on a single quote fetch.
    pub quote_timeout_ms: u64,
    /// Depth of each connection's outbound event queue.
    pub channel_capacity: usize,
    /// Decimal places kept on computed crypto amounts.
    pub crypto_scale: u32,
    /// Fiat currency code, for logs and clients.
    pub fiat_currency: String,
    /// Crypto asset code, for logs and clients.
    pub crypto_asset: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_timeout_ms: constants::DEFAULT_QUOTE_TIMEOUT_MS,
            channel_capacity: constants::DEFAULT_CHANNEL_CAPACITY,
            crypto_scale: constants::DEFAULT_CRYPTO_SCALE,
            fiat_currency: constants::DEFAULT_FIAT_CURRENCY.to_string(),
            crypto_asset: constants::DEFAULT_CRYPTO_ASSET.to_string(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms)
    }

    /// # Errors
    /// Returns `Configuration` for a zero timeout, zero capacity, or a
    /// scale beyond what `Decimal` can represent.
    pub fn validate(&self) -> Result<()> {
        if self.quote_timeout_ms == 0 {
            return Err(EscrowError::Configuration(
                "quote_timeout_ms must be > 0".into(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(EscrowError::Configuration(
                "channel_capacity must be > 0".into(),
            ));
        }
        if self.crypto_scale > 28 {
            return Err(EscrowError::Configuration(format!(
                "crypto_scale {} exceeds 28",
                self.crypto_scale
            )));
        }
        Ok(())
    }
}
