//! Crypto/fiat price quotes.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result};

/// Fiat price of one unit of the escrowed crypto asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub fiat_per_unit: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl Quote {
    /// # Errors
    /// Returns `QuoteUnavailable` for a zero or negative price.
    pub fn new(fiat_per_unit: Decimal) -> Result<Self> {
        if fiat_per_unit <= Decimal::ZERO {
            return Err(EscrowError::QuoteUnavailable {
                reason: format!("non-positive price {fiat_per_unit}"),
            });
        }
        Ok(Self {
            fiat_per_unit,
            fetched_at: Utc::now(),
        })
    }

    /// `fiat / price`, rounded half-even to `scale` places.
    ///
    /// A positive quotient that would round to zero is kept at full
    /// precision instead, so any positive fiat amount converts to a positive
    /// crypto amount.
    ///
    /// # Errors
    /// - `QuoteUnavailable` if the division overflows
    /// - `InvalidAmount` if the quotient underflows `Decimal`'s 28 places
    pub fn crypto_for_fiat(&self, fiat: Decimal, scale: u32) -> Result<Decimal> {
        let raw = fiat
            .checked_div(self.fiat_per_unit)
            .ok_or_else(|| EscrowError::QuoteUnavailable {
                reason: format!("cannot convert {fiat} at price {}", self.fiat_per_unit),
            })?;
        if raw <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount {
                reason: format!("{fiat} at price {} is below decimal precision", self.fiat_per_unit),
            });
        }
        let rounded = raw.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
        if rounded > Decimal::ZERO {
            Ok(rounded.normalize())
        } else {
            Ok(raw.normalize())
        }
    }
}
