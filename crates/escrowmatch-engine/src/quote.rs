//! The external price collaborator.

use async_trait::async_trait;
use escrowmatch_types::{Quote, Result};
use rust_decimal::Decimal;

/// Supplies the current crypto/fiat quote.
///
/// The engine bounds every call with its configured timeout; an
/// implementation need not enforce its own.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// # Errors
    /// Any error is reported to the caller as `QuoteUnavailable`.
    async fn current_quote(&self) -> Result<Quote>;
}

/// A constant price. For development and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedQuoteSource {
    fiat_per_unit: Decimal,
}

impl FixedQuoteSource {
    #[must_use]
    pub fn new(fiat_per_unit: Decimal) -> Self {
        Self { fiat_per_unit }
    }
}

#[async_trait]
impl QuoteSource for FixedQuoteSource {
    async fn current_quote(&self) -> Result<Quote> {
        Quote::new(self.fiat_per_unit)
    }
}
