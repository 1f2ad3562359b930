//! Live quotes from the CoinGecko simple-price endpoint.
//!
//! `GET {url}?ids=<coin>&vs_currencies=<fiat>` answers
//! `{ "<coin>": { "<fiat>": <price> } }`.

use std::str::FromStr;

use async_trait::async_trait;
use escrowmatch_engine::QuoteSource;
use escrowmatch_types::{EscrowError, Quote, Result, constants};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::QuoteSettings;

#[derive(Debug, Clone)]
pub struct CoinGeckoQuoteSource {
    http: reqwest::Client,
    settings: QuoteSettings,
}

impl CoinGeckoQuoteSource {
    pub fn new(settings: QuoteSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(format!("{}/{}", constants::ENGINE_NAME, constants::VERSION))
            .build()
            .map_err(|e| EscrowError::Configuration(format!("http client: {e}")))?;
        Ok(Self { http, settings })
    }
}

#[async_trait]
impl QuoteSource for CoinGeckoQuoteSource {
    async fn current_quote(&self) -> Result<Quote> {
        let resp = self
            .http
            .get(&self.settings.url)
            .query(&[
                ("ids", self.settings.coin.as_str()),
                ("vs_currencies", self.settings.fiat.as_str()),
            ])
            .send()
            .await
            .map_err(|e| unavailable(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(unavailable(format!("http status {}", status.as_u16())));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| unavailable(format!("response decode failed: {e}")))?;

        let price = parse_simple_price(&body, &self.settings.coin, &self.settings.fiat)?;
        tracing::debug!(coin = %self.settings.coin, fiat = %self.settings.fiat, %price, "quote fetched");
        Quote::new(price)
    }
}

/// Extract `body[coin][fiat]` as an exact decimal.
pub fn parse_simple_price(body: &Value, coin: &str, fiat: &str) -> Result<Decimal> {
    let raw = body
        .get(coin)
        .and_then(|prices| prices.get(fiat))
        .ok_or_else(|| unavailable(format!("no {coin}/{fiat} price in response")))?;

    let text = match raw {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => return Err(unavailable(format!("price is not numeric: {other}"))),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| unavailable(format!("price '{text}' unparseable: {e}")))
}

fn unavailable(reason: String) -> EscrowError {
    EscrowError::QuoteUnavailable { reason }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_nested_price() {
        let body = json!({ "stellar": { "inr": 20.25 } });
        assert_eq!(
            parse_simple_price(&body, "stellar", "inr").unwrap(),
            Decimal::new(2025, 2)
        );
    }

    #[test]
    fn accepts_scientific_notation() {
        let body = json!({ "stellar": { "inr": "1.5e1" } });
        assert_eq!(
            parse_simple_price(&body, "stellar", "inr").unwrap(),
            Decimal::new(15, 0)
        );
    }

    #[test]
    fn missing_or_bad_price_unavailable() {
        for body in [
            json!({}),
            json!({ "stellar": {} }),
            json!({ "stellar": { "inr": null } }),
            json!({ "stellar": { "inr": "cheap" } }),
        ] {
            assert!(matches!(
                parse_simple_price(&body, "stellar", "inr"),
                Err(EscrowError::QuoteUnavailable { .. })
            ));
        }
    }

    #[test]
    fn non_positive_price_rejected_by_quote() {
        let body = json!({ "stellar": { "inr": 0 } });
        let price = parse_simple_price(&body, "stellar", "inr").unwrap();
        assert!(Quote::new(price).is_err());
    }
}
