//! System-wide constants for the EscrowMatch engine.

/// Default upper bound on a single quote fetch, in milliseconds.
pub const DEFAULT_QUOTE_TIMEOUT_MS: u64 = 5_000;

/// Default depth of each connection's outbound event queue.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Decimal places kept on a computed crypto amount.
///
/// Seven places is the stroop precision of the Stellar lumen.
pub const DEFAULT_CRYPTO_SCALE: u32 = 7;

/// Fiat currency orders are denominated in.
pub const DEFAULT_FIAT_CURRENCY: &str = "INR";

/// Crypto asset released from escrow.
pub const DEFAULT_CRYPTO_ASSET: &str = "XLM";

/// Acceptance window shown to users after order creation.
///
/// Advisory only: no server-side expiry transition exists.
pub const ADVERTISED_ACCEPT_WINDOW_SECS: u64 = 30;

/// Dispute window shown to users after completion. Advisory only.
pub const ADVERTISED_DISPUTE_WINDOW_HOURS: u64 = 24;

/// Maximum accepted length of a proof reference.
pub const MAX_PROOF_REFERENCE_LEN: usize = 2_048;

/// Default listen address for the daemon.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";

/// Default CoinGecko simple-price endpoint.
pub const DEFAULT_QUOTE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// Default CoinGecko coin id for the escrowed asset.
pub const DEFAULT_QUOTE_COIN: &str = "stellar";

/// Default CoinGecko fiat code (lower-case).
pub const DEFAULT_QUOTE_FIAT: &str = "inr";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "EscrowMatch";
