//! escrowmatch-daemon entry point.
//!
//! Thin on purpose: load configuration, set up tracing, build the shared
//! state, wire middleware, and serve. Handlers live in `routes.rs` and
//! `ws.rs`.

use std::sync::Arc;

use anyhow::Context;
use axum::http::Method;
use escrowmatch_daemon::{coingecko::CoinGeckoQuoteSource, config::DaemonConfig, routes, state};
use escrowmatch_engine::{FixedQuoteSource, QuoteSource};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience; production injects env vars directly.
    dotenvy::from_filename(".env.local").ok();

    let config = DaemonConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_json);

    let quotes: Arc<dyn QuoteSource> = if let Some(price) = config.fixed_quote {
        warn!(%price, "using fixed quote source");
        Arc::new(FixedQuoteSource::new(price))
    } else {
        Arc::new(CoinGeckoQuoteSource::new(config.quote.clone()).context("quote source")?)
    };

    let shared = Arc::new(
        state::AppState::in_memory(quotes, config.engine.clone()).context("engine setup")?,
    );

    let app = routes::build_router(shared)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        );

    info!(
        addr = %config.listen_addr,
        fiat = %config.engine.fiat_currency,
        asset = %config.engine.crypto_asset,
        "escrowmatch-daemon listening"
    );

    axum::serve(tokio::net::TcpListener::bind(config.listen_addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
