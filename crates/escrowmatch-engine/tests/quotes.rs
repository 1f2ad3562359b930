//! Quote failures never leave an order behind.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use escrowmatch_engine::{LifecycleEngine, QuoteSource};
use escrowmatch_presence::{ChannelHandle, PresenceRegistry};
use escrowmatch_store::{MemoryOrderStore, OrderStore};
use escrowmatch_types::{
    EngineConfig, EscrowError, MerchantId, OrderStatus, Quote, Result, UserId,
};
use rust_decimal::Decimal;

struct SlowQuote;

#[async_trait]
impl QuoteSource for SlowQuote {
    async fn current_quote(&self) -> Result<Quote> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Quote::new(Decimal::ONE)
    }
}

struct BrokenQuote;

#[async_trait]
impl QuoteSource for BrokenQuote {
    async fn current_quote(&self) -> Result<Quote> {
        Err(EscrowError::Serialization("unexpected body".into()))
    }
}

fn engine(quotes: Arc<dyn QuoteSource>, store: Arc<MemoryOrderStore>) -> LifecycleEngine {
    let config = EngineConfig {
        quote_timeout_ms: 50,
        ..EngineConfig::default()
    };
    LifecycleEngine::new(store, quotes, Arc::new(PresenceRegistry::new()), config).unwrap()
}

#[tokio::test]
async fn timeout_is_quote_unavailable() {
    let store = Arc::new(MemoryOrderStore::new());
    let engine = engine(Arc::new(SlowQuote), Arc::clone(&store));

    let (ch, mut rx) = ChannelHandle::open(4);
    engine.registry().mark_online(MerchantId::new(), ch);

    let err = engine
        .create_order(UserId::new(), Decimal::new(1000, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EscrowError::QuoteUnavailable { .. }));
    assert!(store.is_empty().await);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn source_error_is_reported_as_quote_unavailable() {
    let store = Arc::new(MemoryOrderStore::new());
    let engine = engine(Arc::new(BrokenQuote), Arc::clone(&store));

    let err = engine
        .create_order(UserId::new(), Decimal::new(1000, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EscrowError::QuoteUnavailable { .. }));
    assert!(
        store
            .list_by_status(OrderStatus::Pending)
            .await
            .unwrap()
            .is_empty()
    );
}
