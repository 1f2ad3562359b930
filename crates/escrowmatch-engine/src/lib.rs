//! # escrowmatch-engine
//!
//! **Order lifecycle engine**: the state machine that takes an order from
//! creation through broadcast, race-free acceptance, proof submission, and
//! verification.
//!
//! ## Architecture
//!
//! 1. **QuoteSource**: the external price collaborator, always called under
//!    a timeout
//! 2. **OrderStore**: persistence with an atomic conditional update
//! 3. **PresenceRegistry / BroadcastDispatcher**: who gets told what
//! 4. **LifecycleEngine**: validates, commits one transition, then notifies
//! 5. **EscrowService**: role-gated boundary over the engine and registry
//!
//! ## Order Flow
//!
//! ```text
//! user:     create_order ─▶ PENDING ─▶ newOrder ─▶ online merchants (snapshot)
//! merchant: accept_order ─(CAS)─▶ ACCEPTED ─▶ orderAccepted ─▶ requester
//! merchant: submit_proof ─▶ ACCEPTED+proof ─▶ proofSubmitted ─▶ requester
//! user:     verify_order ─▶ COMPLETED ─▶ orderVerified ─▶ assigned merchant
//! ```
//!
//! Notifications go out only after the transition is committed and never
//! affect the outcome of the operation.

pub mod engine;
pub mod quote;
pub mod service;

pub use engine::LifecycleEngine;
pub use quote::{FixedQuoteSource, QuoteSource};
pub use service::EscrowService;
