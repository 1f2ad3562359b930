//! # escrowmatch-types
//!
//! Shared types, errors, and configuration for the **EscrowMatch** engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`MerchantId`], [`ChannelId`]
//! - **Order model**: [`Order`], [`OrderStatus`], [`OrderTransition`], [`PendingOrderView`]
//! - **Wire events**: [`OutboundEvent`], [`InboundSignal`]
//! - **Callers**: [`Caller`], [`Role`]
//! - **Pricing**: [`Quote`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`EscrowError`] with `EM_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod caller;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod quote;

// Re-export all primary types at crate root for ergonomic imports:
//   use escrowmatch_types::{Order, OrderStatus, OutboundEvent, ...};

pub use caller::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use quote::*;

// Constants are accessed via `escrowmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
