//! # escrowmatch-presence
//!
//! Who is reachable right now, and how to reach them.
//!
//! ## Architecture
//!
//! 1. **ChannelHandle**: the sending half of one connection's bounded
//!    outbound queue. The transport owns the receiving half.
//! 2. **PresenceRegistry**: merchant id → live channels (the broadcast
//!    audience) and user id → live channels. One mutex guards both maps;
//!    no operation performs I/O while holding it.
//! 3. **BroadcastDispatcher**: copies the target channels out of the
//!    registry, releases the lock, then enqueues with `try_send`.
//!    Delivery is fire-and-forget: a full or closed queue is logged and
//!    skipped, never retried, never surfaced to the caller.
//!
//! ```text
//! engine ─▶ dispatcher ─(lock, clone senders, unlock)─▶ try_send ─▶ transport
//! ```

pub mod channel;
pub mod dispatcher;
pub mod registry;

pub use channel::{ChannelHandle, SendOutcome};
pub use dispatcher::{BroadcastDispatcher, DeliveryReport};
pub use registry::PresenceRegistry;
