//! # escrowmatch-store
//!
//! Durable keyed storage of [`Order`](escrowmatch_types::Order) records.
//!
//! ## Contract
//!
//! The engine only ever talks to an [`OrderStore`]. Every mutation of a stored
//! order goes through [`OrderStore::apply_transition`], which must evaluate the
//! transition's precondition against the *stored* record and write the result
//! in one atomic step. Reading, checking, and writing back in separate steps
//! admits a lost update where two merchants both see `PENDING` and both win.
//!
//! [`MemoryOrderStore`] is the reference implementation: a single
//! `RwLock<HashMap>` where the check-and-set runs under the write guard.

pub mod memory;
pub mod store;

pub use memory::MemoryOrderStore;
pub use store::OrderStore;
