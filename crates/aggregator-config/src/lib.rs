//! Static per-network configuration for the aggregator.
//!
//! Venue registries (enabled venues, VIP allow-lists, gas/fee schedules,
//! settlement overhead), routing options, off-chain quoting options and the
//! micro-trade policy are all loaded once, validated, and injected immutably
//! at orchestrator construction. Nothing in here is mutated at request time.

pub mod loader;
pub mod serde_helpers;
pub mod types;

pub use loader::ConfigLoader;
pub use types::*;
