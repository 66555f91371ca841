//! Market liquidity orchestration.
//!
//! Ties the sampling, quoting and pool-topology collaborators to the
//! allocation pipeline: probe-amount distribution ([`sampling`]), the
//! two-phase on-chain/off-chain integration loop ([`orchestrator`]), the
//! whole-order comparison price handed to off-chain makers
//! ([`comparison_price`]), and the background-refreshed pool-topology
//! snapshot cache ([`cache`]).

pub mod cache;
pub mod comparison_price;
pub mod orchestrator;
pub mod sampling;

pub use cache::PoolTopologyCache;
pub use orchestrator::{
	BestExecution, MarketLiquidityOrchestrator, QuoteIntent, TradeRequest,
};
pub use sampling::probe_amounts;
