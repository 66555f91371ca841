//! Aggregated request-scoped liquidity for one side of one trade.

use crate::common::{Address, Side, U256};
use crate::orders::RestingOrder;
use crate::quotes::IndicativeQuote;
use crate::samples::Sample;

/// Everything sampled and quoted for one side of one trade request.
///
/// Owned by the orchestrator; samples and resting orders are produced once
/// by the sampling fan-out and are read-only afterward. Phase 2 attaches
/// off-chain quotes to a clone rather than mutating the phase-1 value.
#[derive(Debug, Clone)]
pub struct MarketSideLiquidity {
	pub side: Side,
	/// Amount to fill: taker units for sells, maker units for buys.
	pub input_amount: U256,
	pub input_token: Address,
	pub output_token: Address,
	/// Fee-token conversion rate into the output token
	/// (output base units per native token unit).
	pub output_per_native: U256,
	/// Fee-token conversion rate into the input token.
	pub input_per_native: U256,
	pub quotes: RawQuotes,
	/// Whether off-chain quoting is permitted for this request.
	pub offchain_quoting_supported: bool,
}

/// The raw liquidity backing a [`MarketSideLiquidity`].
#[derive(Debug, Clone, Default)]
pub struct RawQuotes {
	/// One sampled curve per venue.
	pub venue_curves: Vec<Vec<Sample>>,
	/// Two-hop probes for the full trade amount.
	pub two_hop_samples: Vec<Sample>,
	/// Resting orders with validated fillable amounts.
	pub resting_orders: Vec<RestingOrder>,
	/// Indicative off-chain quotes (phase 2 only).
	pub indicative_quotes: Vec<IndicativeQuote>,
}
