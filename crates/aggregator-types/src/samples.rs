//! Per-venue price samples and the sampling collaborator seam.
//!
//! A batched probe (out of scope for this workspace) returns one discrete
//! input/output curve per venue for a ladder of probe amounts, plus token
//! metadata and fee-token conversion rates. Curves are monotonically
//! non-decreasing in output; degenerate tails are trimmed downstream by the
//! routable-path encoder.

use crate::common::{Address, U256};
use crate::errors::Result;
use crate::orders::RestingOrder;
use crate::venues::Venue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One point on a venue's discrete price curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
	pub venue: Venue,
	/// Probe amount (taker units for sells, maker units for buys).
	pub input: U256,
	/// Amount the venue quoted for `input`.
	pub output: U256,
	/// Venue-specific data needed later for settlement encoding.
	pub fill_data: FillData,
}

/// Auxiliary venue data carried from sampling through to the materialized
/// orders. The aggregator never interprets `Custom` payloads; they are
/// passed through to the settlement encoder untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FillData {
	None,
	Pool { address: Address },
	TwoHop(TwoHopFillData),
	RestingOrder(RestingOrder),
	Custom(serde_json::Value),
}

impl FillData {
	pub fn as_two_hop(&self) -> Option<&TwoHopFillData> {
		match self {
			FillData::TwoHop(data) => Some(data),
			_ => None,
		}
	}
}

/// Data for a bridged trade through an intermediate token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoHopFillData {
	pub first_hop: HopSource,
	pub second_hop: HopSource,
	pub intermediate_token: Address,
}

/// One leg of a two-hop trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopSource {
	pub venue: Venue,
	pub fill_data: serde_json::Value,
}

/// Batched liquidity probe. One implementation per network; all methods are
/// independent and are fanned out concurrently by the orchestrator.
#[async_trait]
pub trait LiquiditySampler: Send + Sync {
	/// Sample sell curves (taker -> maker) for each venue at each probe
	/// amount. Returns one curve per venue, aligned with `venues`.
	async fn sample_sell_curves(
		&self,
		venues: &[Venue],
		maker_token: Address,
		taker_token: Address,
		probe_amounts: &[U256],
	) -> Result<Vec<Vec<Sample>>>;

	/// Sample buy curves (maker -> taker) for each venue at each probe
	/// amount.
	async fn sample_buy_curves(
		&self,
		venues: &[Venue],
		maker_token: Address,
		taker_token: Address,
		probe_amounts: &[U256],
	) -> Result<Vec<Vec<Sample>>>;

	/// Probe two-hop (bridged) sell routes for the full trade amount.
	/// Samples without complete hop data are dropped by the caller.
	async fn sample_two_hop_sell(
		&self,
		venues: &[Venue],
		maker_token: Address,
		taker_token: Address,
		taker_amount: U256,
	) -> Result<Vec<Sample>>;

	/// Probe two-hop (bridged) buy routes for the full trade amount.
	async fn sample_two_hop_buy(
		&self,
		venues: &[Venue],
		maker_token: Address,
		taker_token: Address,
		maker_amount: U256,
	) -> Result<Vec<Sample>>;

	/// Currently fillable taker amounts for resting orders, aligned with
	/// `orders` (balance/allowance constrained).
	async fn resting_order_fillable_amounts(&self, orders: &[RestingOrder]) -> Result<Vec<U256>>;

	/// Conversion rate from the native fee token into `token`, expressed as
	/// token base units per [`crate::common::NATIVE_TOKEN_UNIT`]. Zero when
	/// no conversion route exists.
	async fn fee_token_conversion_rate(&self, token: Address) -> Result<U256>;
}
