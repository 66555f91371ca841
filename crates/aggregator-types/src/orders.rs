//! Resting orders and settlement-ready materialized orders.

use crate::common::{mul_div, Address, Side, U256};
use crate::samples::FillData;
use crate::venues::Venue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Protocol kind of a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestingOrderKind {
	/// Open-orderbook limit order; settles through the generic wrapper.
	Limit,
	/// Maker-quoted RFQ order; eligible for overhead-free settlement.
	Rfq,
}

/// Settlement kind of a fill or materialized order. Closed set, matched
/// exhaustively at materialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
	/// A pre-existing resting order, filled natively.
	Resting(RestingOrderKind),
	/// A single-venue bridge order.
	Bridge,
	/// Two sequential bridge fills through an intermediate token.
	TwoHop,
}

impl OrderKind {
	pub fn is_resting(self) -> bool {
		matches!(self, OrderKind::Resting(_))
	}
}

/// A discrete, pre-existing commitment to trade at a fixed rate up to its
/// own size. The `fillable_*` amounts reflect the maker's current balance
/// and allowance and may be below the face amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestingOrder {
	pub kind: RestingOrderKind,
	pub maker_token: Address,
	pub taker_token: Address,
	pub maker_amount: U256,
	pub taker_amount: U256,
	pub taker_fee_amount: U256,
	pub fillable_maker_amount: U256,
	pub fillable_taker_amount: U256,
	pub fillable_taker_fee_amount: U256,
}

impl RestingOrder {
	/// Normalized (input, output) amounts for one side of the market.
	/// The taker fee is part of what the taker pays, so it counts toward
	/// the taker-denominated amount.
	pub fn normalized_amounts(&self, side: Side) -> (U256, U256) {
		let maker = self.fillable_maker_amount;
		let taker = self.fillable_taker_amount + self.fillable_taker_fee_amount;
		match side {
			Side::Sell => (taker, maker),
			Side::Buy => (maker, taker),
		}
	}

	/// Re-derives all fillable amounts from a validated taker amount,
	/// scaling the maker side and the fee at the order's fixed rate.
	pub fn with_fillable_taker_amount(mut self, fillable_taker_amount: U256) -> Self {
		let clamped = fillable_taker_amount.min(self.taker_amount);
		self.fillable_maker_amount = mul_div(self.maker_amount, clamped, self.taker_amount);
		self.fillable_taker_fee_amount = mul_div(self.taker_fee_amount, clamped, self.taker_amount);
		self.fillable_taker_amount = clamped;
		self
	}

	/// Re-derives all fillable amounts from a validated maker amount.
	pub fn with_fillable_maker_amount(mut self, fillable_maker_amount: U256) -> Self {
		let clamped = fillable_maker_amount.min(self.maker_amount);
		self.fillable_taker_amount = mul_div(self.taker_amount, clamped, self.maker_amount);
		self.fillable_taker_fee_amount = mul_div(self.taker_fee_amount, clamped, self.maker_amount);
		self.fillable_maker_amount = clamped;
		self
	}
}

/// A settlement-ready order record materialized from a path. Consumed by
/// the settlement-calldata encoder; never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedOrder {
	pub kind: OrderKind,
	pub venue: Venue,
	pub maker_token: Address,
	pub taker_token: Address,
	pub maker_amount: U256,
	pub taker_amount: U256,
	pub fill_data: FillData,
	pub source_path_id: Uuid,
}

/// Materialized orders grouped by settlement kind.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedOrders {
	pub resting: Vec<MaterializedOrder>,
	pub bridge: Vec<MaterializedOrder>,
	/// Each two-hop allocation expands to its two constituent legs,
	/// first hop first.
	pub two_hop: Vec<[MaterializedOrder; 2]>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn order() -> RestingOrder {
		RestingOrder {
			kind: RestingOrderKind::Limit,
			maker_token: Address::ZERO,
			taker_token: Address::ZERO,
			maker_amount: U256::from(2_000u64),
			taker_amount: U256::from(1_000u64),
			taker_fee_amount: U256::from(100u64),
			fillable_maker_amount: U256::from(2_000u64),
			fillable_taker_amount: U256::from(1_000u64),
			fillable_taker_fee_amount: U256::from(100u64),
		}
	}

	#[test]
	fn test_fillable_from_taker_amount_scales_maker_side() {
		let adjusted = order().with_fillable_taker_amount(U256::from(500u64));
		assert_eq!(adjusted.fillable_taker_amount, U256::from(500u64));
		assert_eq!(adjusted.fillable_maker_amount, U256::from(1_000u64));
		assert_eq!(adjusted.fillable_taker_fee_amount, U256::from(50u64));
	}

	#[test]
	fn test_fillable_clamped_to_face_amount() {
		let adjusted = order().with_fillable_taker_amount(U256::from(5_000u64));
		assert_eq!(adjusted.fillable_taker_amount, U256::from(1_000u64));
		assert_eq!(adjusted.fillable_maker_amount, U256::from(2_000u64));
	}

	#[test]
	fn test_normalized_amounts_include_taker_fee() {
		let (input, output) = order().normalized_amounts(Side::Sell);
		assert_eq!(input, U256::from(1_100u64));
		assert_eq!(output, U256::from(2_000u64));

		let (input, output) = order().normalized_amounts(Side::Buy);
		assert_eq!(input, U256::from(2_000u64));
		assert_eq!(output, U256::from(1_100u64));
	}
}
