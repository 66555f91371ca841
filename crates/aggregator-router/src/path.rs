//! The immutable result of an optimization: an ordered set of fills with
//! settlement-ready orders and well-defined comparison semantics.

use crate::fills::native_to_output_amount;
use crate::orders::{classify_orders, create_orders};
use crate::rates::{complete_rate, rate};
use aggregator_config::SettlementOverheadConfig;
use aggregator_types::{
	mul_div, mul_div_ceil, Address, AggregatorError, ClassifiedOrders, Fill, MaterializedOrder,
	Result, Side, SourceFlags, Venue, I256, U256,
};

/// Identity of the trade a path was optimized for.
#[derive(Debug, Clone, Copy)]
pub struct PathContext {
	pub side: Side,
	pub input_token: Address,
	pub output_token: Address,
}

/// Everything needed to price a path's settlement overhead in output-token
/// units. Per-fill venue costs are already baked into each fill; this only
/// covers the flat per-settlement overhead keyed by the path's source
/// flags.
#[derive(Debug, Clone)]
pub struct PathPenaltyOpts {
	pub output_per_native: U256,
	pub input_per_native: U256,
	pub gas_price: U256,
	pub overhead: SettlementOverheadConfig,
	/// Precomputed mask of every VIP-eligible source on this network.
	pub vip_flags: SourceFlags,
}

/// Fee-adjusted size of a path: how much input it absorbs and what it
/// yields after per-fill costs. The output is signed; a path whose costs
/// swamp its quotes sizes negative and loses every comparison.
#[derive(Debug, Clone, Copy)]
struct AdjustedSize {
	input: U256,
	output: I256,
}

/// An immutable allocation across one or more fills.
///
/// Construction materializes the settlement orders and pre-computes the
/// adjusted size; everything else derives from those without mutation.
#[derive(Debug, Clone)]
pub struct Path {
	context: PathContext,
	fills: Vec<Fill>,
	orders: Vec<MaterializedOrder>,
	target_input: U256,
	penalty_opts: PathPenaltyOpts,
	source_flags: SourceFlags,
	adjusted_size: AdjustedSize,
}

impl Path {
	pub fn new(
		context: PathContext,
		fills: Vec<Fill>,
		target_input: U256,
		penalty_opts: PathPenaltyOpts,
	) -> Result<Self> {
		let orders = create_orders(&fills, &context)?;
		let source_flags = SourceFlags::merge(fills.iter().map(|fill| fill.flags));
		let adjusted_size = create_adjusted_size(target_input, &fills);
		Ok(Self {
			context,
			fills,
			orders,
			target_input,
			penalty_opts,
			source_flags,
			adjusted_size,
		})
	}

	pub fn context(&self) -> &PathContext {
		&self.context
	}

	pub fn fills(&self) -> &[Fill] {
		&self.fills
	}

	pub fn source_flags(&self) -> SourceFlags {
		self.source_flags
	}

	pub fn target_input(&self) -> U256 {
		self.target_input
	}

	pub fn has_two_hop(&self) -> bool {
		self.source_flags
			.intersects(SourceFlags::venue(Venue::MultiHop))
	}

	/// Input absorbed and fee-adjusted output of this path, before the
	/// settlement overhead.
	pub fn adjusted_size(&self) -> (U256, I256) {
		(self.adjusted_size.input, self.adjusted_size.output)
	}

	/// Venues contributing at least one fill, deduplicated in fill order.
	pub fn venues(&self) -> Vec<Venue> {
		let mut venues = Vec::new();
		for fill in &self.fills {
			if !venues.contains(&fill.venue) {
				venues.push(fill.venue);
			}
		}
		venues
	}

	pub fn orders(&self) -> &[MaterializedOrder] {
		&self.orders
	}

	/// Orders with slippage protection applied. Resting orders fill at
	/// their signed amounts and are never slipped; neither are zero/max
	/// sentinel amounts on two-hop legs.
	///
	/// Selling, the minimum received (maker) amount is scaled down and
	/// rounded against the taker; buying, the maximum paid (taker) amount
	/// is scaled up and rounded against the taker.
	pub fn slipped_orders(&self, max_slippage: f64) -> Result<Vec<MaterializedOrder>> {
		if !max_slippage.is_finite() || !(0.0..=1.0).contains(&max_slippage) {
			return Err(AggregatorError::InvalidSlippage(max_slippage));
		}
		if max_slippage == 0.0 {
			return Ok(self.orders.clone());
		}
		let denominator = U256::from(SLIPPAGE_PRECISION);
		let scale_down = U256::from(((1.0 - max_slippage) * SLIPPAGE_PRECISION as f64).round() as u128);
		let scale_up = U256::from(((1.0 + max_slippage) * SLIPPAGE_PRECISION as f64).round() as u128);

		let orders = self
			.orders
			.iter()
			.map(|order| {
				if order.kind.is_resting() {
					return order.clone();
				}
				let mut order = order.clone();
				match self.context.side {
					Side::Sell if order.maker_amount != U256::MAX => {
						order.maker_amount = mul_div(order.maker_amount, scale_down, denominator);
					}
					Side::Buy if order.taker_amount != U256::MAX => {
						order.taker_amount = mul_div_ceil(order.taker_amount, scale_up, denominator);
					}
					_ => {}
				}
				order
			})
			.collect();
		Ok(orders)
	}

	/// Slipped orders grouped by settlement kind.
	pub fn classified_orders(&self, max_slippage: f64) -> Result<ClassifiedOrders> {
		Ok(classify_orders(&self.slipped_orders(max_slippage)?))
	}

	/// Rate of this path with per-fill costs and the settlement overhead
	/// applied.
	pub fn adjusted_rate(&self) -> f64 {
		let AdjustedSize { input, output } = self.overhead_applied_size();
		rate(self.context.side, input, output)
	}

	/// Whether this path beats `other` for the same trade.
	///
	/// An under-filled path always loses to one that fills more input;
	/// between two complete fills the better fee-adjusted complete rate
	/// wins. Comparing paths optimized for different targets is a logic
	/// error and is reported as such.
	pub fn is_better_than(&self, other: &Path) -> Result<bool> {
		if self.target_input != other.target_input {
			return Err(AggregatorError::TargetMismatch {
				ours: self.target_input,
				theirs: other.target_input,
			});
		}
		let input = self.adjusted_size.input;
		let other_input = other.adjusted_size.input;
		if input < self.target_input || other_input < self.target_input {
			Ok(input > other_input)
		} else {
			Ok(self.adjusted_complete_rate() > other.adjusted_complete_rate())
		}
	}

	fn adjusted_complete_rate(&self) -> f64 {
		let AdjustedSize { input, output } = self.overhead_applied_size();
		complete_rate(self.context.side, input, output, self.target_input)
	}

	/// Adjusted size with the flat settlement overhead for this path's
	/// source-flag class applied on top of the per-fill costs.
	fn overhead_applied_size(&self) -> AdjustedSize {
		let AdjustedSize { input, output } = self.adjusted_size;
		let overhead_gas = self
			.penalty_opts
			.overhead
			.overhead_gas(self.source_flags, self.penalty_opts.vip_flags);
		let native_cost = self.penalty_opts.gas_price * U256::from(overhead_gas);
		let output_magnitude = if output.is_negative() {
			U256::ZERO
		} else {
			output.unsigned_abs()
		};
		let penalty = native_to_output_amount(
			input,
			output_magnitude,
			self.penalty_opts.input_per_native,
			self.penalty_opts.output_per_native,
			native_cost,
		);
		let penalty = I256::try_from(penalty).unwrap_or(I256::MAX);
		let output = match self.context.side {
			Side::Sell => output.saturating_sub(penalty),
			Side::Buy => output.saturating_add(penalty),
		};
		AdjustedSize { input, output }
	}
}

const SLIPPAGE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Folds fills into the path's adjusted size, clamping at the target.
/// A final fill that overshoots contributes a proportional share of its
/// output, but its settlement penalty applies in full; partial fills do
/// not settle any cheaper.
fn create_adjusted_size(target_input: U256, fills: &[Fill]) -> AdjustedSize {
	let mut size = AdjustedSize {
		input: U256::ZERO,
		output: I256::ZERO,
	};
	for fill in fills {
		if size.input.saturating_add(fill.input) > target_input {
			let remaining_input = target_input - size.input;
			let scaled_output = mul_div(fill.output, remaining_input, fill.input);
			let scaled_output = I256::try_from(scaled_output).unwrap_or(I256::MAX);
			size.input = target_input;
			size.output = size
				.output
				.saturating_add(scaled_output)
				.saturating_add(fill.output_penalty());
		} else {
			size.input = size.input.saturating_add(fill.input);
			size.output = size.output.saturating_add(fill.adjusted_output);
		}
	}
	size
}

#[cfg(test)]
mod tests {
	use super::*;
	use aggregator_types::{FillData, OrderKind};
	use uuid::Uuid;

	fn context(side: Side) -> PathContext {
		PathContext {
			side,
			input_token: Address::repeat_byte(0x11),
			output_token: Address::repeat_byte(0x22),
		}
	}

	fn penalty_opts() -> PathPenaltyOpts {
		PathPenaltyOpts {
			output_per_native: U256::ZERO,
			input_per_native: U256::ZERO,
			gas_price: U256::ZERO,
			overhead: SettlementOverheadConfig::default(),
			vip_flags: SourceFlags::NONE,
		}
	}

	fn bridge_fill(venue: Venue, input: u64, output: u64, adjusted: i64) -> Fill {
		Fill {
			source_path_id: Uuid::new_v4(),
			venue,
			kind: OrderKind::Bridge,
			input: U256::from(input),
			output: U256::from(output),
			adjusted_output: I256::try_from(adjusted).unwrap(),
			gas_estimate: 90_000,
			flags: SourceFlags::venue(venue),
			fill_data: FillData::None,
		}
	}

	fn path(side: Side, fills: Vec<Fill>, target: u64) -> Path {
		Path::new(context(side), fills, U256::from(target), penalty_opts()).unwrap()
	}

	#[test]
	fn test_adjusted_size_sums_whole_fills() {
		let path = path(
			Side::Sell,
			vec![
				bridge_fill(Venue::UniswapV2, 600, 1_200, 1_100),
				bridge_fill(Venue::Curve, 400, 790, 700),
			],
			1_000,
		);
		let (input, output) = path.adjusted_size();
		assert_eq!(input, U256::from(1_000u64));
		assert_eq!(output, I256::try_from(1_800u64).unwrap());
	}

	#[test]
	fn test_partial_final_fill_keeps_full_penalty() {
		// The second fill overshoots by half: output is interpolated to
		// 395, but its -90 penalty applies in full.
		let path = path(
			Side::Sell,
			vec![
				bridge_fill(Venue::UniswapV2, 600, 1_200, 1_100),
				bridge_fill(Venue::Curve, 400, 790, 700),
			],
			800,
		);
		let (input, output) = path.adjusted_size();
		assert_eq!(input, U256::from(800u64));
		assert_eq!(output, I256::try_from(1_100 + 395 - 90).unwrap());
	}

	#[test]
	fn test_is_better_than_requires_same_target() {
		let a = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 500, 1_000, 900)], 500);
		let b = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 600, 1_200, 1_100)], 600);
		assert!(matches!(
			a.is_better_than(&b),
			Err(AggregatorError::TargetMismatch { .. })
		));
	}

	#[test]
	fn test_larger_under_fill_wins_regardless_of_rate() {
		// The smaller fill has a much better rate, but filling more of
		// the request dominates.
		let larger = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 800, 800, 700)], 1_000);
		let smaller = path(Side::Sell, vec![bridge_fill(Venue::Curve, 500, 5_000, 4_900)], 1_000);
		assert!(larger.is_better_than(&smaller).unwrap());
		assert!(!smaller.is_better_than(&larger).unwrap());
	}

	#[test]
	fn test_complete_fills_compare_by_adjusted_rate() {
		let better = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_000, 1_900)], 1_000);
		let worse = path(Side::Sell, vec![bridge_fill(Venue::Curve, 1_000, 2_000, 1_500)], 1_000);
		assert!(better.is_better_than(&worse).unwrap());
		assert!(!worse.is_better_than(&better).unwrap());
	}

	#[test]
	fn test_buy_side_lower_adjusted_output_is_better() {
		let cheap = path(Side::Buy, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_000, 2_100)], 1_000);
		let dear = path(Side::Buy, vec![bridge_fill(Venue::Curve, 1_000, 2_000, 2_500)], 1_000);
		assert!(cheap.is_better_than(&dear).unwrap());
	}

	#[test]
	fn test_slippage_must_be_a_fraction() {
		let path = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_000, 1_900)], 1_000);
		assert!(matches!(
			path.slipped_orders(-0.1),
			Err(AggregatorError::InvalidSlippage(_))
		));
		assert!(matches!(
			path.slipped_orders(1.5),
			Err(AggregatorError::InvalidSlippage(_))
		));
		assert!(matches!(
			path.slipped_orders(f64::NAN),
			Err(AggregatorError::InvalidSlippage(_))
		));
	}

	#[test]
	fn test_sell_slippage_scales_min_received_down() {
		let path = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_000, 1_900)], 1_000);
		let orders = path.slipped_orders(0.25).unwrap();
		assert_eq!(orders[0].maker_amount, U256::from(1_500u64));
		// Taker (input) side is untouched.
		assert_eq!(orders[0].taker_amount, U256::from(1_000u64));
	}

	#[test]
	fn test_buy_slippage_scales_max_paid_up() {
		let path = path(Side::Buy, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_001, 2_100)], 1_000);
		let orders = path.slipped_orders(0.5).unwrap();
		// 2001 * 1.5 = 3001.5, rounded up against the taker.
		assert_eq!(orders[0].taker_amount, U256::from(3_002u64));
		assert_eq!(orders[0].maker_amount, U256::from(1_000u64));
	}

	#[test]
	fn test_zero_slippage_returns_orders_unchanged() {
		let path = path(Side::Sell, vec![bridge_fill(Venue::UniswapV2, 1_000, 2_000, 1_900)], 1_000);
		let orders = path.slipped_orders(0.0).unwrap();
		assert_eq!(orders[0].maker_amount, U256::from(2_000u64));
	}

	#[test]
	fn test_resting_orders_never_slipped() {
		use aggregator_types::{RestingOrder, RestingOrderKind};

		let order = RestingOrder {
			kind: RestingOrderKind::Rfq,
			maker_token: Address::repeat_byte(0x22),
			taker_token: Address::repeat_byte(0x11),
			maker_amount: U256::from(2_000u64),
			taker_amount: U256::from(1_000u64),
			taker_fee_amount: U256::ZERO,
			fillable_maker_amount: U256::from(2_000u64),
			fillable_taker_amount: U256::from(1_000u64),
			fillable_taker_fee_amount: U256::ZERO,
		};
		let fill = Fill {
			source_path_id: Uuid::new_v4(),
			venue: Venue::Native,
			kind: OrderKind::Resting(RestingOrderKind::Rfq),
			input: U256::from(1_000u64),
			output: U256::from(2_000u64),
			adjusted_output: I256::try_from(1_950u64).unwrap(),
			gas_estimate: 100_000,
			flags: SourceFlags::venue(Venue::Native) | SourceFlags::RESTING_RFQ,
			fill_data: FillData::RestingOrder(order),
		};
		let path = path(Side::Sell, vec![fill], 1_000);
		let orders = path.slipped_orders(0.5).unwrap();
		assert_eq!(orders[0].maker_amount, U256::from(2_000u64));
		assert_eq!(orders[0].taker_amount, U256::from(1_000u64));
	}

	#[test]
	fn test_max_sentinel_never_slipped() {
		use aggregator_types::{HopSource, TwoHopFillData};

		let fill = Fill {
			source_path_id: Uuid::new_v4(),
			venue: Venue::MultiHop,
			kind: OrderKind::TwoHop,
			input: U256::from(1_000u64),
			output: U256::from(2_000u64),
			adjusted_output: I256::try_from(1_900u64).unwrap(),
			gas_estimate: 200_000,
			flags: SourceFlags::venue(Venue::MultiHop),
			fill_data: FillData::TwoHop(TwoHopFillData {
				first_hop: HopSource {
					venue: Venue::UniswapV2,
					fill_data: serde_json::Value::Null,
				},
				second_hop: HopSource {
					venue: Venue::Curve,
					fill_data: serde_json::Value::Null,
				},
				intermediate_token: Address::repeat_byte(0x33),
			}),
		};
		let path = path(Side::Buy, vec![fill], 1_000);
		assert!(path.has_two_hop());
		let orders = path.slipped_orders(0.5).unwrap();
		// The second buy leg's taker amount is the open sentinel.
		assert_eq!(orders[1].taker_amount, U256::MAX);
		// The first leg's real taker amount is slipped.
		assert_eq!(orders[0].taker_amount, U256::from(3_000u64));
	}
}
