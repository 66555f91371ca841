//! Encoding of fills into solver-ready routable paths.
//!
//! Each routable path pairs a piecewise-linear price curve in the solver's
//! `f64` domain with the exact liquidity it was derived from, so a solved
//! allocation can always be reconstructed back into integer-precise fills.

use crate::fills::{
	resting_order_to_fill, sample_to_fill, two_hop_sample_to_fill, FillAdjustor, FillContext,
};
use aggregator_types::{
	i256_to_f64, u256_to_f64, Fill, RestingOrder, Sample, Side, SourceFlags, Venue, U256,
};
use uuid::Uuid;

/// One point of a routable path's curve. `fee_penalty` is the settlement
/// cost at this point in output-token units, kept separate from the raw
/// output so reconstruction can recover both.
#[derive(Debug, Clone, Copy)]
pub struct CurvePoint {
	pub input: f64,
	pub output: f64,
	pub fee_penalty: f64,
}

impl CurvePoint {
	/// Output with the settlement cost applied. Selling, the cost reduces
	/// what is received; buying, it inflates what is paid.
	pub fn adjusted_output(&self, side: Side) -> f64 {
		match side {
			Side::Sell => self.output - self.fee_penalty,
			Side::Buy => self.output + self.fee_penalty,
		}
	}
}

/// The liquidity a routable path was encoded from, retained for
/// reconstruction of the solved allocation.
#[derive(Debug, Clone)]
pub enum PathLiquidity {
	/// A venue's sampled curve, one fill per surviving sample in
	/// ascending input order.
	VenueCurve { fills: Vec<Fill> },
	/// A single bridged quote for the full trade amount.
	TwoHop { fill: Fill },
	/// A resting order, re-clippable to any allocated input.
	RestingOrder { order: RestingOrder },
}

/// A solver-ready path: a price curve plus provenance.
#[derive(Debug, Clone)]
pub struct RoutablePath {
	pub path_id: Uuid,
	pub venue: Venue,
	pub flags: SourceFlags,
	/// Whether every contributing source settles without the generic
	/// wrapper. Drives the solver's restricted second pass.
	pub is_vip: bool,
	pub curve: Vec<CurvePoint>,
	pub liquidity: PathLiquidity,
}

impl RoutablePath {
	/// Maximum input this path can absorb.
	pub fn capacity(&self) -> f64 {
		self.curve.last().map(|point| point.input).unwrap_or(0.0)
	}
}

fn fee_penalty_of(fill: &Fill) -> f64 {
	i256_to_f64(fill.output_penalty()).abs()
}

fn curve_point(fill: &Fill) -> CurvePoint {
	CurvePoint {
		input: u256_to_f64(fill.input),
		output: u256_to_f64(fill.output),
		fee_penalty: fee_penalty_of(fill),
	}
}

/// Encodes one venue's sampled curve into a routable path.
///
/// Trailing zero-output samples mark probe amounts past the venue's
/// depth and are trimmed; a curve left with fewer than
/// `min_curve_samples` points is too sparse to interpolate and is
/// dropped entirely.
pub fn encode_venue_curve(
	samples: &[Sample],
	ctx: &FillContext<'_>,
	adjustor: &dyn FillAdjustor,
	target_input: U256,
	min_curve_samples: usize,
	vip_flags: SourceFlags,
) -> Option<RoutablePath> {
	let last_liquid = samples.iter().rposition(|sample| !sample.output.is_zero())?;
	let samples = &samples[..=last_liquid];
	if samples.len() < min_curve_samples {
		return None;
	}

	let path_id = Uuid::new_v4();
	let fills: Vec<Fill> = samples
		.iter()
		.map(|sample| sample_to_fill(sample, ctx, path_id))
		.collect();
	let fills = adjustor.adjust_fills(ctx.side, fills, target_input);
	if fills.len() < min_curve_samples {
		return None;
	}

	let venue = fills[0].venue;
	let flags = SourceFlags::merge(fills.iter().map(|fill| fill.flags));
	let curve = fills.iter().map(curve_point).collect();
	Some(RoutablePath {
		path_id,
		venue,
		flags,
		is_vip: vip_flags.contains(flags),
		curve,
		liquidity: PathLiquidity::VenueCurve { fills },
	})
}

/// Encodes a bridged two-hop quote as a single-point path. The solver
/// interpolates it linearly from the origin.
pub fn encode_two_hop(
	sample: &Sample,
	ctx: &FillContext<'_>,
	vip_flags: SourceFlags,
) -> Option<RoutablePath> {
	if sample.output.is_zero() {
		return None;
	}
	let path_id = Uuid::new_v4();
	let fill = two_hop_sample_to_fill(sample, ctx, path_id)?;
	Some(RoutablePath {
		path_id,
		venue: Venue::MultiHop,
		flags: fill.flags,
		is_vip: vip_flags.contains(fill.flags),
		curve: vec![curve_point(&fill)],
		liquidity: PathLiquidity::TwoHop { fill },
	})
}

/// Encodes a resting order as a synthetic curve of `num_samples` evenly
/// spaced points up to the order's clipped size.
///
/// The settlement cost of a resting order is one flat fill regardless of
/// how much of it is taken, so `fee_penalty` stays constant across the
/// synthetic points while input and output scale linearly.
pub fn encode_resting_order(
	order: &RestingOrder,
	ctx: &FillContext<'_>,
	target_input: U256,
	num_samples: usize,
	vip_flags: SourceFlags,
	filter_negative_adjusted_rate: bool,
) -> Option<RoutablePath> {
	let fill = resting_order_to_fill(order, target_input, ctx, filter_negative_adjusted_rate)?;
	let clipped_input = u256_to_f64(fill.input);
	let clipped_output = u256_to_f64(fill.output);
	let fee_penalty = fee_penalty_of(&fill);

	let curve = (1..=num_samples)
		.map(|i| {
			let fraction = i as f64 / num_samples as f64;
			CurvePoint {
				input: clipped_input * fraction,
				output: clipped_output * fraction,
				fee_penalty,
			}
		})
		.collect();
	Some(RoutablePath {
		path_id: fill.source_path_id,
		venue: Venue::Native,
		flags: fill.flags,
		is_vip: vip_flags.contains(fill.flags),
		curve,
		liquidity: PathLiquidity::RestingOrder {
			order: order.clone(),
		},
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::fills::IdentityFillAdjustor;
	use aggregator_config::{SettlementOverheadConfig, VenueRegistryConfig};
	use aggregator_types::{Address, FillData, RestingOrderKind};
	use std::collections::HashMap;

	fn registry() -> VenueRegistryConfig {
		VenueRegistryConfig {
			name: "testnet".to_string(),
			sell_venues: vec![Venue::UniswapV2],
			buy_venues: vec![Venue::UniswapV2],
			fee_quote_venues: vec![Venue::UniswapV2],
			vip_venues: vec![Venue::UniswapV2],
			gas_schedule: HashMap::new(),
			default_gas_estimate: 0,
			two_hop_surcharge_gas: 0,
			overhead: SettlementOverheadConfig::default(),
			micro_trade: Default::default(),
		}
	}

	fn ctx(registry: &VenueRegistryConfig) -> FillContext<'_> {
		FillContext {
			side: Side::Sell,
			output_per_native: U256::ZERO,
			input_per_native: U256::ZERO,
			gas_price: U256::ZERO,
			registry,
		}
	}

	fn sample(venue: Venue, input: u64, output: u64) -> Sample {
		Sample {
			venue,
			input: U256::from(input),
			output: U256::from(output),
			fill_data: FillData::None,
		}
	}

	#[test]
	fn test_trailing_zero_outputs_trimmed() {
		let registry = registry();
		let ctx = ctx(&registry);
		let samples = vec![
			sample(Venue::UniswapV2, 100, 200),
			sample(Venue::UniswapV2, 200, 390),
			sample(Venue::UniswapV2, 300, 570),
			sample(Venue::UniswapV2, 400, 0),
			sample(Venue::UniswapV2, 500, 0),
		];
		let path = encode_venue_curve(
			&samples,
			&ctx,
			&IdentityFillAdjustor,
			U256::from(300u64),
			3,
			SourceFlags::venue(Venue::UniswapV2),
		)
		.unwrap();
		assert_eq!(path.curve.len(), 3);
		assert_eq!(path.capacity(), 300.0);
		assert!(path.is_vip);
	}

	#[test]
	fn test_sparse_curve_dropped() {
		let registry = registry();
		let ctx = ctx(&registry);
		let samples = vec![
			sample(Venue::UniswapV2, 100, 200),
			sample(Venue::UniswapV2, 200, 390),
			sample(Venue::UniswapV2, 300, 0),
		];
		assert!(encode_venue_curve(
			&samples,
			&ctx,
			&IdentityFillAdjustor,
			U256::from(300u64),
			3,
			SourceFlags::NONE,
		)
		.is_none());
	}

	#[test]
	fn test_all_zero_curve_dropped() {
		let registry = registry();
		let ctx = ctx(&registry);
		let samples = vec![
			sample(Venue::UniswapV2, 100, 0),
			sample(Venue::UniswapV2, 200, 0),
			sample(Venue::UniswapV2, 300, 0),
		];
		assert!(encode_venue_curve(
			&samples,
			&ctx,
			&IdentityFillAdjustor,
			U256::from(300u64),
			3,
			SourceFlags::NONE,
		)
		.is_none());
	}

	#[test]
	fn test_resting_order_synthetic_curve() {
		let registry = registry();
		let ctx = ctx(&registry);
		let order = RestingOrder {
			kind: RestingOrderKind::Rfq,
			maker_token: Address::ZERO,
			taker_token: Address::ZERO,
			maker_amount: U256::from(2_600u64),
			taker_amount: U256::from(1_300u64),
			taker_fee_amount: U256::ZERO,
			fillable_maker_amount: U256::from(2_600u64),
			fillable_taker_amount: U256::from(1_300u64),
			fillable_taker_fee_amount: U256::ZERO,
		};
		// Target below the order size: curve spans the clip, not the order.
		let path = encode_resting_order(
			&order,
			&ctx,
			U256::from(650u64),
			13,
			SourceFlags::RESTING_RFQ | SourceFlags::venue(Venue::Native),
			false,
		)
		.unwrap();
		assert_eq!(path.curve.len(), 13);
		assert_eq!(path.capacity(), 650.0);
		assert_eq!(path.curve[0].input, 50.0);
		assert_eq!(path.curve[12].output, 1_300.0);
		assert!(path.is_vip);
	}

	#[test]
	fn test_limit_order_is_not_vip() {
		let registry = registry();
		let ctx = ctx(&registry);
		let order = RestingOrder {
			kind: RestingOrderKind::Limit,
			maker_token: Address::ZERO,
			taker_token: Address::ZERO,
			maker_amount: U256::from(2_000u64),
			taker_amount: U256::from(1_000u64),
			taker_fee_amount: U256::ZERO,
			fillable_maker_amount: U256::from(2_000u64),
			fillable_taker_amount: U256::from(1_000u64),
			fillable_taker_fee_amount: U256::ZERO,
		};
		let vip_flags = SourceFlags::RESTING_RFQ | SourceFlags::venue(Venue::Native);
		let path =
			encode_resting_order(&order, &ctx, U256::from(1_000u64), 13, vip_flags, false).unwrap();
		assert!(!path.is_vip);
	}
}
