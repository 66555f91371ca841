//! Conversion of raw samples and resting orders into normalized,
//! fee-adjusted [`Fill`]s.
//!
//! Every fill carries its settlement cost converted into output-token
//! units, so downstream comparison only ever looks at `adjusted_output`.

use crate::rates::rate;
use aggregator_config::VenueRegistryConfig;
use aggregator_types::{
	mul_div, Fill, FillData, OrderKind, RestingOrder, RestingOrderKind, Sample, Side, SourceFlags,
	Venue, I256, NATIVE_TOKEN_UNIT, U256,
};
use uuid::Uuid;

/// Everything needed to price the settlement cost of a fill in
/// output-token units.
pub struct FillContext<'a> {
	pub side: Side,
	/// Output-token base units per one native token. Zero when no
	/// conversion route was found.
	pub output_per_native: U256,
	/// Input-token base units per one native token.
	pub input_per_native: U256,
	/// Native base units per gas unit.
	pub gas_price: U256,
	pub registry: &'a VenueRegistryConfig,
}

impl FillContext<'_> {
	fn penalty(&self, input: U256, output: U256, gas_estimate: u64) -> U256 {
		let native_cost = self.gas_price * U256::from(gas_estimate);
		native_to_output_amount(
			input,
			output,
			self.input_per_native,
			self.output_per_native,
			native_cost,
		)
	}
}

/// Converts a native-token amount into output-token units.
///
/// Prefers the direct output-side conversion rate; when none exists, falls
/// back to the input-side rate scaled by the fill's own integer exchange
/// rate. Zero when neither rate is available.
pub fn native_to_output_amount(
	input: U256,
	output: U256,
	input_per_native: U256,
	output_per_native: U256,
	native_amount: U256,
) -> U256 {
	if !output_per_native.is_zero() {
		return mul_div(output_per_native, native_amount, NATIVE_TOKEN_UNIT);
	}
	if input_per_native.is_zero() || input.is_zero() {
		return U256::ZERO;
	}
	mul_div(input_per_native, native_amount, NATIVE_TOKEN_UNIT) * (output / input)
}

/// Applies a settlement penalty to a raw output. Selling, the penalty eats
/// into what is received; buying, it inflates what must be paid.
pub fn adjust_output(side: Side, output: U256, penalty: U256) -> I256 {
	let output = I256::try_from(output).unwrap_or(I256::MAX);
	let penalty = I256::try_from(penalty).unwrap_or(I256::MAX);
	match side {
		Side::Sell => output.saturating_sub(penalty),
		Side::Buy => output.saturating_add(penalty),
	}
}

/// Builds a single-venue bridge fill from one curve sample.
pub fn sample_to_fill(sample: &Sample, ctx: &FillContext<'_>, source_path_id: Uuid) -> Fill {
	let gas_estimate = ctx.registry.gas_estimate(sample.venue);
	let penalty = ctx.penalty(sample.input, sample.output, gas_estimate);
	Fill {
		source_path_id,
		venue: sample.venue,
		kind: OrderKind::Bridge,
		input: sample.input,
		output: sample.output,
		adjusted_output: adjust_output(ctx.side, sample.output, penalty),
		gas_estimate,
		flags: SourceFlags::venue(sample.venue),
		fill_data: sample.fill_data.clone(),
	}
}

/// Builds a fill from a resting order, clipped to the request size.
///
/// The order fills at its fixed rate, so output scales linearly with the
/// clipped input while the settlement penalty stays constant. When
/// `filter_negative_adjusted_rate` is set, an order whose penalty exceeds
/// its clipped output is dropped outright.
pub fn resting_order_to_fill(
	order: &RestingOrder,
	target_input: U256,
	ctx: &FillContext<'_>,
	filter_negative_adjusted_rate: bool,
) -> Option<Fill> {
	let (input, output) = order.normalized_amounts(ctx.side);
	if input.is_zero() || output.is_zero() {
		return None;
	}
	let clipped_input = input.min(target_input);
	let clipped_output = mul_div(output, clipped_input, input);

	let gas_estimate = ctx.registry.gas_estimate(Venue::Native);
	let penalty = ctx.penalty(clipped_input, clipped_output, gas_estimate);
	let adjusted_output = adjust_output(ctx.side, clipped_output, penalty);
	if filter_negative_adjusted_rate && rate(ctx.side, clipped_input, adjusted_output) <= 0.0 {
		return None;
	}

	let resting_flag = match order.kind {
		RestingOrderKind::Limit => SourceFlags::RESTING_LIMIT,
		RestingOrderKind::Rfq => SourceFlags::RESTING_RFQ,
	};
	Some(Fill {
		source_path_id: Uuid::new_v4(),
		venue: Venue::Native,
		kind: OrderKind::Resting(order.kind),
		input: clipped_input,
		output: clipped_output,
		adjusted_output,
		gas_estimate,
		flags: SourceFlags::venue(Venue::Native) | resting_flag,
		fill_data: FillData::RestingOrder(order.clone()),
	})
}

/// Builds a two-hop fill from a bridged sample. Samples missing hop data
/// are dropped.
pub fn two_hop_sample_to_fill(
	sample: &Sample,
	ctx: &FillContext<'_>,
	source_path_id: Uuid,
) -> Option<Fill> {
	let hops = sample.fill_data.as_two_hop()?;
	let gas_estimate = ctx.registry.gas_estimate(hops.first_hop.venue)
		+ ctx.registry.gas_estimate(hops.second_hop.venue)
		+ ctx.registry.two_hop_surcharge_gas;
	let penalty = ctx.penalty(sample.input, sample.output, gas_estimate);
	let flags = SourceFlags::venue(Venue::MultiHop)
		| SourceFlags::venue(hops.first_hop.venue)
		| SourceFlags::venue(hops.second_hop.venue);
	Some(Fill {
		source_path_id,
		venue: Venue::MultiHop,
		kind: OrderKind::TwoHop,
		input: sample.input,
		output: sample.output,
		adjusted_output: adjust_output(ctx.side, sample.output, penalty),
		gas_estimate,
		flags,
		fill_data: sample.fill_data.clone(),
	})
}

/// Hook for reshaping venue fills before they are encoded into routable
/// curves. Lets integrators model venue-specific effects (e.g. expected
/// slippage-by-size) without touching the encoder.
pub trait FillAdjustor: Send + Sync {
	fn adjust_fills(&self, side: Side, fills: Vec<Fill>, target_input: U256) -> Vec<Fill>;
}

/// Default adjustor; passes fills through untouched.
pub struct IdentityFillAdjustor;

impl FillAdjustor for IdentityFillAdjustor {
	fn adjust_fills(&self, _side: Side, fills: Vec<Fill>, _target_input: U256) -> Vec<Fill> {
		fills
	}
}
