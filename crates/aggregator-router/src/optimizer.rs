//! Two-pass optimal-path search over encoded routable paths.
//!
//! One pass solves over every path, a second over the VIP-eligible subset
//! only. Both allocations are reconstructed into integer-precise [`Path`]s
//! and the fee-adjusted winner is returned, so a slightly worse nominal
//! rate can still win on settlement cost.

use crate::fills::{resting_order_to_fill, sample_to_fill, FillAdjustor, FillContext};
use crate::path::{Path, PathContext, PathPenaltyOpts};
use crate::routable::{
	encode_resting_order, encode_two_hop, encode_venue_curve, CurvePoint, PathLiquidity,
	RoutablePath,
};
use crate::solver::route;
use aggregator_config::{RoutingConfig, VenueRegistryConfig};
use aggregator_types::{
	f64_to_u256_ceil, u256_to_f64, Fill, RestingOrder, Result, Sample, I256, ONE_BASE_UNIT, U256,
};
use tracing::warn;

/// Solver totals within this relative distance of the target are treated
/// as complete fills with accumulated precision error; anything further
/// below is a genuine under-fill and is not scaled up.
const PRECISION_TOLERANCE: f64 = 1e-6;

pub struct PathOptimizer<'a> {
	context: PathContext,
	target_input: U256,
	routing: &'a RoutingConfig,
	registry: &'a VenueRegistryConfig,
	penalty_opts: PathPenaltyOpts,
	fill_adjustor: &'a dyn FillAdjustor,
}

impl<'a> PathOptimizer<'a> {
	pub fn new(
		context: PathContext,
		target_input: U256,
		routing: &'a RoutingConfig,
		registry: &'a VenueRegistryConfig,
		penalty_opts: PathPenaltyOpts,
		fill_adjustor: &'a dyn FillAdjustor,
	) -> Self {
		Self {
			context,
			target_input,
			routing,
			registry,
			penalty_opts,
			fill_adjustor,
		}
	}

	/// Finds the best allocation across venue curves, two-hop quotes and
	/// resting orders. `Ok(None)` means no feasible allocation exists;
	/// requests at or below one base unit are under the solver's precision
	/// floor and resolve the same way.
	pub fn find_optimal_path(
		&self,
		venue_curves: &[Vec<Sample>],
		two_hop_samples: &[Sample],
		resting_orders: &[RestingOrder],
	) -> Result<Option<Path>> {
		if self.target_input <= ONE_BASE_UNIT {
			return Ok(None);
		}
		let ctx = self.fill_context();
		let vip_flags = self.registry.vip_flags();

		let mut paths = Vec::new();
		for samples in venue_curves {
			if let Some(path) = encode_venue_curve(
				samples,
				&ctx,
				self.fill_adjustor,
				self.target_input,
				self.routing.min_curve_samples,
				vip_flags,
			) {
				paths.push(path);
			}
		}
		for sample in two_hop_samples {
			if let Some(path) = encode_two_hop(sample, &ctx, vip_flags) {
				paths.push(path);
			}
		}
		for order in resting_orders {
			if let Some(path) = encode_resting_order(
				order,
				&ctx,
				self.target_input,
				self.routing.resting_order_samples,
				vip_flags,
				true,
			) {
				paths.push(path);
			}
		}
		if paths.is_empty() {
			return Ok(None);
		}

		let all_refs: Vec<&RoutablePath> = paths.iter().collect();
		let vip_refs: Vec<&RoutablePath> = paths.iter().filter(|path| path.is_vip).collect();
		let all_sources_path = self.solve_pass(&all_refs, &ctx)?;
		let vip_sources_path = self.solve_pass(&vip_refs, &ctx)?;

		match (all_sources_path, vip_sources_path) {
			(None, vip) => Ok(vip),
			(Some(all), None) => Ok(Some(all)),
			(Some(all), Some(vip)) => {
				if vip.is_better_than(&all)? {
					Ok(Some(vip))
				} else {
					Ok(Some(all))
				}
			}
		}
	}

	fn fill_context(&self) -> FillContext<'a> {
		FillContext {
			side: self.context.side,
			output_per_native: self.penalty_opts.output_per_native,
			input_per_native: self.penalty_opts.input_per_native,
			gas_price: self.penalty_opts.gas_price,
			registry: self.registry,
		}
	}

	/// Runs the solver over `paths` and reconstructs the allocation into a
	/// [`Path`]. A pass whose solver numbers degenerate to non-finite
	/// values is discarded wholesale rather than reconstructed from
	/// garbage.
	fn solve_pass(
		&self,
		paths: &[&RoutablePath],
		ctx: &FillContext<'_>,
	) -> Result<Option<Path>> {
		if paths.is_empty() {
			return Ok(None);
		}
		let target = u256_to_f64(self.target_input);
		let curves: Vec<&[CurvePoint]> = paths.iter().map(|path| path.curve.as_slice()).collect();
		let solved = route(self.context.side, &curves, target, self.routing.solver_steps);
		if !solved.total_input.is_finite()
			|| solved.outputs.iter().any(|output| !output.is_finite())
		{
			warn!(
				side = ?self.context.side,
				target_input = %self.target_input,
				"allocation solver produced a non-finite amount; discarding pass"
			);
			return Ok(None);
		}
		if solved.total_input <= 0.0 {
			return Ok(None);
		}

		// The solver's totals drift from the target by accumulated f64
		// error; scale allocations back up and round against the taker.
		// A genuine under-fill is left as-is so it reports honestly.
		let scalar = if solved.total_input < target * (1.0 - PRECISION_TOLERANCE) {
			1.0
		} else {
			target / solved.total_input
		};

		let mut fills = Vec::new();
		for (i, path) in paths.iter().enumerate() {
			let input = solved.inputs[i];
			let output = solved.outputs[i];
			if input <= 0.0 || output <= 0.0 {
				continue;
			}
			let input_corrected = f64_to_u256_ceil(input * scalar).min(self.target_input);
			if input_corrected.is_zero() {
				continue;
			}
			match &path.liquidity {
				PathLiquidity::RestingOrder { order } => {
					// The clip already happened at the solved size; a
					// negative-rate order is kept here so the pass stays
					// comparable to what the solver saw.
					if let Some(fill) = resting_order_to_fill(order, input_corrected, ctx, false) {
						fills.push(Fill {
							source_path_id: path.path_id,
							..fill
						});
					}
				}
				PathLiquidity::TwoHop { fill } => {
					fills.push(reconstruct_two_hop_fill(fill, input_corrected, output));
				}
				PathLiquidity::VenueCurve { fills: curve_fills } => {
					fills.push(self.reconstruct_venue_fill(curve_fills, ctx, input_corrected, output));
				}
			}
		}
		if fills.is_empty() {
			return Ok(None);
		}
		Path::new(
			self.context,
			fills,
			self.target_input,
			self.penalty_opts.clone(),
		)
		.map(Some)
	}

	/// Maps a solved allocation back onto the venue's measured samples.
	///
	/// The enclosing upper sample supplies the fill's metadata and fee
	/// penalty since venue costs grow with size, but the amounts are always
	/// the solver's: its allocated input and its interpolated output,
	/// clamped to the largest measured sample (liquidity beyond it is
	/// unknown) and floored at one base unit.
	fn reconstruct_venue_fill(
		&self,
		curve_fills: &[Fill],
		ctx: &FillContext<'_>,
		input_corrected: U256,
		solver_output: f64,
	) -> Fill {
		let mut fill = curve_fills[curve_fills.len() - 1].clone();
		for k in (0..curve_fills.len()).rev() {
			if k == 0 {
				fill = curve_fills[0].clone();
			}
			if input_corrected > curve_fills[k].input {
				if let Some(right) = curve_fills.get(k + 1) {
					let interpolated = Sample {
						venue: right.venue,
						input: input_corrected,
						output: f64_to_u256_round(solver_output),
						fill_data: right.fill_data.clone(),
					};
					fill = self
						.adjusted_sample_fill(&interpolated, ctx, right)
						.unwrap_or(fill);
				} else {
					// Past the deepest sample; its metadata still applies.
					fill = curve_fills[k].clone();
				}
				break;
			}
		}

		let max_sampled_output = curve_fills
			.iter()
			.map(|sample_fill| sample_fill.output)
			.max()
			.unwrap_or(U256::ZERO)
			.max(ONE_BASE_UNIT);
		let max_signed = I256::try_from(max_sampled_output).unwrap_or(I256::MAX);
		let penalty = fill.output_penalty();
		let output = f64_to_u256_round(solver_output).clamp(ONE_BASE_UNIT, max_sampled_output);
		fill.input = input_corrected;
		fill.output = output;
		fill.adjusted_output = I256::try_from(output)
			.unwrap_or(I256::MAX)
			.saturating_add(penalty)
			.clamp(I256::ONE, max_signed);
		fill
	}

	fn adjusted_sample_fill(
		&self,
		sample: &Sample,
		ctx: &FillContext<'_>,
		template: &Fill,
	) -> Option<Fill> {
		let fill = sample_to_fill(sample, ctx, template.source_path_id);
		self.fill_adjustor
			.adjust_fills(ctx.side, vec![fill], self.target_input)
			.into_iter()
			.next()
	}
}

/// Rescales a two-hop quote to its allocated share. The settlement cost of
/// both legs applies in full no matter how much of the quote is taken.
fn reconstruct_two_hop_fill(fill: &Fill, input_corrected: U256, solver_output: f64) -> Fill {
	let penalty = fill.output_penalty();
	let max_output = fill.output.max(ONE_BASE_UNIT);
	let output = f64_to_u256_round(solver_output).clamp(ONE_BASE_UNIT, max_output);
	let mut fill = fill.clone();
	fill.input = input_corrected;
	fill.adjusted_output = I256::try_from(output)
		.unwrap_or(I256::MAX)
		.saturating_add(penalty);
	fill.output = output;
	fill
}

fn f64_to_u256_round(value: f64) -> U256 {
	if !value.is_finite() || value <= 0.0 {
		return U256::ZERO;
	}
	let rounded = value.round();
	if rounded >= u128::MAX as f64 {
		U256::from(u128::MAX)
	} else {
		U256::from(rounded as u128)
	}
}
