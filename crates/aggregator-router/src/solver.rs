//! Greedy marginal-rate allocation over piecewise-linear price curves.
//!
//! The solver works entirely in `f64`; interpolated outputs are handed back
//! to the optimizer, which reconstructs integer-precise fills and rejects
//! any pass whose numbers degenerated to non-finite values.

use crate::routable::CurvePoint;
use aggregator_types::Side;

/// Per-path allocation result, aligned with the input curve slice.
#[derive(Debug, Clone)]
pub struct SolverOutput {
	/// Input allocated to each path.
	pub inputs: Vec<f64>,
	/// Raw (fee-free) interpolated output at each allocated input.
	pub outputs: Vec<f64>,
	/// Total input actually allocated. Below the target when the combined
	/// capacity of all paths runs out.
	pub total_input: f64,
}

/// Raw output at `input`, interpolated linearly between curve points with
/// an implied origin, clamped at the curve's capacity.
pub fn interpolate_output(curve: &[CurvePoint], input: f64) -> f64 {
	if input <= 0.0 {
		return 0.0;
	}
	let mut prev_input = 0.0;
	let mut prev_output = 0.0;
	for point in curve {
		if input <= point.input {
			let span = point.input - prev_input;
			if span <= 0.0 {
				return point.output;
			}
			let t = (input - prev_input) / span;
			return prev_output + t * (point.output - prev_output);
		}
		prev_input = point.input;
		prev_output = point.output;
	}
	prev_output
}

/// Settlement cost at `input`: the fee of the first curve point at or above
/// it. Fees are piecewise constant from above, so a partial segment pays
/// the cost of its upper bound.
fn fee_at(curve: &[CurvePoint], input: f64) -> f64 {
	for point in curve {
		if input <= point.input {
			return point.fee_penalty;
		}
	}
	curve.last().map(|point| point.fee_penalty).unwrap_or(0.0)
}

fn adjusted_at(side: Side, curve: &[CurvePoint], input: f64) -> f64 {
	if input <= 0.0 {
		return 0.0;
	}
	let output = interpolate_output(curve, input);
	match side {
		Side::Sell => output - fee_at(curve, input),
		Side::Buy => output + fee_at(curve, input),
	}
}

/// Allocates `target_input` across the given curves in `steps` equal input
/// increments, each step going to the path with the best marginal
/// fee-adjusted rate at its current allocation.
///
/// Selling, the best marginal is the largest adjusted output gained per
/// unit; buying, the smallest adjusted output (amount paid) per unit. A
/// step that would overshoot a path's capacity is clamped to what the path
/// can still absorb. When every path is exhausted the allocation stops
/// short of the target; fill completeness is arbitrated downstream, so
/// negative marginals still get allocated rather than leaving input
/// unrouted.
pub fn route(side: Side, curves: &[&[CurvePoint]], target_input: f64, steps: usize) -> SolverOutput {
	let mut inputs = vec![0.0; curves.len()];
	if target_input > 0.0 && steps > 0 && !curves.is_empty() {
		let step = target_input / steps as f64;
		let mut remaining = target_input;
		while remaining > target_input * 1e-12 {
			let mut best: Option<(usize, f64, f64)> = None;
			for (i, curve) in curves.iter().enumerate() {
				let capacity = curve.last().map(|point| point.input).unwrap_or(0.0);
				let available = capacity - inputs[i];
				if available <= 0.0 {
					continue;
				}
				let take = step.min(remaining).min(available);
				let before = adjusted_at(side, curve, inputs[i]);
				let after = adjusted_at(side, curve, inputs[i] + take);
				let marginal = (after - before) / take;
				let score = match side {
					Side::Sell => marginal,
					Side::Buy => -marginal,
				};
				if best.map(|(_, _, best_score)| score > best_score).unwrap_or(true) {
					best = Some((i, take, score));
				}
			}
			let Some((winner, take, _)) = best else {
				// Combined capacity exhausted; an under-filled allocation
				// is still reported.
				break;
			};
			inputs[winner] += take;
			remaining -= take;
		}
	}

	let outputs = curves
		.iter()
		.zip(&inputs)
		.map(|(curve, &input)| interpolate_output(curve, input))
		.collect();
	let total_input = inputs.iter().sum();
	SolverOutput {
		inputs,
		outputs,
		total_input,
	}
}
