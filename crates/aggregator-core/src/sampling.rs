//! Probe-amount distribution for curve sampling.

use aggregator_types::U256;

const FRACTION_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Ladder of `num_samples` probe amounts ending exactly at `target`.
///
/// Step sizes follow a geometric distribution in `distribution_base`, so
/// with a base above 1 the ladder is denser near zero where venue curves
/// bend the most. Amounts round to the nearest settlement unit but never
/// past the target; the final amount is the target itself, exactly.
pub fn probe_amounts(num_samples: usize, target: U256, distribution_base: f64) -> Vec<U256> {
	if num_samples == 0 || target.is_zero() {
		return Vec::new();
	}
	let weights: Vec<f64> = (0..num_samples)
		.map(|i| distribution_base.powi(i as i32))
		.collect();
	let total: f64 = weights.iter().sum();

	let mut amounts = Vec::with_capacity(num_samples);
	let mut cumulative = 0.0;
	for (i, weight) in weights.iter().enumerate() {
		if i == num_samples - 1 {
			amounts.push(target);
			break;
		}
		cumulative += weight;
		let fraction = cumulative / total;
		let scaled = U256::from((fraction * FRACTION_PRECISION as f64).round() as u128);
		let amount = mul_div_round(target, scaled, U256::from(FRACTION_PRECISION)).min(target);
		amounts.push(amount);
	}
	amounts
}

/// Nearest-integer variant of `mul_div`; halves round up. The scaled
/// fraction already carries f64 representation error, so directional
/// rounding would push every rung off by one unit.
fn mul_div_round(amount: U256, numerator: U256, denominator: U256) -> U256 {
	if denominator.is_zero() {
		return U256::ZERO;
	}
	amount
		.checked_mul(numerator)
		.and_then(|product| product.checked_add(denominator / U256::from(2u64)))
		.map(|product| product / denominator)
		.unwrap_or(U256::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_uniform_base_spaces_evenly() {
		let amounts = probe_amounts(13, U256::from(1_300u64), 1.0);
		assert_eq!(amounts.len(), 13);
		for (i, amount) in amounts.iter().enumerate() {
			assert_eq!(*amount, U256::from(100 * (i as u64 + 1)));
		}
	}

	#[test]
	fn test_rungs_never_overshoot_even_spacing() {
		// Thirds have no exact f64 representation; each rung lands on the
		// nearest unit rather than one past it.
		let amounts = probe_amounts(3, U256::from(1_000u64), 1.0);
		assert_eq!(
			amounts,
			vec![U256::from(333u64), U256::from(667u64), U256::from(1_000u64)]
		);
	}

	#[test]
	fn test_final_amount_is_exactly_the_target() {
		let target = U256::from(999_999_999_999_999_999u64);
		let amounts = probe_amounts(13, target, 1.05);
		assert_eq!(*amounts.last().unwrap(), target);
	}

	#[test]
	fn test_amounts_are_non_decreasing() {
		let amounts = probe_amounts(13, U256::from(10u64).pow(U256::from(21)), 1.05);
		for pair in amounts.windows(2) {
			assert!(pair[0] <= pair[1]);
		}
	}

	#[test]
	fn test_geometric_base_back_loads_steps() {
		let amounts = probe_amounts(13, U256::from(1_000_000u64), 1.5);
		let first_step = amounts[0];
		let last_step = amounts[12] - amounts[11];
		assert!(last_step > first_step);
	}

	#[test]
	fn test_degenerate_inputs_yield_empty_ladder() {
		assert!(probe_amounts(0, U256::from(100u64), 1.05).is_empty());
		assert!(probe_amounts(13, U256::ZERO, 1.05).is_empty());
	}
}
