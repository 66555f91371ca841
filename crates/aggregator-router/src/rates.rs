//! Rate and penalty utilities.
//!
//! Rates are normalized so that higher is always better regardless of side:
//! output per input for sells, input per output for buys. They live in the
//! solver's `f64` domain; settlement amounts never do.

use aggregator_types::{i256_to_f64, u256_to_f64, Side, I256, U256};

/// Rate of an (input, output) pair for one side of the market.
/// Zero amounts rate as zero; a negative adjusted output rates negative.
pub fn rate(side: Side, input: U256, output: I256) -> f64 {
	if input.is_zero() || output.is_zero() {
		return 0.0;
	}
	let input = u256_to_f64(input);
	let output = i256_to_f64(output);
	match side {
		Side::Sell => output / input,
		Side::Buy => input / output,
	}
}

/// Rate additionally penalized by how much of `target_input` the
/// allocation actually fills. Rewards allocations that exactly meet the
/// target over ones that would need a top-up.
pub fn complete_rate(side: Side, input: U256, output: I256, target_input: U256) -> f64 {
	if input.is_zero() || output.is_zero() || target_input.is_zero() {
		return 0.0;
	}
	let filled_fraction = u256_to_f64(input) / u256_to_f64(target_input);
	rate(side, input, output) * filled_fraction
}

#[cfg(test)]
mod tests {
	use super::*;

	fn i256(value: u64) -> I256 {
		I256::try_from(value).unwrap()
	}

	#[test]
	fn test_rate_sides() {
		let input = U256::from(2u64);
		let output = i256(4);
		assert_eq!(rate(Side::Sell, input, output), 2.0);
		assert_eq!(rate(Side::Buy, input, output), 0.5);
	}

	#[test]
	fn test_rate_zero_amounts() {
		assert_eq!(rate(Side::Sell, U256::ZERO, i256(4)), 0.0);
		assert_eq!(rate(Side::Sell, U256::from(2u64), I256::ZERO), 0.0);
	}

	#[test]
	fn test_negative_adjusted_output_rates_negative() {
		let negative = I256::try_from(-4i64).unwrap();
		assert!(rate(Side::Sell, U256::from(2u64), negative) < 0.0);
	}

	#[test]
	fn test_complete_rate_penalizes_partial_fill() {
		let input = U256::from(500u64);
		let output = i256(1_000);
		let target = U256::from(1_000u64);
		// Rate 2.0 scaled by the 50% fill.
		assert_eq!(complete_rate(Side::Sell, input, output, target), 1.0);
		// A full fill is unpenalized.
		assert_eq!(complete_rate(Side::Sell, target, i256(2_000), target), 2.0);
	}
}
