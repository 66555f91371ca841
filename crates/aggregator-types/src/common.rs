//! Common types and numeric helpers used throughout the aggregator.

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export the ethereum primitives everything is built on
pub use alloy_primitives::{Address, I256, U256};

/// Network (chain) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl fmt::Display for NetworkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Which side of the market a trade request is on.
///
/// `Sell` fixes the input (taker) amount and maximizes output;
/// `Buy` fixes the output (maker) amount and minimizes what is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Sell,
	Buy,
}

/// Smallest settlement unit. Requests at or below this are under the
/// solver's precision floor and are rejected outright.
pub const ONE_BASE_UNIT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Base units of the native fee token that conversion rates are quoted
/// against (one whole token, 18 decimals).
pub const NATIVE_TOKEN_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Lossy conversion of a settlement amount into the solver's numeric domain.
pub fn u256_to_f64(value: U256) -> f64 {
	value
		.as_limbs()
		.iter()
		.enumerate()
		.map(|(i, limb)| (*limb as f64) * 2f64.powi(64 * i as i32))
		.sum()
}

/// Lossy conversion of a signed amount (fee-adjusted outputs may go
/// negative on the sell side) into the solver's numeric domain.
pub fn i256_to_f64(value: I256) -> f64 {
	if value.is_negative() {
		-u256_to_f64(value.unsigned_abs())
	} else {
		u256_to_f64(value.unsigned_abs())
	}
}

/// Rounds a solver amount up to the nearest settlement unit. Negative and
/// non-finite values collapse to zero; the caller is expected to have
/// rejected non-finite solver output already.
pub fn f64_to_u256_ceil(value: f64) -> U256 {
	if !value.is_finite() || value <= 0.0 {
		return U256::ZERO;
	}
	let ceiled = value.ceil();
	if ceiled >= u128::MAX as f64 {
		U256::from(u128::MAX)
	} else {
		U256::from(ceiled as u128)
	}
}

/// Floor of `amount * numerator / denominator` in full precision.
/// Returns zero for a zero denominator.
pub fn mul_div(amount: U256, numerator: U256, denominator: U256) -> U256 {
	if denominator.is_zero() {
		return U256::ZERO;
	}
	amount
		.checked_mul(numerator)
		.map(|product| product / denominator)
		.unwrap_or(U256::MAX)
}

/// Ceiling of `amount * numerator / denominator` in full precision.
/// Returns zero for a zero denominator.
pub fn mul_div_ceil(amount: U256, numerator: U256, denominator: U256) -> U256 {
	if denominator.is_zero() {
		return U256::ZERO;
	}
	amount
		.checked_mul(numerator)
		.map(|product| {
			let quotient = product / denominator;
			if (product % denominator).is_zero() {
				quotient
			} else {
				quotient + ONE_BASE_UNIT
			}
		})
		.unwrap_or(U256::MAX)
}
