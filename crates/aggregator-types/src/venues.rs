//! Liquidity venues and the source-flag bitmask used for settlement
//! overhead accounting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A liquidity venue the aggregator can allocate against.
///
/// `Native` covers resting orders and off-chain maker quotes settled through
/// the native order protocol; `MultiHop` tags two-hop bridged allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
	UniswapV2,
	UniswapV3,
	SushiSwap,
	PancakeSwap,
	Curve,
	BalancerV2,
	Dodo,
	Native,
	MultiHop,
}

impl Venue {
	/// All venues, in bit-assignment order.
	pub const ALL: [Venue; 9] = [
		Venue::UniswapV2,
		Venue::UniswapV3,
		Venue::SushiSwap,
		Venue::PancakeSwap,
		Venue::Curve,
		Venue::BalancerV2,
		Venue::Dodo,
		Venue::Native,
		Venue::MultiHop,
	];

	fn bit(self) -> u64 {
		match self {
			Venue::UniswapV2 => 1 << 0,
			Venue::UniswapV3 => 1 << 1,
			Venue::SushiSwap => 1 << 2,
			Venue::PancakeSwap => 1 << 3,
			Venue::Curve => 1 << 4,
			Venue::BalancerV2 => 1 << 5,
			Venue::Dodo => 1 << 6,
			Venue::Native => 1 << 7,
			Venue::MultiHop => 1 << 8,
		}
	}
}

impl fmt::Display for Venue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:?}", self)
	}
}

/// Fixed-width bitmask recording which venue kinds contributed to an
/// allocation. The settlement-overhead schedule is keyed by this mask so
/// the overhead for a path never needs to be recomputed from its fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceFlags(pub u64);

impl SourceFlags {
	pub const NONE: SourceFlags = SourceFlags(0);
	/// Resting limit orders route through the generic settlement wrapper.
	pub const RESTING_LIMIT: SourceFlags = SourceFlags(1 << 62);
	/// Resting RFQ orders are fillable through the overhead-free path.
	pub const RESTING_RFQ: SourceFlags = SourceFlags(1 << 63);

	pub fn venue(venue: Venue) -> SourceFlags {
		SourceFlags(venue.bit())
	}

	pub fn contains(self, other: SourceFlags) -> bool {
		self.0 & other.0 == other.0
	}

	pub fn intersects(self, other: SourceFlags) -> bool {
		self.0 & other.0 != 0
	}

	pub fn merge<I: IntoIterator<Item = SourceFlags>>(flags: I) -> SourceFlags {
		flags
			.into_iter()
			.fold(SourceFlags::NONE, |merged, current| merged | current)
	}
}

impl BitOr for SourceFlags {
	type Output = SourceFlags;

	fn bitor(self, rhs: SourceFlags) -> SourceFlags {
		SourceFlags(self.0 | rhs.0)
	}
}

impl BitOrAssign for SourceFlags {
	fn bitor_assign(&mut self, rhs: SourceFlags) {
		self.0 |= rhs.0;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_venue_bits_are_distinct() {
		let merged = SourceFlags::merge(Venue::ALL.iter().map(|v| SourceFlags::venue(*v)));
		assert_eq!(merged.0.count_ones() as usize, Venue::ALL.len());
	}

	#[test]
	fn test_contains_and_intersects() {
		let flags = SourceFlags::venue(Venue::UniswapV3) | SourceFlags::RESTING_RFQ;
		assert!(flags.contains(SourceFlags::venue(Venue::UniswapV3)));
		assert!(flags.intersects(SourceFlags::RESTING_RFQ));
		assert!(!flags.contains(SourceFlags::venue(Venue::Curve)));
	}
}
