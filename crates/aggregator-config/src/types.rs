//! Configuration types for the aggregator.

use crate::serde_helpers::{deserialize_network_id_map, serialize_network_id_map};
use aggregator_types::{NetworkId, SourceFlags, Venue, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete aggregator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AggregatorConfig {
	/// Routing/solver options.
	#[serde(default)]
	pub routing: RoutingConfig,
	/// Off-chain quoting options.
	#[serde(default)]
	pub rfq: RfqConfig,
	/// Per-network venue registries.
	#[serde(
		deserialize_with = "deserialize_network_id_map",
		serialize_with = "serialize_network_id_map"
	)]
	pub networks: HashMap<NetworkId, VenueRegistryConfig>,
}

impl AggregatorConfig {
	pub fn registry(&self, network: NetworkId) -> Option<&VenueRegistryConfig> {
		self.networks.get(&network)
	}
}

/// Routing and solver options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
	/// Number of probe amounts per venue curve.
	pub num_probe_samples: usize,
	/// Base of the geometric probe-amount ladder.
	pub probe_distribution_base: f64,
	/// Number of equal input steps the allocation solver takes.
	pub solver_steps: usize,
	/// Minimum samples a venue curve needs to be routable.
	pub min_curve_samples: usize,
	/// Samples synthesized per resting order so the solver can interpolate
	/// it like a continuous curve.
	pub resting_order_samples: usize,
}

impl Default for RoutingConfig {
	fn default() -> Self {
		Self {
			num_probe_samples: 13,
			probe_distribution_base: 1.05,
			solver_steps: 200,
			min_curve_samples: 3,
			resting_order_samples: 13,
		}
	}
}

/// Off-chain (RFQ) quoting options. The endpoints themselves belong to the
/// quote-client collaborator; only the policy lives here.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RfqConfig {
	/// Master switch for phase-2 off-chain augmentation.
	pub enabled: bool,
	/// Per-endpoint quote timeout. A slow endpoint yields an empty result,
	/// never a failed request.
	pub endpoint_timeout_ms: u64,
}

impl Default for RfqConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			endpoint_timeout_ms: 600,
		}
	}
}

/// Per-network venue registry.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VenueRegistryConfig {
	/// Network name for logging.
	pub name: String,
	/// Venues sampled for sell requests.
	pub sell_venues: Vec<Venue>,
	/// Venues sampled for buy requests.
	pub buy_venues: Vec<Venue>,
	/// Venues trusted for fee-token conversion-rate quotes. Also the venues
	/// that survive the micro-trade skip.
	pub fee_quote_venues: Vec<Venue>,
	/// Venues whose settlement does not require the generic wrapper.
	pub vip_venues: Vec<Venue>,
	/// Gas each venue's settlement is expected to consume.
	#[serde(default)]
	pub gas_schedule: HashMap<Venue, u64>,
	/// Fallback for venues missing from `gas_schedule`.
	#[serde(default = "default_gas_estimate")]
	pub default_gas_estimate: u64,
	/// Fixed surcharge added on top of both legs of a two-hop fill.
	#[serde(default = "default_two_hop_surcharge")]
	pub two_hop_surcharge_gas: u64,
	/// Settlement overhead schedule keyed by source-flag class.
	#[serde(default)]
	pub overhead: SettlementOverheadConfig,
	/// Skip-full-optimization policy for trades too small to matter.
	#[serde(default)]
	pub micro_trade: MicroTradePolicy,
}

fn default_gas_estimate() -> u64 {
	200_000
}

fn default_two_hop_surcharge() -> u64 {
	30_000
}

impl VenueRegistryConfig {
	/// Gas estimate for a venue, falling back to the registry default.
	pub fn gas_estimate(&self, venue: Venue) -> u64 {
		self.gas_schedule
			.get(&venue)
			.copied()
			.unwrap_or(self.default_gas_estimate)
	}

	/// Merged source-flag mask of every VIP-eligible source. Computed once
	/// at orchestrator construction, not per request.
	pub fn vip_flags(&self) -> SourceFlags {
		let venue_flags = SourceFlags::merge(self.vip_venues.iter().map(|v| SourceFlags::venue(*v)));
		// RFQ resting orders settle through the native VIP path.
		venue_flags | SourceFlags::venue(Venue::Native) | SourceFlags::RESTING_RFQ
	}
}

/// Flat settlement overhead by allocation class, in gas.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettlementOverheadConfig {
	/// Overhead when every contributing source is VIP-eligible.
	pub vip_route_gas: u64,
	/// Overhead of the generic wrapper execution path.
	pub wrapper_gas: u64,
	/// Additional overhead when a two-hop allocation is present.
	pub two_hop_extra_gas: u64,
}

impl Default for SettlementOverheadConfig {
	fn default() -> Self {
		Self {
			vip_route_gas: 20_000,
			wrapper_gas: 160_000,
			two_hop_extra_gas: 30_000,
		}
	}
}

impl SettlementOverheadConfig {
	/// Overhead for an allocation with the given merged source flags.
	/// `vip_flags` is the registry's precomputed VIP mask.
	pub fn overhead_gas(&self, flags: SourceFlags, vip_flags: SourceFlags) -> u64 {
		let base = if vip_flags.contains(flags) {
			self.vip_route_gas
		} else {
			self.wrapper_gas
		};
		if flags.intersects(SourceFlags::venue(Venue::MultiHop)) {
			base + self.two_hop_extra_gas
		} else {
			base
		}
	}
}

/// Configurable skip-full-optimization policy: when the requested amount's
/// native-token value is below the threshold, only fee-quoting venues are
/// considered.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MicroTradePolicy {
	pub enabled: bool,
	/// Threshold in native fee-token base units.
	pub min_native_value: U256,
}
