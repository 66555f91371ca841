//! Whole-order comparison price handed to off-chain makers.

use aggregator_config::VenueRegistryConfig;
use aggregator_router::Path;
use aggregator_types::{
	u256_to_f64, MarketSideLiquidity, Side, SourceFlags, Venue, NATIVE_TOKEN_UNIT, U256,
};
use tracing::debug;

/// Significant digits the published price is quantized to. Prices are in
/// raw base-unit terms, so quantization is relative, not decimal-place.
const COMPARISON_PRICE_DIGITS: i32 = 4;

/// The whole-order price (maker base units per taker base unit) an off-chain
/// maker has to beat to displace the on-chain allocation.
///
/// Starts from the path's overhead-applied adjusted rate and adds back the
/// settlement cost a native order would itself carry, so a maker is asked to
/// beat the on-chain price net of its own fill's gas burden. Returns `None`
/// when the rate or the fee arithmetic degenerates; phase 2 then quotes
/// without pricing context rather than with a misleading one.
pub fn comparison_price(
	path: &Path,
	liquidity: &MarketSideLiquidity,
	registry: &VenueRegistryConfig,
	gas_price: U256,
) -> Option<f64> {
	let adjusted_rate = path.adjusted_rate();
	if !adjusted_rate.is_finite() || adjusted_rate <= 0.0 {
		return None;
	}

	let native_order_flags = SourceFlags::venue(Venue::Native) | SourceFlags::RESTING_RFQ;
	let fee_gas = registry.gas_estimate(Venue::Native)
		+ registry
			.overhead
			.overhead_gas(native_order_flags, registry.vip_flags());
	let fee_native = u256_to_f64(gas_price) * fee_gas as f64;
	let fee_output = native_fee_in_output_units(liquidity, adjusted_rate, fee_native);

	let amount = u256_to_f64(liquidity.input_amount);
	if amount <= 0.0 {
		return None;
	}
	let (maker_amount, taker_amount) = match liquidity.side {
		// Output units are maker units; the fee adds to what the maker
		// must deliver to break even with the on-chain route.
		Side::Sell => (adjusted_rate * amount + fee_output, amount),
		// Output units are taker units; the fee shrinks what the taker
		// can afford to pay the maker.
		Side::Buy => (amount, amount / adjusted_rate - fee_output),
	};
	if maker_amount <= 0.0 || taker_amount <= 0.0 {
		debug!(
			side = ?liquidity.side,
			"native settlement cost exceeds the trade; omitting comparison price"
		);
		return None;
	}

	let price = maker_amount / taker_amount;
	if !price.is_finite() || price <= 0.0 {
		return None;
	}
	Some(quantize(price))
}

/// Converts a native-token fee into output-token base units, preferring the
/// direct output conversion rate and falling back to the input rate bridged
/// through the path's own price.
fn native_fee_in_output_units(
	liquidity: &MarketSideLiquidity,
	adjusted_rate: f64,
	fee_native: f64,
) -> f64 {
	let native_unit = u256_to_f64(NATIVE_TOKEN_UNIT);
	let output_per_native = u256_to_f64(liquidity.output_per_native);
	if output_per_native > 0.0 {
		return fee_native * output_per_native / native_unit;
	}
	let input_per_native = u256_to_f64(liquidity.input_per_native);
	if input_per_native > 0.0 {
		let fee_input = fee_native * input_per_native / native_unit;
		return match liquidity.side {
			// Input is taker units; output (maker) = taker * rate.
			Side::Sell => fee_input * adjusted_rate,
			// Input is maker units; output (taker) = maker / rate.
			Side::Buy => fee_input / adjusted_rate,
		};
	}
	0.0
}

fn quantize(price: f64) -> f64 {
	let magnitude = price.abs().log10().floor() as i32;
	let scale = 10f64.powi(COMPARISON_PRICE_DIGITS - 1 - magnitude);
	(price * scale).round() / scale
}

#[cfg(test)]
mod tests {
	use super::*;
	use aggregator_config::{MicroTradePolicy, SettlementOverheadConfig};
	use aggregator_router::{Path, PathContext, PathPenaltyOpts};
	use aggregator_types::{Address, Fill, FillData, OrderKind, RawQuotes, I256};
	use std::collections::HashMap;
	use uuid::Uuid;

	fn registry() -> VenueRegistryConfig {
		VenueRegistryConfig {
			name: "testnet".to_string(),
			sell_venues: vec![Venue::UniswapV2, Venue::Native],
			buy_venues: vec![Venue::UniswapV2, Venue::Native],
			fee_quote_venues: vec![Venue::UniswapV2],
			vip_venues: vec![Venue::UniswapV2],
			gas_schedule: HashMap::from([(Venue::Native, 100_000)]),
			default_gas_estimate: 200_000,
			two_hop_surcharge_gas: 30_000,
			overhead: SettlementOverheadConfig {
				vip_route_gas: 0,
				wrapper_gas: 160_000,
				two_hop_extra_gas: 30_000,
			},
			micro_trade: MicroTradePolicy::default(),
		}
	}

	fn fill(input: u64, output: u64) -> Fill {
		Fill {
			source_path_id: Uuid::new_v4(),
			venue: Venue::UniswapV2,
			kind: OrderKind::Bridge,
			input: U256::from(input),
			output: U256::from(output),
			adjusted_output: I256::try_from(output).unwrap(),
			gas_estimate: 90_000,
			flags: SourceFlags::venue(Venue::UniswapV2),
			fill_data: FillData::None,
		}
	}

	fn liquidity(side: Side, amount: u64) -> MarketSideLiquidity {
		MarketSideLiquidity {
			side,
			input_amount: U256::from(amount),
			input_token: Address::repeat_byte(0x11),
			output_token: Address::repeat_byte(0x22),
			output_per_native: U256::from(1_000_000u64),
			input_per_native: U256::ZERO,
			quotes: RawQuotes::default(),
			offchain_quoting_supported: true,
		}
	}

	fn path(side: Side, input: u64, output: u64, gas_price: U256) -> Path {
		let context = PathContext {
			side,
			input_token: Address::repeat_byte(0x11),
			output_token: Address::repeat_byte(0x22),
		};
		let penalty_opts = PathPenaltyOpts {
			output_per_native: U256::from(1_000_000u64),
			input_per_native: U256::ZERO,
			gas_price,
			overhead: registry().overhead,
			vip_flags: registry().vip_flags(),
		};
		Path::new(context, vec![fill(input, output)], U256::from(input), penalty_opts).unwrap()
	}

	#[test]
	fn test_zero_gas_sell_price_is_the_adjusted_rate() {
		let path = path(Side::Sell, 1_000_000, 2_000_000, U256::ZERO);
		let liquidity = liquidity(Side::Sell, 1_000_000);
		let price = comparison_price(&path, &liquidity, &registry(), U256::ZERO).unwrap();
		assert_eq!(price, 2.0);
	}

	#[test]
	fn test_native_order_cost_raises_the_sell_price() {
		// Native fill + VIP overhead = 100k gas at gas price 1e13:
		// 1e18 native wei, converted at 1e6 output units per native unit
		// is 1e6 extra output units the maker must deliver.
		let gas_price = U256::from(10_000_000_000_000u64);
		let path = path(Side::Sell, 1_000_000, 2_000_000, U256::ZERO);
		let liquidity = liquidity(Side::Sell, 1_000_000);
		let price = comparison_price(&path, &liquidity, &registry(), gas_price).unwrap();
		assert_eq!(price, 3.0);
	}

	#[test]
	fn test_native_order_cost_tightens_the_buy_price() {
		// Buying 1m maker units at rate 2 costs 500k taker units; the
		// 100k-gas native fee converts to 100k taker units the maker
		// cannot collect, so the price to beat rises to 1m / 400k.
		let gas_price = U256::from(1_000_000_000_000u64);
		let path = path(Side::Buy, 1_000_000, 500_000, U256::ZERO);
		let liquidity = liquidity(Side::Buy, 1_000_000);
		let price = comparison_price(&path, &liquidity, &registry(), gas_price).unwrap();
		assert_eq!(price, 2.5);
	}

	#[test]
	fn test_fee_swallowing_the_trade_yields_no_price() {
		// Fee converts to 1m taker units, the entire taker budget.
		let gas_price = U256::from(10_000_000_000_000u64);
		let path = path(Side::Buy, 1_000_000, 500_000, U256::ZERO);
		let liquidity = liquidity(Side::Buy, 1_000_000);
		assert!(comparison_price(&path, &liquidity, &registry(), gas_price).is_none());
	}

	#[test]
	fn test_quantizes_to_significant_digits() {
		let path = path(Side::Sell, 3_000_000, 1_000_000, U256::ZERO);
		let liquidity = liquidity(Side::Sell, 3_000_000);
		let price = comparison_price(&path, &liquidity, &registry(), U256::ZERO).unwrap();
		assert_eq!(price, 0.3333);
	}

	#[test]
	fn test_input_rate_fallback_bridges_through_the_path_price() {
		let gas_price = U256::from(10_000_000_000_000u64);
		let context = PathContext {
			side: Side::Sell,
			input_token: Address::repeat_byte(0x11),
			output_token: Address::repeat_byte(0x22),
		};
		let penalty_opts = PathPenaltyOpts {
			output_per_native: U256::ZERO,
			input_per_native: U256::from(500_000u64),
			gas_price: U256::ZERO,
			overhead: registry().overhead,
			vip_flags: registry().vip_flags(),
		};
		let path = Path::new(
			context,
			vec![fill(1_000_000, 2_000_000)],
			U256::from(1_000_000u64),
			penalty_opts,
		)
		.unwrap();
		let mut liquidity = liquidity(Side::Sell, 1_000_000);
		liquidity.output_per_native = U256::ZERO;
		liquidity.input_per_native = U256::from(500_000u64);

		// Fee of 1e18 native wei is 500k input units, bridged at rate 2
		// into 1m output units on top of the 2m quoted.
		let price = comparison_price(&path, &liquidity, &registry(), gas_price).unwrap();
		assert_eq!(price, 3.0);
	}
}
