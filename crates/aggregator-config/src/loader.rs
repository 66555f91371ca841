//! Configuration loading from files and environment.

use crate::types::*;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
	/// Load configuration from file
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<AggregatorConfig> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {:?}", path))?;

		let config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {:?}", path),
		};

		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<AggregatorConfig> {
		toml::from_str(contents).map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<AggregatorConfig> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<AggregatorConfig> {
		serde_yaml::from_str(contents).context("Failed to parse YAML")
	}

	/// Load from file with environment variable overrides applied.
	pub fn from_env_and_file<P: AsRef<Path>>(path: P) -> Result<AggregatorConfig> {
		let mut config = Self::from_file(path)?;
		Self::apply_env_overrides(&mut config)?;
		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Apply environment variable overrides
	fn apply_env_overrides(config: &mut AggregatorConfig) -> Result<()> {
		if let Ok(enabled) = std::env::var("AGGREGATOR_RFQ_ENABLED") {
			debug!("Overriding rfq.enabled from environment");
			config.rfq.enabled = enabled
				.parse::<bool>()
				.context("AGGREGATOR_RFQ_ENABLED must be true or false")?;
		}

		if let Ok(timeout) = std::env::var("AGGREGATOR_RFQ_TIMEOUT_MS") {
			debug!("Overriding rfq.endpoint_timeout_ms from environment");
			config.rfq.endpoint_timeout_ms = timeout
				.parse::<u64>()
				.context("AGGREGATOR_RFQ_TIMEOUT_MS must be an integer")?;
		}

		Ok(())
	}

	/// Validate configuration
	fn validate_config(config: &AggregatorConfig) -> Result<()> {
		if config.networks.is_empty() {
			anyhow::bail!("At least one network registry must be configured");
		}

		let routing = &config.routing;
		if routing.solver_steps == 0 {
			anyhow::bail!("routing.solver_steps must be positive");
		}
		if routing.probe_distribution_base < 1.0 {
			// Base 1.0 is the uniform ladder; anything below would shrink
			// the probe amounts instead of growing them.
			anyhow::bail!("routing.probe_distribution_base must be >= 1.0");
		}
		if routing.min_curve_samples < 3 {
			// The solver interpolates between samples and needs at least
			// 3 points per curve.
			anyhow::bail!("routing.min_curve_samples must be >= 3");
		}
		if routing.num_probe_samples < routing.min_curve_samples {
			anyhow::bail!(
				"routing.num_probe_samples ({}) below routing.min_curve_samples ({})",
				routing.num_probe_samples,
				routing.min_curve_samples
			);
		}

		for (network, registry) in &config.networks {
			if registry.sell_venues.is_empty() && registry.buy_venues.is_empty() {
				anyhow::bail!("Network {} has no enabled venues", network);
			}
			for venue in &registry.vip_venues {
				if !registry.sell_venues.contains(venue) && !registry.buy_venues.contains(venue) {
					anyhow::bail!(
						"Network {}: VIP venue {} is not an enabled venue",
						network,
						venue
					);
				}
			}
			if registry.micro_trade.enabled && registry.micro_trade.min_native_value.is_zero() {
				anyhow::bail!(
					"Network {}: micro_trade.min_native_value must be positive when enabled",
					network
				);
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const CONFIG_TOML: &str = r#"
[routing]
num_probe_samples = 13
probe_distribution_base = 1.05
solver_steps = 200
min_curve_samples = 3
resting_order_samples = 13

[rfq]
enabled = true
endpoint_timeout_ms = 600

[networks.1]
name = "mainnet"
sell_venues = ["UniswapV2", "UniswapV3", "Curve"]
buy_venues = ["UniswapV2", "UniswapV3"]
fee_quote_venues = ["UniswapV2", "UniswapV3"]
vip_venues = ["UniswapV2", "UniswapV3"]
default_gas_estimate = 200000
two_hop_surcharge_gas = 30000

[networks.1.gas_schedule]
UniswapV2 = 90000
UniswapV3 = 100000
Curve = 600000

[networks.1.overhead]
vip_route_gas = 20000
wrapper_gas = 160000
two_hop_extra_gas = 30000
"#;

	#[test]
	fn test_load_toml_config() {
		let config = ConfigLoader::from_toml(CONFIG_TOML).unwrap();
		let registry = config.registry(aggregator_types::NetworkId(1)).unwrap();
		assert_eq!(registry.name, "mainnet");
		assert_eq!(registry.gas_estimate(aggregator_types::Venue::Curve), 600_000);
		assert_eq!(config.routing.num_probe_samples, 13);
	}

	#[test]
	fn test_load_from_file() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		file.write_all(CONFIG_TOML.as_bytes()).unwrap();

		let config = ConfigLoader::from_file(file.path()).unwrap();
		assert!(config.rfq.enabled);
	}

	#[test]
	fn test_rejects_empty_networks() {
		let config = ConfigLoader::from_toml("[networks]\n").unwrap();
		assert!(ConfigLoader::validate_config(&config).is_err());
	}

	#[test]
	fn test_rejects_vip_venue_not_enabled() {
		let bad = CONFIG_TOML.replace(
			"vip_venues = [\"UniswapV2\", \"UniswapV3\"]",
			"vip_venues = [\"Dodo\"]",
		);
		let config = ConfigLoader::from_toml(&bad).unwrap();
		assert!(ConfigLoader::validate_config(&config).is_err());
	}

	#[test]
	fn test_uniform_probe_ladder_is_valid() {
		let uniform = CONFIG_TOML.replace(
			"probe_distribution_base = 1.05",
			"probe_distribution_base = 1.0",
		);
		let config = ConfigLoader::from_toml(&uniform).unwrap();
		assert!(ConfigLoader::validate_config(&config).is_ok());

		let shrinking = CONFIG_TOML.replace(
			"probe_distribution_base = 1.05",
			"probe_distribution_base = 0.9",
		);
		let config = ConfigLoader::from_toml(&shrinking).unwrap();
		assert!(ConfigLoader::validate_config(&config).is_err());
	}

	#[test]
	fn test_rejects_too_few_curve_samples() {
		let bad = CONFIG_TOML.replace("min_curve_samples = 3", "min_curve_samples = 2");
		let config = ConfigLoader::from_toml(&bad).unwrap();
		assert!(ConfigLoader::validate_config(&config).is_err());
	}
}
