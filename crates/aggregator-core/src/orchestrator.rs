//! Two-phase market liquidity orchestration.
//!
//! Phase 1 samples every on-chain source concurrently and optimizes with
//! unadjusted fills. Its result prices the comparison quote for phase 2,
//! which fans out to off-chain maker endpoints under a per-endpoint timeout
//! and re-optimizes the phase-1 winning venues together with the returned
//! quotes. A trade only fails when both phases produce nothing.

use crate::comparison_price::comparison_price;
use crate::sampling::probe_amounts;
use aggregator_config::{AggregatorConfig, VenueRegistryConfig};
use aggregator_router::{
	FillAdjustor, IdentityFillAdjustor, Path, PathContext, PathOptimizer, PathPenaltyOpts,
};
use aggregator_types::{
	mul_div, AggregatorError, Address, FirmQuote, FirmQuoteValidator, IndicativeQuote,
	LiquiditySampler, MarketSideLiquidity, NetworkId, OffchainQuoteClient, QuoteRequest, RawQuotes,
	RestingOrder, RestingOrderKind, Result, Sample, Side, Venue, NATIVE_TOKEN_UNIT, U256,
};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Whether phase 2 requests binding or non-binding quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteIntent {
	Indicative,
	Firm,
}

/// One trade to find best execution for.
#[derive(Debug, Clone)]
pub struct TradeRequest {
	pub side: Side,
	pub maker_token: Address,
	pub taker_token: Address,
	/// Exact amount to fill: taker units for sells, maker units for buys.
	pub amount: U256,
	pub gas_price: U256,
	/// Open-orderbook resting orders already known for this pair.
	pub resting_orders: Vec<RestingOrder>,
	pub quote_intent: QuoteIntent,
}

/// Result of a completed two-phase optimization.
#[derive(Debug)]
pub struct BestExecution {
	pub path: Path,
	/// Whole-order price that was handed to off-chain makers, when phase 1
	/// produced one.
	pub comparison_price: Option<f64>,
}

pub struct MarketLiquidityOrchestrator {
	config: AggregatorConfig,
	network: NetworkId,
	sampler: Arc<dyn LiquiditySampler>,
	quote_client: Option<Arc<dyn OffchainQuoteClient>>,
	quote_validator: Option<Arc<dyn FirmQuoteValidator>>,
	fill_adjustor: Arc<dyn FillAdjustor>,
}

impl MarketLiquidityOrchestrator {
	pub fn new(
		config: AggregatorConfig,
		network: NetworkId,
		sampler: Arc<dyn LiquiditySampler>,
	) -> Result<Self> {
		if config.registry(network).is_none() {
			return Err(AggregatorError::Config(format!(
				"no venue registry configured for network {network}"
			)));
		}
		Ok(Self {
			config,
			network,
			sampler,
			quote_client: None,
			quote_validator: None,
			fill_adjustor: Arc::new(IdentityFillAdjustor),
		})
	}

	pub fn with_quote_client(mut self, client: Arc<dyn OffchainQuoteClient>) -> Self {
		self.quote_client = Some(client);
		self
	}

	pub fn with_quote_validator(mut self, validator: Arc<dyn FirmQuoteValidator>) -> Self {
		self.quote_validator = Some(validator);
		self
	}

	/// Fill adjustor applied during phase 2. Phase 1 always optimizes
	/// unadjusted fills.
	pub fn with_fill_adjustor(mut self, adjustor: Arc<dyn FillAdjustor>) -> Self {
		self.fill_adjustor = adjustor;
		self
	}

	fn registry(&self) -> Result<&VenueRegistryConfig> {
		self.config.registry(self.network).ok_or_else(|| {
			AggregatorError::Config(format!(
				"no venue registry configured for network {}",
				self.network
			))
		})
	}

	/// Venues probed for curves and two-hop routes. `Native` and `MultiHop`
	/// are allocation classes, not sampleable venues.
	fn sampled_venues(registry: &VenueRegistryConfig, side: Side) -> Vec<Venue> {
		let configured = match side {
			Side::Sell => &registry.sell_venues,
			Side::Buy => &registry.buy_venues,
		};
		configured
			.iter()
			.copied()
			.filter(|venue| !matches!(venue, Venue::Native | Venue::MultiHop))
			.collect()
	}

	/// Samples everything needed to optimize a sell in one concurrent
	/// fan-out: venue curves, two-hop probes, resting-order fillable
	/// amounts and both fee-token conversion rates.
	pub async fn market_sell_liquidity(&self, request: &TradeRequest) -> Result<MarketSideLiquidity> {
		let registry = self.registry()?;
		let venues = Self::sampled_venues(registry, Side::Sell);
		let probes = probe_amounts(
			self.config.routing.num_probe_samples,
			request.amount,
			self.config.routing.probe_distribution_base,
		);

		let (curves, two_hop, fillable, output_rate, input_rate) = tokio::join!(
			self.sampler
				.sample_sell_curves(&venues, request.maker_token, request.taker_token, &probes),
			self.sampler.sample_two_hop_sell(
				&venues,
				request.maker_token,
				request.taker_token,
				request.amount
			),
			self.sampler
				.resting_order_fillable_amounts(&request.resting_orders),
			self.sampler.fee_token_conversion_rate(request.maker_token),
			self.sampler.fee_token_conversion_rate(request.taker_token),
		);

		self.assemble_liquidity(
			registry,
			Side::Sell,
			request,
			curves?,
			two_hop?,
			fillable?,
			output_rate?,
			input_rate?,
		)
	}

	/// Buy-side counterpart of [`Self::market_sell_liquidity`]. The input
	/// the solver allocates is the maker amount being bought.
	pub async fn market_buy_liquidity(&self, request: &TradeRequest) -> Result<MarketSideLiquidity> {
		let registry = self.registry()?;
		let venues = Self::sampled_venues(registry, Side::Buy);
		let probes = probe_amounts(
			self.config.routing.num_probe_samples,
			request.amount,
			self.config.routing.probe_distribution_base,
		);

		let (curves, two_hop, fillable, output_rate, input_rate) = tokio::join!(
			self.sampler
				.sample_buy_curves(&venues, request.maker_token, request.taker_token, &probes),
			self.sampler.sample_two_hop_buy(
				&venues,
				request.maker_token,
				request.taker_token,
				request.amount
			),
			self.sampler
				.resting_order_fillable_amounts(&request.resting_orders),
			self.sampler.fee_token_conversion_rate(request.taker_token),
			self.sampler.fee_token_conversion_rate(request.maker_token),
		);

		self.assemble_liquidity(
			registry,
			Side::Buy,
			request,
			curves?,
			two_hop?,
			fillable?,
			output_rate?,
			input_rate?,
		)
	}

	#[allow(clippy::too_many_arguments)]
	fn assemble_liquidity(
		&self,
		registry: &VenueRegistryConfig,
		side: Side,
		request: &TradeRequest,
		venue_curves: Vec<Vec<Sample>>,
		two_hop_samples: Vec<Sample>,
		fillable_taker_amounts: Vec<U256>,
		output_per_native: U256,
		input_per_native: U256,
	) -> Result<MarketSideLiquidity> {
		if output_per_native.is_zero() && input_per_native.is_zero() {
			warn!(
				network = %registry.name,
				"no fee-token conversion rate for either token; fills will carry no gas penalty"
			);
		}

		let resting_orders = request
			.resting_orders
			.iter()
			.cloned()
			.zip(fillable_taker_amounts)
			.map(|(order, fillable)| order.with_fillable_taker_amount(fillable))
			.collect();

		let (input_token, output_token, venues) = match side {
			Side::Sell => (request.taker_token, request.maker_token, &registry.sell_venues),
			Side::Buy => (request.maker_token, request.taker_token, &registry.buy_venues),
		};
		Ok(MarketSideLiquidity {
			side,
			input_amount: request.amount,
			input_token,
			output_token,
			output_per_native,
			input_per_native,
			quotes: RawQuotes {
				venue_curves,
				two_hop_samples,
				resting_orders,
				indicative_quotes: Vec::new(),
			},
			offchain_quoting_supported: venues.contains(&Venue::Native),
		})
	}

	/// Runs the full two-phase optimization for one trade.
	pub async fn best_execution(&self, request: &TradeRequest) -> Result<BestExecution> {
		let registry = self.registry()?;
		let mut liquidity = match request.side {
			Side::Sell => self.market_sell_liquidity(request).await?,
			Side::Buy => self.market_buy_liquidity(request).await?,
		};
		self.apply_micro_trade_policy(registry, &mut liquidity);

		// Phase 1: on-chain sources only, fills taken at face value.
		let phase_one = self.optimize(&liquidity, &[], &IdentityFillAdjustor, request.gas_price)?;
		match &phase_one {
			Some(path) => {
				let (input, output) = path.adjusted_size();
				info!(
					side = ?request.side,
					%input,
					%output,
					venues = ?path.venues(),
					"phase 1 allocation complete"
				);
			}
			None => info!(
				side = ?request.side,
				target = %request.amount,
				"no feasible on-chain allocation; relying on off-chain phase"
			),
		}

		let comparison = phase_one
			.as_ref()
			.and_then(|path| comparison_price(path, &liquidity, registry, request.gas_price));

		let phase_two = self
			.offchain_augmented_path(request, &liquidity, phase_one.as_ref(), comparison)
			.await?;

		let path = match (phase_two, phase_one) {
			(Some(path), _) => path,
			(None, Some(path)) => path,
			(None, None) => {
				return Err(AggregatorError::InsufficientLiquidity {
					target: request.amount,
				})
			}
		};
		Ok(BestExecution {
			path,
			comparison_price: comparison,
		})
	}

	/// Below the configured native-value threshold, only fee-quoting venues
	/// are worth routing through; everything else (including two-hop
	/// probes) is dropped before optimization.
	fn apply_micro_trade_policy(
		&self,
		registry: &VenueRegistryConfig,
		liquidity: &mut MarketSideLiquidity,
	) {
		let policy = &registry.micro_trade;
		if !policy.enabled || liquidity.input_per_native.is_zero() {
			return;
		}
		let native_value = mul_div(
			liquidity.input_amount,
			NATIVE_TOKEN_UNIT,
			liquidity.input_per_native,
		);
		if native_value >= policy.min_native_value {
			return;
		}
		debug!(
			%native_value,
			threshold = %policy.min_native_value,
			"trade below micro-trade threshold; restricting to fee-quoting venues"
		);
		liquidity.quotes.venue_curves.retain(|curve| {
			curve
				.first()
				.map(|sample| registry.fee_quote_venues.contains(&sample.venue))
				.unwrap_or(false)
		});
		liquidity.quotes.two_hop_samples.clear();
	}

	fn optimize(
		&self,
		liquidity: &MarketSideLiquidity,
		extra_orders: &[RestingOrder],
		adjustor: &dyn FillAdjustor,
		gas_price: U256,
	) -> Result<Option<Path>> {
		let registry = self.registry()?;
		let context = PathContext {
			side: liquidity.side,
			input_token: liquidity.input_token,
			output_token: liquidity.output_token,
		};
		let penalty_opts = PathPenaltyOpts {
			output_per_native: liquidity.output_per_native,
			input_per_native: liquidity.input_per_native,
			gas_price,
			overhead: registry.overhead.clone(),
			vip_flags: registry.vip_flags(),
		};
		let optimizer = PathOptimizer::new(
			context,
			liquidity.input_amount,
			&self.config.routing,
			registry,
			penalty_opts,
			adjustor,
		);

		let mut resting_orders = liquidity.quotes.resting_orders.clone();
		resting_orders.extend(
			liquidity
				.quotes
				.indicative_quotes
				.iter()
				.map(indicative_to_resting_order),
		);
		resting_orders.extend_from_slice(extra_orders);

		optimizer.find_optimal_path(
			&liquidity.quotes.venue_curves,
			&liquidity.quotes.two_hop_samples,
			&resting_orders,
		)
	}

	/// Phase 2: quote off-chain makers and re-optimize them against the
	/// phase-1 winners. Returns `Ok(None)` whenever the phase does not
	/// apply or yields nothing better than nothing; phase-1 results are
	/// never discarded here.
	async fn offchain_augmented_path(
		&self,
		request: &TradeRequest,
		liquidity: &MarketSideLiquidity,
		phase_one: Option<&Path>,
		comparison: Option<f64>,
	) -> Result<Option<Path>> {
		if !self.config.rfq.enabled || !liquidity.offchain_quoting_supported {
			return Ok(None);
		}
		let Some(client) = &self.quote_client else {
			return Ok(None);
		};

		let quote_request = QuoteRequest {
			side: request.side,
			maker_token: request.maker_token,
			taker_token: request.taker_token,
			amount: request.amount,
			comparison_price: comparison,
		};
		let per_endpoint = Duration::from_millis(self.config.rfq.endpoint_timeout_ms);

		let (indicative, firm) = match request.quote_intent {
			QuoteIntent::Indicative => (
				self.fan_out_indicative(client, &quote_request, per_endpoint)
					.await,
				Vec::new(),
			),
			QuoteIntent::Firm => (
				Vec::new(),
				self.fan_out_firm(client, &quote_request, per_endpoint).await,
			),
		};
		let firm_orders = self.validated_firm_orders(firm).await?;
		if indicative.is_empty() && firm_orders.is_empty() {
			debug!("no usable off-chain quotes; keeping the phase-1 result");
			return Ok(None);
		}
		info!(
			indicative = indicative.len(),
			firm = firm_orders.len(),
			"re-optimizing with off-chain quotes"
		);

		// Venues the phase-1 optimization rejected cannot improve the
		// re-optimization; only the winners are carried into phase 2.
		let winners: Vec<Venue> = phase_one.map(|path| path.venues()).unwrap_or_default();
		let mut phase_two = liquidity.clone();
		phase_two.quotes.venue_curves.retain(|curve| {
			curve
				.first()
				.map(|sample| winners.contains(&sample.venue))
				.unwrap_or(false)
		});
		phase_two.quotes.indicative_quotes = indicative;

		self.optimize(
			&phase_two,
			&firm_orders,
			self.fill_adjustor.as_ref(),
			request.gas_price,
		)
	}

	async fn fan_out_indicative(
		&self,
		client: &Arc<dyn OffchainQuoteClient>,
		request: &QuoteRequest,
		per_endpoint: Duration,
	) -> Vec<IndicativeQuote> {
		let requests = client.endpoints().into_iter().map(|endpoint| {
			let client = Arc::clone(client);
			let request = request.clone();
			async move {
				match tokio::time::timeout(
					per_endpoint,
					client.indicative_quotes(&endpoint, &request),
				)
				.await
				{
					Ok(Ok(quotes)) => quotes,
					Ok(Err(error)) => {
						warn!(%endpoint, %error, "indicative quote request failed");
						Vec::new()
					}
					Err(_) => {
						warn!(%endpoint, "indicative quote request timed out");
						Vec::new()
					}
				}
			}
		});
		let now = Utc::now();
		join_all(requests)
			.await
			.into_iter()
			.flatten()
			.filter(|quote| quote.expiry > now)
			.collect()
	}

	async fn fan_out_firm(
		&self,
		client: &Arc<dyn OffchainQuoteClient>,
		request: &QuoteRequest,
		per_endpoint: Duration,
	) -> Vec<FirmQuote> {
		let requests = client.endpoints().into_iter().map(|endpoint| {
			let client = Arc::clone(client);
			let request = request.clone();
			async move {
				match tokio::time::timeout(per_endpoint, client.firm_quotes(&endpoint, &request))
					.await
				{
					Ok(Ok(quotes)) => quotes,
					Ok(Err(error)) => {
						warn!(%endpoint, %error, "firm quote request failed");
						Vec::new()
					}
					Err(_) => {
						warn!(%endpoint, "firm quote request timed out");
						Vec::new()
					}
				}
			}
		});
		let now = Utc::now();
		join_all(requests)
			.await
			.into_iter()
			.flatten()
			.filter(|quote| quote.expiry > now)
			.collect()
	}

	/// Clamps firm quotes to their validated fillable taker amounts. With
	/// no validator configured the face amounts are trusted.
	async fn validated_firm_orders(&self, quotes: Vec<FirmQuote>) -> Result<Vec<RestingOrder>> {
		if quotes.is_empty() {
			return Ok(Vec::new());
		}
		let orders = match &self.quote_validator {
			Some(validator) => {
				let fillable = validator.fillable_taker_amounts(&quotes).await?;
				quotes
					.into_iter()
					.zip(fillable)
					.filter_map(|(quote, fillable_taker)| {
						if fillable_taker.is_zero() {
							warn!(maker_uri = %quote.maker_uri, "firm quote not fillable; dropping");
							return None;
						}
						Some(quote.order.with_fillable_taker_amount(fillable_taker))
					})
					.collect()
			}
			None => quotes
				.into_iter()
				.map(|quote| {
					let face_taker = quote.order.taker_amount;
					quote.order.with_fillable_taker_amount(face_taker)
				})
				.collect(),
		};
		Ok(orders)
	}
}

/// An indicative quote optimizes like a maker-quoted RFQ order at its face
/// amounts; it only prices the allocation and is never settled directly.
fn indicative_to_resting_order(quote: &IndicativeQuote) -> RestingOrder {
	RestingOrder {
		kind: RestingOrderKind::Rfq,
		maker_token: quote.maker_token,
		taker_token: quote.taker_token,
		maker_amount: quote.maker_amount,
		taker_amount: quote.taker_amount,
		taker_fee_amount: U256::ZERO,
		fillable_maker_amount: quote.maker_amount,
		fillable_taker_amount: quote.taker_amount,
		fillable_taker_fee_amount: U256::ZERO,
	}
}
