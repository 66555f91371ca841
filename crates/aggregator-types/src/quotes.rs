//! Off-chain maker quotes and the quoting collaborator seam.

use crate::common::{Address, Side, U256};
use crate::errors::Result;
use crate::orders::RestingOrder;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A non-binding price estimate from an off-chain maker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicativeQuote {
	pub maker_token: Address,
	pub taker_token: Address,
	pub maker_amount: U256,
	pub taker_amount: U256,
	pub expiry: DateTime<Utc>,
}

/// A binding maker quote. The embedded order is only trusted as fully
/// fillable after it has passed the fillable-amount validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmQuote {
	pub order: RestingOrder,
	pub maker_uri: String,
	pub expiry: DateTime<Utc>,
}

/// Parameters sent to each off-chain quoting endpoint.
#[derive(Debug, Clone)]
pub struct QuoteRequest {
	pub side: Side,
	pub maker_token: Address,
	pub taker_token: Address,
	pub amount: U256,
	/// Whole-order price from the on-chain-only optimization, given to
	/// makers as pricing context. Maker units per taker unit.
	pub comparison_price: Option<f64>,
}

/// Off-chain maker quoting, addressable per endpoint. The orchestrator owns
/// the fan-out and the per-endpoint timeout; implementations only perform a
/// single request.
#[async_trait]
pub trait OffchainQuoteClient: Send + Sync {
	/// Endpoints this client can quote from.
	fn endpoints(&self) -> Vec<String>;

	/// Request non-binding price estimates from one endpoint.
	async fn indicative_quotes(
		&self,
		endpoint: &str,
		request: &QuoteRequest,
	) -> Result<Vec<IndicativeQuote>>;

	/// Request binding quotes from one endpoint.
	async fn firm_quotes(&self, endpoint: &str, request: &QuoteRequest) -> Result<Vec<FirmQuote>>;
}

/// Soft validation of firm quotes against maker balances/allowances.
#[async_trait]
pub trait FirmQuoteValidator: Send + Sync {
	/// Taker amounts actually fillable for each quote, aligned with
	/// `quotes`.
	async fn fillable_taker_amounts(&self, quotes: &[FirmQuote]) -> Result<Vec<U256>>;
}
