//! Error taxonomy for the aggregator.
//!
//! "No feasible allocation" is deliberately not an error: the optimizer
//! returns `Option<Path>` and only the orchestrator decides when the absence
//! of a path becomes a user-visible [`AggregatorError::InsufficientLiquidity`].

use crate::common::U256;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[derive(Error, Debug)]
pub enum AggregatorError {
	/// Neither optimization phase could fill any of the requested amount.
	#[error("insufficient liquidity to fill {target}")]
	InsufficientLiquidity { target: U256 },

	/// `max_slippage` outside `[0, 1]`. Fails fast, never clamped.
	#[error("slippage must be within [0, 1], given: {0}")]
	InvalidSlippage(f64),

	/// Two paths built for different target inputs were compared.
	#[error("target input mismatch: {ours} != {theirs}")]
	TargetMismatch { ours: U256, theirs: U256 },

	#[error("sampler error: {0}")]
	Sampler(String),

	#[error("quote client error: {0}")]
	QuoteClient(String),

	#[error("configuration error: {0}")]
	Config(String),

	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
