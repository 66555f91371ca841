//! Pool topology snapshots and their source seam.

use crate::common::Address;
use crate::errors::Result;
use crate::venues::Venue;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A known pool for a token pair. Read-mostly; refreshed in the background
/// and consumed through an atomically swapped snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
	pub venue: Venue,
	pub address: Address,
	pub tokens: Vec<Address>,
}

/// Source of pool topology, typically a subgraph or registry lookup.
#[async_trait]
pub trait PoolTopologySource: Send + Sync {
	async fn pools_for_pair(&self, token_a: Address, token_b: Address) -> Result<Vec<PoolSnapshot>>;
}
