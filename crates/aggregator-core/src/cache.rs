//! Background-refreshed pool-topology snapshots.
//!
//! Request handling reads pool topology from an atomically swapped snapshot
//! and never waits on topology I/O. A background task (or an explicit
//! freshness check on the request path) refreshes pairs through the
//! [`PoolTopologySource`] seam; a failed refresh keeps the previous
//! snapshot so a flaky source degrades to stale data, not missing data.

use aggregator_types::{Address, PoolSnapshot, PoolTopologySource};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

type PairKey = (Address, Address);

/// Token pairs are cached under a canonical ordering so both lookup
/// directions hit the same entry.
fn pair_key(token_a: Address, token_b: Address) -> PairKey {
	if token_a <= token_b {
		(token_a, token_b)
	} else {
		(token_b, token_a)
	}
}

pub struct PoolTopologyCache {
	source: Arc<dyn PoolTopologySource>,
	snapshot: ArcSwap<HashMap<PairKey, Vec<PoolSnapshot>>>,
	refreshed_at: DashMap<PairKey, Instant>,
	max_age: Duration,
}

impl PoolTopologyCache {
	pub fn new(source: Arc<dyn PoolTopologySource>, max_age: Duration) -> Self {
		Self {
			source,
			snapshot: ArcSwap::from_pointee(HashMap::new()),
			refreshed_at: DashMap::new(),
			max_age,
		}
	}

	/// Pools for a pair from the current snapshot. Synchronous; an unknown
	/// pair is an empty list, not an error.
	pub fn pools(&self, token_a: Address, token_b: Address) -> Vec<PoolSnapshot> {
		self.snapshot
			.load()
			.get(&pair_key(token_a, token_b))
			.cloned()
			.unwrap_or_default()
	}

	pub fn is_fresh(&self, token_a: Address, token_b: Address) -> bool {
		self.refreshed_at
			.get(&pair_key(token_a, token_b))
			.map(|refreshed| refreshed.elapsed() < self.max_age)
			.unwrap_or(false)
	}

	/// Refreshes one pair unless its entry is still within `max_age`.
	pub async fn ensure_fresh(&self, token_a: Address, token_b: Address) {
		if self.is_fresh(token_a, token_b) {
			return;
		}
		self.refresh_pair(token_a, token_b).await;
	}

	async fn refresh_pair(&self, token_a: Address, token_b: Address) {
		let key = pair_key(token_a, token_b);
		match self.source.pools_for_pair(token_a, token_b).await {
			Ok(pools) => {
				// Readers hold whole-map snapshots, so replace the map
				// rather than mutating it in place.
				let mut next: HashMap<PairKey, Vec<PoolSnapshot>> =
					self.snapshot.load().as_ref().clone();
				debug!(?key, pools = pools.len(), "refreshed pool topology");
				next.insert(key, pools);
				self.snapshot.store(Arc::new(next));
				self.refreshed_at.insert(key, Instant::now());
			}
			Err(error) => {
				warn!(%error, ?key, "pool topology refresh failed; keeping previous snapshot");
			}
		}
	}

	/// Spawns a task refreshing `pairs` on a fixed period, decoupled from
	/// the request lifecycle. The first pass runs immediately.
	pub fn spawn_refresher(
		self: Arc<Self>,
		pairs: Vec<(Address, Address)>,
		period: Duration,
	) -> JoinHandle<()> {
		tokio::spawn(async move {
			let mut ticker = tokio::time::interval(period);
			loop {
				ticker.tick().await;
				for (token_a, token_b) in &pairs {
					self.refresh_pair(*token_a, *token_b).await;
				}
			}
		})
	}
}
