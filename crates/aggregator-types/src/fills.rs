//! Normalized units of allocatable liquidity.

use crate::common::{I256, U256};
use crate::orders::OrderKind;
use crate::samples::FillData;
use crate::venues::{SourceFlags, Venue};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A normalized, fee-adjusted unit of allocatable liquidity from one venue.
///
/// Fills are derived per optimization attempt and discarded once a path is
/// built. `adjusted_output` is the quoted output with the venue's fee/gas
/// penalty applied in output-token units; on the sell side it can go
/// negative when the penalty exceeds the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
	/// Groups fills reconstructed from the same routable path.
	pub source_path_id: Uuid,
	pub venue: Venue,
	pub kind: OrderKind,
	pub input: U256,
	pub output: U256,
	pub adjusted_output: I256,
	/// Gas the settlement of this fill is expected to consume.
	pub gas_estimate: u64,
	pub flags: SourceFlags,
	pub fill_data: FillData,
}

impl Fill {
	/// The fee penalty baked into `adjusted_output`, as a signed delta from
	/// the raw output. Negative on the sell side, positive on the buy side.
	pub fn output_penalty(&self) -> I256 {
		self.adjusted_output - I256::try_from(self.output).unwrap_or(I256::MAX)
	}
}
