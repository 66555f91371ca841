//! Shared types for the liquidity aggregation router.
//!
//! Everything request-scoped flows through the types in this crate: raw
//! per-venue price samples, resting orders, normalized fills, off-chain
//! quotes and the aggregated market-side liquidity handed to the optimizer.
//! The traits at the I/O seams (sampling, off-chain quoting, quote
//! validation, pool topology) also live here so that collaborator
//! implementations and consumers only depend on this crate.

pub mod common;
pub mod errors;
pub mod fills;
pub mod liquidity;
pub mod orders;
pub mod pools;
pub mod quotes;
pub mod samples;
pub mod venues;

pub use common::*;
pub use errors::*;
pub use fills::*;
pub use liquidity::*;
pub use orders::*;
pub use pools::*;
pub use quotes::*;
pub use samples::*;
pub use venues::*;
