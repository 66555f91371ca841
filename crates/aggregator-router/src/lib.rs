//! Liquidity-sampling-to-optimal-allocation pipeline.
//!
//! This crate turns discrete per-venue price samples, resting orders and
//! off-chain maker quotes into a normalized cost model ([`fills`]), encodes
//! them into solver-ready curves ([`routable`]), solves the constrained
//! allocation problem ([`solver`]), and reconstructs the winning allocation
//! into an immutable [`path::Path`] with well-defined rate, slippage and
//! classification semantics ([`optimizer`], [`orders`]).

pub mod fills;
pub mod optimizer;
pub mod orders;
pub mod path;
pub mod rates;
pub mod routable;
pub mod solver;

pub use fills::{FillAdjustor, FillContext, IdentityFillAdjustor};
pub use optimizer::PathOptimizer;
pub use path::{Path, PathContext, PathPenaltyOpts};
