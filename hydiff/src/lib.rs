//! Differential structural comparison of functions from two independently
//! compiled modules.
//!
//! The generic engine ([`StructuralComparator`]) decides whether two
//! constructs are "the same" by producing an [`std::cmp::Ordering`].
//! [`DifferentialComparator`] plugs two cross-module rules into it:
//!
//! - address computations are matched through struct field names, so that a
//!   field moved to another position by a layout change still matches;
//! - attributes listed in a [`NonSemanticCatalog`] are ignored.
//!
//! Every comparison is a pure function of its inputs and the catalog is
//! shared read-only, so any number of pairs may be compared in parallel.
pub mod attrs;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod differential;
pub mod engine;
pub mod gep;
pub mod utils;

pub use attrs::AttributeEquivalenceComparator;
pub use cache::{ComparisonCache, FunctionResult, FunctionVerdict};
pub use catalog::NonSemanticCatalog;
pub use config::{AttributeOptions, ComparatorOptions, DiffConfig};
pub use context::{ComparisonContext, GlobalNumberState, SerialNumberOracle, ValueOracle};
pub use differential::DifferentialComparator;
pub use engine::{BaselineComparator, StructuralComparator};
pub use gep::AddressComputationComparator;
pub use utils::error::{DiffError, DiffResult};
