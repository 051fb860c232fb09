//! Instruction IR modules
//!
//! The pieces of a function body that the differential comparators inspect:
//!
//! - `operand`: SSA names and operands
//! - `mem`: address computations (`getelementptr`)
//! - `attributes`: attribute kinds, sets and per-function attribute lists
pub mod attributes;
pub mod mem;
pub mod operand;

pub use operand::{Name, Operand};
