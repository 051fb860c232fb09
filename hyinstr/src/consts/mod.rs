//! Constants usable as immediate operands.
pub mod int;

pub use int::IConst;
