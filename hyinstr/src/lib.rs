//! Hyinstr: the module-local view of a compiled program that the differential
//! comparators read.
//!
//! Every compared module owns its own [`types::TypeRegistry`]; typerefs, SSA
//! names and layouts are therefore only meaningful inside the module that
//! produced them. The crate exposes:
//!
//! - [`types`]: primary and aggregate types, the registry and the natural
//!   [`types::layout::AggregateTypeLayout`] of structs and arrays.
//! - [`consts`]: integer constants used as immediate operands.
//! - [`modules`]: operands, the `getelementptr` address computation and
//!   attribute sets attached to functions, call sites and parameters.
pub mod consts;
pub mod modules;
pub mod types;
pub mod utils;
