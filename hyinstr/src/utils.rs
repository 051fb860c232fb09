use strum::{EnumIs, EnumTryAs};
use thiserror::Error;

use crate::types::Typeref;

#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumIs, EnumTryAs, Error)]
pub enum Error {
    /// The typeref was never registered in the registry it was looked up in.
    #[error(
        "Type `{typeref}` is not registered in this module. Typerefs are module-local \
         and cannot be resolved against another module's registry."
    )]
    UnknownType { typeref: Typeref },

    /// Layouts only exist for structures and arrays.
    #[error("Type `{rendered}` is not an aggregate type and has no field layout.")]
    NotAggregate { rendered: String },

    /// A field index does not address any field of the aggregate.
    #[error("Field index {index} is out of range for an aggregate with {count} fields.")]
    FieldOutOfRange { index: u64, count: u64 },

    /// Sizes or offsets of the aggregate do not fit in 64 bits.
    #[error("Layout of an aggregate overflows the 64-bit address space.")]
    LayoutOverflow,
}

pub type Result<T> = std::result::Result<T, Error>;
