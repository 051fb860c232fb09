//! Memory operations
//!
//! Address computations (`getelementptr`). They derive a pointer from a base
//! pointer by walking an index chain through the layout of an aggregate
//! type. They never access memory themselves.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    consts::IConst,
    modules::operand::{Name, Operand},
    types::{TypeRegistry, Typeref},
};

/// Compute the address of a sub-element of an aggregate.
///
/// `ty` is the source element type. The first index steps over the base
/// pointer as if it addressed an array of `ty`; every following index steps
/// into the aggregate reached so far (a field for structures, an element
/// for arrays). Structure indices are constants; array indices may be
/// dynamic.
///
/// When `in_bounds` is set, the computed address is poison if it leaves the
/// allocated object.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MGetElementPtr {
    pub dest: Name,
    pub base: Operand,
    pub ty: Typeref,
    pub indices: SmallVec<[Operand; 4]>,
    pub in_bounds: bool,
}

impl MGetElementPtr {
    /// Build an in-bounds address computation from constant indices.
    pub fn with_const_indices(
        dest: Name,
        base: Operand,
        ty: Typeref,
        indices: impl IntoIterator<Item = u64>,
    ) -> Self {
        Self {
            dest,
            base,
            ty,
            indices: indices
                .into_iter()
                .map(|index| Operand::Imm(IConst::from(index)))
                .collect(),
            in_bounds: true,
        }
    }

    /// Iterate over all input operands (base first, then indices).
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        std::iter::once(&self.base).chain(self.indices.iter())
    }

    /// Returns `true` if every index is an immediate.
    pub fn has_all_const_indices(&self) -> bool {
        self.indices.iter().all(Operand::is_imm)
    }

    /// Render the instruction in textual IR form.
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display + 'a {
        struct Fmt<'a> {
            instr: &'a MGetElementPtr,
            registry: &'a TypeRegistry,
        }

        impl std::fmt::Display for Fmt<'_> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} = getelementptr ", self.instr.dest)?;
                if self.instr.in_bounds {
                    write!(f, "inbounds ")?;
                }
                write!(f, "{}, ptr {}", self.registry.fmt(self.instr.ty), self.instr.base)?;
                for index in self.instr.indices.iter() {
                    write!(f, ", {}", index)?;
                }
                Ok(())
            }
        }

        Fmt {
            instr: self,
            registry,
        }
    }
}
