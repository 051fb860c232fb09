use num_bigint::BigInt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::primary::IType;

/// An integer literal paired with its `IType`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IConst {
    pub ty: IType,
    pub value: BigInt,
}

impl IConst {
    pub fn new(ty: IType, value: impl Into<BigInt>) -> Self {
        Self {
            ty,
            value: value.into(),
        }
    }

    /// The value as an unsigned field index, if it fits.
    pub fn as_index(&self) -> Option<u64> {
        u64::try_from(&self.value).ok()
    }

    /// Returns `true` if the literal is zero.
    pub fn is_zero(&self) -> bool {
        self.value == BigInt::from(0u8)
    }
}

impl std::fmt::Display for IConst {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.ty, self.value)
    }
}

macro_rules! iconst_from {
    ($prim:ty, $ity:expr) => {
        impl From<$prim> for IConst {
            fn from(value: $prim) -> Self {
                Self {
                    ty: $ity,
                    value: value.into(),
                }
            }
        }
    };
}

iconst_from!(u8, IType::I8);
iconst_from!(u16, IType::I16);
iconst_from!(u32, IType::I32);
iconst_from!(u64, IType::I64);
iconst_from!(i32, IType::I32);
iconst_from!(i64, IType::I64);
