//! Primary types
//!
//! Non-composite types: integers, floating-point values and opaque pointers.
//! Each primary type knows its natural store size and alignment so that
//! aggregate layouts can be computed without a target description.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{EnumIs, EnumTryAs};

/// Size in bytes of an opaque pointer.
pub const POINTER_SIZE: u64 = 8;

/// Represents an integer type with a specific bit width.
///
/// Signeness is not represented here; all integer types are treated as unsigned.
/// Instructions that operate on signed integers will interpret the bits accordingly.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct IType {
    num_bits: u32,
}

impl IType {
    /// Common integer types.
    pub const I1: Self = Self { num_bits: 1 };
    pub const I8: Self = Self { num_bits: 8 };
    pub const I16: Self = Self { num_bits: 16 };
    pub const I32: Self = Self { num_bits: 32 };
    pub const I64: Self = Self { num_bits: 64 };
    pub const I128: Self = Self { num_bits: 128 };
    pub const MIN_BITS: u32 = 1;
    pub const MAX_BITS: u32 = (1 << 23) - 1;

    #[inline]
    const fn check_validity(num_bits: u32) -> bool {
        num_bits >= Self::MIN_BITS && num_bits <= Self::MAX_BITS
    }

    /// Creates a new `IType` with the specified number of bits.
    #[inline]
    pub const fn new(num_bits: u32) -> Option<Self> {
        if Self::check_validity(num_bits) {
            Some(Self { num_bits })
        } else {
            None
        }
    }

    /// Returns the number of bits of the integer type.
    #[inline]
    pub const fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Returns the number of bytes required to store the integer type.
    #[inline]
    pub const fn byte_size(&self) -> u64 {
        self.num_bits.div_ceil(8) as u64
    }

    /// Natural alignment: the store size rounded up to a power of two, capped
    /// at 16 bytes.
    #[inline]
    pub const fn alignment(&self) -> u64 {
        let align = self.byte_size().next_power_of_two();
        if align > 16 { 16 } else { align }
    }
}

impl std::fmt::Display for IType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "i{}", self.num_bits)
    }
}

/// Represents a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FType {
    /// 16-bit floating point value (IEEE-754 binary16)
    Fp16,

    /// 16-bit "brain" floating point value (7-bit significand).
    Bf16,

    /// 32-bit floating point value (IEEE-754 binary32)
    Fp32,

    /// 64-bit floating point value (IEEE-754 binary64)
    Fp64,

    /// 128-bit floating point value (IEEE-754 binary128)
    Fp128,

    /// 80-bit floating point value (X87 extended precision), stored in 16 bytes.
    X86Fp80,
}

impl FType {
    /// Store size in bytes.
    pub const fn byte_size(&self) -> u64 {
        match self {
            FType::Fp16 | FType::Bf16 => 2,
            FType::Fp32 => 4,
            FType::Fp64 => 8,
            FType::Fp128 | FType::X86Fp80 => 16,
        }
    }
}

impl std::fmt::Display for FType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FType::Fp16 => "half",
            FType::Bf16 => "bfloat",
            FType::Fp32 => "float",
            FType::Fp64 => "double",
            FType::Fp128 => "fp128",
            FType::X86Fp80 => "x86_fp80",
        };
        write!(f, "{}", s)
    }
}

/// Represents any primitive type.
///
/// Pointers are opaque: they carry no pointee type, the address computation
/// that derives them names the type it indexes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PrimaryType {
    Int(IType),
    Float(FType),
    Ptr,
}

impl PrimaryType {
    /// Store size in bytes.
    pub const fn byte_size(&self) -> u64 {
        match self {
            PrimaryType::Int(itype) => itype.byte_size(),
            PrimaryType::Float(ftype) => ftype.byte_size(),
            PrimaryType::Ptr => POINTER_SIZE,
        }
    }

    /// Natural alignment in bytes.
    pub const fn alignment(&self) -> u64 {
        match self {
            PrimaryType::Int(itype) => itype.alignment(),
            PrimaryType::Float(ftype) => ftype.byte_size(),
            PrimaryType::Ptr => POINTER_SIZE,
        }
    }
}

impl From<IType> for PrimaryType {
    fn from(value: IType) -> Self {
        PrimaryType::Int(value)
    }
}

impl From<FType> for PrimaryType {
    fn from(value: FType) -> Self {
        PrimaryType::Float(value)
    }
}

impl std::fmt::Display for PrimaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimaryType::Int(itype) => itype.fmt(f),
            PrimaryType::Float(ftype) => ftype.fmt(f),
            PrimaryType::Ptr => write!(f, "ptr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_sizes_and_alignment() {
        assert_eq!(IType::I1.byte_size(), 1);
        assert_eq!(IType::I32.byte_size(), 4);
        assert_eq!(IType::new(24).unwrap().byte_size(), 3);
        assert_eq!(IType::new(24).unwrap().alignment(), 4);
        assert_eq!(IType::new(512).unwrap().alignment(), 16);
        assert!(IType::new(0).is_none());
    }

    #[test]
    fn display_matches_textual_ir() {
        assert_eq!(PrimaryType::from(IType::I64).to_string(), "i64");
        assert_eq!(PrimaryType::from(FType::Fp64).to_string(), "double");
        assert_eq!(PrimaryType::Ptr.to_string(), "ptr");
    }
}
