//! Generic structural comparison.
//!
//! [`StructuralComparator`] is the capability the function-body walk relies
//! on. Every method returns an [`Ordering`]: `Equal` means "match", anything
//! else is a mismatch that also gives a deterministic order usable for
//! canonicalisation. Default methods implement plain same-module semantics;
//! implementors override the points where the two modules may legitimately
//! diverge.
use std::cmp::Ordering;

use hyinstr::{
    consts::IConst,
    modules::{
        Operand,
        attributes::{AttributeList, AttributeSet},
        mem::MGetElementPtr,
    },
    types::{TypeRegistry, Typeref, cmp_types, layout::AggregateTypeLayout},
    utils::Result as LayoutResult,
};

use crate::{
    attrs::cmp_attribute_entries,
    context::{ComparisonContext, ValueOracle},
};

/// Override points of the generic function comparison.
pub trait StructuralComparator {
    /// Type registry of the left module.
    fn left_types(&self) -> &TypeRegistry;

    /// Type registry of the right module.
    fn right_types(&self) -> &TypeRegistry;

    /// General value comparison (local values, constants, globals).
    fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering;

    /// Layout of an aggregate of the left module.
    fn left_layout(&self, ty: Typeref) -> LayoutResult<AggregateTypeLayout> {
        self.left_types().layout_of(ty)
    }

    /// Layout of an aggregate of the right module.
    fn right_layout(&self, ty: Typeref) -> LayoutResult<AggregateTypeLayout> {
        self.right_types().layout_of(ty)
    }

    #[inline]
    fn cmp_numbers(&self, left: u64, right: u64) -> Ordering {
        left.cmp(&right)
    }

    /// Integer constants compare by type, then by value.
    fn cmp_const_ints(&self, left: &IConst, right: &IConst) -> Ordering {
        left.ty.cmp(&right.ty).then_with(|| left.value.cmp(&right.value))
    }

    /// Structural comparison of a left type against a right type.
    fn cmp_types(&self, left: Typeref, right: Typeref) -> Ordering {
        cmp_types(self.left_types(), left, self.right_types(), right)
    }

    /// Strict comparison of two address computations: flags, source type,
    /// chain length, then every index as a value. The base pointers are
    /// compared by the caller.
    fn cmp_address_computations(&self, left: &MGetElementPtr, right: &MGetElementPtr) -> Ordering {
        left.in_bounds
            .cmp(&right.in_bounds)
            .then_with(|| self.cmp_types(left.ty, right.ty))
            .then_with(|| self.cmp_numbers(left.indices.len() as u64, right.indices.len() as u64))
            .then_with(|| {
                left.indices
                    .iter()
                    .zip(right.indices.iter())
                    .map(|(l, r)| self.cmp_values(l, r))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }

    /// Exact comparison of two attribute sets.
    fn cmp_attribute_sets(&self, left: &AttributeSet, right: &AttributeSet) -> Ordering {
        cmp_attribute_entries(left.iter(), right.iter(), |l, r| self.cmp_types(l, r))
    }

    /// Function attributes, return attributes, parameter count, then every
    /// parameter, each through [`Self::cmp_attribute_sets`].
    fn cmp_attribute_lists(&self, left: &AttributeList, right: &AttributeList) -> Ordering {
        self.cmp_attribute_sets(&left.function, &right.function)
            .then_with(|| self.cmp_attribute_sets(&left.ret, &right.ret))
            .then_with(|| self.cmp_numbers(left.params.len() as u64, right.params.len() as u64))
            .then_with(|| {
                left.params
                    .iter()
                    .zip(right.params.iter())
                    .map(|(l, r)| self.cmp_attribute_sets(l, r))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// The engine with nothing overridden: two constructs match only if they are
/// structurally identical.
pub struct BaselineComparator<'a, O> {
    context: ComparisonContext<'a, O>,
}

impl<'a, O: ValueOracle> BaselineComparator<'a, O> {
    pub fn new(context: ComparisonContext<'a, O>) -> Self {
        Self { context }
    }
}

impl<O: ValueOracle> StructuralComparator for BaselineComparator<'_, O> {
    fn left_types(&self) -> &TypeRegistry {
        self.context.left
    }

    fn right_types(&self) -> &TypeRegistry {
        self.context.right
    }

    fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering {
        self.context.cmp_values(left, right)
    }

    fn left_layout(&self, ty: Typeref) -> LayoutResult<AggregateTypeLayout> {
        self.context.left_layout(ty)
    }

    fn right_layout(&self, ty: Typeref) -> LayoutResult<AggregateTypeLayout> {
        self.context.right_layout(ty)
    }
}
