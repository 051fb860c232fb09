//! The differential comparator: the generic engine with the two
//! cross-module override points plugged in.
use std::cmp::Ordering;

use hyinstr::{
    modules::{Operand, attributes::AttributeSet, mem::MGetElementPtr},
    types::{TypeRegistry, Typeref, layout::AggregateTypeLayout},
    utils::Result as LayoutResult,
};

use crate::{
    attrs::AttributeEquivalenceComparator,
    catalog::NonSemanticCatalog,
    config::ComparatorOptions,
    context::{ComparisonContext, ValueOracle},
    engine::StructuralComparator,
    gep::AddressComputationComparator,
};

/// Compares constructs of two functions living in two different modules.
///
/// Address computations tolerate layout divergence of the indexed structures
/// and attribute sets ignore everything listed in the catalog. All other
/// comparisons keep the engine defaults.
///
/// ```rust
/// # use std::cmp::Ordering;
/// # use hyinstr::modules::{Operand, attributes::{AttributeKind, AttributeSet}};
/// # use hyinstr::types::TypeRegistry;
/// # use hydiff::{ComparisonContext, DifferentialComparator};
/// # use hydiff::{NonSemanticCatalog, StructuralComparator};
/// let (left, right) = (TypeRegistry::new([1; 6]), TypeRegistry::new([2; 6]));
/// let ctx = ComparisonContext::new(&left, &right, |_: &Operand, _: &Operand| Ordering::Equal);
/// let cmp = DifferentialComparator::new(ctx, NonSemanticCatalog::builtin());
///
/// let hinted = AttributeSet::new().with(AttributeKind::InlineHint);
/// assert_eq!(cmp.cmp_attribute_sets(&hinted, &AttributeSet::new()), Ordering::Equal);
/// ```
pub struct DifferentialComparator<'a, O> {
    context: ComparisonContext<'a, O>,
    catalog: &'a NonSemanticCatalog,
    options: ComparatorOptions,
}

impl<'a, O: ValueOracle> DifferentialComparator<'a, O> {
    pub fn new(context: ComparisonContext<'a, O>, catalog: &'a NonSemanticCatalog) -> Self {
        Self {
            context,
            catalog,
            options: ComparatorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ComparatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ComparatorOptions {
        self.options
    }
}

impl<O: ValueOracle> StructuralComparator for DifferentialComparator<'_, O> {
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

    fn cmp_address_computations(&self, left: &MGetElementPtr, right: &MGetElementPtr) -> Ordering {
        AddressComputationComparator::new(self, self.options).compare(left, right)
    }

    fn cmp_attribute_sets(&self, left: &AttributeSet, right: &AttributeSet) -> Ordering {
        AttributeEquivalenceComparator::new(self.catalog).compare(left, right, |l, r| {
            self.cmp_types(l, r)
        })
    }
}
