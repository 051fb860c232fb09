//! Attribute equivalence.
//!
//! Two attribute sets are equivalent when they agree on every attribute that
//! is not listed in the [`NonSemanticCatalog`]. When they disagree the order
//! is taken from the smallest (by name) key on which they differ, so that
//! the same two sets always produce the same signal.
use std::cmp::Ordering;

use hyinstr::{
    modules::attributes::{AttributeKey, AttributeSet, AttributeValue},
    types::Typeref,
};
use log::{debug, trace};

use crate::catalog::NonSemanticCatalog;

/// Order two attribute payloads. Type payloads are module-local and are
/// ordered through `cmp_type`.
pub fn cmp_attribute_values(
    left: &AttributeValue,
    right: &AttributeValue,
    cmp_type: impl Fn(Typeref, Typeref) -> Ordering,
) -> Ordering {
    match (left, right) {
        (AttributeValue::Flag, AttributeValue::Flag) => Ordering::Equal,
        (AttributeValue::Int(l), AttributeValue::Int(r)) => l.cmp(r),
        (AttributeValue::Type(l), AttributeValue::Type(r)) => cmp_type(*l, *r),
        (AttributeValue::Str(l), AttributeValue::Str(r)) => l.cmp(r),
        (l, r) => l.rank().cmp(&r.rank()),
    }
}

/// Compare two sequences of attribute entries, both sorted by key.
///
/// A key present only on the left makes the left side greater, a key present
/// only on the right makes it less; a shared key with different payloads
/// orders by payload. The first such key in canonical order decides.
pub fn cmp_attribute_entries<'l, 'r>(
    left: impl Iterator<Item = (&'l AttributeKey, &'l AttributeValue)>,
    right: impl Iterator<Item = (&'r AttributeKey, &'r AttributeValue)>,
    cmp_type: impl Fn(Typeref, Typeref) -> Ordering,
) -> Ordering {
    let mut left = left.peekable();
    let mut right = right.peekable();

    loop {
        let next = (left.peek().copied(), right.peek().copied());
        let ((l_key, l_value), (r_key, r_value)) = match next {
            (None, None) => return Ordering::Equal,
            (Some((key, _)), None) => {
                trace!("attribute `{}` only present on the left", key);
                return Ordering::Greater;
            }
            (None, Some((key, _))) => {
                trace!("attribute `{}` only present on the right", key);
                return Ordering::Less;
            }
            (Some(l), Some(r)) => (l, r),
        };

        match l_key.cmp(r_key) {
            Ordering::Less => {
                trace!("attribute `{}` only present on the left", l_key);
                return Ordering::Greater;
            }
            Ordering::Greater => {
                trace!("attribute `{}` only present on the right", r_key);
                return Ordering::Less;
            }
            Ordering::Equal => {
                let ord = cmp_attribute_values(l_value, r_value, &cmp_type);
                if ord.is_ne() {
                    trace!("attribute `{}` differs in value", l_key);
                    return ord;
                }
            }
        }

        left.next();
        right.next();
    }
}

/// Compares attribute sets after discarding non-semantic attributes.
pub struct AttributeEquivalenceComparator<'c> {
    catalog: &'c NonSemanticCatalog,
}

impl<'c> AttributeEquivalenceComparator<'c> {
    pub fn new(catalog: &'c NonSemanticCatalog) -> Self {
        Self { catalog }
    }

    /// Compare `left` and `right`, ignoring every attribute of the catalog.
    ///
    /// Type-valued attributes are compared through `cmp_type`, which receives
    /// a left-module typeref and a right-module typeref.
    pub fn compare(
        &self,
        left: &AttributeSet,
        right: &AttributeSet,
        cmp_type: impl Fn(Typeref, Typeref) -> Ordering,
    ) -> Ordering {
        let ord = cmp_attribute_entries(
            self.catalog.retain_semantic(left),
            self.catalog.retain_semantic(right),
            cmp_type,
        );
        if ord.is_ne() {
            debug!("attribute sets differ: [{}] vs [{}]", left, right);
        }
        ord
    }
}
