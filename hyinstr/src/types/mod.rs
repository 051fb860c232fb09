//! Types module
//!
//! This module contains the canonical representation of types used by the
//! `hyinstr` crate. It exposes a small type system built on three layers:
//!
//! - Primary types: integer, floating-point and pointer types (see `primary.rs`).
//! - Aggregate types: arrays and structures (see `aggregate.rs`).
//! - A registry-backed [`AnyType`] wrapper and [`TypeRegistry`] which deduplicates
//!   types and provides stable [`Typeref`] identifiers (UUID-based).
//!
//! A registry belongs to exactly one module. Two independently compiled
//! modules own two registries, so the same logical type is reachable through
//! two unrelated typerefs; [`cmp_types`] compares types across registries by
//! their structure instead of by identity.
use std::{
    cmp::Ordering,
    collections::BTreeMap,
    hash::{DefaultHasher, Hash, Hasher},
    ops::Deref,
};

use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use strum::{EnumIs, EnumTryAs};
use uuid::{Timestamp, Uuid};

use crate::{
    types::{
        aggregate::{ArrayType, StructType},
        layout::AggregateTypeLayout,
        primary::PrimaryType,
    },
    utils::{Error, Result},
};
pub mod aggregate;
pub mod layout;
pub mod primary;

/// A stable reference to a type stored inside a `TypeRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Typeref(Uuid);

impl std::fmt::Display for Typeref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sum-type representing any type that can be stored in the registry.
///
/// This includes primary (primitive) types and aggregate types like
/// arrays and structures. [`AnyType`] implements `Hash`/`Eq` so it can be
/// deduplicated by the [`TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs, EnumTryAs)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnyType {
    /// Primary types
    ///
    /// All types that can be represented as [`PrimaryType`]: integers,
    /// floating-point values and opaque pointers.
    Primary(PrimaryType),

    /// An array type: element typeref + element count.
    ///
    /// Notice that the number of elements MUST be known at compile time.
    Array(ArrayType),

    /// A structure type: an ordered list of (optionally named) fields.
    Struct(StructType),
}

impl<S: Into<PrimaryType>> From<S> for AnyType {
    fn from(value: S) -> Self {
        AnyType::Primary(value.into())
    }
}

impl From<ArrayType> for AnyType {
    fn from(value: ArrayType) -> Self {
        AnyType::Array(value)
    }
}

impl From<StructType> for AnyType {
    fn from(value: StructType) -> Self {
        AnyType::Struct(value)
    }
}

impl AnyType {
    /// Rank of the variant, used as the first key of the cross-module order.
    fn rank(&self) -> u8 {
        match self {
            AnyType::Primary(_) => 0,
            AnyType::Array(_) => 1,
            AnyType::Struct(_) => 2,
        }
    }

    fn internal_fmt<U>(&self, ref_object: U) -> impl std::fmt::Display
    where
        U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized,
    {
        struct AnyTypeFmt<'a, U> {
            ty: &'a AnyType,
            ref_object: U,
        }

        impl<U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized> std::fmt::Display
            for AnyTypeFmt<'_, U>
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.ty {
                    AnyType::Primary(primary_type) => primary_type.fmt(f),
                    AnyType::Array(array_type) => {
                        array_type.internal_fmt(self.ref_object.deref()).fmt(f)
                    }
                    AnyType::Struct(struct_type) => {
                        struct_type.internal_fmt(self.ref_object.deref()).fmt(f)
                    }
                }
            }
        }

        AnyTypeFmt {
            ty: self,
            ref_object,
        }
    }

    /// Build a formatting helper that renders this type using the provided
    /// registry to resolve referenced element types.
    ///
    /// Example:
    /// ```rust
    /// # use hyinstr::types::{AnyType, TypeRegistry, primary::IType};
    /// let reg = TypeRegistry::new([0; 6]);
    /// let t = AnyType::from(IType::I32);
    /// assert_eq!(format!("{}", t.fmt(&reg)), "i32");
    /// ```
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display {
        self.internal_fmt(registry.array.read_recursive())
    }
}

/// A central registry that stores and deduplicates `AnyType` values.
///
/// The registry provides fast lookup by `Typeref` and ensures identical type
/// descriptions map to the same stable identifier.
///
/// Example:
///
/// ```rust
/// # use hyinstr::types::{TypeRegistry, primary::IType};
/// let reg = TypeRegistry::new([0u8; 6]);
/// let typeref = reg.search_or_insert(IType::I8.into());
/// assert_eq!(reg.search_or_insert(IType::I8.into()), typeref);
/// assert_eq!(reg.get(typeref).as_deref(), Some(&IType::I8.into()));
/// ```
pub struct TypeRegistry {
    array: RwLock<BTreeMap<Uuid, AnyType>>,
    inverse_lookup: RwLock<BTreeMap<u64, SmallVec<[Uuid; 1]>>>,
    context: uuid::timestamp::context::Context,
    node_id: [u8; 6],
}

impl TypeRegistry {
    fn hash_ty(ty: &AnyType) -> u64 {
        let mut hasher = DefaultHasher::new();
        ty.hash(&mut hasher);
        hasher.finish()
    }

    fn next_uuid(&self) -> Uuid {
        let ts = Timestamp::now(&self.context);
        Uuid::new_v6(ts, &self.node_id)
    }

    /// Create a new [`TypeRegistry`] instance.
    ///
    /// `node_id` is used when allocating UUIDs for newly inserted types.
    pub fn new(node_id: [u8; 6]) -> Self {
        Self {
            array: Default::default(),
            // INFO: Always lock array before inverse_lookup to avoid deadlock
            inverse_lookup: Default::default(),
            context: uuid::timestamp::context::Context::new(0),
            node_id,
        }
    }

    /// Retrieve a borrowed [`AnyType`] for the given `typeref`. Returns
    /// [`None`] if the given `typeref` is not present in the registry.
    ///
    /// # A note on concurrency
    /// This method internally acquires a read lock on the type storage. As a
    /// result,
    ///  1) Multiple concurrent readers are allowed.
    ///  2) You mustn't hold a read-guard while calling [`Self::search_or_insert`] as
    ///     it may attempt to upgrade to a write lock, leading to a deadlock.
    ///  3) The returned guard keeps the read lock held for the lifetime of the guard.
    pub fn get(&self, typeref: Typeref) -> Option<MappedRwLockReadGuard<'_, AnyType>> {
        let array_lock = self.array.read_recursive();
        RwLockReadGuard::try_map(array_lock, |map| map.get(&typeref.0)).ok()
    }

    /// Insert `ty` into the registry if an equivalent type doesn't already
    /// exist and return the [`Typeref`] for it.
    ///
    /// If an identical type is already present, its existing [`Typeref`] is returned,
    /// otherwise a new UUID is allocated and the type is inserted.
    ///
    /// # A note on concurrency
    /// This method internally acquires read locks on the type storage, and
    /// upgrades them to write locks if a new type must be inserted. You **MUST NOT**
    /// hold a read-guard returned by [`Self::get`] while calling this method.
    pub fn search_or_insert(&self, ty: AnyType) -> Typeref {
        let h = Self::hash_ty(&ty);

        // Lock, notice that the order is critical, always lock first database first
        let mut array_lock = self.array.upgradable_read();
        let mut inverse_lookup_lock = self.inverse_lookup.upgradable_read();

        if let Some(typerefs) = inverse_lookup_lock.get(&h) {
            for typeref in typerefs {
                if array_lock.get(typeref) == Some(&ty) {
                    return Typeref(*typeref);
                }
            }
        }

        // NOTE: Ordering of upgrade is paramount to avoid deadlock
        array_lock.with_upgraded(|array_lock| {
            inverse_lookup_lock.with_upgraded(|inverse_lookup_lock| {
                let new_typeref = self.next_uuid();

                if let Some(list) = inverse_lookup_lock.get_mut(&h) {
                    info!(
                        "Detected an hash collision on hash 0x{:016x} while registering {}.",
                        h,
                        ty.internal_fmt(&*array_lock)
                    );
                    list.push(new_typeref);
                } else {
                    debug!(
                        "New type encountered {}. Registered with UUID {}.",
                        ty.internal_fmt(&*array_lock),
                        new_typeref
                    );
                    inverse_lookup_lock.insert(h, smallvec![new_typeref]);
                }

                array_lock.insert(new_typeref, ty);
                Typeref(new_typeref)
            })
        })
    }

    /// Compute the natural layout of the aggregate type referenced by `typeref`.
    ///
    /// Fails with [`Error::UnknownType`] when the typeref is foreign to this
    /// registry and with [`Error::NotAggregate`] for primary types.
    pub fn layout_of(&self, typeref: Typeref) -> Result<AggregateTypeLayout> {
        let ty = self.get(typeref).ok_or(Error::UnknownType { typeref })?;
        match &*ty {
            AnyType::Struct(struct_type) => AggregateTypeLayout::of_struct(self, struct_type),
            AnyType::Array(array_type) => AggregateTypeLayout::of_array(self, array_type),
            AnyType::Primary(primary) => Err(Error::NotAggregate {
                rendered: primary.to_string(),
            }),
        }
    }

    /// Store size and alignment (in bytes) of any registered type.
    pub fn size_align(&self, typeref: Typeref) -> Result<(u64, u64)> {
        let ty = self.get(typeref).ok_or(Error::UnknownType { typeref })?;
        match &*ty {
            AnyType::Primary(primary) => Ok((primary.byte_size(), primary.alignment())),
            AnyType::Struct(struct_type) => {
                let layout = AggregateTypeLayout::of_struct(self, struct_type)?;
                Ok((layout.size, layout.align))
            }
            AnyType::Array(array_type) => {
                let layout = AggregateTypeLayout::of_array(self, array_type)?;
                Ok((layout.size, layout.align))
            }
        }
    }

    /// Format a given `Typeref` using this registry.
    pub fn fmt(&self, typeref: Typeref) -> impl std::fmt::Display {
        struct Fmt<'a> {
            registry: &'a TypeRegistry,
            typeref: Typeref,
        }

        impl<'a> std::fmt::Display for Fmt<'a> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.registry.get(self.typeref) {
                    Some(ty_guard) => ty_guard.fmt(self.registry).fmt(f),
                    None => write!(f, "<unknown type {}>", self.typeref.0),
                }
            }
        }

        Fmt {
            registry: self,
            typeref,
        }
    }
}

/// Structurally compare two types living in two (possibly different) registries.
///
/// Types are ordered by variant (primary < array < struct), then:
/// - primary types by their natural order,
/// - arrays by element count, then element type,
/// - structures by packing, field count, then field types in order.
///
/// Field names and structure names do not take part in the comparison. A
/// typeref missing from its registry orders before every resolvable type.
pub fn cmp_types(
    left_registry: &TypeRegistry,
    left: Typeref,
    right_registry: &TypeRegistry,
    right: Typeref,
) -> Ordering {
    let (l, r) = match (left_registry.get(left), right_registry.get(right)) {
        (Some(l), Some(r)) => (l, r),
        (l, r) => return l.is_some().cmp(&r.is_some()),
    };

    match (&*l, &*r) {
        (AnyType::Primary(lp), AnyType::Primary(rp)) => lp.cmp(rp),
        (AnyType::Array(la), AnyType::Array(ra)) => la
            .num_elements
            .cmp(&ra.num_elements)
            .then_with(|| cmp_types(left_registry, la.ty, right_registry, ra.ty)),
        (AnyType::Struct(ls), AnyType::Struct(rs)) => ls
            .packed
            .cmp(&rs.packed)
            .then_with(|| ls.fields.len().cmp(&rs.fields.len()))
            .then_with(|| {
                ls.element_types()
                    .zip(rs.element_types())
                    .map(|(lt, rt)| cmp_types(left_registry, lt, right_registry, rt))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            }),
        (l, r) => l.rank().cmp(&r.rank()),
    }
}
