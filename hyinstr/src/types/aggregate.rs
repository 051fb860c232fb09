//! Aggregate types
//!
//! This file provides composite types built from `Typeref` references stored
//! in the central `TypeRegistry`:
//! - `ArrayType`: a fixed-size array of elements referenced by `Typeref`.
//! - `StructType`: an ordered sequence of fields, optionally named.
//!
//! Both types carry lightweight `fmt` helpers that accept a `&TypeRegistry` so
//! that elements can be resolved for display purposes.
use std::{collections::BTreeMap, fmt::Debug, ops::Deref};

use crate::types::{AnyType, TypeRegistry, Typeref};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn fmt_element(
    f: &mut std::fmt::Formatter<'_>,
    ref_object: &BTreeMap<Uuid, AnyType>,
    typeref: Typeref,
) -> std::fmt::Result {
    match ref_object.get(&typeref.0) {
        Some(elem) => write!(f, "{}", elem.internal_fmt(ref_object)),
        None => write!(f, "<unknown type {}>", typeref.0),
    }
}

/// Array type
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArrayType {
    pub ty: Typeref,
    pub num_elements: u64,
}

impl ArrayType {
    pub(super) fn internal_fmt<'a, U>(&'a self, ref_object: U) -> impl std::fmt::Display
    where
        U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized,
    {
        struct ArrayTypeFmt<'a, U> {
            r#ref: &'a ArrayType,
            ref_object: U,
        }

        impl<U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized> std::fmt::Display
            for ArrayTypeFmt<'_, U>
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "[{} x ", self.r#ref.num_elements)?;
                fmt_element(f, self.ref_object.deref(), self.r#ref.ty)?;
                write!(f, "]")
            }
        }

        ArrayTypeFmt {
            r#ref: self,
            ref_object,
        }
    }

    /// Build a formatting helper for this `ArrayType`.
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display {
        self.internal_fmt(registry.array.read_recursive())
    }
}

/// A single field of a structure.
///
/// `name` is the declared (source-level) name of the field. Synthetic fields
/// such as explicit padding or compiler-generated members carry no name.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructField {
    pub name: Option<String>,
    pub ty: Typeref,
}

impl StructField {
    /// A field with a declared name.
    pub fn named(name: impl Into<String>, ty: Typeref) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    /// A field without source identity.
    pub fn anonymous(ty: Typeref) -> Self {
        Self { name: None, ty }
    }
}

/// Structure type
///
/// Named structures (`name` is `Some`) are identified across modules by
/// their name; literal structures only by their shape.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StructType {
    pub name: Option<String>,
    pub fields: Vec<StructField>,
    pub packed: bool,
}

impl StructType {
    /// A named structure with the given fields.
    pub fn named(name: impl Into<String>, fields: impl IntoIterator<Item = StructField>) -> Self {
        Self {
            name: Some(name.into()),
            fields: fields.into_iter().collect(),
            packed: false,
        }
    }

    /// A literal (anonymous) structure with the given fields.
    pub fn literal(fields: impl IntoIterator<Item = StructField>) -> Self {
        Self {
            name: None,
            fields: fields.into_iter().collect(),
            packed: false,
        }
    }

    /// Mark this structure as packed (no inter-field padding).
    pub fn with_packed(mut self, packed: bool) -> Self {
        self.packed = packed;
        self
    }

    /// Iterate over the element types in declaration order.
    pub fn element_types(&self) -> impl Iterator<Item = Typeref> + '_ {
        self.fields.iter().map(|field| field.ty)
    }

    pub(super) fn internal_fmt<'a, U>(&'a self, ref_object: U) -> impl std::fmt::Display
    where
        U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized,
    {
        struct StructTypeFmt<'a, U> {
            r#ref: &'a StructType,
            ref_object: U,
        }

        impl<U: Deref<Target = BTreeMap<Uuid, AnyType>> + Sized> std::fmt::Display
            for StructTypeFmt<'_, U>
        {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                // Named structures print by name only, as they may be recursive
                if let Some(name) = &self.r#ref.name {
                    return write!(f, "%struct.{}", name);
                }

                write!(f, "{}", if self.r#ref.packed { "<{ " } else { "{ " })?;
                for (i, field) in self.r#ref.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_element(f, self.ref_object.deref(), field.ty)?;
                }
                write!(f, "{}", if self.r#ref.packed { " }>" } else { " }" })
            }
        }

        StructTypeFmt {
            r#ref: self,
            ref_object,
        }
    }

    /// Build a formatting helper for this `StructType`.
    pub fn fmt<'a>(&'a self, registry: &'a TypeRegistry) -> impl std::fmt::Display {
        self.internal_fmt(registry.array.read_recursive())
    }
}
