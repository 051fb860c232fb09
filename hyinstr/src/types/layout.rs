//! Natural layout of aggregate types.
//!
//! Layouts follow the usual C rules: every field starts at the next offset
//! aligned to its own alignment (unless the structure is packed) and the
//! total size is rounded up to the alignment of the aggregate. A layout is a
//! per-module view; the same logical structure compiled in two modules can
//! produce two layouts with different field counts and offsets.
use crate::{
    types::{
        TypeRegistry, Typeref,
        aggregate::{ArrayType, StructType},
    },
    utils::{Error, Result},
};

/// Placement of one field (or array element) inside an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    /// Position of the field in declaration order.
    pub index: u64,
    /// Byte offset from the start of the aggregate.
    pub offset: u64,
    /// Store size of the field in bytes.
    pub size: u64,
    pub ty: Typeref,
    /// Declared name, `None` for synthetic fields and array elements.
    pub name: Option<String>,
}

/// Shape-specific part of an [`AggregateTypeLayout`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Struct {
        name: Option<String>,
        fields: Vec<FieldLayout>,
    },
    /// Elements are materialised on demand, see [`AggregateTypeLayout::field`].
    Array {
        element: Typeref,
        num_elements: u64,
        stride: u64,
    },
}

/// Ordered field/offset description of a struct or array type within one module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregateTypeLayout {
    pub kind: AggregateKind,
    pub size: u64,
    pub align: u64,
}

#[inline]
fn align_to(offset: u64, align: u64) -> Result<u64> {
    let align = align.max(1);
    offset
        .div_ceil(align)
        .checked_mul(align)
        .ok_or(Error::LayoutOverflow)
}

impl AggregateTypeLayout {
    pub(crate) fn of_struct(registry: &TypeRegistry, ty: &StructType) -> Result<Self> {
        let mut offset = 0u64;
        let mut struct_align = 1u64;
        let mut fields = Vec::with_capacity(ty.fields.len());

        for (index, field) in ty.fields.iter().enumerate() {
            let (size, align) = registry.size_align(field.ty)?;
            let align = if ty.packed { 1 } else { align };

            offset = align_to(offset, align)?;
            struct_align = struct_align.max(align);
            fields.push(FieldLayout {
                index: index as u64,
                offset,
                size,
                ty: field.ty,
                name: field.name.clone(),
            });
            offset = offset.checked_add(size).ok_or(Error::LayoutOverflow)?;
        }

        debug_assert!(fields.windows(2).all(|w| w[0].offset <= w[1].offset));

        Ok(Self {
            kind: AggregateKind::Struct {
                name: ty.name.clone(),
                fields,
            },
            size: align_to(offset, struct_align)?,
            align: struct_align,
        })
    }

    pub(crate) fn of_array(registry: &TypeRegistry, ty: &ArrayType) -> Result<Self> {
        let (size, align) = registry.size_align(ty.ty)?;
        let stride = align_to(size, align)?;
        let total = stride
            .checked_mul(ty.num_elements)
            .ok_or(Error::LayoutOverflow)?;

        Ok(Self {
            kind: AggregateKind::Array {
                element: ty.ty,
                num_elements: ty.num_elements,
                stride,
            },
            size: total,
            align,
        })
    }

    /// Returns `true` for structure layouts.
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, AggregateKind::Struct { .. })
    }

    /// Name of the structure, if this is a named structure.
    pub fn struct_name(&self) -> Option<&str> {
        match &self.kind {
            AggregateKind::Struct { name, .. } => name.as_deref(),
            AggregateKind::Array { .. } => None,
        }
    }

    /// Number of fields (or array elements).
    pub fn len(&self) -> u64 {
        match &self.kind {
            AggregateKind::Struct { fields, .. } => fields.len() as u64,
            AggregateKind::Array { num_elements, .. } => *num_elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Placement of the field at `index`.
    ///
    /// Array elements are computed from the stride. Indexing past the end of
    /// an array is allowed, as address computations may legally do so; only
    /// structure indices are bounds-checked. An element offset that does not
    /// fit in 64 bits is a [`Error::LayoutOverflow`].
    pub fn field(&self, index: u64) -> Result<FieldLayout> {
        match &self.kind {
            AggregateKind::Struct { fields, .. } => {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| fields.get(i))
                    .cloned()
                    .ok_or(Error::FieldOutOfRange {
                        index,
                        count: fields.len() as u64,
                    })
            }
            AggregateKind::Array {
                element, stride, ..
            } => Ok(FieldLayout {
                index,
                offset: stride.checked_mul(index).ok_or(Error::LayoutOverflow)?,
                size: *stride,
                ty: *element,
                name: None,
            }),
        }
    }

    /// Find the structure field whose declared name is `name`.
    pub fn field_by_name(&self, name: &str) -> Option<&FieldLayout> {
        match &self.kind {
            AggregateKind::Struct { fields, .. } => fields
                .iter()
                .find(|field| field.name.as_deref() == Some(name)),
            AggregateKind::Array { .. } => None,
        }
    }

    /// Iterate over the materialised structure fields (empty for arrays).
    pub fn fields(&self) -> impl Iterator<Item = &FieldLayout> {
        match &self.kind {
            AggregateKind::Struct { fields, .. } => either::Either::Left(fields.iter()),
            AggregateKind::Array { .. } => either::Either::Right(std::iter::empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        aggregate::StructField,
        primary::{IType, PrimaryType},
    };

    #[test]
    fn struct_fields_are_naturally_aligned() {
        let reg = TypeRegistry::new([0; 6]);
        let i8_ = reg.search_or_insert(IType::I8.into());
        let i32_ = reg.search_or_insert(IType::I32.into());
        let ptr = reg.search_or_insert(PrimaryType::Ptr.into());
        let s = reg.search_or_insert(
            StructType::named(
                "mixed",
                [
                    StructField::named("tag", i8_),
                    StructField::named("count", i32_),
                    StructField::named("next", ptr),
                ],
            )
            .into(),
        );

        let layout = reg.layout_of(s).unwrap();
        let offsets: Vec<_> = layout.fields().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(layout.size, 16);
        assert_eq!(layout.align, 8);
        assert_eq!(layout.struct_name(), Some("mixed"));
        assert_eq!(layout.field_by_name("next").map(|f| f.index), Some(2));
    }

    #[test]
    fn packed_struct_has_no_padding() {
        let reg = TypeRegistry::new([0; 6]);
        let i8_ = reg.search_or_insert(IType::I8.into());
        let i32_ = reg.search_or_insert(IType::I32.into());
        let s = reg.search_or_insert(
            StructType::literal([StructField::anonymous(i8_), StructField::anonymous(i32_)])
                .with_packed(true)
                .into(),
        );

        let layout = reg.layout_of(s).unwrap();
        assert_eq!(layout.field(1).unwrap().offset, 1);
        assert_eq!(layout.size, 5);
    }

    #[test]
    fn array_elements_use_the_stride() {
        let reg = TypeRegistry::new([0; 6]);
        let i16_ = reg.search_or_insert(IType::I16.into());
        let arr = reg.search_or_insert(
            ArrayType {
                ty: i16_,
                num_elements: 10,
            }
            .into(),
        );

        let layout = reg.layout_of(arr).unwrap();
        assert!(!layout.is_struct());
        assert_eq!(layout.len(), 10);
        assert_eq!(layout.field(3).unwrap().offset, 6);
        assert_eq!(layout.size, 20);
    }

    #[test]
    fn struct_index_out_of_range_is_reported() {
        let reg = TypeRegistry::new([0; 6]);
        let i32_ = reg.search_or_insert(IType::I32.into());
        let s = reg.search_or_insert(StructType::literal([StructField::anonymous(i32_)]).into());
        let layout = reg.layout_of(s).unwrap();
        assert_eq!(
            layout.field(4),
            Err(Error::FieldOutOfRange { index: 4, count: 1 })
        );
        assert!(reg.layout_of(i32_).unwrap_err().is_not_aggregate());
    }

    #[test]
    fn oversized_aggregates_are_rejected() {
        let reg = TypeRegistry::new([0; 6]);
        let i8_ = reg.search_or_insert(IType::I8.into());
        let i64_ = reg.search_or_insert(IType::I64.into());
        let huge = reg.search_or_insert(
            ArrayType {
                ty: i64_,
                num_elements: u64::MAX,
            }
            .into(),
        );
        let s = reg.search_or_insert(
            StructType::named(
                "big",
                [StructField::named("tag", i8_), StructField::named("big", huge)],
            )
            .into(),
        );

        assert_eq!(reg.layout_of(huge), Err(Error::LayoutOverflow));
        assert_eq!(reg.layout_of(s), Err(Error::LayoutOverflow));

        let bytes = reg.search_or_insert(
            ArrayType {
                ty: i64_,
                num_elements: 4,
            }
            .into(),
        );
        let layout = reg.layout_of(bytes).unwrap();
        assert!(layout.field(u64::MAX).unwrap_err().is_layout_overflow());
    }
}
