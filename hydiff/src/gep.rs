//! Address computation equivalence across modules.
//!
//! The same source-level expression `&task->prio` compiles to
//! `getelementptr %struct.task, ptr %t, 0, 1` in one module and to
//! `getelementptr %struct.task, ptr %t, 0, 2` in another one if a field was
//! inserted before `prio`. Comparing the raw indices would report a
//! difference; instead, structure indices are resolved through each module's
//! own layout and matched by the declared field name.
//!
//! Rules for a single structure step (both indices constant):
//!
//! 1. both selected fields carry the same name: the step matches, whatever
//!    the raw indices are;
//! 2. both selected fields are named, and each name also exists in the other
//!    module's layout: the two sides select different known fields, the step
//!    is ordered by raw index, then by name;
//! 3. otherwise (anonymous field, or a field without counterpart) the step
//!    falls back to positional comparison: raw index, then field type.
//!
//! Array steps and the leading pointer step are always positional. Dynamic
//! indices are handed back to the engine's value comparison. A layout that
//! cannot be resolved degrades the rest of the chain to positional
//! comparison; the comparator never fails.
use std::cmp::Ordering;

use hyinstr::{
    modules::{Operand, mem::MGetElementPtr},
    types::{AnyType, TypeRegistry, Typeref, layout::AggregateTypeLayout},
    utils::Result as LayoutResult,
};
use log::{debug, trace};

use crate::{config::ComparatorOptions, engine::StructuralComparator};

/// Aggregate reached so far on one side of the chain; `None` once the
/// layout could not be resolved.
type Cursor = Option<Typeref>;

/// Compares two address computations whose base pointers have already been
/// matched by the engine.
pub struct AddressComputationComparator<'e, E: ?Sized> {
    engine: &'e E,
    options: ComparatorOptions,
}

impl<'e, E: StructuralComparator + ?Sized> AddressComputationComparator<'e, E> {
    pub fn new(engine: &'e E, options: ComparatorOptions) -> Self {
        Self { engine, options }
    }

    pub fn compare(&self, left: &MGetElementPtr, right: &MGetElementPtr) -> Ordering {
        if self.options.compare_in_bounds {
            let ord = left.in_bounds.cmp(&right.in_bounds);
            if ord.is_ne() {
                return ord;
            }
        }

        let ord = self.cmp_source_types(left.ty, right.ty);
        if ord.is_ne() {
            debug!(
                "source element types differ: {} vs {}",
                self.engine.left_types().fmt(left.ty),
                self.engine.right_types().fmt(right.ty)
            );
            return ord;
        }

        let mut l_cursor: Cursor = Some(left.ty);
        let mut r_cursor: Cursor = Some(right.ty);
        let common = left.indices.len().min(right.indices.len());

        for position in 0..common {
            let (l_index, r_index) = (&left.indices[position], &right.indices[position]);
            let ord = if position == 0 {
                // Steps over the base pointer, the aggregate does not change
                self.cmp_positional_index(l_index, r_index)
            } else {
                self.cmp_step(&mut l_cursor, &mut r_cursor, l_index, r_index)
            };

            if ord.is_ne() {
                debug!(
                    "address computations differ at index {}: {} vs {}",
                    position, l_index, r_index
                );
                return ord;
            }
        }

        if left.indices.len() == right.indices.len() {
            return Ordering::Equal;
        }

        let explained = self.options.layout_reconciliation
            && if left.indices.len() > right.indices.len() {
                Self::is_address_preserving(
                    |ty| self.engine.left_layout(ty),
                    l_cursor,
                    common,
                    &left.indices[common..],
                )
            } else {
                Self::is_address_preserving(
                    |ty| self.engine.right_layout(ty),
                    r_cursor,
                    common,
                    &right.indices[common..],
                )
            };

        if explained {
            trace!("index chains differ in length only by address-preserving indices");
            Ordering::Equal
        } else {
            self.engine
                .cmp_numbers(left.indices.len() as u64, right.indices.len() as u64)
        }
    }

    /// Named structures are identified by name across modules; everything
    /// else by structure.
    fn cmp_source_types(&self, left: Typeref, right: Typeref) -> Ordering {
        match (
            struct_name(self.engine.left_types(), left),
            struct_name(self.engine.right_types(), right),
        ) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => self.engine.cmp_types(left, right),
        }
    }

    /// Raw comparison of two indices: numeric for constants (whatever their
    /// width), the engine's value comparison otherwise.
    fn cmp_positional_index(&self, left: &Operand, right: &Operand) -> Ordering {
        match (left.as_const(), right.as_const()) {
            (Some(l), Some(r)) => l.value.cmp(&r.value),
            _ => self.engine.cmp_values(left, right),
        }
    }

    fn cmp_step(
        &self,
        l_cursor: &mut Cursor,
        r_cursor: &mut Cursor,
        left: &Operand,
        right: &Operand,
    ) -> Ordering {
        let layouts = match (*l_cursor, *r_cursor) {
            (Some(l), Some(r)) => self
                .engine
                .left_layout(l)
                .and_then(|l| Ok((l, self.engine.right_layout(r)?))),
            _ => return self.cmp_positional_index(left, right),
        };

        let (l_layout, r_layout) = match layouts {
            Ok(layouts) => layouts,
            Err(err) => {
                debug!("degrading to positional comparison: {}", err);
                *l_cursor = None;
                *r_cursor = None;
                return self.cmp_positional_index(left, right);
            }
        };

        let const_indices = left
            .as_const()
            .and_then(|l| l.as_index())
            .zip(right.as_const().and_then(|r| r.as_index()));

        match (l_layout.is_struct() && r_layout.is_struct(), const_indices) {
            (true, Some((l_index, r_index))) => {
                self.cmp_struct_step(l_cursor, r_cursor, &l_layout, &r_layout, l_index, r_index)
            }
            _ => {
                let ord = self.cmp_positional_index(left, right);
                if !l_layout.is_struct() && !r_layout.is_struct() {
                    *l_cursor = l_layout.field(0).ok().map(|field| field.ty);
                    *r_cursor = r_layout.field(0).ok().map(|field| field.ty);
                } else {
                    // A struct indexed dynamically or against an array: no structure left to follow
                    *l_cursor = None;
                    *r_cursor = None;
                }
                ord
            }
        }
    }

    fn cmp_struct_step(
        &self,
        l_cursor: &mut Cursor,
        r_cursor: &mut Cursor,
        l_layout: &AggregateTypeLayout,
        r_layout: &AggregateTypeLayout,
        l_index: u64,
        r_index: u64,
    ) -> Ordering {
        let (l_field, r_field) = match (l_layout.field(l_index), r_layout.field(r_index)) {
            (Ok(l), Ok(r)) => (l, r),
            (Err(err), _) | (_, Err(err)) => {
                debug!("degrading to positional comparison: {}", err);
                *l_cursor = None;
                *r_cursor = None;
                return l_index.cmp(&r_index);
            }
        };

        *l_cursor = Some(l_field.ty);
        *r_cursor = Some(r_field.ty);

        if self.options.field_identity_matching {
            if let (Some(l_name), Some(r_name)) = (&l_field.name, &r_field.name) {
                if l_name == r_name {
                    trace!("field `{}` matched by name ({} vs {})", l_name, l_index, r_index);
                    return Ordering::Equal;
                }

                if r_layout.field_by_name(l_name).is_some()
                    && l_layout.field_by_name(r_name).is_some()
                {
                    trace!("fields `{}` and `{}` are distinct in both modules", l_name, r_name);
                    return l_index.cmp(&r_index).then_with(|| l_name.cmp(r_name));
                }
            }
        }

        trace!("positional comparison of fields {} and {}", l_index, r_index);
        l_index
            .cmp(&r_index)
            .then_with(|| self.engine.cmp_types(l_field.ty, r_field.ty))
    }

    /// Whether `indices` (starting at chain position `position`) leave the
    /// address unchanged: each must be a constant zero, selecting element 0
    /// of an array or the first field of a structure.
    fn is_address_preserving(
        layout_of: impl Fn(Typeref) -> LayoutResult<AggregateTypeLayout>,
        mut cursor: Cursor,
        position: usize,
        indices: &[Operand],
    ) -> bool {
        for (offset, index) in indices.iter().enumerate() {
            if !index.as_const().is_some_and(|c| c.is_zero()) {
                return false;
            }
            if position + offset == 0 {
                continue;
            }

            let field = cursor
                .ok_or(())
                .and_then(|ty| layout_of(ty).map_err(|_| ()))
                .and_then(|layout| layout.field(0).map_err(|_| ()));
            match field {
                Ok(field) if field.offset == 0 => cursor = Some(field.ty),
                _ => return false,
            }
        }
        true
    }
}

fn struct_name(registry: &TypeRegistry, ty: Typeref) -> Option<String> {
    registry.get(ty).and_then(|ty| match &*ty {
        AnyType::Struct(s) => s.name.clone(),
        _ => None,
    })
}
