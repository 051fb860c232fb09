//! Per-pair comparison context.
//!
//! Nothing is shared by identity between two independently compiled modules:
//! each side has its own type registry and its own SSA numbering. A
//! [`ComparisonContext`] is created for one (left function, right function)
//! pair and carries both registries together with the oracle that decides
//! whether two local values correspond.
use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use hyinstr::{
    modules::{Name, Operand},
    types::{TypeRegistry, Typeref, cmp_types, layout::AggregateTypeLayout},
};
use parking_lot::Mutex;

/// Decides how two values, one from each function, are ordered.
///
/// The oracle is the general value-comparison facility of the surrounding
/// engine. The core comparators only call it for operands they do not
/// interpret structurally (dynamic indices).
pub trait ValueOracle {
    fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering;
}

impl<F> ValueOracle for F
where
    F: Fn(&Operand, &Operand) -> Ordering,
{
    fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering {
        self(left, right)
    }
}

/// Numbering of module-level symbols shared by both sides of every compared pair.
///
/// Two globals are considered the same when they carry the same symbol name;
/// the number only provides a stable order.
#[derive(Debug, Default)]
pub struct GlobalNumberState {
    numbers: Mutex<BTreeMap<String, u64>>,
}

impl GlobalNumberState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `symbol`, allocating the next free number on first sight.
    pub fn number_of(&self, symbol: &str) -> u64 {
        let mut numbers = self.numbers.lock();
        if let Some(number) = numbers.get(symbol) {
            return *number;
        }
        let number = numbers.len() as u64;
        numbers.insert(symbol.to_string(), number);
        number
    }

    pub fn len(&self) -> usize {
        self.numbers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.numbers.lock().clear();
    }
}

#[derive(Debug, Default)]
struct SerialMaps {
    left: BTreeMap<Name, usize>,
    right: BTreeMap<Name, usize>,
}

/// Default [`ValueOracle`]: local values are numbered in the order in which
/// they are first encountered on each side, and two locals correspond when
/// they received the same serial number.
///
/// Operands of different kinds are ordered `Imm < Global < Reg`. Immediates
/// compare by type, then value; globals by their [`GlobalNumberState`] number.
///
/// The numbering is stateful, so an oracle must serve exactly one pair and
/// one direction.
#[derive(Debug)]
pub struct SerialNumberOracle {
    globals: Arc<GlobalNumberState>,
    serials: Mutex<SerialMaps>,
}

impl SerialNumberOracle {
    pub fn new(globals: Arc<GlobalNumberState>) -> Self {
        Self {
            globals,
            serials: Mutex::default(),
        }
    }

    fn rank(operand: &Operand) -> u8 {
        match operand {
            Operand::Imm(_) => 0,
            Operand::Global(_) => 1,
            Operand::Reg(_) => 2,
        }
    }
}

impl ValueOracle for SerialNumberOracle {
    fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering {
        match (left, right) {
            (Operand::Imm(l), Operand::Imm(r)) => {
                l.ty.cmp(&r.ty).then_with(|| l.value.cmp(&r.value))
            }
            (Operand::Global(l), Operand::Global(r)) => {
                if l == r {
                    Ordering::Equal
                } else {
                    self.globals.number_of(l).cmp(&self.globals.number_of(r))
                }
            }
            (Operand::Reg(l), Operand::Reg(r)) => {
                let mut serials = self.serials.lock();
                let next = serials.left.len();
                let l_serial = *serials.left.entry(*l).or_insert(next);
                let next = serials.right.len();
                let r_serial = *serials.right.entry(*r).or_insert(next);
                l_serial.cmp(&r_serial)
            }
            (l, r) => Self::rank(l).cmp(&Self::rank(r)),
        }
    }
}

/// Everything the comparators need to know about one compared pair.
pub struct ComparisonContext<'a, O> {
    pub left: &'a TypeRegistry,
    pub right: &'a TypeRegistry,
    pub oracle: O,
}

impl<'a, O: ValueOracle> ComparisonContext<'a, O> {
    pub fn new(left: &'a TypeRegistry, right: &'a TypeRegistry, oracle: O) -> Self {
        Self {
            left,
            right,
            oracle,
        }
    }

    pub fn left_layout(&self, ty: Typeref) -> hyinstr::utils::Result<AggregateTypeLayout> {
        self.left.layout_of(ty)
    }

    pub fn right_layout(&self, ty: Typeref) -> hyinstr::utils::Result<AggregateTypeLayout> {
        self.right.layout_of(ty)
    }

    pub fn cmp_values(&self, left: &Operand, right: &Operand) -> Ordering {
        self.oracle.cmp_values(left, right)
    }

    /// Structural order of a left-module type against a right-module type.
    pub fn cmp_types(&self, left: Typeref, right: Typeref) -> Ordering {
        cmp_types(self.left, left, self.right, right)
    }
}

#[cfg(test)]
mod tests {
    use hyinstr::consts::IConst;

    use super::*;

    #[test]
    fn locals_are_matched_by_first_use() {
        let oracle = SerialNumberOracle::new(Arc::new(GlobalNumberState::new()));
        let (a, b) = (Operand::Reg(Name(7)), Operand::Reg(Name(42)));

        assert_eq!(oracle.cmp_values(&a, &b), Ordering::Equal);
        // %7 is now bound to %42, a fresh right value cannot match it
        assert_eq!(
            oracle.cmp_values(&a, &Operand::Reg(Name(3))),
            Ordering::Less
        );
        assert_eq!(oracle.cmp_values(&a, &b), Ordering::Equal);
    }

    #[test]
    fn operand_kinds_are_ranked() {
        let oracle = SerialNumberOracle::new(Arc::new(GlobalNumberState::new()));
        let imm = Operand::Imm(IConst::from(1u32));
        let global = Operand::Global("jiffies".to_string());
        let reg = Operand::Reg(Name(0));

        assert_eq!(oracle.cmp_values(&imm, &global), Ordering::Less);
        assert_eq!(oracle.cmp_values(&reg, &global), Ordering::Greater);
        assert_eq!(oracle.cmp_values(&global, &global), Ordering::Equal);
        assert_eq!(
            oracle.cmp_values(&imm, &Operand::Imm(IConst::from(1u64))),
            Ordering::Less,
            "immediates compare by type first"
        );
    }

    #[test]
    fn globals_are_numbered_once() {
        let state = GlobalNumberState::new();
        assert_eq!(state.number_of("a"), 0);
        assert_eq!(state.number_of("b"), 1);
        assert_eq!(state.number_of("a"), 0);
        assert_eq!(state.len(), 2);
        state.clear();
        assert!(state.is_empty());
    }
}
