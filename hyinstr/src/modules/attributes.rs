//! Attributes
//!
//! Attributes are annotations attached to a function, a call site, a return
//! value or a parameter. Some change the meaning of the program (`noalias`,
//! `byval`, `zeroext`, ...), others only steer code generation or the
//! optimizer (`inlinehint`, `optsize`, ...). This module only models them;
//! deciding which ones matter is the job of the comparator.
use std::{cmp::Ordering, collections::BTreeMap};

use enum_map::Enum;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::types::Typeref;

/// Well-known attribute kinds, named after their textual IR spelling.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Enum,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeKind {
    // Optimizer and code generation hints
    #[strum(serialize = "alwaysinline")]
    AlwaysInline,
    #[strum(serialize = "inlinehint")]
    InlineHint,
    #[strum(serialize = "noinline")]
    NoInline,
    #[strum(serialize = "optsize")]
    OptimizeForSize,
    #[strum(serialize = "minsize")]
    MinSize,
    #[strum(serialize = "optnone")]
    OptimizeNone,
    #[strum(serialize = "cold")]
    Cold,
    #[strum(serialize = "hot")]
    Hot,
    #[strum(serialize = "uwtable")]
    UWTable,
    #[strum(serialize = "noredzone")]
    NoRedZone,
    #[strum(serialize = "ssp")]
    StackProtect,
    #[strum(serialize = "sspstrong")]
    StackProtectStrong,
    #[strum(serialize = "sspreq")]
    StackProtectReq,
    #[strum(serialize = "alignstack")]
    AlignStack,
    #[strum(serialize = "nomerge")]
    NoMerge,
    #[strum(serialize = "noprofile")]
    NoProfile,
    #[strum(serialize = "nocf_check")]
    NoCfCheck,

    // Function behaviour
    #[strum(serialize = "nounwind")]
    NoUnwind,
    #[strum(serialize = "noreturn")]
    NoReturn,
    #[strum(serialize = "willreturn")]
    WillReturn,
    #[strum(serialize = "mustprogress")]
    MustProgress,
    #[strum(serialize = "norecurse")]
    NoRecurse,
    #[strum(serialize = "nofree")]
    NoFree,
    #[strum(serialize = "nosync")]
    NoSync,
    #[strum(serialize = "readnone")]
    ReadNone,
    #[strum(serialize = "readonly")]
    ReadOnly,
    #[strum(serialize = "writeonly")]
    WriteOnly,
    #[strum(serialize = "convergent")]
    Convergent,
    #[strum(serialize = "speculatable")]
    Speculatable,
    #[strum(serialize = "naked")]
    Naked,
    #[strum(serialize = "nobuiltin")]
    NoBuiltin,
    #[strum(serialize = "null_pointer_is_valid")]
    NullPointerIsValid,

    // Parameter and return value
    #[strum(serialize = "noalias")]
    NoAlias,
    #[strum(serialize = "nocapture")]
    NoCapture,
    #[strum(serialize = "nonnull")]
    NonNull,
    #[strum(serialize = "noundef")]
    NoUndef,
    #[strum(serialize = "dereferenceable")]
    Dereferenceable,
    #[strum(serialize = "align")]
    Align,
    #[strum(serialize = "zeroext")]
    ZExt,
    #[strum(serialize = "signext")]
    SExt,
    #[strum(serialize = "inreg")]
    InReg,
    #[strum(serialize = "byval")]
    ByVal,
    #[strum(serialize = "sret")]
    StructRet,
    #[strum(serialize = "returned")]
    Returned,
}

impl AttributeKind {
    /// Textual IR spelling of the attribute.
    pub fn name(&self) -> &'static str {
        self.into()
    }
}

/// Key of an attribute: either a well-known kind or a free-form string
/// attribute (`"frame-pointer"="all"`).
///
/// Keys are ordered by their textual name so that iteration over an
/// [`AttributeSet`] is canonical; on equal names well-known kinds come first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeKey {
    Kind(AttributeKind),
    Custom(String),
}

impl AttributeKey {
    pub fn name(&self) -> &str {
        match self {
            AttributeKey::Kind(kind) => kind.name(),
            AttributeKey::Custom(key) => key,
        }
    }
}

impl Ord for AttributeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name().cmp(other.name()).then_with(|| {
            matches!(self, AttributeKey::Custom(_)).cmp(&matches!(other, AttributeKey::Custom(_)))
        })
    }
}

impl PartialOrd for AttributeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<AttributeKind> for AttributeKey {
    fn from(value: AttributeKind) -> Self {
        AttributeKey::Kind(value)
    }
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeKey::Kind(kind) => write!(f, "{}", kind),
            AttributeKey::Custom(key) => write!(f, "{:?}", key),
        }
    }
}

/// Payload attached to an attribute.
///
/// `Type` payloads (as in `byval(%struct.S)`) hold a module-local typeref.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    Flag,
    Int(u64),
    Type(Typeref),
    Str(String),
}

impl AttributeValue {
    /// Rank of the variant, used to order payloads of different shapes.
    pub fn rank(&self) -> u8 {
        match self {
            AttributeValue::Flag => 0,
            AttributeValue::Int(_) => 1,
            AttributeValue::Type(_) => 2,
            AttributeValue::Str(_) => 3,
        }
    }
}

/// An unordered collection of attributes, keyed by [`AttributeKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeSet {
    entries: BTreeMap<AttributeKey, AttributeValue>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flag attribute, builder style.
    pub fn with(mut self, kind: AttributeKind) -> Self {
        self.insert(kind, AttributeValue::Flag);
        self
    }

    /// Add an attribute carrying a payload, builder style.
    pub fn with_value(mut self, kind: AttributeKind, value: AttributeValue) -> Self {
        self.insert(kind, value);
        self
    }

    /// Add a string attribute, builder style.
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(
            AttributeKey::Custom(key.into()),
            AttributeValue::Str(value.into()),
        );
        self
    }

    /// Insert (or replace) an attribute, returning the previous payload.
    pub fn insert(
        &mut self,
        key: impl Into<AttributeKey>,
        value: AttributeValue,
    ) -> Option<AttributeValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &AttributeKey) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    pub fn contains_kind(&self, kind: AttributeKind) -> bool {
        self.entries.contains_key(&AttributeKey::Kind(kind))
    }

    /// Iterate in canonical (name) order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeKey, &AttributeValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<AttributeKind> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = AttributeKind>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|kind| (AttributeKey::Kind(kind), AttributeValue::Flag))
                .collect(),
        }
    }
}

impl FromIterator<(AttributeKey, AttributeValue)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (AttributeKey, AttributeValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl std::fmt::Display for AttributeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match value {
                AttributeValue::Flag => write!(f, "{}", key)?,
                AttributeValue::Int(v) => write!(f, "{}({})", key, v)?,
                AttributeValue::Type(ty) => write!(f, "{}(<{}>)", key, ty)?,
                AttributeValue::Str(s) => write!(f, "{}={:?}", key, s)?,
            }
        }
        Ok(())
    }
}

/// All attribute sets of one function declaration or call site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttributeList {
    pub function: AttributeSet,
    pub ret: AttributeSet,
    pub params: Vec<AttributeSet>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn kind_names_roundtrip_through_from_str() {
        for kind in AttributeKind::iter() {
            assert_eq!(AttributeKind::from_str(kind.name()), Ok(kind));
        }
        assert!(AttributeKind::from_str("not-an-attribute").is_err());
    }

    #[test]
    fn iteration_is_ordered_by_name() {
        let set = AttributeSet::new()
            .with(AttributeKind::NoUnwind)
            .with(AttributeKind::Cold)
            .with_string("frame-pointer", "all")
            .with_value(AttributeKind::Align, AttributeValue::Int(8));

        let names: Vec<_> = set.iter().map(|(key, _)| key.name().to_string()).collect();
        assert_eq!(names, vec!["align", "cold", "frame-pointer", "nounwind"]);
        assert_eq!(
            set.to_string(),
            "align(8) cold \"frame-pointer\"=\"all\" nounwind"
        );
    }

    #[test]
    fn custom_key_sorts_after_kind_with_same_name() {
        let kind = AttributeKey::Kind(AttributeKind::Cold);
        let custom = AttributeKey::Custom("cold".to_string());
        assert_eq!(kind.cmp(&custom), Ordering::Less);
        assert_eq!(custom.cmp(&kind), Ordering::Greater);
    }
}
