//! Catalog of attributes without observable effect.
//!
//! A catalog is an immutable value: it is built once (from the builtin list,
//! optionally adjusted by configuration) before any comparison starts and is
//! then shared by reference between all comparisons, possibly on several
//! threads at once.
use std::collections::BTreeSet;

use enum_map::EnumMap;
use hyinstr::modules::attributes::{AttributeKey, AttributeKind, AttributeSet, AttributeValue};
use once_cell::sync::Lazy;

/// Attribute kinds that only steer the optimizer or code generation.
pub const BUILTIN_NON_SEMANTIC_KINDS: &[AttributeKind] = &[
    AttributeKind::AlwaysInline,
    AttributeKind::InlineHint,
    AttributeKind::NoInline,
    AttributeKind::OptimizeForSize,
    AttributeKind::MinSize,
    AttributeKind::OptimizeNone,
    AttributeKind::Cold,
    AttributeKind::Hot,
    AttributeKind::UWTable,
    AttributeKind::NoRedZone,
    AttributeKind::StackProtect,
    AttributeKind::StackProtectStrong,
    AttributeKind::StackProtectReq,
    AttributeKind::AlignStack,
    AttributeKind::NoMerge,
    AttributeKind::NoProfile,
    AttributeKind::NoCfCheck,
];

/// String attributes describing the compilation target or tuning.
pub const BUILTIN_NON_SEMANTIC_STRINGS: &[&str] = &[
    "frame-pointer",
    "min-legal-vector-width",
    "no-trapping-math",
    "stack-protector-buffer-size",
    "target-cpu",
    "target-features",
    "tune-cpu",
];

static BUILTIN: Lazy<NonSemanticCatalog> = Lazy::new(|| {
    NonSemanticCatalog::from_parts(
        BUILTIN_NON_SEMANTIC_KINDS.iter().copied(),
        BUILTIN_NON_SEMANTIC_STRINGS.iter().copied(),
    )
});

/// Set of attribute keys known never to affect runtime behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonSemanticCatalog {
    kinds: EnumMap<AttributeKind, bool>,
    string_keys: BTreeSet<String>,
}

impl NonSemanticCatalog {
    /// The process-wide builtin catalog.
    pub fn builtin() -> &'static NonSemanticCatalog {
        &BUILTIN
    }

    /// A catalog that filters nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_parts<'s>(
        kinds: impl IntoIterator<Item = AttributeKind>,
        string_keys: impl IntoIterator<Item = &'s str>,
    ) -> Self {
        let mut catalog = Self::empty();
        for kind in kinds {
            catalog.kinds[kind] = true;
        }
        catalog.string_keys = string_keys.into_iter().map(str::to_string).collect();
        catalog
    }

    pub fn with_kind(mut self, kind: AttributeKind) -> Self {
        self.kinds[kind] = true;
        self
    }

    /// Treat `kind` as semantic again.
    pub fn without_kind(mut self, kind: AttributeKind) -> Self {
        self.kinds[kind] = false;
        self
    }

    pub fn with_string_key(mut self, key: impl Into<String>) -> Self {
        self.string_keys.insert(key.into());
        self
    }

    pub fn contains_kind(&self, kind: AttributeKind) -> bool {
        self.kinds[kind]
    }

    pub fn is_non_semantic(&self, key: &AttributeKey) -> bool {
        match key {
            AttributeKey::Kind(kind) => self.kinds[*kind],
            AttributeKey::Custom(key) => self.string_keys.contains(key),
        }
    }

    /// Non-semantic kinds, in declaration order.
    pub fn kinds(&self) -> impl Iterator<Item = AttributeKind> + '_ {
        self.kinds
            .iter()
            .filter_map(|(kind, listed)| listed.then_some(kind))
    }

    pub fn string_keys(&self) -> impl Iterator<Item = &str> {
        self.string_keys.iter().map(String::as_str)
    }

    /// The entries of `set` that survive filtering, in canonical order.
    pub fn retain_semantic<'s>(
        &'s self,
        set: &'s AttributeSet,
    ) -> impl Iterator<Item = (&'s AttributeKey, &'s AttributeValue)> + 's {
        set.iter().filter(|(key, _)| !self.is_non_semantic(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_lists_hints_only() {
        let catalog = NonSemanticCatalog::builtin();
        assert!(catalog.contains_kind(AttributeKind::InlineHint));
        assert!(catalog.contains_kind(AttributeKind::OptimizeForSize));
        assert!(!catalog.contains_kind(AttributeKind::NoAlias));
        assert!(!catalog.contains_kind(AttributeKind::ByVal));
        assert!(catalog.is_non_semantic(&AttributeKey::Custom("target-cpu".into())));
        assert!(!catalog.is_non_semantic(&AttributeKey::Custom("no-builtins".into())));
        assert_eq!(catalog.kinds().count(), BUILTIN_NON_SEMANTIC_KINDS.len());
    }

    #[test]
    fn builtin_is_initialised_once() {
        assert!(std::ptr::eq(
            NonSemanticCatalog::builtin(),
            NonSemanticCatalog::builtin()
        ));
    }

    #[test]
    fn retain_semantic_drops_catalogued_entries() {
        let set = AttributeSet::new()
            .with(AttributeKind::InlineHint)
            .with(AttributeKind::NoAlias)
            .with_string("target-cpu", "x86-64");
        let kept: Vec<_> = NonSemanticCatalog::builtin()
            .retain_semantic(&set)
            .map(|(key, _)| key.name().to_string())
            .collect();
        assert_eq!(kept, vec!["noalias"]);

        let adjusted = NonSemanticCatalog::builtin()
            .clone()
            .without_kind(AttributeKind::InlineHint);
        assert_eq!(adjusted.retain_semantic(&set).count(), 2);
    }
}
