//! Comparator configuration.
//!
//! Configuration is read from TOML, every key is optional:
//!
//! ```toml
//! [comparator]
//! field_identity_matching = true
//! layout_reconciliation = true
//! compare_in_bounds = true
//!
//! [attributes]
//! use_builtin = true
//! non_semantic = ["nounwind"]
//! semantic = ["cold"]
//! ignored_string_attributes = ["probe-stack"]
//! ```
use std::{path::Path, str::FromStr};

use hyinstr::modules::attributes::AttributeKind;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::{BUILTIN_NON_SEMANTIC_KINDS, BUILTIN_NON_SEMANTIC_STRINGS, NonSemanticCatalog},
    utils::error::{DiffError, DiffResult},
};

/// Switches of the address-computation comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorOptions {
    /// Match struct fields by declared name before falling back to their position.
    pub field_identity_matching: bool,
    /// Accept trailing zero indices on the longer chain when they do not move the address.
    pub layout_reconciliation: bool,
    /// Distinguish `inbounds` from plain address computations.
    pub compare_in_bounds: bool,
}

impl Default for ComparatorOptions {
    fn default() -> Self {
        Self {
            field_identity_matching: true,
            layout_reconciliation: true,
            compare_in_bounds: true,
        }
    }
}

/// Adjustments of the non-semantic attribute catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeOptions {
    /// Start from the builtin catalog (otherwise from an empty one).
    pub use_builtin: bool,
    /// Additional attribute kinds to ignore.
    pub non_semantic: Vec<String>,
    /// Attribute kinds that must be compared even if the builtin catalog ignores them.
    pub semantic: Vec<String>,
    /// Additional string attributes to ignore.
    pub ignored_string_attributes: Vec<String>,
}

impl Default for AttributeOptions {
    fn default() -> Self {
        Self {
            use_builtin: true,
            non_semantic: Vec::new(),
            semantic: Vec::new(),
            ignored_string_attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub comparator: ComparatorOptions,
    pub attributes: AttributeOptions,
}

fn parse_kinds(names: &[String], key: &'static str) -> DiffResult<Vec<AttributeKind>> {
    names
        .iter()
        .map(|name| {
            AttributeKind::from_str(name).map_err(|_| DiffError::UnknownAttribute {
                name: name.clone(),
                key,
            })
        })
        .collect()
}

impl DiffConfig {
    pub fn from_toml_str(source: &str) -> DiffResult<Self> {
        Self::parse(source, "<inline>")
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> DiffResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source, &path.display().to_string())
    }

    fn parse(source: &str, file: &str) -> DiffResult<Self> {
        toml::from_str(source).map_err(|source| DiffError::ConfigParseError {
            source,
            file: file.to_string(),
        })
    }

    /// Build the catalog described by the `[attributes]` section.
    ///
    /// Kinds listed in `semantic` win over kinds listed in `non_semantic`.
    pub fn catalog(&self) -> DiffResult<NonSemanticCatalog> {
        let extra = parse_kinds(&self.attributes.non_semantic, "attributes.non_semantic")?;
        let semantic = parse_kinds(&self.attributes.semantic, "attributes.semantic")?;

        let mut catalog = if self.attributes.use_builtin {
            NonSemanticCatalog::from_parts(
                BUILTIN_NON_SEMANTIC_KINDS.iter().copied(),
                BUILTIN_NON_SEMANTIC_STRINGS.iter().copied(),
            )
        } else {
            NonSemanticCatalog::empty()
        };

        for kind in extra {
            catalog = catalog.with_kind(kind);
        }
        for key in &self.attributes.ignored_string_attributes {
            catalog = catalog.with_string_key(key.as_str());
        }
        for kind in semantic {
            catalog = catalog.without_kind(kind);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use hyinstr::modules::attributes::AttributeKey;

    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = DiffConfig::from_toml_str("").unwrap();
        assert_eq!(config, DiffConfig::default());
        assert!(config.comparator.field_identity_matching);
        assert_eq!(
            &config.catalog().unwrap(),
            NonSemanticCatalog::builtin()
        );
    }

    #[test]
    fn attribute_section_adjusts_catalog() {
        let config = DiffConfig::from_toml_str(
            r#"
            [comparator]
            layout_reconciliation = false

            [attributes]
            non_semantic = ["nounwind", "cold"]
            semantic = ["cold"]
            ignored_string_attributes = ["probe-stack"]
            "#,
        )
        .unwrap();

        assert!(!config.comparator.layout_reconciliation);
        assert!(config.comparator.compare_in_bounds);

        let catalog = config.catalog().unwrap();
        assert!(catalog.contains_kind(AttributeKind::NoUnwind));
        assert!(!catalog.contains_kind(AttributeKind::Cold));
        assert!(catalog.contains_kind(AttributeKind::InlineHint));
        assert!(catalog.is_non_semantic(&AttributeKey::Custom("probe-stack".into())));
    }

    #[test]
    fn without_builtin_only_listed_kinds_are_ignored() {
        let config = DiffConfig::from_toml_str(
            r#"
            [attributes]
            use_builtin = false
            non_semantic = ["inlinehint"]
            "#,
        )
        .unwrap();
        let catalog = config.catalog().unwrap();
        assert_eq!(catalog.kinds().collect::<Vec<_>>(), vec![AttributeKind::InlineHint]);
        assert_eq!(catalog.string_keys().count(), 0);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let config =
            DiffConfig::from_toml_str("[attributes]\nsemantic = [\"fast-please\"]").unwrap();
        match config.catalog() {
            Err(DiffError::UnknownAttribute { name, key }) => {
                assert_eq!(name, "fast-please");
                assert_eq!(key, "attributes.semantic");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_document_reports_file() {
        let err =
            DiffConfig::from_toml_str("[comparator]\ncompare_in_bounds = \"yes\"").unwrap_err();
        assert!(matches!(err, DiffError::ConfigParseError { ref file, .. } if file == "<inline>"));
        assert!(err.to_string().contains("<inline>"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DiffConfig::load("/nonexistent/hydiff.toml").unwrap_err();
        assert!(matches!(err, DiffError::IoError(_)));
    }
}
