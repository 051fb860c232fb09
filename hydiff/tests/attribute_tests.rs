use std::cmp::Ordering;

use hydiff::{
    AttributeEquivalenceComparator, BaselineComparator, ComparisonCache, ComparisonContext,
    DiffConfig, DiffError, DifferentialComparator, FunctionVerdict, NonSemanticCatalog,
    StructuralComparator,
};
use hyinstr::{
    modules::{
        Operand,
        attributes::{AttributeKind, AttributeList, AttributeSet, AttributeValue},
    },
    types::{
        TypeRegistry, Typeref,
        aggregate::{StructField, StructType},
        primary::IType,
    },
};

fn positional(_: &Operand, _: &Operand) -> Ordering {
    Ordering::Equal
}

fn point(reg: &TypeRegistry, wide: bool) -> Typeref {
    let coord = reg.search_or_insert(if wide { IType::I64 } else { IType::I32 }.into());
    reg.search_or_insert(
        StructType::named("point", [StructField::named("x", coord), StructField::named("y", coord)])
            .into(),
    )
}

#[test]
fn hint_only_difference_is_ignored() {
    let reg = TypeRegistry::new([0; 6]);
    let cmp = DifferentialComparator::new(
        ComparisonContext::new(&reg, &reg, positional),
        NonSemanticCatalog::builtin(),
    );

    let hinted = AttributeSet::new()
        .with(AttributeKind::InlineHint)
        .with(AttributeKind::NoAlias);
    let plain = AttributeSet::new().with(AttributeKind::NoAlias);
    assert_eq!(cmp.cmp_attribute_sets(&hinted, &plain), Ordering::Equal);

    let without_noalias = AttributeSet::new().with(AttributeKind::InlineHint);
    assert_ne!(cmp.cmp_attribute_sets(&hinted, &without_noalias), Ordering::Equal);
    assert_eq!(cmp.cmp_attribute_sets(&hinted, &without_noalias), Ordering::Greater);
}

#[test]
fn baseline_engine_sees_every_attribute() {
    let reg = TypeRegistry::new([0; 6]);
    let baseline = BaselineComparator::new(ComparisonContext::new(&reg, &reg, positional));
    let hinted = AttributeSet::new().with(AttributeKind::Cold);
    assert_eq!(
        baseline.cmp_attribute_sets(&hinted, &AttributeSet::new()),
        Ordering::Greater
    );
}

#[test]
fn attribute_lists_are_filtered_everywhere() {
    let reg = TypeRegistry::new([0; 6]);
    let cmp = DifferentialComparator::new(
        ComparisonContext::new(&reg, &reg, positional),
        NonSemanticCatalog::builtin(),
    );

    let left = AttributeList {
        function: AttributeSet::new()
            .with(AttributeKind::NoUnwind)
            .with(AttributeKind::UWTable)
            .with_string("target-cpu", "x86-64"),
        ret: AttributeSet::new().with(AttributeKind::NoUndef),
        params: vec![AttributeSet::new().with(AttributeKind::NoCapture)],
    };
    let right = AttributeList {
        function: AttributeSet::new()
            .with(AttributeKind::NoUnwind)
            .with(AttributeKind::OptimizeForSize)
            .with_string("target-cpu", "znver3"),
        ret: AttributeSet::new().with(AttributeKind::NoUndef),
        params: vec![AttributeSet::new().with(AttributeKind::NoCapture)],
    };
    assert_eq!(cmp.cmp_attribute_lists(&left, &right), Ordering::Equal);

    let mut fewer_params = right.clone();
    fewer_params.params.clear();
    assert_eq!(cmp.cmp_attribute_lists(&left, &fewer_params), Ordering::Greater);

    let mut nonnull_ret = right.clone();
    nonnull_ret.ret.insert(AttributeKind::NonNull, AttributeValue::Flag);
    assert_eq!(cmp.cmp_attribute_lists(&left, &nonnull_ret), Ordering::Less);
}

#[test]
fn type_payloads_are_compared_across_modules() {
    let left = TypeRegistry::new([1; 6]);
    let right = TypeRegistry::new([2; 6]);
    let cmp = DifferentialComparator::new(
        ComparisonContext::new(&left, &right, positional),
        NonSemanticCatalog::builtin(),
    );

    let byval = |ty| AttributeSet::new().with_value(AttributeKind::ByVal, AttributeValue::Type(ty));
    let l_point = point(&left, false);
    let r_point = point(&right, false);
    let r_wide = point(&right, true);

    assert_eq!(cmp.cmp_attribute_sets(&byval(l_point), &byval(r_point)), Ordering::Equal);
    assert_eq!(cmp.cmp_attribute_sets(&byval(l_point), &byval(r_wide)), Ordering::Less);
}

#[test]
fn custom_catalog_is_honoured() {
    let catalog = NonSemanticCatalog::empty().with_string_key("probe-stack");
    let cmp = AttributeEquivalenceComparator::new(&catalog);
    let left = AttributeSet::new()
        .with_string("probe-stack", "inline-asm")
        .with(AttributeKind::Cold);
    let right = AttributeSet::new().with(AttributeKind::Cold);
    let no_types = |_: Typeref, _: Typeref| Ordering::Equal;

    assert_eq!(cmp.compare(&left, &right, no_types), Ordering::Equal);
    assert_eq!(
        cmp.compare(&left, &AttributeSet::new(), no_types),
        Ordering::Greater,
        "the empty catalog keeps `cold`"
    );
}

#[test]
fn configuration_builds_catalog_and_options() {
    let config = DiffConfig::from_toml_str(
        r#"
        [comparator]
        layout_reconciliation = false

        [attributes]
        non_semantic = ["nounwind"]
        semantic = ["inlinehint"]
        ignored_string_attributes = ["probe-stack"]
        "#,
    )
    .expect("valid configuration");
    assert!(!config.comparator.layout_reconciliation);
    assert!(config.comparator.field_identity_matching);

    let catalog = config.catalog().expect("known attribute names");
    let reg = TypeRegistry::new([0; 6]);
    let cmp = DifferentialComparator::new(ComparisonContext::new(&reg, &reg, positional), &catalog)
        .with_options(config.comparator);
    assert!(!cmp.options().layout_reconciliation);

    let hinted = AttributeSet::new()
        .with(AttributeKind::InlineHint)
        .with(AttributeKind::NoUnwind)
        .with_string("probe-stack", "inline-asm");
    assert_eq!(
        cmp.cmp_attribute_sets(&hinted, &AttributeSet::new()),
        Ordering::Greater
    );
    assert_eq!(
        cmp.cmp_attribute_sets(
            &hinted,
            &AttributeSet::new().with(AttributeKind::InlineHint)
        ),
        Ordering::Equal
    );
}

#[test]
fn unknown_attribute_name_is_reported() {
    let config = DiffConfig::from_toml_str(
        r#"
        [attributes]
        non_semantic = ["definitely-not-an-attribute"]
        "#,
    )
    .expect("syntactically valid");

    match config.catalog() {
        Err(DiffError::UnknownAttribute { name, key }) => {
            assert_eq!(name, "definitely-not-an-attribute");
            assert_eq!(key, "attributes.non_semantic");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn malformed_configuration_is_a_parse_error() {
    let err = DiffConfig::from_toml_str("[comparator]\nlayout_reconciliation = 3")
        .expect_err("wrong value type");
    assert!(err.is_config_parse_error(), "{err}");
}

#[test]
fn builtin_catalog_is_shared_between_threads() {
    let reg = TypeRegistry::new([0; 6]);
    let hinted = AttributeSet::new()
        .with(AttributeKind::InlineHint)
        .with(AttributeKind::NoAlias);
    let plain = AttributeSet::new().with(AttributeKind::NoAlias);
    let cache = ComparisonCache::new();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let (reg, hinted, plain, cache) = (&reg, &hinted, &plain, &cache);
            scope.spawn(move || {
                let cmp = DifferentialComparator::new(
                    ComparisonContext::new(reg, reg, positional),
                    NonSemanticCatalog::builtin(),
                );
                for _ in 0..100 {
                    assert_eq!(cmp.cmp_attribute_sets(hinted, plain), Ordering::Equal);
                }
                let name = format!("f{}", worker % 4);
                cache.get_or_compare(&name, &name, || cmp.cmp_attribute_sets(hinted, plain));
            });
        }
    });

    assert_eq!(cache.len(), 4);
    assert!(
        cache
            .results()
            .iter()
            .all(|result| result.verdict == FunctionVerdict::Equal)
    );
    assert_eq!(cache.equal_pairs().len(), 4);
}
