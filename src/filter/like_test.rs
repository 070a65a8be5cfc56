use std::sync::Arc;

use super::*;
use crate::extractor::{Extractor, ExtractorObj, Target};
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;

struct Name;

impl ExtractorObj for Name {
    fn name(&self) -> &str {
        "field:name"
    }
    fn target(&self) -> Target {
        Target::Value
    }
}

impl Extractor<String, String> for Name {
    fn extract(&self, value: &String) -> Option<String> {
        Some(value.clone())
    }
}

fn like(pattern: &str, ignore_case: bool) -> Like<u64, String> {
    let extractor: Arc<dyn Extractor<String, String>> = Arc::new(Name);
    Like::new(extractor, pattern, Some('\\'), ignore_case)
}

#[test]
fn test_leading_and_trailing_percent_is_contains() {
    let f = like("%ana%", false);
    assert!(f.evaluate(&"banana".to_string()));
    assert!(f.evaluate(&"ana".to_string()));
    assert!(!f.evaluate(&"banan".to_string()));
}

#[test]
fn test_leading_percent_is_suffix_match() {
    let f = like("%son", false);
    assert!(f.evaluate(&"johnson".to_string()));
    assert!(!f.evaluate(&"sonny".to_string()));
}

#[test]
fn test_trailing_percent_is_prefix_match() {
    let f = like("john%", false);
    assert!(f.evaluate(&"johnson".to_string()));
    assert!(!f.evaluate(&"bjohn".to_string()));
}

#[test]
fn test_underscore_matches_exactly_one_char() {
    let f = like("j_hn", false);
    assert!(f.evaluate(&"john".to_string()));
    assert!(!f.evaluate(&"jhn".to_string()));
    assert!(!f.evaluate(&"joohn".to_string()));
}

#[test]
fn test_middle_percent_matches_gap() {
    let f = like("a%z", false);
    assert!(f.evaluate(&"az".to_string()));
    assert!(f.evaluate(&"abcz".to_string()));
    assert!(!f.evaluate(&"zza".to_string()));
}

#[test]
fn test_whole_literal_no_wildcard_is_exact_match() {
    let f = like("exact", false);
    assert!(f.evaluate(&"exact".to_string()));
    assert!(!f.evaluate(&"exactly".to_string()));
    assert!(!f.evaluate(&"exac".to_string()));
}

#[test]
fn test_ignore_case() {
    let f = like("John%", true);
    assert!(f.evaluate(&"johnson".to_string()));
    assert!(f.evaluate(&"JOHNSON".to_string()));
}

#[test]
fn test_escape_literalizes_wildcard() {
    let f = like("100\\%", false);
    assert!(f.evaluate(&"100%".to_string()));
    assert!(!f.evaluate(&"100x".to_string()));
}

#[test]
fn test_literal_pattern_degrades_to_equals_index_path() {
    let extractor: Arc<dyn Extractor<String, String>> = Arc::new(Name);
    let registry: IndexRegistry<u64, String> = IndexRegistry::new();
    let f = Like::new(extractor, "exact", None, false);
    let mut keys: std::collections::BTreeSet<u64> = [1, 2].into_iter().collect();
    // no index registered: Equals::apply_index falls back to a residual
    let residual = f.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_some());
}

#[test]
fn test_wildcard_pattern_has_no_index_path() {
    let extractor: Arc<dyn Extractor<String, String>> = Arc::new(Name);
    let registry: IndexRegistry<u64, String> = IndexRegistry::new();
    let f = Like::new(extractor, "a%b", None, false);
    let mut keys: std::collections::BTreeSet<u64> = [1, 2].into_iter().collect();
    let residual = f.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_some());
    assert_eq!(keys, [1, 2].into_iter().collect());
}
