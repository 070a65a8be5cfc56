use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::entry::Entry;
use crate::extractor::{Extractor, ExtractorObj, FieldExtractor, Target};
use crate::filter::leaf::{Equals, Greater};
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;
use crate::index::simple::{IndexConfig, SimpleMapIndex};

type Person = (String, i32);

fn age_extractor() -> Arc<FieldExtractor<Person, i32, fn(&Person) -> Option<i32>>> {
    Arc::new(FieldExtractor::new("field:age", Target::Value, (|p: &Person| Some(p.1)) as fn(&Person) -> Option<i32>))
}

fn seed_age_index(people: &[(u64, Person)]) -> (IndexRegistry<u64, Person>, Arc<dyn Extractor<Person, i32>>) {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let mut registry: IndexRegistry<u64, Person> = IndexRegistry::new();
    let config = IndexConfig { ordered: true, ..IndexConfig::default() };
    let mut index: SimpleMapIndex<u64, Person, i32> = SimpleMapIndex::new(extractor.clone(), config);
    for (k, v) in people {
        index.insert(&Entry::new(*k, v.clone())).unwrap();
    }
    let handle = index.extractor_handle();
    registry.insert_index(handle, Box::new(index));
    (registry, extractor)
}

#[test]
fn test_all_conjunction_resolves_fully_with_indexes() {
    let people = vec![
        (1u64, ("a".to_string(), 20)),
        (2, ("b".to_string(), 30)),
        (3, ("c".to_string(), 40)),
    ];
    let (registry, extractor) = seed_age_index(&people);
    let all = All::and(
        Box::new(Greater::new(extractor.clone(), 15)),
        Box::new(Equals::new(extractor, 30)),
    );
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = all.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [2].into_iter().collect());
}

#[test]
fn test_all_evaluate_short_circuits_on_first_false() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let all = All::and(
        Box::new(Equals::new(extractor.clone(), 30)),
        Box::new(Greater::new(extractor, 100)),
    );
    assert!(!all.evaluate(&("a".to_string(), 30)));
}

#[test]
fn test_any_disjunction_unions_index_paths() {
    let people = vec![
        (1u64, ("a".to_string(), 10)),
        (2, ("b".to_string(), 20)),
        (3, ("c".to_string(), 30)),
    ];
    let (registry, extractor) = seed_age_index(&people);
    let any = Any::or(
        Box::new(Equals::new(extractor.clone(), 10)),
        Box::new(Equals::new(extractor, 30)),
    );
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = any.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1, 3].into_iter().collect());
}

#[test]
fn test_any_evaluate_is_true_if_either_matches() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let any = Any::or(
        Box::new(Equals::new(extractor.clone(), 10)),
        Box::new(Equals::new(extractor, 30)),
    );
    assert!(any.evaluate(&("x".to_string(), 30)));
    assert!(!any.evaluate(&("x".to_string(), 99)));
}

#[test]
fn test_not_inverts_full_resolution() {
    let people = vec![
        (1u64, ("a".to_string(), 10)),
        (2, ("b".to_string(), 30)),
        (3, ("c".to_string(), 30)),
    ];
    let (registry, extractor) = seed_age_index(&people);
    let not = Not::new(Box::new(Equals::new(extractor, 30)));
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = not.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1].into_iter().collect());
}

#[test]
fn test_any_disjunction_mixes_index_resolved_and_residual_children() {
    type Row = (String, i32, i32);
    let rows = vec![
        (1u64, ("a".to_string(), 30, 50_000)),  // matches via indexed age==30
        (2u64, ("b".to_string(), 25, 200_000)), // matches via unindexed salary>100000
        (3u64, ("c".to_string(), 25, 1_000)),   // matches neither
    ];
    let age_extractor: Arc<dyn Extractor<Row, i32>> =
        Arc::new(FieldExtractor::new("field:age", Target::Value, (|p: &Row| Some(p.1)) as fn(&Row) -> Option<i32>));
    let salary_extractor: Arc<dyn Extractor<Row, i32>> = Arc::new(FieldExtractor::new(
        "field:salary",
        Target::Value,
        (|p: &Row| Some(p.2)) as fn(&Row) -> Option<i32>,
    ));

    let mut registry: IndexRegistry<u64, Row> = IndexRegistry::new();
    let mut index: SimpleMapIndex<u64, Row, i32> = SimpleMapIndex::new(age_extractor.clone(), IndexConfig::default());
    for (k, v) in &rows {
        index.insert(&Entry::new(*k, v.clone())).unwrap();
    }
    registry.insert_index(index.extractor_handle(), Box::new(index));

    let any = Any::or(Box::new(Equals::new(age_extractor, 30)), Box::new(Greater::new(salary_extractor, 100_000)));
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = any.apply_index(&registry, &mut keys).unwrap().expect("salary clause is unindexed");
    assert_eq!(keys, [1, 2, 3].into_iter().collect());

    for (k, v) in &rows {
        let entry = Entry::new(*k, v.clone());
        let expect = *k == 1 || *k == 2;
        assert_eq!(residual.evaluate_entry(&entry).unwrap(), expect, "key {k}");
    }
}

#[test]
fn test_not_partial_resolution_keeps_index_confirmed_complement_matches() {
    type Row = (String, i32); // (category, score)
    let rows = vec![
        (1u64, ("A".to_string(), 3)),  // inner fails (score <= 5): Not matches
        (2u64, ("A".to_string(), 10)), // inner matches: Not doesn't
        (3u64, ("B".to_string(), 3)),  // inner fails via indexed clause alone: Not matches
        (4u64, ("B".to_string(), 10)), // inner fails via indexed clause alone: Not matches
    ];
    let category_extractor: Arc<dyn Extractor<Row, String>> = Arc::new(FieldExtractor::new(
        "field:category",
        Target::Value,
        (|p: &Row| Some(p.0.clone())) as fn(&Row) -> Option<String>,
    ));
    let score_extractor: Arc<dyn Extractor<Row, i32>> =
        Arc::new(FieldExtractor::new("field:score", Target::Value, (|p: &Row| Some(p.1)) as fn(&Row) -> Option<i32>));

    let mut registry: IndexRegistry<u64, Row> = IndexRegistry::new();
    let mut index: SimpleMapIndex<u64, Row, String> =
        SimpleMapIndex::new(category_extractor.clone(), IndexConfig::default());
    for (k, v) in &rows {
        index.insert(&Entry::new(*k, v.clone())).unwrap();
    }
    registry.insert_index(index.extractor_handle(), Box::new(index));

    let inner = All::and(
        Box::new(Equals::new(category_extractor, "A".to_string())),
        Box::new(Greater::new(score_extractor, 5)),
    );
    let not = Not::new(Box::new(inner));
    let mut keys: BTreeSet<u64> = [1, 2, 3, 4].into_iter().collect();
    let residual = not.apply_index(&registry, &mut keys).unwrap().expect("score clause is unindexed");
    // No key gets dropped at the apply_index stage: both the
    // index-confirmed complements and the still-undecided candidates
    // must survive into the residual evaluation.
    assert_eq!(keys, [1, 2, 3, 4].into_iter().collect());

    for (k, v) in &rows {
        let entry = Entry::new(*k, v.clone());
        let expect = *k != 2;
        assert_eq!(residual.evaluate_entry(&entry).unwrap(), expect, "key {k}");
    }
}

#[test]
fn test_not_evaluate_is_pure_complement() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let not = Not::new(Box::new(Equals::new(extractor, 30)));
    assert!(!not.evaluate(&("a".to_string(), 30)));
    assert!(not.evaluate(&("a".to_string(), 31)));
}

#[test]
fn test_xor_has_no_index_path() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let xor = Xor::new(Box::new(Equals::new(extractor.clone(), 10)), Box::new(Equals::new(extractor, 30)));
    let registry: IndexRegistry<u64, Person> = IndexRegistry::new();
    let mut keys: BTreeSet<u64> = [1, 2].into_iter().collect();
    // default apply_index is the identity: no narrowing, residual is self
    let residual = xor.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_some());
    assert_eq!(keys, [1, 2].into_iter().collect());
}

#[test]
fn test_xor_evaluate_is_exclusive_or() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let xor = Xor::new(Box::new(Equals::new(extractor.clone(), 10)), Box::new(Equals::new(extractor, 30)));
    assert!(xor.evaluate(&("a".to_string(), 10))); // left true, right false
    assert!(!xor.evaluate(&("a".to_string(), 99))); // both false
}
