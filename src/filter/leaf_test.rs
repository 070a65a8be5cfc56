use std::collections::BTreeSet;
use std::sync::Arc;

use super::*;
use crate::entry::Entry;
use crate::extractor::{Extractor, FieldExtractor, Target};
use crate::filter::Filter;
use crate::index::registry::IndexRegistry;
use crate::index::simple::{IndexConfig, SimpleMapIndex};

type Person = (String, i32);

fn age_extractor() -> Arc<FieldExtractor<Person, i32, fn(&Person) -> Option<i32>>> {
    Arc::new(FieldExtractor::new("field:age", Target::Value, (|p: &Person| Some(p.1)) as fn(&Person) -> Option<i32>))
}

fn tags_extractor() -> Arc<FieldExtractor<(String, BTreeSet<String>), BTreeSet<String>, fn(&(String, BTreeSet<String>)) -> Option<BTreeSet<String>>>>
{
    Arc::new(FieldExtractor::new(
        "field:tags",
        Target::Value,
        (|v: &(String, BTreeSet<String>)| Some(v.1.clone())) as fn(&(String, BTreeSet<String>)) -> Option<BTreeSet<String>>,
    ))
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
fn test_equals_uses_index_when_present() {
    let people = vec![(1u64, ("a".to_string(), 30)), (2, ("b".to_string(), 40)), (3, ("c".to_string(), 30))];
    let (registry, extractor) = seed_age_index(&people);
    let filter = Equals::new(extractor, 30);
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1, 3].into_iter().collect());
}

#[test]
fn test_equals_falls_back_without_index() {
    let extractor: Arc<dyn Extractor<Person, i32>> = age_extractor();
    let registry: IndexRegistry<u64, Person> = IndexRegistry::new();
    let filter = Equals::new(extractor, 30);
    let mut keys: BTreeSet<u64> = [1, 2].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_some());
    assert_eq!(keys, [1, 2].into_iter().collect());
}

#[test]
fn test_not_equals_subtracts_posting() {
    let people = vec![(1u64, ("a".to_string(), 30)), (2, ("b".to_string(), 40))];
    let (registry, extractor) = seed_age_index(&people);
    let filter = NotEquals::new(extractor, 30);
    let mut keys: BTreeSet<u64> = [1, 2].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [2].into_iter().collect());
}

#[test]
fn test_greater_uses_ordered_range() {
    let people = vec![(1u64, ("a".to_string(), 20)), (2, ("b".to_string(), 30)), (3, ("c".to_string(), 40))];
    let (registry, extractor) = seed_age_index(&people);
    let filter = Greater::new(extractor, 25);
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [2, 3].into_iter().collect());
}

#[test]
fn test_less_equals_uses_ordered_range() {
    let people = vec![(1u64, ("a".to_string(), 20)), (2, ("b".to_string(), 30)), (3, ("c".to_string(), 40))];
    let (registry, extractor) = seed_age_index(&people);
    let filter = LessEquals::new(extractor, 30);
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1, 2].into_iter().collect());
}

#[test]
fn test_between_uses_single_range_walk() {
    let people = vec![
        (1u64, ("a".to_string(), 10)),
        (2, ("b".to_string(), 20)),
        (3, ("c".to_string(), 30)),
        (4, ("d".to_string(), 40)),
    ];
    let (registry, extractor) = seed_age_index(&people);
    let filter = Between::new(extractor, 15, true, 35, true);
    let mut keys: BTreeSet<u64> = [1, 2, 3, 4].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [2, 3].into_iter().collect());
}

#[test]
fn test_in_unions_postings() {
    let people = vec![(1u64, ("a".to_string(), 10)), (2, ("b".to_string(), 20)), (3, ("c".to_string(), 30))];
    let (registry, extractor) = seed_age_index(&people);
    let filter = In::new(extractor, vec![10, 30]);
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1, 3].into_iter().collect());
}

fn seed_tags_index(
    people: &[(u64, (String, BTreeSet<String>))],
) -> (IndexRegistry<u64, (String, BTreeSet<String>)>, Arc<dyn Extractor<(String, BTreeSet<String>), BTreeSet<String>>>) {
    let extractor = tags_extractor();
    let mut registry: IndexRegistry<u64, (String, BTreeSet<String>)> = IndexRegistry::new();
    let mut index: SimpleMapIndex<u64, (String, BTreeSet<String>), String> = SimpleMapIndex::new_split(
        extractor.clone(),
        IndexConfig { multiplicity: crate::index::simple::Multiplicity::Split, ..IndexConfig::default() },
    );
    for (k, v) in people {
        index.insert(&Entry::new(*k, v.clone())).unwrap();
    }
    let handle = index.extractor_handle();
    let extractor: Arc<dyn Extractor<(String, BTreeSet<String>), BTreeSet<String>>> = extractor;
    registry.insert_index(handle, Box::new(index));
    (registry, extractor)
}

#[test]
fn test_contains_intersects_single_posting() {
    let mut a_tags = BTreeSet::new();
    a_tags.insert("rust".to_string());
    a_tags.insert("db".to_string());
    let mut b_tags = BTreeSet::new();
    b_tags.insert("db".to_string());
    let people = vec![(1u64, ("a".to_string(), a_tags)), (2, ("b".to_string(), b_tags))];
    let (registry, extractor) = seed_tags_index(&people);
    let filter = Contains::new(extractor, "rust".to_string());
    let mut keys: BTreeSet<u64> = [1, 2].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1].into_iter().collect());
}

#[test]
fn test_key_filter_retains_given_keys() {
    let registry: IndexRegistry<u64, Person> = IndexRegistry::new();
    let filter: Key<u64> = Key::new([2u64, 3].into_iter().collect());
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = crate::filter::Filter::<u64, Person>::apply_index(&filter, &registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [2, 3].into_iter().collect());
}

#[test]
fn test_in_key_set_restricts_then_delegates() {
    let people = vec![(1u64, ("a".to_string(), 30)), (2, ("b".to_string(), 40)), (3, ("c".to_string(), 30))];
    let (registry, extractor) = seed_age_index(&people);
    let inner: Box<dyn Filter<u64, Person>> = Box::new(Equals::new(extractor, 30));
    let filter = InKeySet::new(inner, [1u64, 2].into_iter().collect());
    let mut keys: BTreeSet<u64> = [1, 2, 3].into_iter().collect();
    let residual = filter.apply_index(&registry, &mut keys).unwrap();
    assert!(residual.is_none());
    assert_eq!(keys, [1].into_iter().collect());
}
