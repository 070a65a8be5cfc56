use std::sync::Arc;

use super::*;
use crate::comparator::NaturalOrder;
use crate::extractor::{Extractor, FieldExtractor, Target};
use crate::filter::{Equals, Greater};

type Person = (String, i32);

fn age_extractor() -> Arc<dyn Extractor<Person, i32>> {
    Arc::new(FieldExtractor::new("field:age", Target::Value, (|p: &Person| Some(p.1)) as fn(&Person) -> Option<i32>))
}

fn seeded_map() -> DataMap<u64, Person> {
    let mut map: DataMap<u64, Person> = DataMap::new();
    map.put(1, ("alice".to_string(), 30)).unwrap();
    map.put(2, ("bob".to_string(), 40)).unwrap();
    map.put(3, ("carol".to_string(), 20)).unwrap();
    map
}

#[test]
fn test_put_insert_then_update_keeps_index_consistent() {
    let mut map: DataMap<u64, Person> = DataMap::new();
    map.add_index(age_extractor(), IndexConfig { ordered: true, ..IndexConfig::default() }).unwrap();
    map.put(1, ("alice".to_string(), 30)).unwrap();
    map.put(1, ("alice".to_string(), 31)).unwrap(); // update path

    let filter = Equals::new(age_extractor(), 31);
    let matched = map.key_set(&filter).unwrap();
    assert_eq!(matched, [1u64].into_iter().collect());

    let filter = Equals::new(age_extractor(), 30);
    let matched = map.key_set(&filter).unwrap();
    assert!(matched.is_empty());
}

#[test]
fn test_delete_retracts_key_from_index() {
    let mut map = seeded_map();
    map.add_index(age_extractor(), IndexConfig::default()).unwrap();
    let removed = map.delete(&2u64).unwrap();
    assert_eq!(removed, Some(("bob".to_string(), 40)));
    assert!(!map.contains_key(&2));

    let filter = Equals::new(age_extractor(), 40);
    let matched = map.key_set(&filter).unwrap();
    assert!(matched.is_empty());
}

#[test]
fn test_add_index_is_idempotent_identity_but_rejects_duplicate() {
    let mut map = seeded_map();
    map.add_index(age_extractor(), IndexConfig::default()).unwrap();
    let err = map.add_index(age_extractor(), IndexConfig::default());
    assert!(err.is_err());
}

#[test]
fn test_remove_index_drops_the_index_path() {
    let mut map = seeded_map();
    map.add_index(age_extractor(), IndexConfig::default()).unwrap();
    let handle = ExtractorHandle::new("field:age", Target::Value);
    assert!(map.remove_index(&handle));
    assert!(!map.remove_index(&handle)); // already gone
}

#[test]
fn test_key_set_uses_index_path_when_registered() {
    let mut map = seeded_map();
    map.add_index(age_extractor(), IndexConfig { ordered: true, ..IndexConfig::default() }).unwrap();
    let filter = Greater::new(age_extractor(), 25);
    let matched = map.key_set(&filter).unwrap();
    assert_eq!(matched, [1u64, 2].into_iter().collect());
}

#[test]
fn test_key_set_falls_back_to_full_scan_without_index() {
    let map = seeded_map();
    let filter = Greater::new(age_extractor(), 25);
    let matched = map.key_set(&filter).unwrap();
    assert_eq!(matched, [1u64, 2].into_iter().collect());
}

#[test]
fn test_entry_set_sorted_orders_by_natural_age() {
    let map = seeded_map();
    let filter = Greater::new(age_extractor(), 0);
    let entries = map.entry_set_sorted(&filter, &NaturalOrder).unwrap();
    let ages: Vec<i32> = entries.iter().map(|(_, v)| v.1).collect();
    assert_eq!(ages, vec![20, 30, 40]);
}

#[test]
fn test_page_slice_extracts_first_page() {
    let map = seeded_map();
    let filter = Greater::new(age_extractor(), 0);
    let entries = map.entry_set_sorted(&filter, &NaturalOrder).unwrap();
    let page: Page<Person> = Page::new(2);
    let first = DataMap::<u64, Person>::page_slice(&entries, &page);
    assert_eq!(first.iter().map(|(_, v)| v.1).collect::<Vec<_>>(), vec![20, 30]);
}

#[test]
fn test_entry_set_sorted_propagates_comparator_error() {
    use crate::comparator::FloatOrder;
    use crate::filter::Key;

    let mut map: DataMap<u64, f64> = DataMap::new();
    map.put(1, 1.0).unwrap();
    map.put(2, f64::NAN).unwrap();

    let filter = Key::new([1u64, 2].into_iter().collect());
    let err = map.entry_set_sorted(&filter, &FloatOrder);
    assert!(err.is_err());
}

#[test]
fn test_retain_matching_drops_keys_failing_residual_filter() {
    let map = seeded_map();
    // no index registered: every comparison filter degrades to a residual
    // evaluated entry-by-entry via `retain_matching`.
    let filter = Equals::new(age_extractor(), 20);
    let matched = map.key_set(&filter).unwrap();
    assert_eq!(matched, [3u64].into_iter().collect());
}
