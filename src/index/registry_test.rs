use std::sync::Arc;

use super::*;
use crate::entry::Entry;
use crate::extractor::{Extractor, ExtractorHandle, ExtractorObj, Target};
use crate::index::simple::{IndexConfig, SimpleMapIndex};

struct NameLen;

impl ExtractorObj for NameLen {
    fn name(&self) -> &str {
        "field:name_len"
    }
    fn target(&self) -> Target {
        Target::Value
    }
}

impl Extractor<String, usize> for NameLen {
    fn extract(&self, value: &String) -> Option<usize> {
        Some(value.len())
    }
}

#[test]
fn test_register_and_notify() {
    let mut registry: IndexRegistry<u64, String> = IndexRegistry::new();
    let extractor = Arc::new(NameLen);
    let handle = ExtractorHandle::of(extractor.as_ref());
    let index: SimpleMapIndex<u64, String, usize> =
        SimpleMapIndex::new(extractor, IndexConfig::default());
    registry.insert_index(handle.clone(), Box::new(index));

    let e = Entry::new(1u64, "hello".to_string());
    registry.notify_insert(&e).unwrap();

    let idx = registry.get(&handle).unwrap();
    assert_eq!(idx.len(), 1);
    assert!(!idx.is_partial());
}

#[test]
fn test_remove_index() {
    let mut registry: IndexRegistry<u64, String> = IndexRegistry::new();
    let extractor = Arc::new(NameLen);
    let handle = ExtractorHandle::of(extractor.as_ref());
    let index: SimpleMapIndex<u64, String, usize> =
        SimpleMapIndex::new(extractor, IndexConfig::default());
    registry.insert_index(handle.clone(), Box::new(index));
    assert!(registry.contains(&handle));
    registry.remove_index(&handle);
    assert!(!registry.contains(&handle));
}
