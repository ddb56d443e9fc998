//! Property tests for lookup and mutation invariants.

use docstore::{DocumentStore, Predicate, StoreConfig, WriteOptions};
use proptest::prelude::*;
use serde_json::{json, Value};

fn store_with(tags: &[u8]) -> DocumentStore {
    let records: Vec<Value> = tags
        .iter()
        .enumerate()
        .map(|(i, tag)| json!({"i": i, "tag": tag}))
        .collect();
    DocumentStore::open(StoreConfig::raw(Value::Array(records).to_string())).unwrap()
}

proptest! {
    #[test]
    fn lookup_finds_first_match(tags in prop::collection::vec(0u8..4, 0..40), wanted in 0u8..4) {
        let store = store_with(&tags);

        let found = store.lookup(&Predicate::field_eq("tag", wanted));

        let expected = tags.iter().position(|t| *t == wanted);
        prop_assert_eq!(found.index, expected);
        prop_assert_eq!(found.record.is_some(), expected.is_some());
    }

    #[test]
    fn none_predicate_never_matches(tags in prop::collection::vec(0u8..4, 0..40)) {
        let store = store_with(&tags);
        prop_assert_eq!(store.lookup(&Predicate::none()).signed_index(), -1);
    }

    #[test]
    fn update_touches_exactly_one(tags in prop::collection::vec(0u8..4, 1..40), wanted in 0u8..4) {
        let store = store_with(&tags);
        let before = store.records();

        let result = store
            .update(
                &Predicate::field_eq("tag", wanted),
                |mut r| {
                    r["touched"] = json!(true);
                    r
                },
                &WriteOptions::default(),
            )
            .unwrap();

        let after = store.records();
        prop_assert_eq!(after.len(), before.len());
        for (i, (old, new)) in before.iter().zip(after.iter()).enumerate() {
            if Some(i) == result.index {
                prop_assert_eq!(&new["touched"], &json!(true));
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn delete_shrinks_by_one(tags in prop::collection::vec(0u8..4, 0..40), wanted in 0u8..4) {
        let store = store_with(&tags);
        let len = store.len();

        match store.delete(&Predicate::field_eq("tag", wanted), &WriteOptions::default()) {
            Ok(deleted) => {
                prop_assert_eq!(store.len(), len - 1);
                prop_assert_eq!(&deleted.record["tag"], &json!(wanted));
            }
            Err(_) => {
                prop_assert!(!tags.contains(&wanted));
                prop_assert_eq!(store.len(), len);
            }
        }
    }

    #[test]
    fn add_grows_by_one(tags in prop::collection::vec(0u8..4, 0..40), extra in 0u8..4) {
        let store = store_with(&tags);
        let len = store.len();

        store.add(json!({"tag": extra}), &WriteOptions::default()).unwrap();

        prop_assert_eq!(store.len(), len + 1);
        prop_assert_eq!(store.get(len), Some(json!({"tag": extra})));
    }
}
