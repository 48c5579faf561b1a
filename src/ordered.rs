//! Deterministic traversal of unordered maps.
//!
//! Every walk over a `HashMap` in the pipeline goes through [`sorted_keys`] so
//! that emitted `source` lists and the order in which sibling module calls are
//! resolved do not depend on hash seeds. Keys must be `Ord`; a map keyed by
//! anything else is rejected at compile time.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// Returns every key of `map` in ascending order.
#[must_use]
pub fn sorted_keys<K, V, S>(map: &HashMap<K, V, S>) -> Vec<K>
where
    K: Ord + Clone,
    S: BuildHasher,
{
    let mut keys: Vec<K> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Serializes a `HashMap` with its entries in key order.
///
/// Used as `#[serde(serialize_with = "crate::ordered::serialize_sorted")]`.
///
/// # Errors
///
/// Propagates serializer errors.
pub fn serialize_sorted<K, V, S, Ser>(
    map: &HashMap<K, V, S>,
    serializer: Ser,
) -> Result<Ser::Ok, Ser::Error>
where
    K: Ord + Clone + Serialize + std::hash::Hash + Eq,
    V: Serialize,
    S: BuildHasher,
    Ser: Serializer,
{
    let mut state = serializer.serialize_map(Some(map.len()))?;
    for key in sorted_keys(map) {
        state.serialize_entry(&key, &map[&key])?;
    }
    state.end()
}

/// Sorts and de-duplicates a provenance list in place.
pub fn normalize_sources(sources: &mut Vec<String>) {
    sources.sort();
    sources.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sorted_keys_independent_of_insertion_order() {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        let names = ["vpc", "db", "subnet", "atracker", "kms"];
        for (i, name) in names.iter().enumerate() {
            forward.insert((*name).to_string(), i);
        }
        for (i, name) in names.iter().rev().enumerate() {
            backward.insert((*name).to_string(), i);
        }

        assert_eq!(sorted_keys(&forward), sorted_keys(&backward));
        assert_eq!(
            sorted_keys(&forward),
            vec!["atracker", "db", "kms", "subnet", "vpc"]
        );
    }

    #[test]
    fn test_sorted_keys_empty_map() {
        let map: HashMap<String, ()> = HashMap::new();
        assert!(sorted_keys(&map).is_empty());
    }

    #[test]
    fn test_serialize_sorted_is_stable() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize_sorted")]
            map: HashMap<String, u32>,
        }

        let mut map = HashMap::new();
        map.insert("zeta".to_string(), 1);
        map.insert("alpha".to_string(), 2);
        map.insert("mid".to_string(), 3);

        let json = serde_json::to_string(&Wrapper { map }).unwrap();
        assert_eq!(json, r#"{"map":{"alpha":2,"mid":3,"zeta":1}}"#);
    }

    #[test]
    fn test_normalize_sources_sorts_and_dedups() {
        let mut sources = vec![
            "module.db".to_string(),
            "ibm_is_vpc.main.resource_group".to_string(),
            "module.db".to_string(),
        ];
        normalize_sources(&mut sources);
        assert_eq!(
            sources,
            vec!["ibm_is_vpc.main.resource_group", "module.db"]
        );
    }
}
