//! Proptest generators for property-based testing.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use constellate_claims::{Metadata, MetadataKind};
use constellate_core::{canonical_cbor, Algorithm, Document, Keypair, Link, Value};

/// Generate a map key. Never the reserved link key `/`.
pub fn key() -> impl Strategy<Value = String> {
    "[a-z@][a-zA-Z]{0,7}".prop_map(String::from)
}

/// Generate a finite float.
pub fn finite_float() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9f64
}

/// Generate a scalar value or a link.
pub fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        finite_float().prop_map(Value::Float),
        "[a-z ]{0,12}".prop_map(Value::Text),
        ("[a-z]{4,8}", "[a-z]{0,4}").prop_map(|(target, path)| {
            Value::Link(Link::with_path(target, path))
        }),
    ]
}

/// Generate an arbitrary value nested at most a few levels deep.
pub fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 32, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..5).prop_map(Value::Map),
        ]
    })
}

/// Generate a top-level document.
pub fn document() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(key(), value(), 0..8)
}

/// Generate a document that encodes: no nested document appears twice.
pub fn encodable_document() -> impl Strategy<Value = Document> {
    document().prop_filter("nested documents must be distinct", |doc| {
        canonical_cbor(&Value::Map(doc.clone())).is_ok()
    })
}

/// Recursively shuffle every array in `value` with a seeded RNG.
///
/// Map entries are untouched since [`Document`] keeps them sorted.
pub fn shuffle_arrays(value: &Value, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    shuffle_with(value, &mut rng)
}

fn shuffle_with(value: &Value, rng: &mut StdRng) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(|v| shuffle_with(v, rng)).collect();
            items.shuffle(rng);
            Value::Array(items)
        }
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), shuffle_with(v, rng)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Generate an encodable document together with an array-shuffled copy.
pub fn permuted_pair() -> impl Strategy<Value = (Value, Value)> {
    (encodable_document(), any::<u64>()).prop_map(|(doc, seed)| {
        let original = Value::Map(doc);
        let shuffled = shuffle_arrays(&original, seed);
        (original, shuffled)
    })
}

/// Generate an Ed25519 keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| {
        Keypair::from_seed(Algorithm::EdDsa, &seed).expect("every seed is an Ed25519 key")
    })
}

/// Generate an issuer identity.
pub fn identity() -> impl Strategy<Value = String> {
    keypair().prop_map(|kp| kp.identity())
}

/// Generate a composition with one to three composers and no id.
pub fn composition() -> impl Strategy<Value = Metadata> {
    (
        "[a-z][a-z -]{0,23}",
        prop::collection::vec(identity(), 1..=3),
        prop::option::of("[A-Z][a-z]{2,9}"),
    )
        .prop_map(|(title, composers, genre)| {
            let mut meta = Metadata::of_kind(MetadataKind::MusicComposition)
                .with("title", title)
                .with("composer", Value::from_iter(composers));
            if let Some(genre) = genre {
                meta = meta.with("genre", Value::from_iter([genre]));
            }
            meta
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellate_claims::Identifiable;
    use constellate_core::{canonicalize, Cid, Codec, HashAlgorithm, LINK_KEY};

    fn uses_link_key(value: &Value) -> bool {
        match value {
            Value::Map(map) => map.contains_key(LINK_KEY) || map.values().any(uses_link_key),
            Value::Array(items) => items.iter().any(uses_link_key),
            _ => false,
        }
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(doc in document()) {
            let value = Value::Map(doc);
            let once = canonicalize(&value);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn generated_maps_avoid_link_key(doc in document()) {
            prop_assert!(!uses_link_key(&Value::Map(doc)));
        }

        #[test]
        fn cid_ignores_array_order((original, shuffled) in permuted_pair()) {
            for codec in [Codec::DagCbor, Codec::DagJson] {
                let c1 = Cid::compute(&original, codec, HashAlgorithm::Sha2_256).unwrap();
                let c2 = Cid::compute(&shuffled, codec, HashAlgorithm::Sha2_256).unwrap();
                prop_assert_eq!(c1, c2);
            }
        }

        #[test]
        fn canonical_form_ignores_array_order((original, shuffled) in permuted_pair()) {
            prop_assert_eq!(canonicalize(&original), canonicalize(&shuffled));
        }

        #[test]
        fn composition_is_self_certifying(mut meta in composition()) {
            prop_assert!(meta.check_schema().is_ok());
            let id = meta.set_id().unwrap();
            prop_assert_eq!(meta.id(), Some(id.as_str()));
            prop_assert!(meta.has_valid_id().unwrap());
        }
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let value = Value::from_iter(0i64..20);
        assert_eq!(shuffle_arrays(&value, 7), shuffle_arrays(&value, 7));
        assert_eq!(canonicalize(&shuffle_arrays(&value, 7)), canonicalize(&value));
    }
}
