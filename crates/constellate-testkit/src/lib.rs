//! # Constellate Testkit
//!
//! Testing utilities for Constellate.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Documents with hand-checked canonical encodings
//! - **Generators**: Proptest strategies for documents, permutations and metadata
//! - **Fixtures**: Deterministic parties, sample metadata and a scripted backend
//!
//! ## Golden Vectors
//!
//! ```rust
//! use constellate_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! for (name, matches, hex) in verify_all_vectors() {
//!     assert!(matches, "{}: got {}", name, hex);
//! }
//! assert!(!all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use constellate_core::{Cid, Codec, HashAlgorithm};
//! use constellate_testkit::generators::permuted_pair;
//!
//! proptest! {
//!     #[test]
//!     fn cid_ignores_array_order((a, b) in permuted_pair()) {
//!         let c1 = Cid::compute(&a, Codec::DagCbor, HashAlgorithm::Sha2_256).unwrap();
//!         let c2 = Cid::compute(&b, Codec::DagCbor, HashAlgorithm::Sha2_256).unwrap();
//!         prop_assert_eq!(c1, c2);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use constellate_core::Algorithm;
//! use constellate_testkit::fixtures::{composition, Party};
//!
//! let composer = Party::new("amy", Algorithm::EdDsa);
//! let song = composition("fire-song", &[&composer]);
//! assert_eq!(song.authorized_issuers().unwrap(), vec![composer.identity().as_str()]);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{composition, parties, recording, Party, ScriptedBackend};
pub use generators::{document, encodable_document, permuted_pair, shuffle_arrays};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector};
