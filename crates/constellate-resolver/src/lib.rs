//! # Constellate Resolver
//!
//! Follows links across document boundaries.
//!
//! ## Overview
//!
//! A path like `composer/0/name` may start in one document, hit a link to a
//! second document, and finish there. The [`Resolver`] fetches each document
//! through a [`Backend`](constellate_store::Backend), walks as much of the
//! path as that document holds, and continues in the link's target.
//!
//! ## Key Properties
//!
//! - **Stateless**: the backend is passed to every call
//! - **Ordered**: concurrent results are always returned in submission order
//! - **Fail-fast**: the first error aborts the whole batch
//! - **Bounded**: hop, depth and cycle limits keep every call finite
//!
//! ## Usage
//!
//! ```rust,no_run
//! use constellate_resolver::{Resolver, ResolverConfig};
//! use constellate_store::MemoryBackend;
//!
//! async fn example(cid: constellate_core::Cid) -> constellate_resolver::Result<()> {
//!     let backend = MemoryBackend::new();
//!     let resolver = Resolver::new(ResolverConfig::default());
//!
//!     let title = resolver.get(&backend, &cid, "recordingOf/title").await?;
//!     let tree = resolver.expand_cid(&backend, &cid).await?;
//!     # let _ = (title, tree);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod error;
pub mod resolver;

pub use batch::{join_ordered, BatchRunner};
pub use error::{ResolveError, Result};
pub use resolver::{Resolver, ResolverConfig};
