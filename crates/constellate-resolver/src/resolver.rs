//! Backend-agnostic traversal.
//!
//! [`Resolver::get`] answers a path query that may cross any number of
//! document boundaries. [`Resolver::expand`] inlines every link reachable
//! from a value, resolving sibling links concurrently and splicing results
//! back in their original positions.

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use constellate_core::{CoreError, Cid, Link, Resolved, Value};
use constellate_store::Backend;

use crate::batch::{join_ordered, BatchRunner};
use crate::error::{ResolveError, Result};

/// Limits applied while following links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum links `get` follows for a single query.
    pub max_hops: usize,
    /// Maximum nesting of links `expand` follows on one branch.
    pub max_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_hops: 64,
            max_depth: 32,
        }
    }
}

/// A `(document, path)` pair already being expanded on the current branch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Visit {
    cid: Cid,
    path: String,
}

/// The chain of addresses open on one branch of an expansion.
#[derive(Debug, Clone, Default)]
struct Branch {
    visits: Vec<Visit>,
    links: usize,
}

/// Follows links across documents held by a [`Backend`].
///
/// The resolver holds no document state; the backend is passed to every
/// call. Its only state is the [`BatchRunner`] serializing `get_many` batches.
#[derive(Debug, Default)]
pub struct Resolver {
    config: ResolverConfig,
    runner: BatchRunner,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            runner: BatchRunner::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `path` starting at the document `cid`, following links.
    ///
    /// Each hop fetches one document and walks as much of the path as lies
    /// inside it. When the walk stops at a link, the link's own path and the
    /// unconsumed segments are joined and the walk continues in the target.
    /// A link reached at the end of the path is followed too, so the result
    /// is never a link.
    pub async fn get<B>(&self, backend: &B, cid: &Cid, path: &str) -> Result<Value>
    where
        B: Backend + ?Sized,
    {
        let mut cid = cid.clone();
        let mut path = path.to_string();
        let mut hops = 0;

        loop {
            let doc = backend.get(&cid).await?;
            let Resolved { value, remainder } = backend.resolve(&doc, &path)?;

            let link = match value {
                Value::Link(link) => link,
                other => return Ok(other),
            };

            hops += 1;
            if hops > self.config.max_hops {
                tracing::warn!(limit = self.config.max_hops, address = %link, "hop limit reached");
                return Err(ResolveError::TooManyHops {
                    limit: self.config.max_hops,
                });
            }

            let (next, link_path) = link_target(backend, &link)?;
            path = join_path(&link_path, &remainder);
            tracing::trace!(hop = hops, from = ?cid, to = ?next, path = %path, "following link");
            cid = next;
        }
    }

    /// Resolve several `(cid, path)` queries as one batch.
    ///
    /// Results are returned in request order. Batches submitted concurrently
    /// on the same resolver run one after another.
    pub async fn get_many<B>(&self, backend: &B, requests: &[(Cid, String)]) -> Result<Vec<Value>>
    where
        B: Backend + ?Sized,
    {
        let ops = requests
            .iter()
            .map(|(cid, path)| self.get(backend, cid, path));
        self.runner.run(ops).await
    }

    /// Inline every link reachable from `value`.
    ///
    /// Links are resolved with [`get`](Self::get) and the result is expanded
    /// in turn. Sibling values (array items, map entries) are expanded
    /// concurrently; each result replaces its link in place, so array order is
    /// preserved. A link back to a `(document, path)` already open on the same
    /// branch fails with [`ResolveError::CycleDetected`].
    pub async fn expand<B>(&self, backend: &B, value: &Value) -> Result<Value>
    where
        B: Backend + ?Sized,
    {
        self.expand_value(backend, value.clone(), Branch::default())
            .await
    }

    /// Fetch a document and expand it.
    pub async fn expand_cid<B>(&self, backend: &B, cid: &Cid) -> Result<Value>
    where
        B: Backend + ?Sized,
    {
        let doc = backend.get(cid).await?;
        let branch = Branch {
            visits: vec![Visit {
                cid: cid.clone(),
                path: String::new(),
            }],
            links: 0,
        };
        self.expand_value(backend, doc, branch).await
    }

    fn expand_value<'a, B>(
        &'a self,
        backend: &'a B,
        value: Value,
        branch: Branch,
    ) -> BoxFuture<'a, Result<Value>>
    where
        B: Backend + ?Sized,
    {
        // Nested levels fan out with join_ordered directly. A level waits on
        // its children, so queueing them on the BatchRunner gate would deadlock.
        async move {
            match value {
                Value::Link(link) => self.expand_link(backend, link, branch).await,
                Value::Array(items) => {
                    let expanded = join_ordered(
                        items
                            .into_iter()
                            .map(|item| self.expand_value(backend, item, branch.clone())),
                    )
                    .await?;
                    Ok(Value::Array(expanded))
                }
                Value::Map(map) => {
                    let (keys, values): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
                    let expanded = join_ordered(
                        values
                            .into_iter()
                            .map(|v| self.expand_value(backend, v, branch.clone())),
                    )
                    .await?;
                    Ok(Value::Map(keys.into_iter().zip(expanded).collect()))
                }
                other => Ok(other),
            }
        }
        .boxed()
    }

    async fn expand_link<B>(&self, backend: &B, link: Link, mut branch: Branch) -> Result<Value>
    where
        B: Backend + ?Sized,
    {
        let (cid, path) = link_target(backend, &link)?;
        let visit = Visit { cid, path };

        if branch.visits.contains(&visit) {
            tracing::warn!(address = %link, "link cycle during expansion");
            return Err(ResolveError::CycleDetected {
                address: link.address(),
            });
        }
        if branch.links >= self.config.max_depth {
            tracing::warn!(limit = self.config.max_depth, address = %link, "expansion too deep");
            return Err(ResolveError::MaxDepthExceeded {
                limit: self.config.max_depth,
            });
        }

        let resolved = self.get(backend, &visit.cid, &visit.path).await?;
        branch.visits.push(visit);
        branch.links += 1;
        self.expand_value(backend, resolved, branch).await
    }
}

/// Turn a link into the CID and path it points at.
fn link_target<B>(backend: &B, link: &Link) -> Result<(Cid, String)>
where
    B: Backend + ?Sized,
{
    backend.address_to_cid(&link.address()).map_err(|e| {
        ResolveError::Core(CoreError::PathNotFound {
            path: link.address(),
            reason: format!("not a valid address: {}", e),
        })
    })
}

fn join_path(link_path: &str, remainder: &str) -> String {
    match (link_path.is_empty(), remainder.is_empty()) {
        (true, _) => remainder.to_string(),
        (false, true) => link_path.to_string(),
        (false, false) => format!("{}/{}", link_path, remainder),
    }
}
