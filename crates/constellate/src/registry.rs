//! The Registry: unified API over storage, resolution and claims.
//!
//! A registry owns one signing identity and one backend. It publishes
//! self-certified metadata, issues claims about published metadata under its
//! own identity, and verifies claims from anyone against stored metadata.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use constellate_claims::{Claim, ClaimKind, Identifiable, Metadata, SignedClaim};
use constellate_core::{Cid, Keypair, Value};
use constellate_resolver::{Resolver, ResolverConfig};
use constellate_store::Backend;

use crate::error::{RegistryError, Result};

/// Configuration for the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Limits for link following.
    pub resolver: ResolverConfig,
    /// Whether to schema-check metadata before storing it.
    pub validate_on_publish: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            validate_on_publish: true,
        }
    }
}

/// Outcome of publishing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// The self-certifying id written into the document.
    pub id: String,
    /// Where the backend stored the document.
    pub cid: Cid,
}

/// Optional validity bounds for an issued claim, in Unix milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: Option<i64>,
    pub expires_at: Option<i64>,
}

impl ValidityWindow {
    /// Valid from issue until `exp`.
    pub fn until(exp: i64) -> Self {
        Self {
            not_before: None,
            expires_at: Some(exp),
        }
    }

    /// Valid from `nbf` onwards, with an optional expiry.
    pub fn starting(nbf: i64, expires_at: Option<i64>) -> Self {
        Self {
            not_before: Some(nbf),
            expires_at,
        }
    }
}

/// The main Registry struct.
pub struct Registry<B: Backend> {
    /// The identity keypair claims are issued under.
    keypair: Keypair,
    /// The storage backend.
    backend: Arc<B>,
    resolver: Resolver,
    config: RegistryConfig,
}

impl<B: Backend> Registry<B> {
    /// Create a new registry instance.
    pub fn new(keypair: Keypair, backend: B, config: RegistryConfig) -> Self {
        Self::with_shared(keypair, Arc::new(backend), config)
    }

    /// Create a registry over a backend shared with other owners.
    pub fn with_shared(keypair: Keypair, backend: Arc<B>, config: RegistryConfig) -> Self {
        Self {
            keypair,
            backend,
            resolver: Resolver::new(config.resolver.clone()),
            config,
        }
    }

    /// This registry's identity: the base58 public key claims are issued under.
    pub fn identity(&self) -> String {
        self.keypair.identity()
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Metadata Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish metadata.
    ///
    /// Writes the self-certifying id into the document, checks its schema
    /// when configured to, and stores it.
    pub async fn publish(&self, mut metadata: Metadata) -> Result<Published> {
        let id = metadata.set_id()?;
        if self.config.validate_on_publish {
            metadata.check_schema()?;
        }

        let cid = self.backend.put(&metadata.to_value()).await?;
        tracing::debug!(id = %id, cid = ?cid, "published metadata");
        Ok(Published { id, cid })
    }

    /// Resolve a path from a stored document, following links.
    pub async fn fetch(&self, cid: &Cid, path: &str) -> Result<Value> {
        Ok(self.resolver.get(&*self.backend, cid, path).await?)
    }

    /// Load a stored metadata document.
    pub async fn fetch_metadata(&self, cid: &Cid) -> Result<Metadata> {
        let value = self.fetch(cid, "").await?;
        Ok(Metadata::from_value(value)?)
    }

    /// Load a stored document with every link replaced by its target.
    pub async fn expand(&self, cid: &Cid) -> Result<Value> {
        Ok(self.resolver.expand_cid(&*self.backend, cid).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claim Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a signed claim about `metadata` under this registry's identity.
    ///
    /// The metadata must already carry its id. Nothing is stored.
    pub fn issue(
        &self,
        kind: ClaimKind,
        metadata: &Metadata,
        audience: &[String],
        window: ValidityWindow,
    ) -> Result<SignedClaim> {
        let subject = metadata
            .id()
            .ok_or(RegistryError::UnexpectedDocument {
                expected: "identified metadata",
            })?
            .to_string();

        let mut builder = Claim::builder(kind, self.identity(), subject);
        if !audience.is_empty() {
            builder = builder.audience(audience.iter().cloned());
        }
        if let Some(nbf) = window.not_before {
            builder = builder.not_before(nbf);
        }
        if let Some(exp) = window.expires_at {
            builder = builder.expires_at(exp);
        }
        let claim = builder.build()?;

        let signed = SignedClaim::sign(claim, &self.keypair)?;
        tracing::debug!(
            kind = %kind,
            jti = signed.claim.id().unwrap_or_default(),
            "issued claim"
        );
        Ok(signed)
    }

    /// Store a signed claim in its transport form.
    pub async fn store_claim(&self, signed: &SignedClaim) -> Result<Cid> {
        let cid = self.backend.put(&Value::Map(signed.to_document())).await?;
        tracing::debug!(cid = ?cid, "stored claim");
        Ok(cid)
    }

    /// Load a signed claim stored with [`Registry::store_claim`].
    pub async fn load_claim(&self, cid: &Cid) -> Result<SignedClaim> {
        let doc = self
            .backend
            .get(cid)
            .await?
            .into_map()
            .ok_or(RegistryError::UnexpectedDocument {
                expected: "signed claim",
            })?;
        Ok(SignedClaim::from_document(doc)?)
    }

    /// Verify a signed claim against the metadata stored at `metadata_cid`.
    pub async fn verify(&self, signed: &SignedClaim, metadata_cid: &Cid) -> Result<()> {
        let metadata = self.fetch_metadata(metadata_cid).await?;
        match signed.verify(&metadata) {
            Ok(()) => {
                tracing::debug!(cid = ?metadata_cid, "claim verified");
                Ok(())
            }
            Err(e) => {
                tracing::debug!(cid = ?metadata_cid, error = %e, "claim rejected");
                Err(e.into())
            }
        }
    }

    /// Like [`Registry::verify`], with an explicit clock in Unix milliseconds.
    pub async fn verify_at(
        &self,
        signed: &SignedClaim,
        metadata_cid: &Cid,
        now: i64,
    ) -> Result<()> {
        let metadata = self.fetch_metadata(metadata_cid).await?;
        Ok(signed.verify_at(&metadata, now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use constellate_claims::{ClaimViolation, ClaimsError, MetadataKind};
    use constellate_core::Algorithm;
    use constellate_store::MemoryBackend;

    fn registry(seed: u8) -> Registry<MemoryBackend> {
        let keypair = Keypair::from_seed(Algorithm::EdDsa, &[seed; 32]).unwrap();
        Registry::new(keypair, MemoryBackend::new(), RegistryConfig::default())
    }

    fn composition(composers: &[String]) -> Metadata {
        Metadata::of_kind(MetadataKind::MusicComposition)
            .with("title", "fire-song")
            .with("composer", Value::from_iter(composers.iter().cloned()))
    }

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert!(config.validate_on_publish);
        assert_eq!(config.resolver, ResolverConfig::default());
    }

    #[tokio::test]
    async fn test_publish_sets_id_and_stores() {
        let registry = registry(1);
        let published = registry
            .publish(composition(&[registry.identity()]))
            .await
            .unwrap();

        let stored = registry.fetch_metadata(&published.cid).await.unwrap();
        assert_eq!(stored.id(), Some(published.id.as_str()));
        assert!(stored.has_valid_id().unwrap());
    }

    #[tokio::test]
    async fn test_publish_rejects_bad_schema() {
        let registry = registry(1);
        let missing_composer = Metadata::of_kind(MetadataKind::MusicComposition).with("title", "x");

        let err = registry.publish(missing_composer).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Claims(ClaimsError::InvalidSchema(_))
        ));
        assert!(registry.backend().is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_validation() {
        let keypair = Keypair::from_seed(Algorithm::EdDsa, &[1; 32]).unwrap();
        let config = RegistryConfig {
            validate_on_publish: false,
            ..RegistryConfig::default()
        };
        let registry = Registry::new(keypair, MemoryBackend::new(), config);

        let draft = Metadata::of_kind(MetadataKind::MusicComposition).with("title", "x");
        assert!(registry.publish(draft).await.is_ok());
    }

    #[tokio::test]
    async fn test_issue_and_verify() {
        let registry = registry(2);
        let mut meta = composition(&[registry.identity()]);
        let published = registry.publish(meta.clone()).await.unwrap();
        meta.set_id().unwrap();

        let signed = registry
            .issue(ClaimKind::Create, &meta, &[], ValidityWindow::default())
            .unwrap();
        assert_eq!(signed.claim.issuer(), Some(registry.identity().as_str()));
        assert_eq!(signed.claim.subject(), Some(published.id.as_str()));

        registry.verify(&signed, &published.cid).await.unwrap();
    }

    #[tokio::test]
    async fn test_issue_requires_identified_metadata() {
        let registry = registry(2);
        let meta = composition(&[registry.identity()]);
        let err = registry
            .issue(ClaimKind::Create, &meta, &[], ValidityWindow::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnexpectedDocument { .. }));
    }

    #[tokio::test]
    async fn test_verify_rejects_unauthorized_issuer() {
        let owner = registry(3);
        let stranger = Registry::with_shared(
            Keypair::from_seed(Algorithm::EdDsa, &[4; 32]).unwrap(),
            owner.backend.clone(),
            RegistryConfig::default(),
        );

        let published = owner.publish(composition(&[owner.identity()])).await.unwrap();
        let meta = owner.fetch_metadata(&published.cid).await.unwrap();

        let signed = stranger
            .issue(ClaimKind::Create, &meta, &[], ValidityWindow::default())
            .unwrap();
        let err = stranger.verify(&signed, &published.cid).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Claims(ClaimsError::InvalidClaim(
                ClaimViolation::IssuerNotAuthorized { .. }
            ))
        ));
        assert!(err.is_invalid_claim());
    }

    #[tokio::test]
    async fn test_claim_storage_roundtrip() {
        let registry = registry(5);
        let published = registry
            .publish(composition(&[registry.identity()]))
            .await
            .unwrap();
        let meta = registry.fetch_metadata(&published.cid).await.unwrap();

        let signed = registry
            .issue(ClaimKind::Create, &meta, &[], ValidityWindow::default())
            .unwrap();
        let cid = registry.store_claim(&signed).await.unwrap();
        let loaded = registry.load_claim(&cid).await.unwrap();

        assert_eq!(loaded, signed);
        registry.verify(&loaded, &published.cid).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_claim_rejects_metadata() {
        let registry = registry(5);
        let published = registry
            .publish(composition(&[registry.identity()]))
            .await
            .unwrap();
        let err = registry.load_claim(&published.cid).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Claims(ClaimsError::InvalidSchema(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_respects_window() {
        let registry = registry(6);
        let published = registry
            .publish(composition(&[registry.identity()]))
            .await
            .unwrap();
        let meta = registry.fetch_metadata(&published.cid).await.unwrap();

        let signed = registry
            .issue(ClaimKind::Create, &meta, &[], ValidityWindow::until(i64::MAX))
            .unwrap();
        let iat = signed.claim.issued_at().unwrap();

        registry
            .verify_at(&signed, &published.cid, iat + 1)
            .await
            .unwrap();
        let err = registry
            .verify_at(&signed, &published.cid, iat - 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Claims(ClaimsError::InvalidClaim(
                ClaimViolation::IssuedInFuture { .. }
            ))
        ));
    }
}
