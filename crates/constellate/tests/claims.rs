//! End-to-end claim scenarios: publish metadata, issue claims, verify them.

use constellate::claims::{ClaimViolation, ClaimsError};
use constellate::core::Algorithm;
use constellate::store::{MemoryBackend, SqliteBackend};
use constellate::{Backend, ClaimKind, Registry, RegistryConfig, RegistryError, ValidityWindow};
use constellate_testkit::fixtures::{composition, Party};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn registry_for<B: Backend>(party: &Party, backend: B) -> Registry<B> {
    Registry::new(party.keypair.clone(), backend, RegistryConfig::default())
}

#[tokio::test]
async fn fire_song_create_claim() -> anyhow::Result<()> {
    init_tracing();
    let amy = Party::new("amy", Algorithm::EdDsa);
    let bob = Party::new("bob", Algorithm::Es256);
    let registry = registry_for(&amy, MemoryBackend::new());

    let song = composition("fire-song", &[&amy]).with("publisher", bob.identity());
    let published = registry.publish(song).await?;
    let metadata = registry.fetch_metadata(&published.cid).await?;

    let claim = registry.issue(ClaimKind::Create, &metadata, &[], ValidityWindow::default())?;
    registry.verify(&claim, &published.cid).await?;

    // Same claim checked against a composition by someone else.
    let zed = Party::new("zed", Algorithm::EdDsa);
    let other = registry
        .publish(composition("fire-song", &[&zed]).with("publisher", bob.identity()))
        .await?;
    let err = registry.verify(&claim, &other.cid).await.unwrap_err();
    assert!(err.is_invalid_claim(), "unexpected error: {}", err);
    Ok(())
}

#[tokio::test]
async fn publisher_issues_license() -> anyhow::Result<()> {
    init_tracing();
    let amy = Party::new("amy", Algorithm::EdDsa);
    let bob = Party::new("bob", Algorithm::Es256);
    let carol = Party::new("carol", Algorithm::EdDsa);

    let backend = std::sync::Arc::new(MemoryBackend::new());
    let composer = Registry::with_shared(
        amy.keypair.clone(),
        backend.clone(),
        RegistryConfig::default(),
    );
    let publisher = Registry::with_shared(bob.keypair.clone(), backend, RegistryConfig::default());

    let song = composition("fire-song", &[&amy]).with("publisher", bob.identity());
    let published = composer.publish(song).await?;
    let metadata = publisher.fetch_metadata(&published.cid).await?;

    let license = publisher.issue(
        ClaimKind::License,
        &metadata,
        &[carol.identity()],
        ValidityWindow::default(),
    )?;
    assert_eq!(license.header.alg()?, Algorithm::Es256);
    composer.verify(&license, &published.cid).await?;

    // A license must name its audience.
    let unaddressed =
        publisher.issue(ClaimKind::License, &metadata, &[], ValidityWindow::default())?;
    let err = composer.verify(&unaddressed, &published.cid).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Claims(ClaimsError::InvalidClaim(ClaimViolation::ClaimSchema(_)))
    ));

    // The issuer may not license to itself.
    let to_self = publisher.issue(
        ClaimKind::License,
        &metadata,
        &[bob.identity()],
        ValidityWindow::default(),
    )?;
    let err = composer.verify(&to_self, &published.cid).await.unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Claims(ClaimsError::InvalidClaim(
            ClaimViolation::IssuerInAudience { .. }
        ))
    ));
    Ok(())
}

#[tokio::test]
async fn tampered_claim_is_rejected() -> anyhow::Result<()> {
    init_tracing();
    let amy = Party::new("amy", Algorithm::EdDsa);
    let registry = registry_for(&amy, MemoryBackend::new());

    let published = registry.publish(composition("fire-song", &[&amy])).await?;
    let metadata = registry.fetch_metadata(&published.cid).await?;
    let mut claim = registry.issue(ClaimKind::Create, &metadata, &[], ValidityWindow::default())?;

    claim.signature.0[0] ^= 0x01;
    let err = registry.verify(&claim, &published.cid).await.unwrap_err();
    assert!(matches!(err, RegistryError::Claims(ClaimsError::InvalidSignature)));
    Ok(())
}

#[tokio::test]
async fn expired_claim_is_rejected() -> anyhow::Result<()> {
    init_tracing();
    let amy = Party::new("amy", Algorithm::EdDsa);
    let registry = registry_for(&amy, MemoryBackend::new());

    let published = registry.publish(composition("fire-song", &[&amy])).await?;
    let metadata = registry.fetch_metadata(&published.cid).await?;
    let claim = registry.issue(
        ClaimKind::Create,
        &metadata,
        &[],
        ValidityWindow::until(constellate::core::now_millis() + 1_000),
    )?;
    let exp = claim.claim.expires_at().unwrap_or_default();

    registry.verify_at(&claim, &published.cid, exp - 1).await?;
    let err = registry
        .verify_at(&claim, &published.cid, exp)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistryError::Claims(ClaimsError::InvalidClaim(ClaimViolation::Expired { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn claims_survive_a_file_ledger() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("registry.db");
    let amy = Party::new("amy", Algorithm::Es256);

    let (metadata_cid, claim_cid) = {
        let registry = registry_for(&amy, SqliteBackend::open(&path)?);
        let published = registry.publish(composition("fire-song", &[&amy])).await?;
        let metadata = registry.fetch_metadata(&published.cid).await?;
        let claim =
            registry.issue(ClaimKind::Create, &metadata, &[], ValidityWindow::default())?;
        (published.cid, registry.store_claim(&claim).await?)
    };

    let reopened = registry_for(&amy, SqliteBackend::open(&path)?);
    let claim = reopened.load_claim(&claim_cid).await?;
    reopened.verify(&claim, &metadata_cid).await?;
    assert_eq!(reopened.backend().count().await?, 2);
    Ok(())
}
