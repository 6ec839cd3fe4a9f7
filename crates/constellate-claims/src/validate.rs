//! Claim validation.
//!
//! Checks run in a fixed order and stop at the first violation:
//!
//! 1. metadata schema and self-certified id
//! 2. claim schema for its kind
//! 3. claim kind is known
//! 4. `iat` is not in the future
//! 5. `aud`, if present, does not contain `iss`
//! 6. `exp`, if present, is after `iat` and `nbf` and not in the past
//! 7. `nbf`, if present, is after `iat` and not in the future
//! 8. `jti` matches the claim's content
//! 9. `sub` is the metadata's id
//! 10. `iss` is listed in one of the metadata's authorized-issuer fields

use constellate_core::now_millis;

use crate::claim::Claim;
use crate::error::{ClaimViolation, ClaimsError, Result};
use crate::identity::Identifiable;
use crate::metadata::Metadata;

/// Validate a claim against the metadata it is about, using the system clock.
pub fn validate_claim(claim: &Claim, metadata: &Metadata) -> Result<()> {
    validate_claim_at(claim, metadata, now_millis())
}

/// Validate a claim against its metadata at time `now` (Unix ms).
pub fn validate_claim_at(claim: &Claim, metadata: &Metadata, now: i64) -> Result<()> {
    match check(claim, metadata, now)? {
        Ok(()) => Ok(()),
        Err(violation) => {
            tracing::debug!(
                jti = claim.id().unwrap_or_default(),
                %violation,
                "claim rejected"
            );
            Err(ClaimsError::InvalidClaim(violation))
        }
    }
}

/// Outer error: hashing failed. Inner error: the claim is invalid.
fn check(
    claim: &Claim,
    metadata: &Metadata,
    now: i64,
) -> Result<std::result::Result<(), ClaimViolation>> {
    use ClaimViolation::*;

    // 1
    if let Err(e) = metadata.check_schema() {
        return Ok(Err(MetadataSchema(e)));
    }
    let metadata_id = metadata.compute_id()?;
    if metadata.id() != Some(metadata_id.as_str()) {
        return Ok(Err(MetadataIdMismatch {
            expected: metadata_id,
            actual: metadata.id().map(str::to_string),
        }));
    }

    // 2
    if let Err(e) = claim.check_schema() {
        return Ok(Err(ClaimSchema(e)));
    }

    // 3
    if let Err(violation) = claim.kind() {
        return Ok(Err(violation));
    }

    // The schema check guarantees these are present.
    let iss = claim.issuer().unwrap_or_default();
    let iat = claim.issued_at().unwrap_or_default();

    // 4
    if iat > now {
        return Ok(Err(IssuedInFuture { iat, now }));
    }

    // 5
    if claim.audience().contains(&iss) {
        return Ok(Err(IssuerInAudience {
            iss: iss.to_string(),
        }));
    }

    // 6
    if let Some(exp) = claim.expires_at() {
        if exp <= iat {
            return Ok(Err(ExpiryBeforeIssue { exp, iat }));
        }
        if let Some(nbf) = claim.not_before() {
            if exp <= nbf {
                return Ok(Err(ExpiryBeforeNotBefore { exp, nbf }));
            }
        }
        if exp <= now {
            return Ok(Err(Expired { exp, now }));
        }
    }

    // 7
    if let Some(nbf) = claim.not_before() {
        if nbf <= iat {
            return Ok(Err(NotBeforeBeforeIssue { nbf, iat }));
        }
        if nbf > now {
            return Ok(Err(NotYetValid { nbf, now }));
        }
    }

    // 8
    let jti = claim.compute_id()?;
    if claim.id() != Some(jti.as_str()) {
        return Ok(Err(ClaimIdMismatch {
            expected: jti,
            actual: claim.id().unwrap_or_default().to_string(),
        }));
    }

    // 9
    let sub = claim.subject().unwrap_or_default();
    if sub != metadata_id {
        return Ok(Err(SubjectMismatch {
            sub: sub.to_string(),
            metadata_id,
        }));
    }

    // 10
    let kind = metadata.kind().map_err(ClaimsError::InvalidSchema)?;
    let issuers = metadata.authorized_issuers()?;
    if !issuers.contains(&iss) {
        return Ok(Err(IssuerNotAuthorized {
            iss: iss.to_string(),
            kind: kind.to_string(),
        }));
    }

    Ok(Ok(()))
}
