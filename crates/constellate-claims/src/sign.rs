//! Signing and verifying claims.
//!
//! The signing input is `base64url(canon(header)) + "." +
//! base64url(canon(claim))`, with canonical JSON for both parts and no
//! padding. The issuer's public key is recovered from `iss`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use constellate_core::{canonical_json, now_millis, Document, Keypair, PublicKey, Signature, Value};

use crate::claim::Claim;
use crate::error::{ClaimsError, Result, SchemaError};
use crate::header::Header;
use crate::metadata::Metadata;
use crate::validate::validate_claim_at;

/// The exact bytes that get signed.
pub fn signing_input(header: &Header, claim: &Claim) -> Result<String> {
    let header = canonical_json(&header.to_value())?;
    let claim = canonical_json(&claim.to_value())?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(claim)
    ))
}

/// Sign a claim. The header's algorithm must match the key.
pub fn sign_claim(claim: &Claim, header: &Header, keypair: &Keypair) -> Result<Signature> {
    let alg = header.alg()?;
    if alg != keypair.algorithm() {
        return Err(ClaimsError::AlgorithmMismatch {
            header: alg,
            key: keypair.algorithm(),
        });
    }
    let input = signing_input(header, claim)?;
    Ok(keypair.sign(input.as_bytes()))
}

/// Verify a signed claim against the metadata it is about, using the system
/// clock.
pub fn verify_claim(
    claim: &Claim,
    header: &Header,
    metadata: &Metadata,
    signature: &Signature,
) -> Result<()> {
    verify_claim_at(claim, header, metadata, signature, now_millis())
}

/// Verify a signed claim at time `now` (Unix ms).
///
/// The header schema is checked first, then every validation rule, then the
/// signature.
pub fn verify_claim_at(
    claim: &Claim,
    header: &Header,
    metadata: &Metadata,
    signature: &Signature,
    now: i64,
) -> Result<()> {
    let alg = header.alg()?;
    validate_claim_at(claim, metadata, now)?;

    let iss = claim.issuer().unwrap_or_default();
    let key = PublicKey::from_base58(iss).map_err(|_| ClaimsError::InvalidIssuer(iss.to_string()))?;
    if key.algorithm() != alg {
        return Err(ClaimsError::AlgorithmMismatch {
            header: alg,
            key: key.algorithm(),
        });
    }

    let input = signing_input(header, claim)?;
    key.verify(input.as_bytes(), signature).map_err(|_| {
        tracing::debug!(iss, "signature rejected");
        ClaimsError::InvalidSignature
    })
}

/// A claim together with its header and detached signature, as transmitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedClaim {
    pub header: Header,
    pub claim: Claim,
    pub signature: Signature,
}

impl SignedClaim {
    /// Sign `claim` with a header matching the key's algorithm.
    pub fn sign(claim: Claim, keypair: &Keypair) -> Result<Self> {
        let header = Header::new(keypair.algorithm());
        let signature = sign_claim(&claim, &header, keypair)?;
        Ok(Self {
            header,
            claim,
            signature,
        })
    }

    pub fn verify(&self, metadata: &Metadata) -> Result<()> {
        verify_claim(&self.claim, &self.header, metadata, &self.signature)
    }

    pub fn verify_at(&self, metadata: &Metadata, now: i64) -> Result<()> {
        verify_claim_at(&self.claim, &self.header, metadata, &self.signature, now)
    }

    /// `{ header, claim, signature }` with the signature as base58 text.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("header".into(), self.header.to_value());
        doc.insert("claim".into(), self.claim.to_value());
        doc.insert("signature".into(), Value::Text(self.signature.to_base58()));
        doc
    }

    pub fn from_document(mut doc: Document) -> Result<Self> {
        let header = take_map(&mut doc, "header")?;
        let claim = take_map(&mut doc, "claim")?;
        let signature = doc
            .get("signature")
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaError::new("signature", "expected base58 text"))?;
        let signature = Signature::from_base58(signature)
            .map_err(|_| SchemaError::new("signature", "not base58"))?;

        Ok(Self {
            header: Header::from_document(header),
            claim: Claim::from_document(claim),
            signature,
        })
    }
}

fn take_map(doc: &mut Document, field: &str) -> Result<Document> {
    doc.remove(field)
        .and_then(Value::into_map)
        .ok_or_else(|| SchemaError::new(field, "expected a map").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimKind;
    use crate::error::ClaimViolation;
    use crate::identity::Identifiable;
    use crate::metadata::MetadataKind;
    use constellate_core::Algorithm;

    const NOW: i64 = 1_700_000_000_000;

    fn setup(alg: Algorithm) -> (Keypair, Metadata, Claim) {
        let composer = Keypair::from_seed(alg, &[7u8; 32]).unwrap();
        let mut composition = Metadata::of_kind(MetadataKind::MusicComposition)
            .with("title", "fire-song")
            .with("composer", Value::from_iter([composer.identity()]));
        composition.set_id().unwrap();

        let claim = Claim::builder(
            ClaimKind::Create,
            composer.identity(),
            composition.id().unwrap(),
        )
        .issued_at(NOW - 1_000)
        .build()
        .unwrap();

        (composer, composition, claim)
    }

    #[test]
    fn test_signing_input_shape() {
        let header = Header::new(Algorithm::EdDsa);
        let (_, _, claim) = setup(Algorithm::EdDsa);
        let input = signing_input(&header, &claim).unwrap();

        let (h, c) = input.split_once('.').unwrap();
        assert_eq!(
            URL_SAFE_NO_PAD.decode(h).unwrap(),
            br#"{"alg":"EdDsa","typ":"JWT"}"#.to_vec()
        );
        assert_eq!(
            URL_SAFE_NO_PAD.decode(c).unwrap(),
            canonical_json(&claim.to_value()).unwrap()
        );
        assert!(!input.contains('='));
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        for alg in [Algorithm::EdDsa, Algorithm::Es256] {
            let (composer, composition, claim) = setup(alg);
            let signed = SignedClaim::sign(claim, &composer).unwrap();
            signed.verify_at(&composition, NOW).unwrap();
        }
    }

    #[test]
    fn test_flipped_signature_bit_fails() {
        for alg in [Algorithm::EdDsa, Algorithm::Es256] {
            let (composer, composition, claim) = setup(alg);
            let mut signed = SignedClaim::sign(claim, &composer).unwrap();
            signed.signature.0[0] ^= 0x80;

            let err = signed.verify_at(&composition, NOW).unwrap_err();
            assert!(matches!(err, ClaimsError::InvalidSignature));
        }
    }

    #[test]
    fn test_signature_from_another_key_fails() {
        let (_, composition, claim) = setup(Algorithm::EdDsa);
        let impostor = Keypair::from_seed(Algorithm::EdDsa, &[9u8; 32]).unwrap();
        let signature = sign_claim(&claim, &Header::new(Algorithm::EdDsa), &impostor).unwrap();

        let header = Header::new(Algorithm::EdDsa);
        let err = verify_claim_at(&claim, &header, &composition, &signature, NOW).unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidSignature));
    }

    #[test]
    fn test_algorithm_mismatch_at_signing() {
        let (composer, _, claim) = setup(Algorithm::EdDsa);
        let err = sign_claim(&claim, &Header::new(Algorithm::Es256), &composer).unwrap_err();
        assert!(matches!(
            err,
            ClaimsError::AlgorithmMismatch {
                header: Algorithm::Es256,
                key: Algorithm::EdDsa
            }
        ));
    }

    #[test]
    fn test_bad_header_rejected_before_validation() {
        let (composer, composition, claim) = setup(Algorithm::EdDsa);
        let signed = SignedClaim::sign(claim, &composer).unwrap();
        let header = Header::from_document(Document::new());

        let err = verify_claim_at(&signed.claim, &header, &composition, &signed.signature, NOW)
            .unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidSchema(_)));
    }

    #[test]
    fn test_invalid_claim_rejected_regardless_of_signature() {
        let (composer, composition, _) = setup(Algorithm::EdDsa);
        let subject = composition.id().unwrap();
        let claim = Claim::builder(ClaimKind::Create, composer.identity(), subject)
            .issued_at(NOW - 1_000)
            .not_before(NOW - 500)
            .expires_at(NOW - 600)
            .build()
            .unwrap();
        let signed = SignedClaim::sign(claim, &composer).unwrap();

        let err = signed.verify_at(&composition, NOW).unwrap_err();
        assert!(matches!(
            err,
            ClaimsError::InvalidClaim(ClaimViolation::ExpiryBeforeNotBefore { .. })
        ));
    }

    #[test]
    fn test_non_key_issuer() {
        let mut composition = Metadata::of_kind(MetadataKind::MusicComposition)
            .with("title", "fire-song")
            .with("composer", "amy");
        composition.set_id().unwrap();
        let claim = Claim::builder(ClaimKind::Create, "amy", composition.id().unwrap())
            .issued_at(NOW - 1)
            .build()
            .unwrap();
        let signature = Signature::from_bytes(vec![0u8; 64]);

        let header = Header::new(Algorithm::EdDsa);
        let err = verify_claim_at(&claim, &header, &composition, &signature, NOW).unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidIssuer(_)));
    }

    #[test]
    fn test_transport_document_roundtrip() {
        let (composer, composition, claim) = setup(Algorithm::Es256);
        let signed = SignedClaim::sign(claim, &composer).unwrap();

        let received = SignedClaim::from_document(signed.to_document()).unwrap();
        assert_eq!(received, signed);
        received.verify_at(&composition, NOW).unwrap();
    }

    #[test]
    fn test_malformed_transport_document() {
        let err = SignedClaim::from_document(Document::new()).unwrap_err();
        assert!(matches!(err, ClaimsError::InvalidSchema(ref e) if e.field == "header"));
    }
}
