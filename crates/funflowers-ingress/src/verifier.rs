//! Purchase signature verification.
//!
//! The store signs every purchase payload with its RSA key. The game ships
//! the matching public key (X.509 `SubjectPublicKeyInfo`, base64) and checks
//! a SHA1-with-RSA (PKCS#1 v1.5) signature over the raw payload bytes.
//!
//! Verification fails closed: a malformed signature or key is an error, and
//! callers must treat an error exactly like a signature mismatch.
//!
//! Client-side verification can be stubbed out by anyone who patches the
//! binary. It is a sample-app simplification, not a substitute for
//! validating receipts on a server.

use base64::{Engine, engine::general_purpose::STANDARD};
use funflowers_types::{FlowersError, Result};
use rsa::{
    RsaPublicKey,
    pkcs1v15::{Signature, VerifyingKey},
    pkcs8::DecodePublicKey,
    signature::Verifier,
    traits::PublicKeyParts,
};
use sha1::Sha1;

/// Embedded store public key (RSA-1024, DER `SubjectPublicKeyInfo`, base64).
const STORE_PUBLIC_KEY_B64: &str = "MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQCyRJrfK4rDPgQ2fQzZaABgcA4OuOY/3wO+Q3V2/g9GwGhPQbfJ7UKVsi\
TUIyThrAwPnn9FsSjUgTfqSUKm8oEVvJBV8cYWp2meKbpSpM/5Y5snj8B6nuCzLCFhbtMD6YIk0PXvJHWWFWXcP8BIUjSX7EtPi2E+8GaqDWtMYVPgfwIDAQAB";

/// Verifies purchase payload signatures against a fixed RSA public key.
///
/// Pure and deterministic: no state is mutated, and the same inputs always
/// produce the same answer.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    key: RsaPublicKey,
}

impl SignatureVerifier {
    /// Verifier for the store key embedded in the game.
    ///
    /// # Errors
    /// Returns `Verification` if the embedded key material is invalid.
    pub fn embedded() -> Result<Self> {
        Self::from_base64_der(STORE_PUBLIC_KEY_B64)
    }

    /// Build a verifier from a base64 DER `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    /// Returns `Verification` if the input is not base64 or not an RSA
    /// public key.
    pub fn from_base64_der(key_b64: &str) -> Result<Self> {
        let der = decode_base64(key_b64).map_err(|e| FlowersError::Verification {
            reason: format!("public key is not valid base64: {e}"),
        })?;
        let key = RsaPublicKey::from_public_key_der(&der).map_err(|e| {
            FlowersError::Verification {
                reason: format!("invalid RSA public key: {e}"),
            }
        })?;
        Ok(Self::from_public_key(key))
    }

    #[must_use]
    pub fn from_public_key(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Expected signature length in bytes (the modulus size).
    #[must_use]
    pub fn signature_len(&self) -> usize {
        self.key.size()
    }

    /// Verify `signature_b64` over `payload`.
    ///
    /// Returns `Ok(true)` only for a signature that verifies under the key,
    /// `Ok(false)` for a well-formed signature that does not match.
    ///
    /// # Errors
    /// Returns `Verification` if the signature is not base64 or has the
    /// wrong length for the key.
    pub fn verify(&self, payload: &[u8], signature_b64: &str) -> Result<bool> {
        let raw = decode_base64(signature_b64).map_err(|e| FlowersError::Verification {
            reason: format!("signature is not valid base64: {e}"),
        })?;

        if raw.len() != self.signature_len() {
            return Err(FlowersError::Verification {
                reason: format!(
                    "signature is {} bytes, expected {}",
                    raw.len(),
                    self.signature_len()
                ),
            });
        }

        let signature =
            Signature::try_from(raw.as_slice()).map_err(|e| FlowersError::Verification {
                reason: format!("malformed signature: {e}"),
            })?;

        let verifying_key = VerifyingKey::<Sha1>::new(self.key.clone());
        let verified = verifying_key.verify(payload, &signature).is_ok();

        tracing::debug!(
            payload_len = payload.len(),
            verified,
            "Purchase signature checked"
        );
        Ok(verified)
    }
}

/// Decode standard base64, ignoring embedded whitespace and line breaks
/// (stores commonly wrap long signatures).
fn decode_base64(input: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sign_b64, test_verifier};

    const PAYLOAD: &str = r#"{"orderId":"A-1","productId":"1023608","purchaseToken":"tok-1"}"#;

    #[test]
    fn embedded_key_parses() {
        let verifier = SignatureVerifier::embedded().unwrap();
        assert_eq!(verifier.signature_len(), 128);
    }

    #[test]
    fn valid_signature_verifies() {
        let verifier = test_verifier();
        let sig = sign_b64(PAYLOAD.as_bytes());
        assert!(verifier.verify(PAYLOAD.as_bytes(), &sig).unwrap());
    }

    #[test]
    fn deterministic() {
        let verifier = test_verifier();
        let sig = sign_b64(PAYLOAD.as_bytes());
        for _ in 0..3 {
            assert!(verifier.verify(PAYLOAD.as_bytes(), &sig).unwrap());
        }
    }

    #[test]
    fn tampered_payload_rejected() {
        let verifier = test_verifier();
        let sig = sign_b64(PAYLOAD.as_bytes());
        let tampered = PAYLOAD.replace("1023608", "1023609");
        assert!(!verifier.verify(tampered.as_bytes(), &sig).unwrap());
    }

    #[test]
    fn tampered_signature_rejected() {
        let verifier = test_verifier();
        let mut raw = STANDARD.decode(sign_b64(PAYLOAD.as_bytes())).unwrap();
        raw[10] ^= 0x01;
        let sig = STANDARD.encode(raw);
        assert!(!verifier.verify(PAYLOAD.as_bytes(), &sig).unwrap());
    }

    #[test]
    fn wrapped_signature_accepted() {
        let verifier = test_verifier();
        let sig = sign_b64(PAYLOAD.as_bytes());
        let (head, tail) = sig.split_at(40);
        let wrapped = format!("{head}\n{tail}\n");
        assert!(verifier.verify(PAYLOAD.as_bytes(), &wrapped).unwrap());
    }

    #[test]
    fn non_base64_signature_is_error() {
        let verifier = test_verifier();
        let err = verifier.verify(PAYLOAD.as_bytes(), "not*base64!").unwrap_err();
        assert!(matches!(err, FlowersError::Verification { ref reason } if reason.contains("base64")));
    }

    #[test]
    fn short_signature_is_error() {
        let verifier = test_verifier();
        let err = verifier
            .verify(PAYLOAD.as_bytes(), &STANDARD.encode([7u8; 16]))
            .unwrap_err();
        assert!(matches!(err, FlowersError::Verification { ref reason } if reason.contains("16 bytes")));
    }

    #[test]
    fn empty_signature_is_error() {
        let verifier = test_verifier();
        assert!(verifier.verify(PAYLOAD.as_bytes(), "").is_err());
    }

    #[test]
    fn foreign_key_signature_rejected_by_embedded_key() {
        let verifier = SignatureVerifier::embedded().unwrap();
        let sig = sign_b64(PAYLOAD.as_bytes());
        // Same length as the embedded key, so this is a mismatch, not an error.
        assert!(!verifier.verify(PAYLOAD.as_bytes(), &sig).unwrap());
    }

    #[test]
    fn invalid_key_material_is_error() {
        let err = SignatureVerifier::from_base64_der(&STANDARD.encode(b"not a key")).unwrap_err();
        assert!(matches!(err, FlowersError::Verification { .. }));
        assert!(SignatureVerifier::from_base64_der("%%%").is_err());
    }
}
