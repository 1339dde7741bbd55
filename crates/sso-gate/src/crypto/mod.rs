use base64::{engine::general_purpose, Engine as _};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha1::Sha1;

use crate::errors::GateError;

/// Convert the provider's public key material into a verification key.
///
/// The provider publishes its key as a base64-wrapped DER public-key
/// container (SubjectPublicKeyInfo). ASCII whitespace inside the blob is
/// tolerated since the material is copied around as an opaque string.
///
/// Pure and deterministic: the same bytes always yield the same key.
/// Malformed input is reported as `GateError::MalformedKey`, never a panic.
pub fn convert_public_key(raw_base64: &str) -> Result<RsaPublicKey, GateError> {
    let compact: String = raw_base64.split_ascii_whitespace().collect();
    let der = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| GateError::MalformedKey(format!("invalid base64 wrapping: {}", e)))?;

    RsaPublicKey::from_public_key_der(&der)
        .map_err(|e| GateError::MalformedKey(format!("not a public key container: {}", e)))
}

/// The canonical message the provider signs: `username + "-" + hostname`.
///
/// The hyphen join is literal and unescaped. Callers must ensure neither
/// field can make two distinct pairs collapse to the same message; this is
/// a constraint of the provider's signature scheme, not something the gate
/// can repair locally.
pub fn signed_message(username: &str, hostname: &str) -> String {
    format!("{}-{}", username, hostname)
}

/// Check a base64-encoded assertion against the converted public key.
///
/// PKCS#1 v1.5 with a SHA-1 digest, matching what the provider issues.
/// Returns `false` for undecodable or wrong-length signatures rather than
/// erroring; a malformed assertion is just a failed authentication.
pub fn verify_signature(message: &str, signature_base64: &str, key: &RsaPublicKey) -> bool {
    let Ok(raw) = general_purpose::STANDARD.decode(signature_base64) else {
        return false;
    };
    let Ok(signature) = Signature::try_from(raw.as_slice()) else {
        return false;
    };

    VerifyingKey::<Sha1>::new(key.clone())
        .verify(message.as_bytes(), &signature)
        .is_ok()
}
