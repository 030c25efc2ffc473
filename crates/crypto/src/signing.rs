//! Signature verification against a trusted-signers list (§4.5).
//!
//! Restore holds the `signed-digest` record until file close, then walks
//! the trusted-signers list; exactly one key must validate the signature
//! over the recomputed digest. A verification failure is reported but the
//! already-written file is not deleted.

use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha2::Sha256;

/// Verifies `signature` over `digest` against every key in
/// `trusted_signers`, succeeding as soon as one validates.
///
/// Returns `true` if exactly one (or more) of the trusted keys validated
/// the signature, `false` if none did.
#[must_use]
pub fn verify_against_trusted_signers(trusted_signers: &[RsaPublicKey], digest: &[u8], signature: &[u8]) -> bool {
    let Ok(sig) = Signature::try_from(signature) else {
        return false;
    };
    trusted_signers.iter().any(|key| {
        let verifying_key = VerifyingKey::<Sha256>::new(key.clone());
        verifying_key.verify(digest, &sig).is_ok()
    })
}
