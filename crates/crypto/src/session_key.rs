//! Per-job symmetric session key generation and per-recipient sealing.

use rand::rngs::OsRng;
use rsa::Oaep;
use rsa::pkcs1v15;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// Key length for the per-job symmetric cipher (AES-256).
pub const SESSION_KEY_LEN: usize = 32;

/// A freshly generated, not-yet-sealed session key.
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; SESSION_KEY_LEN]>);

impl SessionKey {
    /// Generates a new random session key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; SESSION_KEY_LEN];
        rsa::rand_core::RngCore::fill_bytes(&mut OsRng, &mut bytes);
        Self(Zeroizing::new(bytes))
    }

    /// The raw key bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }

    /// Seals this key for one recipient's RSA public key using OAEP,
    /// producing the payload of one `encrypted-session-data` stream.
    ///
    /// # Errors
    ///
    /// Returns [`SealError`] if the underlying RSA encryption fails.
    pub fn seal_for(&self, recipient: &RsaPublicKey) -> Result<Vec<u8>, SealError> {
        recipient
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), self.0.as_slice())
            .map_err(|err| SealError(err.to_string()))
    }

    /// Unseals a session key previously sealed with [`Self::seal_for`]
    /// using the recipient's matching private key.
    ///
    /// # Errors
    ///
    /// Returns [`SealError`] if decryption fails or the recovered
    /// plaintext is not exactly [`SESSION_KEY_LEN`] bytes.
    pub fn unseal(sealed: &[u8], recipient_private: &RsaPrivateKey) -> Result<Self, SealError> {
        let plaintext = recipient_private
            .decrypt(Oaep::new::<Sha256>(), sealed)
            .map_err(|err| SealError(err.to_string()))?;
        let bytes: [u8; SESSION_KEY_LEN] = plaintext
            .try_into()
            .map_err(|_| SealError("unsealed session key has the wrong length".to_string()))?;
        Ok(Self(Zeroizing::new(bytes)))
    }
}

/// Signs a digest using PKCS#1 v1.5, for the `signed-digest` stream.
///
/// # Errors
///
/// Returns [`SealError`] if the underlying RSA signing operation fails.
pub fn sign_digest(key: &RsaPrivateKey, digest: &[u8]) -> Result<Vec<u8>, SealError> {
    let signing_key = pkcs1v15::SigningKey::<Sha256>::new(key.clone());
    use rsa::signature::RandomizedSigner;
    let signature = signing_key.sign_with_rng(&mut OsRng, digest);
    use rsa::signature::SignatureEncoding;
    Ok(signature.to_vec())
}

/// Sealing, unsealing, or signing with an asymmetric key failed.
#[derive(Debug, Error)]
#[error("asymmetric key operation failed: {0}")]
pub struct SealError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs1v15::VerifyingKey;
    use rsa::signature::Verifier;

    fn test_keypair() -> (RsaPrivateKey, RsaPublicKey) {
        let private = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        (private, public)
    }

    #[test]
    fn session_key_round_trips_through_sealing() {
        let (private, public) = test_keypair();
        let key = SessionKey::generate();
        let sealed = key.seal_for(&public).unwrap();
        let unsealed = SessionKey::unseal(&sealed, &private).unwrap();
        assert_eq!(key.bytes(), unsealed.bytes());
    }

    #[test]
    fn signature_verifies_against_the_signing_digest() {
        use checksums::strong::StrongDigest;
        let (private, public) = test_keypair();
        let digest = checksums::strong::Sha256::digest(b"signing digest content");
        let signature = sign_digest(&private, digest.as_ref()).unwrap();
        let verifying_key = VerifyingKey::<Sha256>::new(public);
        let sig = pkcs1v15::Signature::try_from(signature.as_slice()).unwrap();
        verifying_key.verify(digest.as_ref(), &sig).unwrap();
    }
}
