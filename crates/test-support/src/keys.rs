//! Canned RSA keypairs for crypto round-trip tests.
//!
//! Generating a fresh RSA key per test is slow and, worse, makes failures
//! hard to reproduce if a test ever depends on key shape (modulus size,
//! parity). This module seeds a fixed-seed RNG instead of embedding a raw
//! PEM blob, so the keypair is both deterministic across runs and
//! generated through the same `rsa` APIs production code uses, rather
//! than a hand-maintained fixture file that could silently drift from
//! what `RsaPrivateKey` actually produces.

use std::sync::OnceLock;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rsa::{RsaPrivateKey, RsaPublicKey};

const FIXED_SEED: u64 = 0x5EED_CA11_FEED_BEEF;
const TEST_KEY_BITS: usize = 2048;

struct CannedKeypair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

fn generate_canned() -> CannedKeypair {
    let mut rng = StdRng::seed_from_u64(FIXED_SEED);
    let private = RsaPrivateKey::new(&mut rng, TEST_KEY_BITS).expect("deterministic keygen cannot fail");
    let public = RsaPublicKey::from(&private);
    CannedKeypair { private, public }
}

static CANNED: OnceLock<CannedKeypair> = OnceLock::new();

/// Returns a reference to the shared, lazily-generated canned keypair.
/// Generated once per process no matter how many tests call this.
#[must_use]
pub fn canned_keypair() -> (&'static RsaPrivateKey, &'static RsaPublicKey) {
    let keypair = CANNED.get_or_init(generate_canned);
    (&keypair.private, &keypair.public)
}

/// Generates a second, distinct keypair for tests that need an
/// "untrusted" or "wrong" signer, with its own fixed seed.
#[must_use]
pub fn canned_alternate_keypair() -> (RsaPrivateKey, RsaPublicKey) {
    let mut rng = StdRng::seed_from_u64(FIXED_SEED ^ 1);
    let private = RsaPrivateKey::new(&mut rng, TEST_KEY_BITS).expect("deterministic keygen cannot fail");
    let public = RsaPublicKey::from(&private);
    (private, public)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_keypair_is_stable_across_calls() {
        let (private_a, public_a) = canned_keypair();
        let (private_b, public_b) = canned_keypair();
        assert_eq!(private_a.to_pkcs1_der().unwrap().as_bytes(), private_b.to_pkcs1_der().unwrap().as_bytes());
        assert_eq!(public_a, public_b);
    }

    #[test]
    fn alternate_keypair_differs_from_the_canned_one() {
        let (_, public) = canned_keypair();
        let (_, alternate_public) = canned_alternate_keypair();
        assert_ne!(public, &alternate_public);
    }
}
