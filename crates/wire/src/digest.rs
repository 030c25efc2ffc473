//! Base64 framing for the content-digest streams (§6: "Base64 MD5 digest",
//! and the SHA1/256/512 siblings).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Encodes a raw digest into the base64 payload carried by a digest
/// stream record.
#[must_use]
pub fn encode(digest: &[u8]) -> String {
    STANDARD.encode(digest)
}

/// Decodes a digest stream's base64 payload back into raw digest bytes.
///
/// # Errors
///
/// Returns [`DigestPayloadError`] if the payload is not valid base64 or
/// not valid UTF-8.
pub fn decode(payload: &[u8]) -> Result<Vec<u8>, DigestPayloadError> {
    let text = std::str::from_utf8(payload).map_err(|_| DigestPayloadError)?;
    STANDARD.decode(text.trim_end()).map_err(|_| DigestPayloadError)
}

/// A digest stream payload was not valid base64.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("digest stream payload is not valid base64")]
pub struct DigestPayloadError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_digest_bytes() {
        let digest = [1u8, 2, 3, 4, 5, 250, 251, 252];
        let encoded = encode(&digest);
        let decoded = decode(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, digest);
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_eq!(decode(b"not valid base64 !!"), Err(DigestPayloadError));
    }
}
