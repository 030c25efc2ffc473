//! Encrypted emission framing (§4.2 step 4).
//!
//! Each encrypted emission on the wire is a 4-byte big-endian
//! plaintext-length prefix followed by cipher blocks (AES-256-CBC with a
//! random per-emission IV prepended to the ciphertext). The encoder
//! produces one complete emission per call; the decoder buffers residual
//! partial-block bytes across calls and only yields plaintext once a full
//! block (or the final, padded block at `finalize`) is available.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

use crate::session_key::SESSION_KEY_LEN;

type Aes256CbcEnc = Encryptor<Aes256>;
type Aes256CbcDec = Decryptor<Aes256>;

const IV_LEN: usize = 16;

/// Encrypts `plaintext` into one emission: a 4-byte big-endian length
/// prefix, a random IV, then the PKCS#7-padded CBC ciphertext.
#[must_use]
pub fn encrypt_emission(key: &[u8; SESSION_KEY_LEN], plaintext: &[u8]) -> Vec<u8> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new(key.into(), &iv.into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(4 + IV_LEN + ciphertext.len());
    out.extend_from_slice(&(plaintext.len() as u32).to_be_bytes());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    out
}

/// Decrypts one complete emission produced by [`encrypt_emission`].
///
/// # Errors
///
/// Returns [`CipherError`] if the emission is truncated, the announced
/// plaintext length does not match what decrypts, or padding is invalid.
pub fn decrypt_emission(key: &[u8; SESSION_KEY_LEN], emission: &[u8]) -> Result<Vec<u8>, CipherError> {
    if emission.len() < 4 + IV_LEN {
        return Err(CipherError::Truncated);
    }
    let announced_len = u32::from_be_bytes(emission[0..4].try_into().unwrap()) as usize;
    let iv = &emission[4..4 + IV_LEN];
    let ciphertext = &emission[4 + IV_LEN..];

    let cipher = Aes256CbcDec::new(key.into(), iv.into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::InvalidPadding)?;

    if plaintext.len() != announced_len {
        return Err(CipherError::LengthMismatch {
            announced: announced_len,
            actual: plaintext.len(),
        });
    }
    Ok(plaintext)
}

/// A streaming decryptor that buffers bytes across calls, since the
/// session-data stream may hand it arbitrarily sized chunks. Callers feed
/// raw emission bytes via [`Self::feed`] and drain completed plaintext
/// emissions via the returned vector; [`Self::finalize`] asserts no
/// residual bytes remain.
#[derive(Default)]
pub struct StreamingDecryptor {
    buffer: Vec<u8>,
}

impl StreamingDecryptor {
    /// Creates an empty decryptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds more raw bytes in and drains every complete emission found so
    /// far, leaving any trailing partial emission buffered.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError`] if a length-prefixed emission fails to
    /// decrypt once it is fully buffered.
    pub fn feed(&mut self, key: &[u8; SESSION_KEY_LEN], chunk: &[u8]) -> Result<Vec<Vec<u8>>, CipherError> {
        self.buffer.extend_from_slice(chunk);
        let mut out = Vec::new();
        loop {
            if self.buffer.len() < 4 {
                break;
            }
            let announced = u32::from_be_bytes(self.buffer[0..4].try_into().unwrap()) as usize;
            // Ciphertext is padded up to the next 16-byte block boundary.
            let padded_len = ((announced / 16) + 1) * 16;
            let emission_len = 4 + IV_LEN + padded_len;
            if self.buffer.len() < emission_len {
                break;
            }
            let emission: Vec<u8> = self.buffer.drain(..emission_len).collect();
            out.push(decrypt_emission(key, &emission)?);
        }
        Ok(out)
    }

    /// Asserts no partial emission bytes remain buffered at end-of-file.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Truncated`] if residual bytes remain.
    pub fn finalize(self) -> Result<(), CipherError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(CipherError::Truncated)
        }
    }
}

/// Encryption or decryption framing error.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The emission ended before a complete header/IV/ciphertext was read.
    #[error("encrypted emission truncated")]
    Truncated,
    /// Padding removal failed; the ciphertext or key is wrong.
    #[error("invalid padding while decrypting")]
    InvalidPadding,
    /// The decrypted plaintext length does not match the announced length.
    #[error("announced plaintext length {announced} does not match decrypted length {actual}")]
    LengthMismatch {
        /// Length announced in the 4-byte prefix.
        announced: usize,
        /// Length actually recovered after unpadding.
        actual: usize,
    },
}
