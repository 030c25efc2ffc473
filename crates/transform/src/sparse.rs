//! Sparse-block detection (§4.2 stage 2).

/// Returns `true` if every byte in `block` is zero.
#[must_use]
pub fn is_all_zero(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Decides whether a read block should be suppressed (logical hole) or
/// emitted with an address prefix.
///
/// A block is suppressed only when it is all-zero, it is not the file's
/// terminal (possibly short) tail block, and the file is not itself a
/// zero-length device — suppressing the only block of a zero-length
/// device would leave restore with nothing to size the output from.
#[must_use]
pub fn should_suppress(block: &[u8], is_terminal: bool, is_zero_length_device: bool) -> bool {
    !is_terminal && !is_zero_length_device && is_all_zero(block)
}

/// Prefixes `block` with its 8-byte big-endian logical file address, the
/// wire shape of a `sparse-data` stream payload (§6).
#[must_use]
pub fn encode_block(address: u64, block: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + block.len());
    out.extend_from_slice(&address.to_be_bytes());
    out.extend_from_slice(block);
    out
}

/// Splits a `sparse-data` payload back into its address prefix and the
/// block bytes.
///
/// # Errors
///
/// Returns `Err` if `payload` is shorter than the 8-byte address prefix.
pub fn decode_block(payload: &[u8]) -> Result<(u64, &[u8]), SparseDecodeError> {
    if payload.len() < 8 {
        return Err(SparseDecodeError);
    }
    let (prefix, rest) = payload.split_at(8);
    let address = u64::from_be_bytes(prefix.try_into().expect("split_at(8) guarantees 8 bytes"));
    Ok((address, rest))
}

/// A sparse-data payload was shorter than the mandatory 8-byte address
/// prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("sparse-data payload shorter than the 8-byte address prefix")]
pub struct SparseDecodeError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_zero_detects_every_byte_zero() {
        assert!(is_all_zero(&[0u8; 16]));
        assert!(is_all_zero(&[]));
        assert!(!is_all_zero(&[0, 0, 1, 0]));
    }

    #[test]
    fn terminal_blocks_are_never_suppressed() {
        assert!(!should_suppress(&[0u8; 16], true, false));
    }

    #[test]
    fn zero_length_devices_are_never_suppressed() {
        assert!(!should_suppress(&[0u8; 16], false, true));
    }

    #[test]
    fn non_zero_blocks_are_never_suppressed() {
        assert!(!should_suppress(&[1u8; 16], false, false));
    }

    #[test]
    fn middle_zero_block_is_suppressed() {
        assert!(should_suppress(&[0u8; 16], false, false));
    }

    #[test]
    fn encode_decode_round_trips() {
        let block = b"payload bytes";
        let encoded = encode_block(0x2000_0000, block);
        let (address, decoded) = decode_block(&encoded).unwrap();
        assert_eq!(address, 0x2000_0000);
        assert_eq!(decoded, block);
    }

    #[test]
    fn decode_rejects_short_payload() {
        assert!(decode_block(&[0, 1, 2]).is_err());
    }
}
