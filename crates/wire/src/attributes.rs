//! The `unix-attributes` stream payload codec (§4.1 supplement, §6).
//!
//! Wire shape: `<file-index> <type> <path>\0<attrs>\0<link>\0<exAttrs>\0<delta>\0`
//! — a leading ASCII file-index and type, a space, then four NUL-terminated
//! fields. `attrs` is the base-36 `FileStat` encoding (`core::stat`);
//! `link` is the symlink target or hard-link source path, empty for
//! everything else; `exAttrs` carries platform-specific extended
//! attributes (Windows reparse data, flags) as an opaque string, empty
//! when unused; `delta` is the delta-sequence counter rendered as decimal.

use thiserror::Error;

/// A decoded attributes record, ready to be re-encoded onto or parsed off
/// the wire.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AttributesRecord {
    /// The file-index this record announces data for.
    pub file_index: i32,
    /// The numeric file-type code the orchestrator assigned.
    pub file_type: i32,
    /// The file's path, as sent (already path-stripped if configured).
    pub path: String,
    /// The base-36 `FileStat` encoding.
    pub attrs: String,
    /// Symlink target or hard-link source path; empty if neither applies.
    pub link: String,
    /// Opaque platform-specific extended attributes; empty if unused.
    pub ex_attrs: String,
    /// The delta-sequence counter for chained incremental content.
    pub delta: u32,
}

impl AttributesRecord {
    /// Serializes this record to its wire payload bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}\0", self.file_index, self.file_type, self.path).into_bytes();
        out.extend_from_slice(self.attrs.as_bytes());
        out.push(0);
        out.extend_from_slice(self.link.as_bytes());
        out.push(0);
        out.extend_from_slice(self.ex_attrs.as_bytes());
        out.push(0);
        out.extend_from_slice(self.delta.to_string().as_bytes());
        out
    }

    /// Parses a payload produced by [`Self::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`AttributesParseError`] if the leading `<file-index>
    /// <type> <path>` header or any of the four NUL-terminated fields is
    /// missing.
    pub fn decode(payload: &[u8]) -> Result<Self, AttributesParseError> {
        let nul = payload.iter().position(|&b| b == 0).ok_or(AttributesParseError)?;
        let header = std::str::from_utf8(&payload[..nul]).map_err(|_| AttributesParseError)?;
        let mut header_fields = header.splitn(3, ' ');
        let file_index: i32 = header_fields
            .next()
            .ok_or(AttributesParseError)?
            .parse()
            .map_err(|_| AttributesParseError)?;
        let file_type: i32 = header_fields
            .next()
            .ok_or(AttributesParseError)?
            .parse()
            .map_err(|_| AttributesParseError)?;
        let path = header_fields.next().ok_or(AttributesParseError)?.to_string();

        let rest = &payload[nul + 1..];
        let mut fields = rest.split(|&b| b == 0);
        let attrs = next_field(&mut fields)?;
        let link = next_field(&mut fields)?;
        let ex_attrs = next_field(&mut fields)?;
        let delta_str = next_field(&mut fields)?;
        let delta: u32 = delta_str.parse().map_err(|_| AttributesParseError)?;

        Ok(Self {
            file_index,
            file_type,
            path,
            attrs,
            link,
            ex_attrs,
            delta,
        })
    }
}

fn next_field<'a>(fields: &mut impl Iterator<Item = &'a [u8]>) -> Result<String, AttributesParseError> {
    let raw = fields.next().ok_or(AttributesParseError)?;
    String::from_utf8(raw.to_vec()).map_err(|_| AttributesParseError)
}

/// The attributes payload did not match the fixed field layout.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("malformed attributes record payload")]
pub struct AttributesParseError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_regular_file_record() {
        let record = AttributesRecord {
            file_index: 7,
            file_type: 0,
            path: "/home/user/file.txt".to_string(),
            attrs: "1 2z 1a4 1 3e8 3e8 0 1000 rs k9 k9".to_string(),
            link: String::new(),
            ex_attrs: String::new(),
            delta: 0,
        };
        let encoded = record.encode();
        let decoded = AttributesRecord::decode(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn round_trips_a_symlink_record_with_a_link_target() {
        let record = AttributesRecord {
            file_index: 12,
            file_type: 2,
            path: "/home/user/link".to_string(),
            attrs: "1 2z 1a4 1 3e8 3e8 0 0 rs k9 k9".to_string(),
            link: "/home/user/target".to_string(),
            ex_attrs: String::new(),
            delta: 3,
        };
        let encoded = record.encode();
        let decoded = AttributesRecord::decode(&encoded).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_rejects_a_payload_missing_the_nul_header_terminator() {
        assert_eq!(AttributesRecord::decode(b"1 0 /path"), Err(AttributesParseError));
    }

    #[test]
    fn decode_rejects_a_payload_missing_trailing_fields() {
        assert_eq!(
            AttributesRecord::decode(b"1 0 /path\0attrs-only"),
            Err(AttributesParseError)
        );
    }
}
