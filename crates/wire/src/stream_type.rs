//! The stream-type enumeration (§6).
//!
//! These numeric codes are part of the wire compatibility contract and
//! must never be renumbered; the restore side routes any code outside
//! this set to a single "unknown" branch rather than failing (§4.5,
//! §7).

/// One wire stream type, tagging the payload that follows a record
/// header.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StreamType {
    /// `<file-index> <type> <path>\0<attrs>\0<link>\0<exAttrs>\0<delta>\0`
    UnixAttributes,
    /// Raw file content bytes.
    FileData,
    /// Base64 MD5 digest.
    Md5Digest,
    /// Base64 SHA1 digest.
    Sha1Digest,
    /// Base64 SHA256 digest.
    Sha256Digest,
    /// Base64 SHA512 digest.
    Sha512Digest,
    /// 8-byte address prefix + raw bytes.
    SparseData,
    /// zlib-compressed content.
    GzipData,
    /// Address prefix + zlib-compressed content.
    SparseGzipData,
    /// Reserved; must be ignored.
    ProgramNames,
    /// Reserved; must be ignored.
    ProgramData,
    /// Extended platform attributes.
    UnixAttributesEx,
    /// Plugin extraction boundary marker.
    PluginName,
    /// Director-to-FD-only out-of-band metadata.
    RestoreObject,
    /// Sealed symmetric session key.
    EncryptedSessionData,
    /// 4-byte length prefix + cipher blocks.
    EncryptedFileData,
    /// Encrypted, compressed content.
    EncryptedGzipFileData,
    /// DER-ish PKI signature blob.
    SignedDigest,
    /// 12-byte header + compressed content (any algorithm).
    CompressedData,
    /// Raw macOS resource-fork bytes.
    MacosForkData,
    /// 32-byte Finder info payload.
    HfsAttributes,
    /// One member of the opaque, per-platform ACL family (1000-1014).
    Acl(u16),
    /// One member of the opaque, per-platform xattr family (1900-1907).
    Xattr(u16),
    /// A code outside the known set; counted and ignored per job kind.
    Unknown(i32),
}

const UNIX_ATTRIBUTES: i32 = 1;
const FILE_DATA: i32 = 2;
const MD5_DIGEST: i32 = 3;
const SHA1_DIGEST: i32 = 4;
const SPARSE_DATA: i32 = 11;
const GZIP_DATA: i32 = 12;
const SPARSE_GZIP_DATA: i32 = 13;
const PROGRAM_NAMES: i32 = 14;
const PROGRAM_DATA: i32 = 15;
const UNIX_ATTRIBUTES_EX: i32 = 16;
const PLUGIN_NAME: i32 = 17;
const RESTORE_OBJECT: i32 = 19;
const ENCRYPTED_SESSION_DATA: i32 = 21;
const ENCRYPTED_FILE_DATA: i32 = 22;
const ENCRYPTED_GZIP_FILE_DATA: i32 = 23;
const SIGNED_DIGEST: i32 = 24;
const COMPRESSED_DATA: i32 = 26;
const SHA256_DIGEST: i32 = 27;
const SHA512_DIGEST: i32 = 28;
const MACOS_FORK_DATA: i32 = 30;
const HFS_ATTRIBUTES: i32 = 31;
const ACL_FAMILY_START: i32 = 1000;
const ACL_FAMILY_END: i32 = 1014;
const XATTR_FAMILY_START: i32 = 1900;
const XATTR_FAMILY_END: i32 = 1907;

impl StreamType {
    /// Recovers the stream type from its numeric wire code. Codes outside
    /// the enumeration (including the ACL/xattr family ranges) map into
    /// [`StreamType::Unknown`] or their family variant; nothing is fatal.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            UNIX_ATTRIBUTES => Self::UnixAttributes,
            FILE_DATA => Self::FileData,
            MD5_DIGEST => Self::Md5Digest,
            SHA1_DIGEST => Self::Sha1Digest,
            SHA256_DIGEST => Self::Sha256Digest,
            SHA512_DIGEST => Self::Sha512Digest,
            SPARSE_DATA => Self::SparseData,
            GZIP_DATA => Self::GzipData,
            SPARSE_GZIP_DATA => Self::SparseGzipData,
            PROGRAM_NAMES => Self::ProgramNames,
            PROGRAM_DATA => Self::ProgramData,
            UNIX_ATTRIBUTES_EX => Self::UnixAttributesEx,
            PLUGIN_NAME => Self::PluginName,
            RESTORE_OBJECT => Self::RestoreObject,
            ENCRYPTED_SESSION_DATA => Self::EncryptedSessionData,
            ENCRYPTED_FILE_DATA => Self::EncryptedFileData,
            ENCRYPTED_GZIP_FILE_DATA => Self::EncryptedGzipFileData,
            SIGNED_DIGEST => Self::SignedDigest,
            COMPRESSED_DATA => Self::CompressedData,
            MACOS_FORK_DATA => Self::MacosForkData,
            HFS_ATTRIBUTES => Self::HfsAttributes,
            ACL_FAMILY_START..=ACL_FAMILY_END => Self::Acl(code as u16),
            XATTR_FAMILY_START..=XATTR_FAMILY_END => Self::Xattr(code as u16),
            other => Self::Unknown(other),
        }
    }

    /// The numeric wire code for this stream type.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::UnixAttributes => UNIX_ATTRIBUTES,
            Self::FileData => FILE_DATA,
            Self::Md5Digest => MD5_DIGEST,
            Self::Sha1Digest => SHA1_DIGEST,
            Self::Sha256Digest => SHA256_DIGEST,
            Self::Sha512Digest => SHA512_DIGEST,
            Self::SparseData => SPARSE_DATA,
            Self::GzipData => GZIP_DATA,
            Self::SparseGzipData => SPARSE_GZIP_DATA,
            Self::ProgramNames => PROGRAM_NAMES,
            Self::ProgramData => PROGRAM_DATA,
            Self::UnixAttributesEx => UNIX_ATTRIBUTES_EX,
            Self::PluginName => PLUGIN_NAME,
            Self::RestoreObject => RESTORE_OBJECT,
            Self::EncryptedSessionData => ENCRYPTED_SESSION_DATA,
            Self::EncryptedFileData => ENCRYPTED_FILE_DATA,
            Self::EncryptedGzipFileData => ENCRYPTED_GZIP_FILE_DATA,
            Self::SignedDigest => SIGNED_DIGEST,
            Self::CompressedData => COMPRESSED_DATA,
            Self::MacosForkData => MACOS_FORK_DATA,
            Self::HfsAttributes => HFS_ATTRIBUTES,
            Self::Acl(id) => id as i32,
            Self::Xattr(id) => id as i32,
            Self::Unknown(code) => code,
        }
    }

    /// Whether this is a content-digest stream (MD5/SHA1/SHA256/SHA512),
    /// as opposed to the signing digest.
    #[must_use]
    pub const fn is_content_digest(self) -> bool {
        matches!(
            self,
            Self::Md5Digest | Self::Sha1Digest | Self::Sha256Digest | Self::Sha512Digest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normative_codes_round_trip() {
        for (expected_code, variant) in [
            (1, StreamType::UnixAttributes),
            (2, StreamType::FileData),
            (3, StreamType::Md5Digest),
            (4, StreamType::Sha1Digest),
            (11, StreamType::SparseData),
            (12, StreamType::GzipData),
            (13, StreamType::SparseGzipData),
            (16, StreamType::UnixAttributesEx),
            (17, StreamType::PluginName),
            (19, StreamType::RestoreObject),
            (21, StreamType::EncryptedSessionData),
            (22, StreamType::EncryptedFileData),
            (23, StreamType::EncryptedGzipFileData),
            (24, StreamType::SignedDigest),
            (26, StreamType::CompressedData),
            (30, StreamType::MacosForkData),
            (31, StreamType::HfsAttributes),
        ] {
            assert_eq!(variant.code(), expected_code);
            assert_eq!(StreamType::from_code(expected_code), variant);
        }
    }

    #[test]
    fn acl_and_xattr_families_map_to_their_variant() {
        assert_eq!(StreamType::from_code(1005), StreamType::Acl(1005));
        assert_eq!(StreamType::from_code(1903), StreamType::Xattr(1903));
    }

    #[test]
    fn codes_outside_every_range_are_unknown() {
        assert_eq!(StreamType::from_code(9999), StreamType::Unknown(9999));
    }
}
