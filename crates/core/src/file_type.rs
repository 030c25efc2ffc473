//! File classification taxonomy (§4.4 step 1).
//!
//! Every entry the fileset iterator yields is classified exactly once;
//! the classification dictates which streams the backup orchestrator
//! emits and whether content is read at all.

/// The classification of one fileset entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FileType {
    /// A regular file with non-zero size.
    Regular,
    /// A regular file with zero size (no data streams are emitted).
    EmptyRegular,
    /// A symbolic link; the target is carried in the attributes record.
    Symlink,
    /// A hard link to a path already saved in this job; only the
    /// remembered digest is re-emitted, content is not re-read.
    HardLinkSaved,
    /// The start of a directory; its own attributes are emitted, its
    /// content streams are its children.
    DirectoryBegin,
    /// The end of a directory, when its attributes are finalized (ACL and
    /// xattr for directories apply inline at this point).
    DirectoryEnd,
    /// A Windows reparse point.
    ReparsePoint,
    /// A Windows junction.
    Junction,
    /// A block device.
    BlockDevice,
    /// A character device.
    CharDevice,
    /// A named pipe (FIFO); reads are bounded by a timer (§4.2 step 1).
    Fifo,
    /// A Unix domain socket; sockets are never backed up.
    Socket,
    /// The entry could not be accessed (permission denied).
    NoAccess,
    /// A symlink that should not be followed per fileset options.
    NoFollow,
    /// An entry that could not be `stat`-ed.
    NoStat,
    /// An entry unchanged per accurate-mode comparison; skipped.
    NoChange,
    /// An entry skipped because its archive bit was not set (Windows
    /// incremental semantics).
    ArchiveBit,
    /// An entry that could not be opened for reading.
    NoOpen,
    /// A path the accurate store believes existed but which the scan no
    /// longer found; emitted as a deleted-file summary record.
    Deleted,
    /// Out-of-band metadata from the Director, consumed but not written
    /// to disk on restore.
    RestoreObject,
    /// A plugin-command entry; content is produced/consumed by the
    /// plugin I/O vector instead of the filesystem.
    PluginConfig,
    /// A Full-level accurate-mode entry that matched the Director's
    /// prior state exactly; emitted as an attributes-only pointer to the
    /// earlier base job instead of re-reading and re-sending content.
    Base,
}

impl FileType {
    /// Whether this classification carries content data at all.
    #[must_use]
    pub const fn carries_data(self) -> bool {
        matches!(
            self,
            Self::Regular | Self::BlockDevice | Self::CharDevice | Self::Fifo | Self::ReparsePoint | Self::Junction
        )
    }

    /// Whether this classification is attributes-only (no data streams,
    /// but still emits exactly one attributes record).
    #[must_use]
    pub const fn attributes_only(self) -> bool {
        matches!(
            self,
            Self::EmptyRegular
                | Self::Symlink
                | Self::HardLinkSaved
                | Self::DirectoryBegin
                | Self::DirectoryEnd
                | Self::NoChange
                | Self::Deleted
                | Self::Base
        )
    }

    /// Whether this classification is entirely skipped: no record of any
    /// kind is emitted for it.
    #[must_use]
    pub const fn is_skipped(self) -> bool {
        matches!(
            self,
            Self::Socket | Self::NoAccess | Self::NoFollow | Self::NoStat | Self::ArchiveBit | Self::NoOpen
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_carries_data_and_is_not_skipped() {
        assert!(FileType::Regular.carries_data());
        assert!(!FileType::Regular.is_skipped());
        assert!(!FileType::Regular.attributes_only());
    }

    #[test]
    fn socket_is_skipped_and_carries_no_data() {
        assert!(FileType::Socket.is_skipped());
        assert!(!FileType::Socket.carries_data());
    }

    #[test]
    fn empty_regular_is_attributes_only() {
        assert!(FileType::EmptyRegular.attributes_only());
        assert!(!FileType::EmptyRegular.carries_data());
    }
}
