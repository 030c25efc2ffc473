//! A fake fileset iterator: a fixed, ordered list of
//! `orchestrator::packet::FileEntry` values, so tests can drive
//! `BackupOrchestrator` without a real fileset walk.

use fd_core::file_type::FileType;
use fd_core::stat::FileStat;
use filters::option::OptionBlock;
use orchestrator::packet::FileEntry;

/// Builds a [`FileEntry`] with sensible defaults, overridden one field at
/// a time, matching the builder style already used by this workspace's
/// other fixture-heavy crates.
pub struct FileEntryBuilder {
    entry: FileEntry,
}

impl FileEntryBuilder {
    /// Starts building a regular file entry at `path` with the given size.
    #[must_use]
    pub fn regular(path: &str, size: u64) -> Self {
        Self {
            entry: FileEntry {
                path: path.to_string(),
                file_type: if size == 0 { FileType::EmptyRegular } else { FileType::Regular },
                stat: FileStat {
                    size,
                    mode: 0o100_644,
                    nlink: 1,
                    ..FileStat::default()
                },
                link_target: None,
                delta_sequence: 0,
                options: OptionBlock::default(),
                hard_link_digest: None,
            },
        }
    }

    /// Starts building a symlink entry at `path` pointing at `target`.
    #[must_use]
    pub fn symlink(path: &str, target: &str) -> Self {
        Self {
            entry: FileEntry {
                path: path.to_string(),
                file_type: FileType::Symlink,
                stat: FileStat {
                    mode: 0o120_777,
                    nlink: 1,
                    ..FileStat::default()
                },
                link_target: Some(target.to_string()),
                delta_sequence: 0,
                options: OptionBlock::default(),
                hard_link_digest: None,
            },
        }
    }

    /// Starts building a directory entry at `path`.
    #[must_use]
    pub fn directory(path: &str) -> Self {
        Self {
            entry: FileEntry {
                path: path.to_string(),
                file_type: FileType::DirectoryBegin,
                stat: FileStat {
                    mode: 0o040_755,
                    nlink: 2,
                    ..FileStat::default()
                },
                link_target: None,
                delta_sequence: 0,
                options: OptionBlock::default(),
                hard_link_digest: None,
            },
        }
    }

    /// Overrides the option block carried with this entry.
    #[must_use]
    pub fn with_options(mut self, options: OptionBlock) -> Self {
        self.entry.options = options;
        self
    }

    /// Finishes building.
    #[must_use]
    pub fn build(self) -> FileEntry {
        self.entry
    }
}

/// An ordered, fixed list of fileset entries, standing in for a real
/// recursive directory walk.
#[derive(Default)]
pub struct FakeFileset {
    entries: Vec<FileEntry>,
}

impl FakeFileset {
    /// An empty fileset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry.
    #[must_use]
    pub fn with_entry(mut self, entry: FileEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Consumes the fileset, yielding its entries in the order they were
    /// added.
    #[must_use]
    pub fn into_entries(self) -> Vec<FileEntry> {
        self.entries
    }
}
