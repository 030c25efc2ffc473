//! Turns a committed fileset into the ordered [`FileEntry`] sequence the
//! backup orchestrator consumes, by actually walking local disk (§4.7's
//! parser explicitly defers this to "the walker, out of this crate's
//! scope" — this is that walker).

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use fd_core::file_type::FileType;
use fd_core::stat::FileStat;
use filters::fileset::{EntryKind, Fileset, Pattern};
use filters::matcher::FilesetMatcher;
use orchestrator::packet::FileEntry;

/// Walks every root named by a top-level `F` literal in an include entry,
/// classifying and stat'ing each visited path against the compiled
/// matcher. Roots that resolve to a single file (not a directory) are
/// included as-is without a walk.
///
/// Hard links are resolved against entries already visited earlier in
/// this same walk: a later path sharing an already-seen `(dev, ino)`
/// pair is classified [`FileType::HardLinkSaved`] rather than re-read.
#[must_use]
pub fn walk(fileset: &Fileset, matcher: &FilesetMatcher) -> Vec<FileEntry> {
    let mut seen_inodes: HashMap<(u64, u64), String> = HashMap::new();
    let mut entries = Vec::new();

    for root in include_roots(fileset) {
        for dir_entry in jwalk::WalkDir::new(root.as_str()).sort(true) {
            let Ok(dir_entry) = dir_entry else { continue };
            let path = dir_entry.path();
            let Some(path_str) = path.to_str() else { continue };
            let is_dir = dir_entry.file_type().is_dir();

            let Some(options) = matcher.classify(path_str, is_dir) else {
                continue;
            };

            let Ok(metadata) = fs::symlink_metadata(&path) else {
                entries.push(no_access_entry(path_str));
                continue;
            };

            let entry = classify(path_str, &path, &metadata, options.clone(), &mut seen_inodes);
            entries.push(entry);
        }
    }
    entries
}

fn include_roots(fileset: &Fileset) -> Vec<String> {
    let mut roots = Vec::new();
    for entry in &fileset.entries {
        if entry.kind != Some(EntryKind::Include) {
            continue;
        }
        for pattern in &entry.patterns {
            if let Pattern::Literal(path) = pattern {
                roots.push(path.clone());
            }
        }
    }
    roots
}

fn no_access_entry(path: &str) -> FileEntry {
    FileEntry {
        path: path.to_string(),
        file_type: FileType::NoAccess,
        stat: FileStat::default(),
        link_target: None,
        delta_sequence: 0,
        options: filters::option::OptionBlock::default(),
        hard_link_digest: None,
    }
}

fn classify(
    path_str: &str,
    path: &Path,
    metadata: &fs::Metadata,
    options: filters::option::OptionBlock,
    seen_inodes: &mut HashMap<(u64, u64), String>,
) -> FileEntry {
    let stat = stat_from_metadata(metadata);
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(path).ok().and_then(|t| t.to_str().map(str::to_string));
        return FileEntry {
            path: path_str.to_string(),
            file_type: FileType::Symlink,
            stat,
            link_target: target,
            delta_sequence: 0,
            options,
            hard_link_digest: None,
        };
    }

    if file_type.is_dir() {
        return FileEntry {
            path: path_str.to_string(),
            file_type: FileType::DirectoryBegin,
            stat,
            link_target: None,
            delta_sequence: 0,
            options,
            hard_link_digest: None,
        };
    }

    let inode_key = (stat.dev, stat.ino);
    if metadata.nlink() > 1 {
        if let Some(existing) = seen_inodes.get(&inode_key) {
            return FileEntry {
                path: path_str.to_string(),
                file_type: FileType::HardLinkSaved,
                stat,
                link_target: Some(existing.clone()),
                delta_sequence: 0,
                options,
                hard_link_digest: None,
            };
        }
        seen_inodes.insert(inode_key, path_str.to_string());
    }

    if file_type.is_file() {
        let classification = if stat.size == 0 { FileType::EmptyRegular } else { FileType::Regular };
        return FileEntry {
            path: path_str.to_string(),
            file_type: classification,
            stat,
            link_target: None,
            delta_sequence: 0,
            options,
            hard_link_digest: None,
        };
    }

    FileEntry {
        path: path_str.to_string(),
        file_type: special_device_classification(metadata),
        stat,
        link_target: None,
        delta_sequence: 0,
        options,
        hard_link_digest: None,
    }
}

#[cfg(unix)]
fn special_device_classification(metadata: &fs::Metadata) -> FileType {
    use std::os::unix::fs::FileTypeExt;
    let file_type = metadata.file_type();
    if file_type.is_block_device() {
        FileType::BlockDevice
    } else if file_type.is_char_device() {
        FileType::CharDevice
    } else if file_type.is_fifo() {
        FileType::Fifo
    } else {
        FileType::Socket
    }
}

fn stat_from_metadata(metadata: &fs::Metadata) -> FileStat {
    FileStat {
        dev: metadata.dev(),
        ino: metadata.ino(),
        mode: metadata.mode(),
        nlink: metadata.nlink() as u32,
        uid: metadata.uid(),
        gid: metadata.gid(),
        rdev: metadata.rdev(),
        size: metadata.size(),
        atime: metadata.atime(),
        mtime: metadata.mtime(),
        ctime: metadata.ctime(),
    }
}
