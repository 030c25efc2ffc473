//! The real-filesystem [`BackupSource`]/[`RestoreSink`] implementation,
//! the disk-backed counterpart to `test-support::filesystem::FakeFilesystem`.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use orchestrator::packet::{BackupSource, RestoreSink};

/// Reads from and writes to the real filesystem, rooted at nothing in
/// particular — every path handed to it is used as-is, since the
/// fileset walker already resolved absolute paths.
#[derive(Debug, Default)]
pub struct DiskFilesystem;

impl BackupSource for DiskFilesystem {
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }
}

impl RestoreSink for DiskFilesystem {
    fn create(&self, path: &str) -> std::io::Result<Box<dyn Write>> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Box::new(File::create(path)?))
    }

    fn symlink(&self, path: &str, target: &str) -> std::io::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let _ = fs::remove_file(path);
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(target, path)
        }
        #[cfg(not(unix))]
        {
            let _ = target;
            Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "symlinks require a Unix target"))
        }
    }

    fn create_dir(&self, path: &str) -> std::io::Result<()> {
        fs::create_dir_all(path)
    }

    fn hard_link(&self, path: &str, existing: &str) -> std::io::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let _ = fs::remove_file(path);
        fs::hard_link(existing, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn round_trips_content_through_open_and_create() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.txt");
        fs::write(&source_path, b"hello disk").unwrap();

        let fs_impl = DiskFilesystem;
        let mut content = Vec::new();
        BackupSource::open(&fs_impl, source_path.to_str().unwrap())
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"hello disk");

        let dest_path = dir.path().join("nested").join("dest.txt");
        {
            let mut writer = RestoreSink::create(&fs_impl, dest_path.to_str().unwrap()).unwrap();
            writer.write_all(&content).unwrap();
        }
        assert_eq!(fs::read(&dest_path).unwrap(), b"hello disk");
    }

    #[test]
    fn creates_symlinks_and_hard_links() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target.txt");
        fs::write(&target, b"x").unwrap();

        let fs_impl = DiskFilesystem;
        let link_path = dir.path().join("link.txt");
        fs_impl.symlink(link_path.to_str().unwrap(), target.to_str().unwrap()).unwrap();
        assert_eq!(fs::read_link(&link_path).unwrap(), target);

        let hard_path = dir.path().join("hard.txt");
        fs_impl.hard_link(hard_path.to_str().unwrap(), target.to_str().unwrap()).unwrap();
        assert_eq!(fs::read(&hard_path).unwrap(), b"x");
    }
}
