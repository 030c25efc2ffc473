//! An in-memory filesystem implementing `orchestrator`'s
//! `BackupSource`/`RestoreSink` traits, so tests never need to touch real
//! disk for ordinary read/write fixtures.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::rc::Rc;

use orchestrator::packet::{BackupSource, RestoreSink};

/// An in-memory filesystem: a path-keyed map of file content, plus
/// separately-tracked symlinks, directories, and hard links, so tests can
/// assert on exactly what kind of entry was created at a path.
#[derive(Clone, Default)]
pub struct FakeFilesystem {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    symlinks: Rc<RefCell<HashMap<String, String>>>,
    hard_links: Rc<RefCell<HashMap<String, String>>>,
    directories: Rc<RefCell<Vec<String>>>,
}

impl FakeFilesystem {
    /// Creates an empty filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file's content before a backup walk reads it.
    pub fn put(&self, path: &str, content: Vec<u8>) {
        self.files.borrow_mut().insert(path.to_string(), content);
    }

    /// Returns a written file's content, if any.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    /// Returns a created symlink's target, if any.
    #[must_use]
    pub fn symlink_target(&self, path: &str) -> Option<String> {
        self.symlinks.borrow().get(path).cloned()
    }

    /// Returns a created hard link's source path, if any.
    #[must_use]
    pub fn hard_link_source(&self, path: &str) -> Option<String> {
        self.hard_links.borrow().get(path).cloned()
    }

    /// Whether a directory was created at `path`.
    #[must_use]
    pub fn has_directory(&self, path: &str) -> bool {
        self.directories.borrow().iter().any(|d| d == path)
    }
}

impl BackupSource for FakeFilesystem {
    fn open(&self, path: &str) -> io::Result<Box<dyn Read>> {
        let content = self
            .files
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))?;
        Ok(Box::new(Cursor::new(content)))
    }
}

struct FileWriter {
    path: String,
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
    buf: Vec<u8>,
}

impl Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for FileWriter {
    fn drop(&mut self) {
        self.files.borrow_mut().insert(std::mem::take(&mut self.path), std::mem::take(&mut self.buf));
    }
}

impl RestoreSink for FakeFilesystem {
    fn create(&self, path: &str) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(FileWriter {
            path: path.to_string(),
            files: Rc::clone(&self.files),
            buf: Vec::new(),
        }))
    }

    fn symlink(&self, path: &str, target: &str) -> io::Result<()> {
        self.symlinks.borrow_mut().insert(path.to_string(), target.to_string());
        Ok(())
    }

    fn create_dir(&self, path: &str) -> io::Result<()> {
        self.directories.borrow_mut().push(path.to_string());
        Ok(())
    }

    fn hard_link(&self, path: &str, existing: &str) -> io::Result<()> {
        self.hard_links.borrow_mut().insert(path.to_string(), existing.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_round_trip_through_open_and_create() {
        let fs = FakeFilesystem::new();
        fs.put("/a", b"hello".to_vec());
        let mut content = Vec::new();
        BackupSource::open(&fs, "/a").unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"hello");

        {
            let mut writer = RestoreSink::create(&fs, "/b").unwrap();
            writer.write_all(b"world").unwrap();
        }
        assert_eq!(fs.get("/b"), Some(b"world".to_vec()));
    }

    #[test]
    fn symlinks_and_hard_links_and_directories_are_tracked_separately() {
        let fs = FakeFilesystem::new();
        fs.symlink("/link", "/target").unwrap();
        fs.hard_link("/alias", "/original").unwrap();
        fs.create_dir("/dir").unwrap();

        assert_eq!(fs.symlink_target("/link"), Some("/target".to_string()));
        assert_eq!(fs.hard_link_source("/alias"), Some("/original".to_string()));
        assert!(fs.has_directory("/dir"));
        assert!(!fs.has_directory("/link"));
    }

    #[test]
    fn opening_a_missing_path_is_a_not_found_error() {
        let fs = FakeFilesystem::new();
        let error = BackupSource::open(&fs, "/missing").unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
    }
}
