//! Filesystem `stat`/`lstat` collection, bridging to `fd_core::stat::FileStat`.

use std::path::Path;

use fd_core::stat::FileStat;
use thiserror::Error;

/// A `stat`/`lstat` call failed.
#[derive(Debug, Error)]
#[error("failed to stat {path}: {source}")]
pub struct StatError {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
}

/// Collects `lstat`-equivalent metadata for `path`, never following a
/// trailing symlink.
///
/// # Errors
///
/// Returns [`StatError`] if the underlying system call failed.
#[cfg(unix)]
pub fn collect(path: &Path) -> Result<FileStat, StatError> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| StatError {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path contains interior NUL"),
    })?;
    let mut raw = MaybeUninit::<libc::stat>::uninit();

    #[allow(unsafe_code)]
    // SAFETY: `c_path` is a valid, NUL-terminated C string for the
    // lifetime of this call, and `raw` is a suitably sized, writable
    // buffer for `lstat` to populate.
    let result = unsafe { libc::lstat(c_path.as_ptr(), raw.as_mut_ptr()) };
    if result != 0 {
        return Err(StatError {
            path: path.to_path_buf(),
            source: std::io::Error::last_os_error(),
        });
    }

    #[allow(unsafe_code)]
    // SAFETY: `lstat` returned success, so `raw` was fully initialized.
    let raw = unsafe { raw.assume_init() };

    Ok(FileStat {
        dev: raw.st_dev as u64,
        ino: raw.st_ino,
        mode: raw.st_mode,
        nlink: raw.st_nlink as u32,
        uid: raw.st_uid,
        gid: raw.st_gid,
        rdev: raw.st_rdev as u64,
        size: raw.st_size.max(0) as u64,
        atime: raw.st_atime,
        mtime: raw.st_mtime,
        ctime: raw.st_ctime,
    })
}

/// Non-Unix `stat` collection is not yet implemented; the core's file
/// classification (§4.4 step 1) depends on Unix-shaped mode bits that a
/// faithful Windows backend would need to synthesize separately.
#[cfg(not(unix))]
pub fn collect(path: &Path) -> Result<FileStat, StatError> {
    Err(StatError {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::Unsupported, "unsupported platform"),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn collects_a_regular_files_stat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"hello").unwrap();

        let stat = collect(&path).unwrap();
        assert_eq!(stat.size, 5);
        assert!(stat.mode & libc::S_IFREG as u32 == libc::S_IFREG as u32);
    }

    #[test]
    fn missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(collect(&dir.path().join("missing")).is_err());
    }
}
