#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::undocumented_unsafe_blocks)]
#![doc = include_str!("../README.md")]

use std::io;
use std::path::Path;

#[cfg(not(unix))]
type ModeType = libc::c_uint;
#[cfg(not(unix))]
type DeviceType = libc::c_uint;

#[cfg(unix)]
mod unix {
    use super::{Path, io};
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    fn path_to_c(path: &Path) -> io::Result<CString> {
        CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains interior NUL"))
    }

    pub(super) fn mkfifo(path: &Path, mode: libc::mode_t) -> io::Result<()> {
        let c_path = path_to_c(path)?;
        // SAFETY: `c_path` is a valid, NUL-terminated representation of `path`.
        let result = unsafe { libc::mkfifo(c_path.as_ptr(), mode) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    pub(super) fn mknod(path: &Path, mode: libc::mode_t, device: libc::dev_t) -> io::Result<()> {
        let c_path = path_to_c(path)?;
        // SAFETY: `c_path` is a valid, NUL-terminated representation of `path`.
        let result = unsafe { libc::mknod(c_path.as_ptr(), mode, device) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

#[cfg(unix)]
#[cfg_attr(docsrs, doc(cfg(unix)))]
/// Creates a FIFO special file at `path` using the requested `mode`.
///
/// The helper mirrors the behaviour of `mkfifo(3)` and is only available on
/// Unix platforms. The function returns an error when the path cannot be
/// represented as a C string or when the underlying syscall fails.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if the provided path contains an
/// interior NUL byte. Other error kinds bubble up from the `mkfifo(3)` call,
/// such as [`io::ErrorKind::AlreadyExists`] or [`io::ErrorKind::PermissionDenied`].
///
/// # Examples
///
/// ```rust
/// # #[cfg(unix)] {
/// use std::env;
/// use std::fs;
/// use std::os::unix::fs::FileTypeExt;
/// use std::time::{SystemTime, UNIX_EPOCH};
///
/// let unique = SystemTime::now()
///     .duration_since(UNIX_EPOCH)
///     .unwrap()
///     .as_nanos();
/// let path = env::temp_dir().join(format!("rsync_fifo_{unique}"));
/// # let _ = fs::remove_file(&path);
/// apple_fs::mkfifo(&path, 0o600).unwrap();
/// let metadata = fs::metadata(&path).unwrap();
/// assert!(metadata.file_type().is_fifo());
/// fs::remove_file(&path).unwrap();
/// # }
/// ```
pub fn mkfifo(path: &Path, mode: libc::mode_t) -> io::Result<()> {
    unix::mkfifo(path, mode)
}

#[cfg(unix)]
#[cfg_attr(docsrs, doc(cfg(unix)))]
/// Creates a filesystem node at `path` with the supplied `mode` and `device`.
///
/// This wrapper exposes the subset of `mknod(2)` used by the rsync
/// implementation. Passing `libc::S_IFIFO` as the mode creates a named pipe.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if the path cannot be converted to a
/// C string. Other failures surface directly from the `mknod(2)` syscall.
///
/// # Examples
///
/// ```rust
/// # #[cfg(unix)] {
/// use std::env;
/// use std::fs;
/// use std::os::unix::fs::FileTypeExt;
/// use std::time::{SystemTime, UNIX_EPOCH};
///
/// let unique = SystemTime::now()
///     .duration_since(UNIX_EPOCH)
///     .unwrap()
///     .as_nanos();
/// let path = env::temp_dir().join(format!("rsync_mknod_{unique}"));
/// # let _ = fs::remove_file(&path);
/// apple_fs::mknod(&path, libc::S_IFIFO | 0o600, 0).unwrap();
/// let metadata = fs::metadata(&path).unwrap();
/// assert!(metadata.file_type().is_fifo());
/// fs::remove_file(&path).unwrap();
/// # }
/// ```
pub fn mknod(path: &Path, mode: libc::mode_t, device: libc::dev_t) -> io::Result<()> {
    unix::mknod(path, mode, device)
}

#[cfg(not(unix))]
/// Stub implementation that reports the lack of FIFO support on non-Unix
/// platforms.
///
/// # Errors
///
/// Always returns an [`io::ErrorKind::Unsupported`] error to mirror the
/// behaviour of upstream rsync on unsupported targets.
pub fn mkfifo(_path: &Path, _mode: ModeType) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "mkfifo is only implemented on Unix platforms",
    ))
}

#[cfg(not(unix))]
/// Stub implementation that reports the lack of `mknod` support on non-Unix
/// platforms.
///
/// # Errors
///
/// Always returns an [`io::ErrorKind::Unsupported`] error.
pub fn mknod(_path: &Path, _mode: ModeType, _device: DeviceType) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "mknod is only implemented on Unix platforms",
    ))
}

/// The extended attribute name macOS uses to expose a file's Finder info.
#[cfg(target_os = "macos")]
const FINDER_INFO_XATTR: &str = "com.apple.FinderInfo";

/// The extended attribute name macOS uses to expose a file's resource
/// fork.
#[cfg(target_os = "macos")]
const RESOURCE_FORK_XATTR: &str = "com.apple.ResourceFork";

/// Reads the 32-byte Finder-info blob for `path`.
///
/// # Errors
///
/// Returns an error if the attribute is absent, could not be read, or is
/// not exactly 32 bytes.
#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
pub fn read_finder_info(path: &Path) -> io::Result<[u8; 32]> {
    let raw = xattr::get(path, FINDER_INFO_XATTR)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no Finder info present"))?;
    raw.try_into()
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "Finder info was not 32 bytes"))
}

/// Writes a 32-byte Finder-info blob to `path`.
///
/// # Errors
///
/// Returns an error if the underlying `setxattr(2)` call failed.
#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
pub fn write_finder_info(path: &Path, info: &[u8; 32]) -> io::Result<()> {
    xattr::set(path, FINDER_INFO_XATTR, info)
}

/// Reads the resource fork for `path`, or an empty vector if it has none.
///
/// # Errors
///
/// Returns an error if the underlying `getxattr(2)` call failed for a
/// reason other than the attribute being absent.
#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
pub fn read_resource_fork(path: &Path) -> io::Result<Vec<u8>> {
    Ok(xattr::get(path, RESOURCE_FORK_XATTR)?.unwrap_or_default())
}

/// Writes `data` as `path`'s resource fork.
///
/// # Errors
///
/// Returns an error if the underlying `setxattr(2)` call failed.
#[cfg(target_os = "macos")]
#[cfg_attr(docsrs, doc(cfg(target_os = "macos")))]
pub fn write_resource_fork(path: &Path, data: &[u8]) -> io::Result<()> {
    xattr::set(path, RESOURCE_FORK_XATTR, data)
}
