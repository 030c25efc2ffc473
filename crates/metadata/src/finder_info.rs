//! Finder-info and resource-fork handling (§4.4 step 8, §4.5 Mac-fork and
//! Finder-info records, §6 stream ids 30/31).

/// The fixed-size Finder-info payload carried by the `hfs-attributes`
/// stream.
pub const FINDER_INFO_LEN: usize = 32;

/// Reads the 32-byte Finder-info blob for `path` on Darwin hosts.
///
/// # Errors
///
/// Returns an I/O error if the underlying extended attribute could not
/// be read.
#[cfg(target_os = "macos")]
pub fn read_finder_info(path: &std::path::Path) -> std::io::Result<[u8; FINDER_INFO_LEN]> {
    apple_fs::read_finder_info(path)
}

/// Applies a 32-byte Finder-info blob to `path` on Darwin hosts.
///
/// # Errors
///
/// Returns an I/O error if the underlying extended attribute could not
/// be written.
#[cfg(target_os = "macos")]
pub fn apply_finder_info(path: &std::path::Path, info: &[u8; FINDER_INFO_LEN]) -> std::io::Result<()> {
    apple_fs::write_finder_info(path, info)
}

/// Non-Darwin hosts never emit or expect Finder-info streams (§4.4 step 8
/// is gated on "Darwin hosts").
#[cfg(not(target_os = "macos"))]
pub fn read_finder_info(_path: &std::path::Path) -> std::io::Result<[u8; FINDER_INFO_LEN]> {
    Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "Finder info is Darwin-only"))
}

#[cfg(not(target_os = "macos"))]
/// See [`read_finder_info`]; applying is equally unsupported off Darwin.
pub fn apply_finder_info(_path: &std::path::Path, _info: &[u8; FINDER_INFO_LEN]) -> std::io::Result<()> {
    Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "Finder info is Darwin-only"))
}

/// Reads the resource fork for `path` on Darwin hosts, or an empty
/// vector if it has none.
///
/// # Errors
///
/// Returns an I/O error if the underlying extended attribute could not
/// be read.
#[cfg(target_os = "macos")]
pub fn read_resource_fork(path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    apple_fs::read_resource_fork(path)
}

/// Writes `data` as `path`'s resource fork on Darwin hosts.
///
/// # Errors
///
/// Returns an I/O error if the underlying extended attribute could not
/// be written.
#[cfg(target_os = "macos")]
pub fn write_resource_fork(path: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
    apple_fs::write_resource_fork(path, data)
}

#[cfg(not(target_os = "macos"))]
/// See [`read_resource_fork`]; resource forks do not exist off Darwin.
pub fn read_resource_fork(_path: &std::path::Path) -> std::io::Result<Vec<u8>> {
    Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "resource forks are Darwin-only"))
}

#[cfg(not(target_os = "macos"))]
/// See [`write_resource_fork`]; resource forks do not exist off Darwin.
pub fn write_resource_fork(_path: &std::path::Path, _data: &[u8]) -> std::io::Result<()> {
    Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "resource forks are Darwin-only"))
}
