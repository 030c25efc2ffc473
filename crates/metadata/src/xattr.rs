//! Extended-attribute gather/apply (§4.4 step 9, §4.5 xattr records, §6
//! `xattr family` stream ids 1900–1907).

use std::path::Path;

use thiserror::Error;

/// One extended attribute, as gathered from or destined for the
/// filesystem.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XattrEntry {
    /// The attribute's namespaced name (e.g. `user.comment`).
    pub name: String,
    /// The attribute's raw value.
    pub value: Vec<u8>,
}

/// An xattr gather or apply operation failed.
#[derive(Debug, Error)]
#[error("xattr operation failed for {path}: {source}")]
pub struct XattrError {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
}

/// A platform-specific extended-attribute backend, kept behind a trait so
/// the orchestrators depend only on this capability, not a concrete OS
/// implementation (§9, "no base class required" generalized to traits).
pub trait XattrBackend {
    /// Lists every extended attribute on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`XattrError`] if the listing could not be gathered; the
    /// orchestrator treats this as a soft, per-kind-counted error
    /// (§4.4, §7 kind 3).
    fn gather(&self, path: &Path) -> Result<Vec<XattrEntry>, XattrError>;

    /// Applies `entries` to `path`, replacing any existing values with
    /// matching names.
    ///
    /// # Errors
    ///
    /// Returns [`XattrError`] if an attribute could not be set.
    fn apply(&self, path: &Path, entries: &[XattrEntry]) -> Result<(), XattrError>;
}

/// The Unix extended-attribute backend, built on `getxattr(2)`/
/// `setxattr(2)` via the `xattr` crate.
#[cfg(all(unix, feature = "xattr"))]
#[derive(Debug, Default)]
pub struct UnixXattrBackend;

#[cfg(all(unix, feature = "xattr"))]
impl XattrBackend for UnixXattrBackend {
    fn gather(&self, path: &Path) -> Result<Vec<XattrEntry>, XattrError> {
        let names = xattr::list(path).map_err(|source| XattrError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut entries = Vec::new();
        for name in names {
            let value = xattr::get(path, &name)
                .map_err(|source| XattrError {
                    path: path.to_path_buf(),
                    source,
                })?
                .unwrap_or_default();
            entries.push(XattrEntry {
                name: name.to_string_lossy().into_owned(),
                value,
            });
        }
        Ok(entries)
    }

    fn apply(&self, path: &Path, entries: &[XattrEntry]) -> Result<(), XattrError> {
        for entry in entries {
            xattr::set(path, &entry.name, &entry.value).map_err(|source| XattrError {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(all(test, unix, feature = "xattr"))]
mod tests {
    use super::*;

    #[test]
    fn apply_then_gather_round_trips_a_user_attribute() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"data").unwrap();

        let backend = UnixXattrBackend;
        let entries = vec![XattrEntry {
            name: "user.example".to_string(),
            value: b"value".to_vec(),
        }];
        if backend.apply(&path, &entries).is_err() {
            // Some CI filesystems (tmpfs without xattr support) reject
            // this; the contract under test is round-tripping, not
            // filesystem capability.
            return;
        }
        let gathered = backend.gather(&path).unwrap();
        assert!(gathered.iter().any(|e| e.name == "user.example" && e.value == b"value"));
    }
}
