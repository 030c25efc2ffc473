//! Configuration resource blocks (§6, §9 supplement), grounded on
//! `filed_conf.c`'s resource-table-driven parser.
//!
//! Rather than porting the original's reflection-like resource-item table,
//! this models the config dialect as a small recursive-descent parser over
//! `Name = value` directives inside `Block { ... }` groups, producing two
//! typed structs. Only the directives named in §6 are modeled; any other
//! directive inside a recognized block is preserved as an opaque string
//! rather than rejected, so a config file exercising director-only
//! directives still parses.

use std::collections::BTreeMap;

use thiserror::Error;

/// The client (`FileDaemon`) resource: the daemon's own identity and
/// operational settings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientResource {
    /// The daemon's configured name, used in PID/state file naming and
    /// status reports.
    pub name: Option<String>,
    /// Addresses to listen on.
    pub addresses: Vec<String>,
    /// The working directory for PID files, state files, and the
    /// accurate store's LMDB environments.
    pub working_directory: Option<String>,
    /// The plugin directory.
    pub plugin_directory: Option<String>,
    /// PKI key file paths (signing/sealing keys).
    pub pki_key_files: Vec<String>,
    /// Certificate file paths.
    pub certificate_files: Vec<String>,
    /// Maximum concurrent jobs this daemon will service.
    pub maximum_concurrent_jobs: Option<u32>,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval: Option<u32>,
    /// Network buffer size in bytes.
    pub network_buffer_size: Option<u32>,
    /// Directives this parser does not model, preserved verbatim.
    pub unrecognized: BTreeMap<String, String>,
}

/// One `Director` resource: one Director permitted to connect, and the
/// per-director settings that apply to its connections.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DirectorResource {
    /// The director's configured name, matched against its greeting.
    pub name: Option<String>,
    /// The shared password for the challenge/response exchange.
    pub password: Option<String>,
    /// Whether TLS is required for this director's connections.
    pub tls_required: bool,
    /// Whether this director is monitor-role (status-only, §4.6).
    pub monitor: bool,
    /// Directories this director's `resolve`/script commands may touch.
    pub allowed_script_dirs: Vec<String>,
    /// Job commands this director is permitted to issue.
    pub allowed_job_cmds: Vec<String>,
    /// Per-director bandwidth cap, bytes per second.
    pub maximum_bandwidth_per_job: Option<u64>,
    /// Directives this parser does not model, preserved verbatim.
    pub unrecognized: BTreeMap<String, String>,
}

/// The full parsed configuration: one client resource and its permitted
/// directors.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Configuration {
    /// The `FileDaemon { ... }` block.
    pub client: Option<ClientResource>,
    /// Every `Director { ... }` block, in file order.
    pub directors: Vec<DirectorResource>,
}

/// A configuration file failed to parse.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A `Block {` was opened but never closed with `}`.
    #[error("unterminated block starting at line {0}")]
    UnterminatedBlock(usize),
    /// A directive line outside of any block.
    #[error("directive outside any block at line {0}: {1}")]
    DirectiveOutsideBlock(usize, String),
    /// A line inside a block was neither a directive nor `}`.
    #[error("malformed line at line {0}: {1}")]
    Malformed(usize, String),
    /// More than one `FileDaemon` block was present.
    #[error("duplicate FileDaemon block at line {0}")]
    DuplicateClientBlock(usize),
    /// An unrecognized block type was opened (only `FileDaemon` and
    /// `Director` are modeled).
    #[error("unrecognized block type {0:?} at line {1}")]
    UnknownBlockKind(String, usize),
}

/// Parses the resource-block text format into a [`Configuration`].
///
/// # Errors
///
/// Returns [`ConfigError`] on any structural problem; unrecognized
/// directives inside a recognized block are not errors (they land in
/// `unrecognized`).
pub fn parse(text: &str) -> Result<Configuration, ConfigError> {
    let mut config = Configuration::default();
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));

    while let Some((line_no, line)) = lines.next() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(kind) = line.strip_suffix('{').map(str::trim) else {
            return Err(ConfigError::DirectiveOutsideBlock(line_no, line.to_string()));
        };
        let body = parse_block_body(&mut lines, line_no)?;
        match kind {
            "FileDaemon" => {
                if config.client.is_some() {
                    return Err(ConfigError::DuplicateClientBlock(line_no));
                }
                config.client = Some(client_resource_from(body));
            }
            "Director" => {
                config.directors.push(director_resource_from(body));
            }
            other => return Err(ConfigError::UnknownBlockKind(other.to_string(), line_no)),
        }
    }

    Ok(config)
}

fn parse_block_body(
    lines: &mut impl Iterator<Item = (usize, &str)>,
    opened_at: usize,
) -> Result<Vec<(String, String)>, ConfigError> {
    let mut directives = Vec::new();
    for (line_no, line) in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "}" {
            return Ok(directives);
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::Malformed(line_no, line.to_string()));
        };
        let key = key.trim().to_string();
        let value = value.trim().trim_matches('"').to_string();
        directives.push((key, value));
    }
    Err(ConfigError::UnterminatedBlock(opened_at))
}

fn client_resource_from(directives: Vec<(String, String)>) -> ClientResource {
    let mut out = ClientResource::default();
    for (key, value) in directives {
        match key.as_str() {
            "Name" => out.name = Some(value),
            "Address" => out.addresses.push(value),
            "WorkingDirectory" => out.working_directory = Some(value),
            "PluginDirectory" => out.plugin_directory = Some(value),
            "PkiKeyFile" => out.pki_key_files.push(value),
            "CertificateFile" => out.certificate_files.push(value),
            "MaximumConcurrentJobs" => out.maximum_concurrent_jobs = value.parse().ok(),
            "HeartbeatInterval" => out.heartbeat_interval = value.parse().ok(),
            "NetworkBufferSize" => out.network_buffer_size = value.parse().ok(),
            _ => {
                out.unrecognized.insert(key, value);
            }
        }
    }
    out
}

fn director_resource_from(directives: Vec<(String, String)>) -> DirectorResource {
    let mut out = DirectorResource::default();
    for (key, value) in directives {
        match key.as_str() {
            "Name" => out.name = Some(value),
            "Password" => out.password = Some(value),
            "TlsRequired" => out.tls_required = value.eq_ignore_ascii_case("yes"),
            "Monitor" => out.monitor = value.eq_ignore_ascii_case("yes"),
            "AllowedScriptDir" => out.allowed_script_dirs.push(value),
            "AllowedJobCmd" => out.allowed_job_cmds.push(value),
            "MaximumBandwidthPerJob" => out.maximum_bandwidth_per_job = value.parse().ok(),
            _ => {
                out.unrecognized.insert(key, value);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_client_and_director() {
        let text = r#"
            FileDaemon {
                Name = "backup-01-fd"
                WorkingDirectory = "/var/lib/filed"
                MaximumConcurrentJobs = 4
            }
            Director {
                Name = "main-dir"
                Password = "secret"
                Monitor = yes
            }
        "#;
        let config = parse(text).unwrap();
        let client = config.client.unwrap();
        assert_eq!(client.name, Some("backup-01-fd".to_string()));
        assert_eq!(client.maximum_concurrent_jobs, Some(4));
        assert_eq!(config.directors.len(), 1);
        assert!(config.directors[0].monitor);
        assert_eq!(config.directors[0].password.as_deref(), Some("secret"));
    }

    #[test]
    fn unrecognized_directives_are_preserved_not_rejected() {
        let text = r#"
            Director {
                Name = "main-dir"
                MaximumBandwidthPerJobSchedule = "xyz"
            }
        "#;
        let config = parse(text).unwrap();
        assert_eq!(
            config.directors[0].unrecognized.get("MaximumBandwidthPerJobSchedule").map(String::as_str),
            Some("xyz")
        );
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let text = "FileDaemon {\n  Name = \"x\"\n";
        assert_eq!(parse(text), Err(ConfigError::UnterminatedBlock(1)));
    }

    #[test]
    fn duplicate_client_block_is_rejected() {
        let text = "FileDaemon {\n}\nFileDaemon {\n}\n";
        assert_eq!(parse(text), Err(ConfigError::DuplicateClientBlock(3)));
    }

    #[test]
    fn unknown_block_kind_is_rejected() {
        let text = "StorageDaemon {\n}\n";
        assert_eq!(parse(text), Err(ConfigError::UnknownBlockKind("StorageDaemon".to_string(), 1)));
    }

    #[test]
    fn multiple_directors_are_all_retained_in_order() {
        let text = r#"
            Director { Name = "a" }
            Director { Name = "b" }
        "#;
        let config = parse(text).unwrap();
        let names: Vec<_> = config.directors.iter().map(|d| d.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }
}
