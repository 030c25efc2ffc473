//! Admin command dispatch (§4.6 supplement), grounded on `dir_cmd.c`'s
//! fixed command table and `status.c`'s report builder.
//!
//! `ready`-state commands are matched against a fixed `(verb, handler)`
//! table, the same shape the original source uses, rather than a
//! general-purpose command parser: the command set is closed and does not
//! grow at runtime.

use thiserror::Error;

/// A parsed admin command, as dispatched from [`crate::state::SessionState::Ready`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AdminCommand {
    /// `setdebug level=<n> [trace=<0|1>]`.
    SetDebug {
        /// The requested `tracing` debug level.
        level: u8,
        /// Whether to also enable call tracing.
        trace: bool,
    },
    /// `setbandwidth Job=<name> value=<bytes-per-second>`.
    SetBandwidth {
        /// The job the limit applies to.
        job_name: String,
        /// Bytes per second, or `0` for unlimited.
        bytes_per_second: u64,
    },
    /// `setauthorization Job=<name> Authorization=<token>`.
    SetAuthorization {
        /// The job the Storage-Daemon authorization applies to.
        job_name: String,
        /// The authorization token.
        authorization: String,
    },
    /// `resolve <hostname>`.
    Resolve {
        /// The hostname to resolve.
        hostname: String,
    },
    /// `status`: human-readable report.
    Status,
    /// `.status [api]`: report in human-readable or machine-readable form.
    DotStatus {
        /// Whether the `api` qualifier selected machine-readable output.
        api: bool,
    },
    /// `sm_dump`: memory allocator debug dump.
    SmDump,
    /// `cancel Job=<name>`.
    Cancel {
        /// The job to cancel.
        job_name: String,
    },
}

impl AdminCommand {
    /// Whether a monitor-role Director may invoke this command. Per §4.6,
    /// monitor directors may only ever request a status report.
    #[must_use]
    pub const fn allowed_for_monitor(&self) -> bool {
        matches!(self, Self::Status | Self::DotStatus { .. })
    }
}

/// An admin command line did not match any entry in the command table.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum AdminCommandError {
    /// The first token was not a recognized verb.
    #[error("unrecognized admin command: {0}")]
    UnknownVerb(String),
    /// The verb was recognized but a required argument was missing or
    /// malformed.
    #[error("malformed arguments for {verb}: {detail}")]
    MalformedArguments {
        /// The recognized verb.
        verb: String,
        /// What was wrong with the arguments.
        detail: String,
    },
}

/// Parses one admin command line against the fixed verb table.
///
/// # Errors
///
/// Returns [`AdminCommandError`] if the line's verb is unrecognized or its
/// required arguments are missing.
pub fn parse_admin_command(line: &str) -> Result<AdminCommand, AdminCommandError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().unwrap_or("").to_string();
    let rest: Vec<&str> = tokens.collect();
    let kv = |key: &str| -> Option<String> {
        rest.iter()
            .find_map(|token| token.strip_prefix(&format!("{key}=")).map(str::to_string))
    };

    match verb.as_str() {
        "setdebug" => {
            let level: u8 = kv("level")
                .ok_or_else(|| malformed(&verb, "missing level="))?
                .parse()
                .map_err(|_| malformed(&verb, "level= is not a number"))?;
            let trace = kv("trace").as_deref() == Some("1");
            Ok(AdminCommand::SetDebug { level, trace })
        }
        "setbandwidth" => {
            let job_name = kv("Job").ok_or_else(|| malformed(&verb, "missing Job="))?;
            let bytes_per_second: u64 = kv("value")
                .ok_or_else(|| malformed(&verb, "missing value="))?
                .parse()
                .map_err(|_| malformed(&verb, "value= is not a number"))?;
            Ok(AdminCommand::SetBandwidth {
                job_name,
                bytes_per_second,
            })
        }
        "setauthorization" => {
            let job_name = kv("Job").ok_or_else(|| malformed(&verb, "missing Job="))?;
            let authorization = kv("Authorization").ok_or_else(|| malformed(&verb, "missing Authorization="))?;
            Ok(AdminCommand::SetAuthorization {
                job_name,
                authorization,
            })
        }
        "resolve" => {
            let hostname = rest.first().ok_or_else(|| malformed(&verb, "missing hostname"))?.to_string();
            Ok(AdminCommand::Resolve { hostname })
        }
        "status" => Ok(AdminCommand::Status),
        ".status" => Ok(AdminCommand::DotStatus {
            api: rest.first().copied() == Some("api"),
        }),
        "sm_dump" => Ok(AdminCommand::SmDump),
        "cancel" => {
            let job_name = kv("Job").ok_or_else(|| malformed(&verb, "missing Job="))?;
            Ok(AdminCommand::Cancel { job_name })
        }
        other => Err(AdminCommandError::UnknownVerb(other.to_string())),
    }
}

fn malformed(verb: &str, detail: &str) -> AdminCommandError {
    AdminCommandError::MalformedArguments {
        verb: verb.to_string(),
        detail: detail.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_setdebug_with_trace() {
        let cmd = parse_admin_command("setdebug level=2 trace=1").unwrap();
        assert_eq!(cmd, AdminCommand::SetDebug { level: 2, trace: true });
    }

    #[test]
    fn parses_cancel() {
        let cmd = parse_admin_command("cancel Job=nightly-backup").unwrap();
        assert_eq!(
            cmd,
            AdminCommand::Cancel {
                job_name: "nightly-backup".to_string()
            }
        );
    }

    #[test]
    fn dot_status_detects_api_qualifier() {
        assert_eq!(parse_admin_command(".status api").unwrap(), AdminCommand::DotStatus { api: true });
        assert_eq!(parse_admin_command(".status").unwrap(), AdminCommand::DotStatus { api: false });
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert_eq!(
            parse_admin_command("reload"),
            Err(AdminCommandError::UnknownVerb("reload".to_string()))
        );
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        assert!(matches!(
            parse_admin_command("setbandwidth Job=x"),
            Err(AdminCommandError::MalformedArguments { .. })
        ));
    }

    #[test]
    fn only_status_commands_are_allowed_for_monitor_directors() {
        assert!(AdminCommand::Status.allowed_for_monitor());
        assert!(AdminCommand::DotStatus { api: false }.allowed_for_monitor());
        assert!(!AdminCommand::SmDump.allowed_for_monitor());
        assert!(
            !AdminCommand::Cancel {
                job_name: "x".to_string()
            }
            .allowed_for_monitor()
        );
    }
}
