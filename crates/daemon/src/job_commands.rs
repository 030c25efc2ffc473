//! The Director's job-lifecycle command-line language (§4.6, §6):
//! everything between `Hello` and `EndJob` that is not an admin command
//! (see [`crate::admin`]).

use fd_core::job::{JobLevel, JobType, VerifyLevel};
use thiserror::Error;
use wire::director::{JobIdLine, parse_job_id_line};

/// One parsed job-lifecycle command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JobCommand {
    /// The Director's opening greeting, naming itself.
    Hello {
        /// The Director's configured name.
        director_name: String,
    },
    /// `JobId=... Job=... SDid=... SDtime=... Authorization=...`.
    OpenJob {
        /// The Director-assigned job id.
        job_id: u32,
        /// The Director-assigned job name.
        job_name: String,
        /// The Storage-Daemon volume-session id.
        sd_id: i32,
        /// The Storage-Daemon volume-session time.
        sd_time: i32,
        /// The Storage-Daemon authorization key.
        authorization: String,
    },
    /// `level = <name> [since_time=<unix-seconds>]`.
    Level {
        /// The negotiated backup level.
        level: JobLevel,
        /// The since-time for `SinceTime`/incremental/differential levels.
        since_time: Option<i64>,
    },
    /// `storage address=<host> port=<port>`: where to connect for the
    /// Storage-Daemon channel.
    Storage {
        /// The Storage-Daemon's address.
        address: String,
        /// The Storage-Daemon's listening port.
        port: u16,
    },
    /// One line of the fileset definition (§4.7), forwarded verbatim to
    /// `filters::fileset::Fileset::apply_line`.
    FilesetLine {
        /// The raw line text.
        line: String,
    },
    /// `accurate files=<n>`: the Director is about to stream `n`
    /// prior-state records (§4.3) that must be ingested into the
    /// change-detection store before the fileset walk begins.
    Accurate {
        /// The number of prior-state records that follow.
        file_count: u32,
    },
    /// `run`: start the job's data-transfer phase.
    Run,
    /// `cancel`: the Director is canceling the current job.
    Cancel,
    /// `EndJob`: the Director is tearing down the session.
    EndJob,
}

/// A job-lifecycle command line did not parse.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum JobCommandError {
    /// The line's leading verb was not recognized.
    #[error("unrecognized job command: {0}")]
    UnknownVerb(String),
    /// A required field was missing or malformed.
    #[error("malformed {verb} command: {detail}")]
    Malformed {
        /// The verb that failed to parse.
        verb: String,
        /// What was wrong.
        detail: String,
    },
}

/// Parses one job-lifecycle command line.
///
/// # Errors
///
/// Returns [`JobCommandError`] if the line does not match a known verb or
/// a required field is missing.
pub fn parse_job_command(line: &str) -> Result<JobCommand, JobCommandError> {
    let trimmed = line.trim_end_matches(['\n', '\r']);
    if trimmed.starts_with("Hello") {
        return parse_hello(trimmed);
    }
    if trimmed.starts_with("JobId=") {
        return parse_open_job(trimmed);
    }
    if let Some(rest) = trimmed.strip_prefix("level") {
        return parse_level(rest);
    }
    if let Some(rest) = trimmed.strip_prefix("storage") {
        return parse_storage(rest);
    }
    if let Some(rest) = trimmed.strip_prefix("fileset") {
        return Ok(JobCommand::FilesetLine { line: rest.trim_start().to_string() });
    }
    if let Some(rest) = trimmed.strip_prefix("accurate") {
        return parse_accurate(rest);
    }
    match trimmed {
        "run" => Ok(JobCommand::Run),
        "cancel" => Ok(JobCommand::Cancel),
        "EndJob" => Ok(JobCommand::EndJob),
        other => Err(JobCommandError::UnknownVerb(other.to_string())),
    }
}

fn parse_hello(line: &str) -> Result<JobCommand, JobCommandError> {
    let director_name = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| malformed("Hello", "missing director name"))?
        .to_string();
    Ok(JobCommand::Hello { director_name })
}

fn parse_open_job(line: &str) -> Result<JobCommand, JobCommandError> {
    let JobIdLine {
        job_id,
        job_name,
        sd_id,
        sd_time,
        authorization,
    } = parse_job_id_line(line);
    Ok(JobCommand::OpenJob {
        job_id: job_id.ok_or_else(|| malformed("JobId", "missing JobId="))?,
        job_name: job_name.ok_or_else(|| malformed("JobId", "missing Job="))?,
        sd_id: sd_id.map_or(0, |v| v as i32),
        sd_time: sd_time.map_or(0, |v| v as i32),
        authorization: authorization.ok_or_else(|| malformed("JobId", "missing Authorization="))?,
    })
}

fn parse_level(rest: &str) -> Result<JobCommand, JobCommandError> {
    let rest = rest.trim_start().trim_start_matches('=').trim_start();
    let mut since_time = None;
    let mut level_name = rest;
    if let Some((name, tail)) = rest.split_once(' ') {
        level_name = name;
        for token in tail.split_whitespace() {
            if let Some(value) = token.strip_prefix("since_time=") {
                since_time = value.parse().ok();
            }
        }
    }
    let level = match level_name {
        "full" => JobLevel::Full,
        "differential" => JobLevel::Differential,
        "incremental" => JobLevel::Incremental,
        "base" => JobLevel::Base,
        "since_time" => JobLevel::SinceTime,
        "verify_catalog" => JobLevel::Verify(VerifyLevel::Catalog),
        "verify_volume" => JobLevel::Verify(VerifyLevel::Volume),
        "verify_init_catalog" => JobLevel::Verify(VerifyLevel::InitCatalog),
        other => return Err(malformed("level", &format!("unrecognized level {other:?}"))),
    };
    Ok(JobCommand::Level { level, since_time })
}

fn parse_storage(rest: &str) -> Result<JobCommand, JobCommandError> {
    let mut address = None;
    let mut port = None;
    for token in rest.split_whitespace() {
        if let Some(value) = token.strip_prefix("address=") {
            address = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("port=") {
            port = value.parse().ok();
        }
    }
    Ok(JobCommand::Storage {
        address: address.ok_or_else(|| malformed("storage", "missing address="))?,
        port: port.ok_or_else(|| malformed("storage", "missing or invalid port="))?,
    })
}

fn parse_accurate(rest: &str) -> Result<JobCommand, JobCommandError> {
    let file_count = rest
        .split_whitespace()
        .find_map(|token| token.strip_prefix("files="))
        .and_then(|value| value.parse().ok())
        .ok_or_else(|| malformed("accurate", "missing or invalid files="))?;
    Ok(JobCommand::Accurate { file_count })
}

fn malformed(verb: &str, detail: &str) -> JobCommandError {
    JobCommandError::Malformed {
        verb: verb.to_string(),
        detail: detail.to_string(),
    }
}

/// The job type implied by a negotiated level, when the Director has not
/// otherwise said `restore` or `verify` explicitly (§3: the FD infers
/// backup vs. restore from the command sequence, not a standalone field).
#[must_use]
pub const fn job_type_for_level(level: JobLevel) -> JobType {
    match level {
        JobLevel::Verify(_) => JobType::Verify,
        _ => JobType::Backup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello() {
        assert_eq!(
            parse_job_command("Hello my-director calling"),
            Ok(JobCommand::Hello { director_name: "my-director".to_string() })
        );
    }

    #[test]
    fn parses_open_job_line() {
        let cmd = parse_job_command("JobId=7 Job=nightly SDid=3 SDtime=99 Authorization=secret").unwrap();
        assert_eq!(
            cmd,
            JobCommand::OpenJob {
                job_id: 7,
                job_name: "nightly".to_string(),
                sd_id: 3,
                sd_time: 99,
                authorization: "secret".to_string(),
            }
        );
    }

    #[test]
    fn parses_level_with_since_time() {
        let cmd = parse_job_command("level = incremental since_time=1700000000").unwrap();
        assert_eq!(
            cmd,
            JobCommand::Level {
                level: JobLevel::Incremental,
                since_time: Some(1_700_000_000),
            }
        );
    }

    #[test]
    fn parses_storage_address_and_port() {
        let cmd = parse_job_command("storage address=10.0.0.5 port=9103").unwrap();
        assert_eq!(
            cmd,
            JobCommand::Storage {
                address: "10.0.0.5".to_string(),
                port: 9103,
            }
        );
    }

    #[test]
    fn fileset_lines_are_forwarded_verbatim() {
        let cmd = parse_job_command("fileset I").unwrap();
        assert_eq!(cmd, JobCommand::FilesetLine { line: "I".to_string() });
    }

    #[test]
    fn parses_accurate_file_count() {
        let cmd = parse_job_command("accurate files=42").unwrap();
        assert_eq!(cmd, JobCommand::Accurate { file_count: 42 });
    }

    #[test]
    fn unknown_verb_is_rejected() {
        assert!(matches!(parse_job_command("frobnicate"), Err(JobCommandError::UnknownVerb(_))));
    }

    #[test]
    fn job_type_inference_routes_verify_levels() {
        assert_eq!(job_type_for_level(JobLevel::Verify(VerifyLevel::Catalog)), JobType::Verify);
        assert_eq!(job_type_for_level(JobLevel::Full), JobType::Backup);
    }
}
