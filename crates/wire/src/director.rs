//! The Director command-line language (§6): line-oriented, space-delimited
//! commands and 4-digit-coded ASCII responses.

use std::fmt;

/// A parsed `JobId=... Job=... SDid=... SDtime=... Authorization=...` line
/// and its friends.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct JobIdLine {
    /// `JobId=`
    pub job_id: Option<u32>,
    /// `Job=`
    pub job_name: Option<String>,
    /// `SDid=`
    pub sd_id: Option<u32>,
    /// `SDtime=`
    pub sd_time: Option<u32>,
    /// `Authorization=`
    pub authorization: Option<String>,
}

/// Parses a space-delimited `key=value` line into its known fields.
/// Unrecognized keys are ignored, matching the permissive line-oriented
/// grammar (§4.6, §6).
#[must_use]
pub fn parse_job_id_line(line: &str) -> JobIdLine {
    let mut out = JobIdLine::default();
    for token in line.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        match key {
            "JobId" => out.job_id = value.parse().ok(),
            "Job" => out.job_name = Some(value.to_string()),
            "SDid" => out.sd_id = value.parse().ok(),
            "SDtime" => out.sd_time = value.parse().ok(),
            "Authorization" => out.authorization = Some(value.to_string()),
            _ => {}
        }
    }
    out
}

/// A 4-digit response code, as emitted on the Director channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResponseCode(pub u16);

impl ResponseCode {
    /// `2000 OK ...`
    pub const OK: Self = Self(2000);
    /// `2001 Job ... marked to be canceled`
    pub const JOB_MARKED_CANCELED: Self = Self(2001);
    /// `2800 End Job ...`
    pub const END_JOB: Self = Self(2800);
    /// `2999 Invalid command`
    pub const INVALID_COMMAND: Self = Self(2999);
}

/// Formats a response line `<code> <message>\n`.
#[must_use]
pub fn response_line(code: ResponseCode, message: &str) -> String {
    format!("{} {message}\n", code.0)
}

/// The summary fields reported in the `EndJob` line (§6, §7).
#[derive(Clone, Debug)]
pub struct EndJobSummary {
    /// The job's final [`core::job::TerminationCode`] numeric value.
    pub term_code: u32,
    /// Files examined or sent during the job.
    pub job_files: u64,
    /// Bytes read from the local filesystem.
    pub read_bytes: u64,
    /// Bytes sent on the Storage-Daemon channel.
    pub job_bytes: u64,
    /// Total error count.
    pub errors: u64,
    /// Whether a volume-snapshot service was used.
    pub vss: bool,
    /// Whether encryption was used.
    pub encrypt: bool,
}

impl fmt::Display for EndJobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} End Job TermCode={} JobFiles={} ReadBytes={} JobBytes={} Errors={} VSS={} Encrypt={}",
            ResponseCode::END_JOB.0,
            self.term_code,
            self.job_files,
            self.read_bytes,
            self.job_bytes,
            self.errors,
            i32::from(self.vss),
            i32::from(self.encrypt),
        )
    }
}
