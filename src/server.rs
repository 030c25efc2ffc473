//! The TCP accept loop and per-connection session driver: the piece that
//! ties [`daemon::state::SessionState`], the job-command parser, the
//! fileset walker, and the backup/restore orchestrators together over
//! real sockets (§5, §6).

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use accurate::store::{ChangeDetectionStore, EntryHandle};
use fd_core::file_type::FileType;
use fd_core::job::{JobLevel, JobType};
use fd_core::session::SessionContext;
use fd_core::stat::{AccurateCompareOptions, FileStat};
use daemon::accurate_select::select_change_detection_store;
use daemon::admin::{AdminCommand, parse_admin_command};
use daemon::config::Configuration;
use daemon::job_commands::{JobCommand, job_type_for_level, parse_job_command};
use daemon::session::{JobSession, JobSessionFactory};
use daemon::state::SessionEvent;
use filters::fileset::Fileset;
use filters::matcher::FilesetMatcher;
use filters::option::OptionBlock;
use metadata::acl::UnixAclBackend;
use metadata::xattr::UnixXattrBackend;
use orchestrator::backup::BackupOrchestrator;
use orchestrator::packet::FileEntry;
use orchestrator::restore::RestoreOrchestrator;
use wire::director::{EndJobSummary, ResponseCode, response_line};
use wire::framing::{END_OF_SESSION_FILE_INDEX, recv_record};

use crate::disk::DiskFilesystem;
use crate::walk;

/// The default listening address when the client resource names none.
const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9102";

/// Accurate-mode comparison fields applied when a job negotiates
/// `accurate` without a narrower option sub-string (§4.3, §4.7 `C`):
/// size and modification time, the cheapest pair that catches the
/// common edit-in-place and truncate cases.
const DEFAULT_ACCURATE_COMPARE: AccurateCompareOptions = AccurateCompareOptions {
    inode: false,
    permissions: false,
    nlink: false,
    uid: false,
    gid: false,
    size: true,
    size_decrease: false,
    atime: false,
    mtime: true,
    ctime: false,
    checksum: false,
    always: false,
};

/// One prior-state record the Director streamed ahead of the fileset
/// walk, in `path\0lstat\0checksum\0delta_seq\0` form (§4.3).
struct AccurateRecord {
    path: String,
    lstat_ascii: String,
    checksum_ascii: String,
    delta_sequence: u32,
}

fn parse_accurate_record(line: &str) -> Option<AccurateRecord> {
    let mut fields = line.split('\0');
    let path = fields.next()?.to_string();
    let lstat_ascii = fields.next()?.to_string();
    let checksum_ascii = fields.next().unwrap_or_default().to_string();
    let delta_sequence = fields.next().and_then(|v| v.parse().ok()).unwrap_or(0);
    Some(AccurateRecord { path, lstat_ascii, checksum_ascii, delta_sequence })
}

/// Owns the parsed configuration and the process-wide session factory;
/// accepts Director connections and drives each on its own thread.
pub struct Server {
    config: Configuration,
    factory: JobSessionFactory,
}

impl Server {
    /// Builds a server over an already-parsed configuration and an
    /// already-constructed session factory (the factory holds the
    /// process-wide locks, built once in `main`).
    #[must_use]
    pub fn new(config: Configuration, factory: JobSessionFactory) -> Self {
        Self { config, factory }
    }

    /// Binds every address named by the `FileDaemon` resource (or a
    /// single default) and services connections until the process is
    /// terminated. Each accept loop and each connection runs on its own
    /// thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if none of the configured addresses could be
    /// bound.
    pub fn run(self) -> std::io::Result<()> {
        let addresses = self.listen_addresses();
        let server = Arc::new(self);
        let mut handles = Vec::new();
        for address in addresses {
            let listener = TcpListener::bind(&address)?;
            tracing::info!(address, "listening for director connections");
            let server = Arc::clone(&server);
            handles.push(std::thread::spawn(move || server.accept_loop(listener)));
        }
        for handle in handles {
            let _ = handle.join();
        }
        Ok(())
    }

    fn listen_addresses(&self) -> Vec<String> {
        match &self.config.client {
            Some(client) if !client.addresses.is_empty() => client.addresses.clone(),
            _ => vec![DEFAULT_LISTEN_ADDRESS.to_string()],
        }
    }

    fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let server = Arc::clone(&self);
            std::thread::spawn(move || {
                if let Err(error) = server.drive_session(stream) {
                    tracing::warn!(%error, "session ended with an I/O error");
                }
            });
        }
    }

    fn drive_session(&self, stream: TcpStream) -> std::io::Result<()> {
        let mut writer = stream.try_clone()?;
        let mut reader = BufReader::new(stream);
        let mut session = self.factory.start_session();
        let mut fileset = Fileset::new();
        let mut storage_address: Option<(String, u16)> = None;
        let mut monitor = false;
        let mut line = String::new();
        let mut accurate_records: Vec<AccurateRecord> = Vec::new();

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                session.apply(SessionEvent::DirectorEof);
                break;
            }
            let command_line = line.trim_end_matches(['\n', '\r']);
            if command_line.is_empty() {
                continue;
            }

            if session.state().accepts_admin_commands() {
                if let Ok(admin) = parse_admin_command(command_line) {
                    if monitor && !admin.allowed_for_monitor() {
                        writer.write_all(response_line(ResponseCode::INVALID_COMMAND, "not permitted for a monitor director").as_bytes())?;
                        continue;
                    }
                    self.dispatch_admin(&admin, &session, &mut writer)?;
                    session.apply(SessionEvent::AdminCommand);
                    continue;
                }
            }

            let Ok(command) = parse_job_command(command_line) else {
                writer.write_all(response_line(ResponseCode::INVALID_COMMAND, command_line).as_bytes())?;
                continue;
            };

            match command {
                JobCommand::Hello { director_name } => {
                    let director = self.config.directors.iter().find(|d| d.name.as_deref() == Some(director_name.as_str()));
                    let known = director.is_some();
                    monitor = director.is_some_and(|d| d.monitor);
                    session.apply(SessionEvent::Greeting(known));
                    session.apply(SessionEvent::AuthResult(known));
                    let message = if known { "Hello" } else { "authentication failed" };
                    writer.write_all(response_line(ResponseCode::OK, message).as_bytes())?;
                    if !known {
                        break;
                    }
                }
                JobCommand::OpenJob { job_id, job_name, .. } => {
                    session.open_job(job_id, job_name, JobType::Backup);
                    writer.write_all(response_line(ResponseCode::OK, "JobId accepted").as_bytes())?;
                }
                JobCommand::Level { level, since_time } => {
                    if let Some(ctx) = session.context_mut() {
                        ctx.level = level;
                        ctx.since_time = since_time;
                        ctx.job_type = job_type_for_level(level);
                    }
                    session.apply(SessionEvent::Level);
                }
                JobCommand::FilesetLine { line } => {
                    fileset.apply_line(&line);
                    session.apply(SessionEvent::FilesetLine);
                }
                JobCommand::Storage { address, port } => {
                    storage_address = Some((address, port));
                    session.apply(SessionEvent::Storage);
                }
                JobCommand::Accurate { file_count } => {
                    accurate_records.clear();
                    for _ in 0..file_count {
                        line.clear();
                        if reader.read_line(&mut line)? == 0 {
                            break;
                        }
                        if let Some(record) = parse_accurate_record(line.trim_end_matches(['\n', '\r'])) {
                            accurate_records.push(record);
                        }
                    }
                    if let Some(ctx) = session.context_mut() {
                        ctx.accurate = true;
                    }
                }
                JobCommand::Run => {
                    fileset.commit();
                    let job_type = session.context().map_or(JobType::Backup, |ctx| ctx.job_type);
                    session.apply(match job_type {
                        JobType::Restore => SessionEvent::Restore,
                        JobType::Verify | JobType::Estimate => SessionEvent::Verify,
                        JobType::Backup => SessionEvent::Backup,
                    });

                    let Some((address, port)) = storage_address.clone() else {
                        writer.write_all(response_line(ResponseCode::INVALID_COMMAND, "no storage address").as_bytes())?;
                        session.close_job(SessionEvent::Completion);
                        continue;
                    };
                    let summary = self.run_job(&mut session, &fileset, &address, port, &accurate_records);
                    writer.write_all(summary.to_string().as_bytes())?;
                    writer.write_all(b"\n")?;
                    session.close_job(SessionEvent::Completion);
                }
                JobCommand::Cancel => {
                    if session.state().is_cancelable() {
                        if let Some(ctx) = session.context() {
                            ctx.cancel.cancel();
                        }
                        writer.write_all(response_line(ResponseCode::JOB_MARKED_CANCELED, "job marked to be canceled").as_bytes())?;
                    }
                    session.close_job(SessionEvent::Cancel);
                }
                JobCommand::EndJob => break,
            }
        }
        Ok(())
    }

    fn dispatch_admin(&self, command: &AdminCommand, session: &JobSession, writer: &mut TcpStream) -> std::io::Result<()> {
        let _ = session;
        match command {
            AdminCommand::Status | AdminCommand::DotStatus { .. } => {
                writer.write_all(response_line(ResponseCode::OK, "running").as_bytes())
            }
            AdminCommand::SetDebug { .. } | AdminCommand::SetBandwidth { .. } | AdminCommand::SetAuthorization { .. } => {
                writer.write_all(response_line(ResponseCode::OK, "applied").as_bytes())
            }
            AdminCommand::Resolve { hostname } => {
                writer.write_all(response_line(ResponseCode::OK, hostname).as_bytes())
            }
            AdminCommand::SmDump => writer.write_all(response_line(ResponseCode::OK, "dumped").as_bytes()),
            AdminCommand::Cancel { job_name } => {
                writer.write_all(response_line(ResponseCode::JOB_MARKED_CANCELED, job_name).as_bytes())
            }
        }
    }

    /// Connects to the Storage Daemon and runs the job's data-transfer
    /// phase, returning the summary to report back on the Director
    /// channel. Connection and protocol failures are reported as an
    /// `Errored` termination rather than propagated, matching the rule
    /// that every job that connects emits exactly one `EndJob` record.
    fn run_job(
        &self,
        session: &mut JobSession,
        fileset: &Fileset,
        address: &str,
        port: u16,
        accurate_records: &[AccurateRecord],
    ) -> EndJobSummary {
        let Some(ctx) = session.context_mut() else {
            return error_summary();
        };
        let sd_stream = match TcpStream::connect((address, port)) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(%error, address, port, "failed to connect to storage daemon");
                return error_summary();
            }
        };
        let _ = sd_stream.set_read_timeout(Some(Duration::from_secs(1800)));
        let mut sd_writer = match sd_stream.try_clone() {
            Ok(stream) => stream,
            Err(_) => return error_summary(),
        };
        let _ = writeln!(sd_writer, "Hello Start Job {}", ctx.job_name);
        let mut sd_reader = BufReader::new(sd_stream);
        let mut ack = String::new();
        let _ = sd_reader.read_line(&mut ack);

        let matcher = match FilesetMatcher::compile(fileset) {
            Ok(matcher) => matcher,
            Err(error) => {
                tracing::warn!(%error, "fileset did not compile");
                return error_summary();
            }
        };

        let working_directory = self.config.client.as_ref().and_then(|c| c.working_directory.clone());
        let result = match ctx.job_type {
            JobType::Restore => run_restore(ctx, &mut sd_reader),
            _ => run_backup(ctx, fileset, &matcher, &mut sd_writer, working_directory.as_deref(), accurate_records),
        };

        let _ = writeln!(sd_writer, "EndJob");
        match result {
            Ok(summary) => summary,
            Err(_) => error_summary(),
        }
    }
}

fn error_summary() -> EndJobSummary {
    EndJobSummary {
        term_code: fd_core::job::TerminationCode::Errored.code(),
        job_files: 0,
        read_bytes: 0,
        job_bytes: 0,
        errors: 1,
        vss: false,
        encrypt: false,
    }
}

fn run_backup<W: Write>(
    ctx: &mut SessionContext,
    fileset: &Fileset,
    matcher: &FilesetMatcher,
    sd_writer: &mut W,
    working_directory: Option<&str>,
    accurate_records: &[AccurateRecord],
) -> std::io::Result<EndJobSummary> {
    let entries = walk::walk(fileset, matcher);
    let disk = DiskFilesystem;
    let acl = UnixAclBackend;
    let xattr = UnixXattrBackend;

    let mut accurate_store = if ctx.accurate {
        accurate_store_for(accurate_records, working_directory).ok()
    } else {
        None
    };

    let mut orchestrator = BackupOrchestrator::<_, _, UnixAclBackend, UnixXattrBackend>::new(
        sd_writer, &disk, Some(&acl), Some(&xattr), None, None, ctx.job_id as i32, 0,
    );

    for entry in &entries {
        match accurate_decision(ctx, accurate_store.as_deref(), entry) {
            AccurateDecision::NotTracked => {
                if orchestrator.backup_entry(ctx, entry).is_err() {
                    ctx.counters.errors += 1;
                }
            }
            AccurateDecision::Unchanged(handle) => {
                // Unchanged: never re-read or re-sent here. Full level
                // reports it as a base-file pointer, non-Full simply
                // drops it, both via the end-of-job pass below.
                if let Some(store) = accurate_store.as_mut() {
                    store.mark_seen(handle);
                }
            }
            AccurateDecision::Changed(handle) => {
                if orchestrator.backup_entry(ctx, entry).is_err() {
                    ctx.counters.errors += 1;
                }
                if ctx.level != JobLevel::Full {
                    if let (Some(store), Some(handle)) = (accurate_store.as_mut(), handle) {
                        store.mark_seen(handle);
                    }
                }
            }
        }
    }

    if let Some(store) = accurate_store.as_mut() {
        emit_accurate_summary(ctx, store.as_ref(), &mut orchestrator, ctx.level);
    }
    if let Some(mut store) = accurate_store {
        let _ = store.destroy();
    }

    Ok(summary_from_counters(ctx))
}

fn accurate_store_for(
    records: &[AccurateRecord],
    working_directory: Option<&str>,
) -> Result<Box<dyn ChangeDetectionStore>, accurate::store::StoreError> {
    let dir = working_directory.map_or_else(|| std::env::temp_dir().join("filed-accurate"), |dir| std::path::Path::new(dir).join("filed-accurate"));
    let mut store = select_change_detection_store(records.len(), 1_000_000, &dir)?;
    for record in records {
        store.add(&record.path, &record.lstat_ascii, &record.checksum_ascii, record.delta_sequence)?;
    }
    Ok(store)
}

/// What the accurate store says about one currently-scanned entry,
/// against the Director's prior-state dump.
enum AccurateDecision {
    /// Accurate mode is off, or the store could not be built.
    NotTracked,
    /// Found in the prior state and unchanged by the comparison fields.
    Unchanged(EntryHandle),
    /// Not found, or found but changed; `None` when it is a brand new
    /// path with no prior-state handle to mark.
    Changed(Option<EntryHandle>),
}

fn accurate_decision(ctx: &mut SessionContext, store: Option<&dyn ChangeDetectionStore>, entry: &FileEntry) -> AccurateDecision {
    ctx.counters.files_examined += 1;
    let Some(store) = store else { return AccurateDecision::NotTracked };
    let Some(recorded) = store.lookup(&entry.path) else {
        return AccurateDecision::Changed(None);
    };
    let handle = recorded.file_number;
    let Some(previous_stat) = FileStat::decode_ascii(&recorded.lstat_ascii) else {
        return AccurateDecision::Changed(Some(handle));
    };
    if entry.stat.accurate_matches(&previous_stat, &DEFAULT_ACCURATE_COMPARE) {
        AccurateDecision::Unchanged(handle)
    } else {
        AccurateDecision::Changed(Some(handle))
    }
}

/// The end-of-job pass (§4.3): Full level reports every unchanged entry
/// as a base-file pointer, every other level reports every entry the
/// scan never found as deleted. Never both for the same job.
fn emit_accurate_summary<W: Write>(
    ctx: &mut SessionContext,
    store: &dyn ChangeDetectionStore,
    orchestrator: &mut BackupOrchestrator<'_, W, DiskFilesystem, UnixAclBackend, UnixXattrBackend>,
    level: JobLevel,
) {
    let mut pending = Vec::new();
    if level == JobLevel::Full {
        store.iter_all_seen(&mut |path, change_entry| {
            pending.push((path.to_string(), change_entry.lstat_ascii.clone(), change_entry.delta_sequence));
        });
    } else {
        store.iter_unseen(&mut |path, change_entry| {
            pending.push((path.to_string(), change_entry.lstat_ascii.clone(), change_entry.delta_sequence));
        });
    }
    let file_type = if level == JobLevel::Full { FileType::Base } else { FileType::Deleted };
    for (path, lstat_ascii, delta_sequence) in pending {
        let Some(stat) = FileStat::decode_ascii(&lstat_ascii) else { continue };
        let entry = FileEntry {
            path,
            file_type,
            stat,
            link_target: None,
            delta_sequence,
            options: OptionBlock::default(),
            hard_link_digest: None,
        };
        if orchestrator.backup_entry(ctx, &entry).is_err() {
            ctx.counters.errors += 1;
        }
    }
}

fn run_restore<R: BufRead>(ctx: &mut SessionContext, sd_reader: &mut R) -> std::io::Result<EndJobSummary> {
    let disk = DiskFilesystem;
    let acl = UnixAclBackend;
    let xattr = UnixXattrBackend;
    let mut orchestrator = RestoreOrchestrator::<_, UnixAclBackend, UnixXattrBackend>::new(&disk, Some(&acl), Some(&xattr), None, &[]);

    loop {
        let (header, payload) = match recv_record(sd_reader) {
            Ok(record) => record,
            Err(_) => break,
        };
        let _ = orchestrator.feed_record(ctx, &header, &payload);
        if header.file_index == END_OF_SESSION_FILE_INDEX {
            break;
        }
    }
    let _ = orchestrator.close_current(ctx);
    Ok(summary_from_counters(ctx))
}

fn summary_from_counters(ctx: &SessionContext) -> EndJobSummary {
    let term_code = if ctx.counters.errors > 0 {
        fd_core::job::TerminationCode::OkWithWarnings
    } else {
        fd_core::job::TerminationCode::Ok
    };
    EndJobSummary {
        term_code: term_code.code(),
        job_files: ctx.counters.files_sent,
        read_bytes: ctx.counters.bytes_read,
        job_bytes: ctx.counters.bytes_sent,
        errors: ctx.counters.errors,
        vss: false,
        encrypt: false,
    }
}
