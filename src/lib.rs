#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Ties the workspace's crates into one running File Daemon: parses its
//! own command line ([`cli::Args`]), parses and validates the resource
//! config ([`daemon::config`]), and either runs `--test-config` or binds
//! and services Director connections via [`server::Server`].
//!
//! # Design
//!
//! Mirrors the thin-binary pattern the rest of the workspace uses:
//! [`bin/filed.rs`](../src/bin/filed.rs) only parses `env::args_os` and
//! hands off to [`run`], so the actual startup sequence is unit-testable
//! without a process boundary.

pub mod cli;
pub mod disk;
pub mod server;
pub mod walk;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use cli::Args;
use daemon::session::JobSessionFactory;
use platform::process_locks::ProcessLocks;
use server::Server;

/// Parses arguments, brings up logging, and runs the daemon until it
/// exits or fails to start.
///
/// `stderr` receives configuration and startup errors; nothing is
/// written to `stdout` outside of `--test-config`'s silent success.
pub fn run<I, S>(args: I, stderr: &mut impl Write) -> ExitCode
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    let args = match Args::try_parse_from(args) {
        Ok(args) => args,
        Err(error) => {
            let _ = write!(stderr, "{error}");
            return exit_code_for_clap_error(&error);
        }
    };

    let config_text = match std::fs::read_to_string(&args.config) {
        Ok(text) => text,
        Err(error) => {
            let _ = writeln!(stderr, "filed: cannot read {}: {error}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    let config = match daemon::config::parse(&config_text) {
        Ok(config) => config,
        Err(error) => {
            let _ = writeln!(stderr, "filed: {}: {error}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    if args.test_config {
        return ExitCode::SUCCESS;
    }

    logging::install_subscriber(args.debug_level);

    if !args.foreground {
        if let Err(error) = platform::daemonize::daemonize() {
            let _ = writeln!(stderr, "filed: failed to daemonize: {error}");
            return ExitCode::FAILURE;
        }
    }

    if let Err(error) = platform::privilege::drop_privileges(args.user.as_deref(), args.group.as_deref()) {
        let _ = writeln!(stderr, "filed: {error}");
        return ExitCode::FAILURE;
    }

    let factory = JobSessionFactory::new(Arc::new(ProcessLocks::new()));
    let server = Server::new(config, factory);
    match server.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "filed: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Maps a `clap` parse failure to the conventional `--help`/`--version`
/// success vs. usage-error exit codes.
fn exit_code_for_clap_error(error: &clap::Error) -> ExitCode {
    use clap::error::ErrorKind;
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
