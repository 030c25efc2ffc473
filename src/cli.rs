//! Command-line arguments (§6's CLI entry point supplement), grounded on
//! the original daemon's fixed `-c/-f/-t/-d/-u/-g` option set.

use std::path::PathBuf;

use clap::Parser;

/// File Daemon command-line options.
#[derive(Parser, Debug, Clone)]
#[command(name = "filed", about = "File Daemon: the client backup/restore agent of a network backup architecture")]
pub struct Args {
    /// Path to the resource-block configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: PathBuf,

    /// Stay attached to the terminal instead of daemonizing.
    #[arg(short = 'f', long = "foreground")]
    pub foreground: bool,

    /// Parse and validate the configuration, then exit without binding
    /// any socket.
    #[arg(short = 't', long = "test-config")]
    pub test_config: bool,

    /// Debug verbosity level, `0` (quiet) through `3` (noisiest).
    #[arg(short = 'd', long = "debug-level")]
    pub debug_level: Option<u8>,

    /// Drop privileges to this user after binding, Unix only.
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Drop privileges to this group after binding, Unix only.
    #[arg(short = 'g', long = "group")]
    pub group: Option<String>,
}
