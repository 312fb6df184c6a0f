use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "hsi-scanner",
    about = "Report fwupd host security attributes",
    version
)]
pub struct Cli {
    /// Attribute identifiers to resolve (e.g. org.fwupd.hsi.Uefi.SecureBoot)
    #[arg(value_name = "STREAM_ID")]
    pub stream_ids: Vec<String>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Decode a captured `busctl --json=short call` reply instead of querying the bus
    #[arg(long, value_name = "FILE")]
    pub replay: Option<PathBuf>,

    /// Captured `busctl --json=short get-property ... HostSecurityId` reply, used with --replay
    #[arg(long, value_name = "FILE", requires = "replay")]
    pub replay_hsi: Option<PathBuf>,

    /// Scanning an image or chroot; an unreachable service is not an error
    #[arg(long)]
    pub offline: bool,

    /// Require attribute names to match exactly instead of by prefix
    #[arg(long)]
    pub exact_match: bool,

    /// Print every attribute reported by the service
    #[arg(long)]
    pub list: bool,

    /// Include the host security level in the report
    #[arg(long)]
    pub hsi: bool,

    /// Write the JSON report to a file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
