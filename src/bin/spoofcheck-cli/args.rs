use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use spoofcheck::{ConfigError, ScannerConfig};

pub const DEFAULT_LEDGER: &str = "vuln-domains.txt";

#[derive(Parser)]
#[command(
    name = "spoofcheck-cli",
    version,
    about = "SPF/DMARC scanner: flags domains open to email spoofing"
)]
pub struct Cli {
    /// domain list, one domain per line
    pub domains_file: PathBuf,

    /// number of concurrent workers
    #[arg(short, long, default_value_t = spoofcheck::auth::DEFAULT_WORKERS)]
    pub workers: usize,

    /// per-lookup timeout (seconds)
    #[arg(short = 't', long = "timeout", default_value_t = 5)]
    pub timeout_secs: u64,

    /// ledger receiving vulnerable domains (appended)
    #[arg(short, long, default_value = DEFAULT_LEDGER)]
    pub output: PathBuf,

    /// format: human|ndjson
    #[arg(long, default_value = "human")]
    pub format: String,

    /// disable ANSI colours in human output
    #[arg(long)]
    pub no_color: bool,

    /// verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn scanner_config(&self) -> Result<ScannerConfig, ConfigError> {
        ScannerConfig::new(self.workers, self.timeout())
    }

    pub fn human_output(&self) -> bool {
        self.format == "human"
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
