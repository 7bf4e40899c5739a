mod args;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use spoofcheck::{DomainScanner, ScanPipeline, ScanSummary};
use tracing_subscriber::EnvFilter;

use args::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    // codes de sortie : 0 OK, 2 domaines vulnérables, 1 fatal
    match run(&cli) {
        Ok(summary) if summary.vulnerable > 0 => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[-] {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ScanSummary> {
    let config = cli
        .scanner_config()
        .context("invalid scanner configuration")?;
    let mut renderer = output::make_renderer(cli)?;
    let scanner = DomainScanner::from_system_conf(&config).context("resolver setup")?;

    let sink = output::open_ledger(cli);
    output::print_banner(cli, &sink);

    let pipeline = ScanPipeline::new(scanner, config);
    let summary = pipeline.run_file(&cli.domains_file, &mut renderer, &sink)?;

    output::print_completion(cli, &sink, &summary);
    Ok(summary)
}
