use std::io;

use anyhow::{Result, bail};
use spoofcheck::{HumanRenderer, LedgerSink, Render, ScanSummary};

use crate::args::Cli;

pub fn make_renderer(cli: &Cli) -> Result<Box<dyn Render + Send>> {
    match cli.format.as_str() {
        "human" => Ok(Box::new(HumanRenderer::new(io::stdout(), !cli.no_color))),
        "ndjson" => ndjson_renderer(),
        other => bail!("unknown --format '{other}', use: human|ndjson"),
    }
}

#[cfg(feature = "with-serde")]
fn ndjson_renderer() -> Result<Box<dyn Render + Send>> {
    Ok(Box::new(spoofcheck::NdjsonRenderer::new(io::stdout())))
}

#[cfg(not(feature = "with-serde"))]
fn ndjson_renderer() -> Result<Box<dyn Render + Send>> {
    bail!("format=ndjson requires the 'with-serde' feature")
}

/// Opens the ledger, degrading to a disabled sink when it cannot be created.
pub fn open_ledger(cli: &Cli) -> LedgerSink {
    match LedgerSink::create(&cli.output) {
        Ok(sink) => sink,
        Err(err) => {
            eprintln!("[-] {err}; vulnerable domains will not be saved");
            LedgerSink::disabled()
        }
    }
}

pub fn print_banner(cli: &Cli, sink: &LedgerSink) {
    if !cli.human_output() {
        return;
    }
    println!("[+] SPF/DMARC Scanner - Email Spoofing Vulnerability Checker");
    println!(
        "[+] Workers: {}, Timeout: {}s",
        cli.workers, cli.timeout_secs
    );
    println!("[+] Scanning domains from: {}", cli.domains_file.display());
    if let Some(path) = sink.path() {
        println!("[+] Vulnerable domains will be saved to: {}", path.display());
    }
    println!("{}", "-".repeat(60));
}

pub fn print_completion(cli: &Cli, sink: &LedgerSink, summary: &ScanSummary) {
    if sink.write_failures() > 0 {
        eprintln!(
            "[-] {} vulnerable domain(s) could not be written to the ledger",
            sink.write_failures()
        );
    }
    if !cli.human_output() {
        return;
    }
    println!(
        "[+] Scan completed: {} domain(s) scanned, {} vulnerable.",
        summary.scanned, summary.vulnerable
    );
    if let Some(path) = sink.path() {
        println!("[+] Check {} for vulnerable domains.", path.display());
    }
}
