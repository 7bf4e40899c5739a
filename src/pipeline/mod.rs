//! Concurrent scan of a domain list.
//!
//! A single producer (the calling thread) queues trimmed, non-empty domains on
//! a bounded intake channel. A fixed pool of workers pulls from it, runs the
//! [`DomainScanner`] and pushes each [`ScanResult`] on a bounded result
//! channel. One reporter thread drains that channel, renders every result and
//! records flagged domains in the [`VulnerabilitySink`].
//!
//! Results reach the reporter in completion order, not input order.
//!
//! Shutdown is explicit: once the input is exhausted the intake sender is
//! dropped, the workers are joined (dropping the last result senders), the
//! reporter is joined and finally the sink is closed.

mod error;
mod report;
mod sink;

pub use error::{PipelineError, SinkError};
pub use report::{
    HumanRenderer, Render, Reporter, ScanReport, ScanSummary, SectionReport, SectionStatus,
};
#[cfg(feature = "with-serde")]
pub use report::NdjsonRenderer;
pub use sink::{LedgerSink, MemorySink, VulnerabilitySink};

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::auth::{DomainScanner, LookupTxt, ScanResult, ScannerConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Draining,
    Done,
}

pub struct ScanPipeline<R> {
    scanner: DomainScanner<R>,
    config: ScannerConfig,
}

impl<R> ScanPipeline<R>
where
    R: LookupTxt,
{
    pub fn new(scanner: DomainScanner<R>, config: ScannerConfig) -> Self {
        Self { scanner, config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn scanner(&self) -> &DomainScanner<R> {
        &self.scanner
    }

    /// Scans every domain listed in `path`, one per line.
    ///
    /// The file is opened before any worker starts; failing to open it is
    /// fatal and nothing is scanned.
    pub fn run_file<P, Rn, S>(
        &self,
        path: P,
        renderer: &mut Rn,
        sink: &S,
    ) -> Result<ScanSummary, PipelineError>
    where
        P: AsRef<Path>,
        Rn: Render + Send + ?Sized,
        S: VulnerabilitySink + ?Sized,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| PipelineError::open_input(path, err))?;
        info!(path = %path.display(), "scanning domain list");
        self.run_reader(BufReader::new(file), renderer, sink)
    }

    /// Scans domains read line by line from `input`.
    ///
    /// A read error stops intake; domains already queued are still scanned
    /// and recorded before the error is returned. Lines that are not valid
    /// UTF-8 are skipped with a warning.
    pub fn run_reader<B, Rn, S>(
        &self,
        input: B,
        renderer: &mut Rn,
        sink: &S,
    ) -> Result<ScanSummary, PipelineError>
    where
        B: BufRead,
        Rn: Render + Send + ?Sized,
        S: VulnerabilitySink + ?Sized,
    {
        let lines = input
            .split(b'\n')
            .enumerate()
            .filter_map(|(index, line)| match line {
                Err(err) => Some(Err(err)),
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(line) => Some(Ok(line)),
                    Err(_) => {
                        warn!(line = index + 1, "skipping domain list line with invalid UTF-8");
                        None
                    }
                },
            });
        let (summary, read_error) = self.drive(lines, renderer, sink);
        match read_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    /// Scans an in-memory domain list.
    pub fn run<I, D, Rn, S>(&self, domains: I, renderer: &mut Rn, sink: &S) -> ScanSummary
    where
        I: IntoIterator<Item = D>,
        D: AsRef<str>,
        Rn: Render + Send + ?Sized,
        S: VulnerabilitySink + ?Sized,
    {
        let lines = domains
            .into_iter()
            .map(|domain| Ok::<_, io::Error>(domain.as_ref().to_string()));
        self.drive(lines, renderer, sink).0
    }

    fn drive<I, Rn, S>(
        &self,
        lines: I,
        renderer: &mut Rn,
        sink: &S,
    ) -> (ScanSummary, Option<PipelineError>)
    where
        I: Iterator<Item = io::Result<String>>,
        Rn: Render + Send + ?Sized,
        S: VulnerabilitySink + ?Sized,
    {
        let started = Instant::now();
        let capacity = self.config.channel_capacity();
        let workers = self.config.workers();
        let mut phase = Phase::Idle;

        let (intake_tx, intake_rx) = mpsc::sync_channel::<String>(capacity);
        let (result_tx, result_rx) = mpsc::sync_channel::<ScanResult>(capacity);
        let intake_rx = Arc::new(Mutex::new(intake_rx));

        let (summary, read_error) = thread::scope(|scope| {
            let reporter = scope.spawn(move || {
                let mut reporter = Reporter::new(renderer, sink);
                for result in result_rx {
                    reporter.handle(result);
                }
                reporter.finish()
            });

            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    let intake = Arc::clone(&intake_rx);
                    let results = result_tx.clone();
                    scope.spawn(move || self.work(id, &intake, results))
                })
                .collect();
            // workers now hold the only intake receiver and result senders
            drop(intake_rx);
            drop(result_tx);

            advance(&mut phase, Phase::Running);
            info!(workers, capacity, "scan started");

            let mut queued = 0usize;
            let mut read_error = None;
            for line in lines {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        error!(queued, error = %err, "failed reading domain list, stopping intake");
                        read_error = Some(PipelineError::read_input(queued, err));
                        break;
                    }
                };
                let domain = line.trim();
                if domain.is_empty() {
                    continue;
                }
                if intake_tx.send(domain.to_string()).is_err() {
                    error!(queued, "all scan workers exited, stopping intake");
                    break;
                }
                queued += 1;
            }
            drop(intake_tx);

            advance(&mut phase, Phase::Draining);
            for handle in handles {
                if handle.join().is_err() {
                    error!("scan worker panicked");
                }
            }

            let summary = reporter.join().unwrap_or_else(|_| {
                error!("reporter panicked");
                ScanSummary::default()
            });
            (summary, read_error)
        });

        if let Err(err) = sink.close() {
            warn!(error = %err, "failed to close vulnerable-domain ledger");
        }
        advance(&mut phase, Phase::Done);
        info!(
            scanned = summary.scanned,
            vulnerable = summary.vulnerable,
            elapsed = ?started.elapsed(),
            "scan completed"
        );

        (summary, read_error)
    }

    fn work(&self, id: usize, intake: &Mutex<Receiver<String>>, results: SyncSender<ScanResult>) {
        let mut scanned = 0usize;
        loop {
            let next = intake
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv();
            let Ok(domain) = next else {
                break;
            };
            let result = self.scanner.scan(&domain);
            scanned += 1;
            if results.send(result).is_err() {
                warn!(worker = id, "result channel closed, worker stopping early");
                break;
            }
        }
        debug!(worker = id, scanned, "worker exiting");
    }
}

fn advance(phase: &mut Phase, next: Phase) {
    debug!(from = ?*phase, to = ?next, "pipeline phase");
    *phase = next;
}
