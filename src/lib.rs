#![forbid(unsafe_code)]
//! spoofcheck: bulk SPF/DMARC posture scanner
//!
//! Flags domains whose published SPF and DMARC records let a forged sender
//! through, scanning a domain list with a bounded pool of worker threads.

pub mod auth;
pub mod pipeline;

pub use auth::{
    AuthError, ConfigError, DomainScanner, LookupTxt, ScanResult, ScannerConfig, SystemResolver,
    analyze_dmarc, analyze_spf,
};
#[cfg(feature = "with-serde")]
pub use pipeline::NdjsonRenderer;
pub use pipeline::{
    HumanRenderer, LedgerSink, MemorySink, PipelineError, Render, ScanPipeline, ScanReport,
    ScanSummary, SectionReport, SectionStatus, SinkError, VulnerabilitySink,
};
