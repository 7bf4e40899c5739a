use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::Serialize;

use super::{ConfigError, dmarc, spf};

pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Outcome of scanning a single domain.
///
/// A missing record is always vulnerable; the constructor is the only way to
/// build one, so that invariant holds for every value in circulation.
#[cfg_attr(feature = "with-serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanResult {
    domain: String,
    spf_record: Option<String>,
    spf_vulnerable: bool,
    dmarc_record: Option<String>,
    dmarc_vulnerable: bool,
}

impl ScanResult {
    pub fn new(
        domain: impl Into<String>,
        spf_record: Option<String>,
        dmarc_record: Option<String>,
    ) -> Self {
        let spf_vulnerable = spf_record.as_deref().is_none_or(spf::analyze_spf);
        let dmarc_vulnerable = dmarc_record.as_deref().is_none_or(dmarc::analyze_dmarc);
        Self {
            domain: domain.into(),
            spf_record,
            spf_vulnerable,
            dmarc_record,
            dmarc_vulnerable,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn spf_record(&self) -> Option<&str> {
        self.spf_record.as_deref()
    }

    pub fn spf_vulnerable(&self) -> bool {
        self.spf_vulnerable
    }

    pub fn dmarc_record(&self) -> Option<&str> {
        self.dmarc_record.as_deref()
    }

    pub fn dmarc_vulnerable(&self) -> bool {
        self.dmarc_vulnerable
    }

    /// True when either SPF or DMARC lets a forged sender through.
    pub fn is_vulnerable(&self) -> bool {
        self.spf_vulnerable || self.dmarc_vulnerable
    }
}

/// Process-wide scanner settings, fixed before the scan starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerConfig {
    workers: usize,
    timeout: Duration,
    channel_capacity: usize,
}

impl ScannerConfig {
    pub fn new(workers: usize, timeout: Duration) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            workers,
            timeout,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        })
    }

    /// Bound for both the intake and the result channel.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.channel_capacity = capacity;
        Ok(self)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
