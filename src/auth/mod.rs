//! Per-domain SPF/DMARC evaluation.
//!
//! [`DomainScanner`] performs the two TXT lookups for a domain (the domain
//! itself and `_dmarc.<domain>`), picks the relevant record from each answer
//! and runs the weakness heuristics over it. Lookup failures of any kind are
//! treated as a missing record.

mod dmarc;
mod error;
mod resolver;
mod spf;
mod types;

pub use dmarc::analyze_dmarc;
pub use error::{AuthError, ConfigError};
pub use resolver::{LookupTxt, SystemResolver};
pub use spf::analyze_spf;
pub use types::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_TIMEOUT, DEFAULT_WORKERS, ScanResult, ScannerConfig,
};

use tracing::debug;

use resolver::{dmarc_name, normalize_domain};

/// Stateless domain evaluator over an injectable TXT source.
pub struct DomainScanner<R> {
    resolver: R,
}

impl DomainScanner<SystemResolver> {
    /// Scanner backed by the system resolver, every lookup bounded by
    /// `config.timeout()`.
    pub fn from_system_conf(config: &ScannerConfig) -> Result<Self, AuthError> {
        SystemResolver::from_system_conf(config.timeout()).map(Self::new)
    }
}

impl<R> DomainScanner<R>
where
    R: LookupTxt,
{
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// First `v=spf1` record published at `domain`, if any.
    pub fn lookup_spf(&self, domain: &str) -> Option<String> {
        let ascii = self.ascii_domain(domain)?;
        let records = self.fetch(&ascii)?;
        spf::select(&records)
    }

    /// First `v=DMARC1` record published at `_dmarc.<domain>`, if any.
    pub fn lookup_dmarc(&self, domain: &str) -> Option<String> {
        let ascii = self.ascii_domain(domain)?;
        let records = self.fetch(&dmarc_name(&ascii))?;
        dmarc::select(&records)
    }

    pub fn scan(&self, domain: &str) -> ScanResult {
        let domain = domain.trim();
        let spf_record = self.lookup_spf(domain);
        let dmarc_record = self.lookup_dmarc(domain);
        ScanResult::new(domain, spf_record, dmarc_record)
    }

    fn ascii_domain(&self, domain: &str) -> Option<String> {
        match normalize_domain(domain) {
            Ok(ascii) => Some(ascii),
            Err(err) => {
                debug!(domain, error = %err, "domain normalization failed");
                None
            }
        }
    }

    fn fetch(&self, name: &str) -> Option<Vec<String>> {
        match self.resolver.lookup_txt(name) {
            Ok(records) => Some(records),
            Err(err) => {
                debug!(name, error = %err, "TXT lookup failed, treating record as absent");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests;
