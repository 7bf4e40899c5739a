use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use trust_dns_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    error::{ResolveError, ResolveErrorKind},
    lookup::TxtLookup,
    system_conf,
};

use super::AuthError;

const DMARC_LABEL: &str = "_dmarc";

pub(crate) fn normalize_domain(domain: &str) -> Result<String, AuthError> {
    let trimmed = domain.trim();
    if trimmed.is_empty() {
        return Err(AuthError::EmptyDomain);
    }
    idna::domain_to_ascii(trimmed).map_err(AuthError::idna)
}

pub(crate) fn dmarc_name(ascii_domain: &str) -> String {
    format!("{DMARC_LABEL}.{ascii_domain}")
}

/// Source of TXT records for a DNS name.
///
/// Implementations must be shareable across worker threads.
pub trait LookupTxt: Sync {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, AuthError>;
}

/// System resolver with a hard per-lookup deadline.
///
/// Lookups run on a private multi-threaded runtime; worker threads block on
/// it concurrently, and a lookup still pending at the deadline is dropped.
pub struct SystemResolver {
    runtime: Runtime,
    inner: TokioAsyncResolver,
    timeout: Duration,
}

impl SystemResolver {
    /// Builds a resolver from the host configuration (`/etc/resolv.conf` or
    /// the platform equivalent) with a single attempt per lookup.
    pub fn from_system_conf(timeout: Duration) -> Result<Self, AuthError> {
        let (config, mut opts) = system_conf::read_system_conf()
            .map_err(|err| AuthError::resolver_init(std::io::Error::from(err)))?;
        opts.timeout = timeout;
        opts.attempts = 1;
        Self::with_config(config, opts, timeout)
    }

    /// Builds a resolver for explicit nameservers. `deadline` bounds every
    /// lookup regardless of `opts.timeout`.
    pub(crate) fn with_config(
        config: ResolverConfig,
        opts: ResolverOpts,
        deadline: Duration,
    ) -> Result<Self, AuthError> {
        let runtime = Builder::new_multi_thread()
            .thread_name("spoofcheck-dns")
            .enable_all()
            .build()
            .map_err(AuthError::resolver_init)?;
        let inner = {
            let _guard = runtime.enter();
            TokioAsyncResolver::tokio(config, opts)
        };

        Ok(Self {
            runtime,
            inner,
            timeout: deadline,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl LookupTxt for SystemResolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, AuthError> {
        let outcome = self.runtime.block_on(async {
            tokio::time::timeout(self.timeout, self.inner.txt_lookup(name)).await
        });

        let lookup = match outcome {
            Err(_) => return Err(AuthError::lookup_timeout(name, self.timeout)),
            Ok(Ok(lookup)) => lookup,
            Ok(Err(err)) => {
                if should_treat_as_empty(&err) {
                    return Ok(Vec::new());
                }
                return Err(AuthError::txt_lookup(name, err));
            }
        };
        collect_txt_records(name, &lookup)
    }
}

fn collect_txt_records(name: &str, lookup: &TxtLookup) -> Result<Vec<String>, AuthError> {
    let mut records = Vec::new();
    for txt in lookup.iter() {
        let mut record = String::new();
        for piece in txt.txt_data().iter() {
            let segment = std::str::from_utf8(piece.as_ref())
                .map_err(|err| AuthError::txt_data_utf8(name, err))?;
            record.push_str(segment);
        }
        records.push(record);
    }
    Ok(records)
}

fn should_treat_as_empty(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}
