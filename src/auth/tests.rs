use std::collections::{HashMap, HashSet};
use std::net::UdpSocket;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use proptest::prelude::*;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};

use super::{
    AuthError, ConfigError, DomainScanner, LookupTxt, ScanResult, ScannerConfig, SystemResolver,
    analyze_dmarc, analyze_spf,
};

/// Static TXT data keyed by lower-cased name. Names listed in `failing`
/// answer with a resolver error instead.
#[derive(Default)]
pub(crate) struct StubResolver {
    records: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl StubResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_records<I, S>(&mut self, name: &str, records: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = normalize_name(name);
        let values = records.into_iter().map(Into::into).collect();
        self.records.insert(key, values);
    }

    pub(crate) fn fail(&mut self, name: &str) {
        self.failing.insert(normalize_name(name));
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn queried(&self) -> Vec<String> {
        self.queried.lock().expect("queried lock").clone()
    }
}

impl LookupTxt for StubResolver {
    fn lookup_txt(&self, name: &str) -> Result<Vec<String>, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = normalize_name(name);
        self.queried.lock().expect("queried lock").push(key.clone());
        if self.failing.contains(&key) {
            return Err(AuthError::lookup_timeout(key, Duration::from_secs(5)));
        }
        Ok(self.records.get(&key).cloned().unwrap_or_default())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[test]
fn spf_softfail_without_hard_fail_is_vulnerable() {
    assert!(analyze_spf("v=spf1 include:_spf.example.com ~all"));
}

#[test]
fn spf_hard_fail_is_not_vulnerable() {
    assert!(!analyze_spf("v=spf1 include:_spf.example.com -all"));
}

#[test]
fn spf_redirect_next_to_hard_fail_is_vulnerable() {
    assert!(analyze_spf("v=spf1 a -all redirect=_spf2.example.com"));
}

#[test]
fn spf_pass_all_next_to_hard_fail_is_vulnerable() {
    assert!(analyze_spf("v=spf1 -all +all"));
    assert!(analyze_spf("v=spf1 ?all -all"));
}

#[test]
fn spf_analysis_ignores_case() {
    assert!(!analyze_spf("V=SPF1 IP4:192.0.2.1 -ALL"));
    assert!(analyze_spf("v=spf1 -all REDIRECT=_spf.example.com"));
}

#[test]
fn spf_without_any_all_mechanism_is_vulnerable() {
    assert!(analyze_spf("v=spf1 include:_spf.example.com"));
}

#[test]
fn dmarc_monitoring_policy_is_vulnerable() {
    assert!(analyze_dmarc("v=DMARC1; p=none; rua=mailto:x@example.com"));
}

#[test]
fn dmarc_quarantine_is_not_vulnerable() {
    assert!(!analyze_dmarc("v=DMARC1; p=quarantine"));
}

#[test]
fn dmarc_reject_without_pct_is_not_vulnerable() {
    assert!(!analyze_dmarc("v=DMARC1; p=reject; rua=mailto:x@example.com"));
}

#[test]
fn dmarc_missing_policy_is_vulnerable() {
    assert!(analyze_dmarc("v=DMARC1; rua=mailto:x@example.com"));
}

#[test]
fn dmarc_low_percentage_is_vulnerable() {
    assert!(analyze_dmarc("v=DMARC1; p=reject; pct=0"));
    assert!(analyze_dmarc("v=DMARC1; p=quarantine; pct=1"));
}

#[test]
fn dmarc_pct_prefix_match_flags_full_rollout() {
    // `pct=1` is a prefix of these, so they are flagged too.
    assert!(analyze_dmarc("v=DMARC1; p=reject; pct=100"));
    assert!(analyze_dmarc("v=DMARC1; p=reject; pct=10"));
    assert!(analyze_dmarc("v=DMARC1; p=quarantine; pct=15"));
}

#[test]
fn dmarc_other_percentages_pass() {
    assert!(!analyze_dmarc("v=DMARC1; p=reject; pct=50"));
}

#[test]
fn dmarc_subdomain_none_matches_policy_substring() {
    assert!(analyze_dmarc("v=DMARC1; p=reject; sp=none"));
}

#[test]
fn dmarc_analysis_ignores_case() {
    assert!(!analyze_dmarc("V=DMARC1; P=REJECT"));
    assert!(analyze_dmarc("v=DMARC1; P=None"));
}

proptest! {
    #[test]
    fn spf_without_hard_fail_always_vulnerable(body in "[a-z0-9:=._ ~?+]{0,60}") {
        let record = format!("v=spf1 {body}");
        prop_assert!(analyze_spf(&record));
    }

    #[test]
    fn analyzers_ignore_ascii_case(record in "[ -~]{0,60}") {
        let upper = record.to_ascii_uppercase();
        prop_assert_eq!(analyze_spf(&record), analyze_spf(&upper));
        prop_assert_eq!(analyze_dmarc(&record), analyze_dmarc(&upper));
    }
}

#[test]
fn lookup_spf_picks_first_spf_record() {
    let mut stub = StubResolver::new();
    stub.insert_records(
        "example.com",
        vec![
            "google-site-verification=abc",
            "v=spf1 ip4:192.0.2.1 -all",
            "v=spf1 include:other.example ~all",
        ],
    );
    let scanner = DomainScanner::new(stub);

    assert_eq!(
        scanner.lookup_spf("example.com").as_deref(),
        Some("v=spf1 ip4:192.0.2.1 -all")
    );
}

#[test]
fn lookup_spf_prefix_is_case_sensitive() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["V=SPF1 -all"]);
    let scanner = DomainScanner::new(stub);

    assert_eq!(scanner.lookup_spf("example.com"), None);
}

#[test]
fn lookup_spf_failure_reads_as_absent() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["v=spf1 -all"]);
    stub.fail("example.com");
    let scanner = DomainScanner::new(stub);

    assert_eq!(scanner.lookup_spf("example.com"), None);
}

#[test]
fn lookup_dmarc_queries_dmarc_label() {
    let mut stub = StubResolver::new();
    stub.insert_records(
        "_dmarc.example.com",
        vec!["some other record", "v=DMARC1; p=reject"],
    );
    let scanner = DomainScanner::new(stub);

    assert_eq!(
        scanner.lookup_dmarc("example.com").as_deref(),
        Some("v=DMARC1; p=reject")
    );
    assert_eq!(scanner.resolver().queried(), vec!["_dmarc.example.com"]);
}

#[test]
fn lookup_dmarc_ignores_records_without_prefix() {
    let mut stub = StubResolver::new();
    stub.insert_records("_dmarc.example.com", vec!["v=dmarc1; p=reject"]);
    let scanner = DomainScanner::new(stub);

    assert_eq!(scanner.lookup_dmarc("example.com"), None);
}

#[test]
fn scan_without_records_flags_both_checks() {
    let scanner = DomainScanner::new(StubResolver::new());
    let result = scanner.scan("  missing.example \n");

    assert_eq!(result.domain(), "missing.example");
    assert_eq!(result.spf_record(), None);
    assert!(result.spf_vulnerable());
    assert_eq!(result.dmarc_record(), None);
    assert!(result.dmarc_vulnerable());
    assert!(result.is_vulnerable());
}

#[test]
fn scan_combines_spf_and_dmarc_findings() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["v=spf1 ip4:192.0.2.1 ~all"]);
    stub.insert_records("_dmarc.example.com", vec!["v=DMARC1; p=reject"]);
    let scanner = DomainScanner::new(stub);

    let result = scanner.scan("example.com");

    assert_eq!(result.spf_record(), Some("v=spf1 ip4:192.0.2.1 ~all"));
    assert!(result.spf_vulnerable());
    assert_eq!(result.dmarc_record(), Some("v=DMARC1; p=reject"));
    assert!(!result.dmarc_vulnerable());
    assert!(result.is_vulnerable());
}

#[test]
fn scan_of_hardened_domain_is_clean() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["v=spf1 mx -all"]);
    stub.insert_records("_dmarc.example.com", vec!["v=DMARC1; p=quarantine"]);
    let scanner = DomainScanner::new(stub);

    assert!(!scanner.scan("example.com").is_vulnerable());
}

#[test]
fn dmarc_lookup_failure_only_affects_dmarc() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["v=spf1 mx -all"]);
    stub.insert_records("_dmarc.example.com", vec!["v=DMARC1; p=reject"]);
    stub.fail("_dmarc.example.com");
    let scanner = DomainScanner::new(stub);

    let result = scanner.scan("example.com");
    assert!(!result.spf_vulnerable());
    assert_eq!(result.dmarc_record(), None);
    assert!(result.dmarc_vulnerable());
}

#[test]
fn scan_is_idempotent_over_static_data() {
    let mut stub = StubResolver::new();
    stub.insert_records("example.com", vec!["v=spf1 -all"]);
    stub.insert_records("_dmarc.example.com", vec!["v=DMARC1; p=none"]);
    let scanner = DomainScanner::new(stub);

    assert_eq!(scanner.scan("example.com"), scanner.scan("example.com"));
}

#[test]
fn scan_queries_ascii_form_of_unicode_domain() {
    let mut stub = StubResolver::new();
    stub.insert_records("xn--bcher-kva.example", vec!["v=spf1 -all"]);
    let scanner = DomainScanner::new(stub);

    let result = scanner.scan("bücher.example");

    assert_eq!(result.domain(), "bücher.example");
    assert_eq!(result.spf_record(), Some("v=spf1 -all"));
    assert_eq!(
        scanner.resolver().queried(),
        vec!["xn--bcher-kva.example", "_dmarc.xn--bcher-kva.example"]
    );
}

#[test]
fn scan_of_blank_domain_skips_lookups() {
    let scanner = DomainScanner::new(StubResolver::new());
    let result = scanner.scan("   ");

    assert!(result.is_vulnerable());
    assert_eq!(scanner.resolver().calls(), 0);
}

#[test]
fn system_resolver_gives_up_at_deadline() {
    // bound but never read: queries sent here go unanswered
    let silent = UdpSocket::bind("127.0.0.1:0").expect("bind udp");
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(
        silent.local_addr().expect("local addr"),
        Protocol::Udp,
    ));
    let mut opts = ResolverOpts::default();
    opts.timeout = Duration::from_secs(30);
    opts.attempts = 1;
    let deadline = Duration::from_millis(300);
    let resolver = SystemResolver::with_config(config, opts, deadline).expect("resolver");

    let started = Instant::now();
    let outcome = resolver.lookup_txt("example.com");
    let elapsed = started.elapsed();

    assert!(
        matches!(outcome, Err(AuthError::LookupTimeout { .. })),
        "unexpected outcome: {outcome:?}"
    );
    assert!(elapsed >= deadline);
    assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
    assert_eq!(resolver.timeout(), deadline);
}

#[test]
fn scan_result_without_record_is_always_vulnerable() {
    let result = ScanResult::new("example.com", None, Some("v=DMARC1; p=reject".into()));
    assert!(result.spf_vulnerable());
    assert!(!result.dmarc_vulnerable());
}

#[test]
fn config_defaults() {
    let config = ScannerConfig::default();
    assert_eq!(config.workers(), 20);
    assert_eq!(config.timeout(), Duration::from_secs(5));
    assert_eq!(config.channel_capacity(), 100);
}

#[test]
fn config_rejects_zero_values() {
    assert_eq!(
        ScannerConfig::new(0, Duration::from_secs(5)),
        Err(ConfigError::ZeroWorkers)
    );
    assert_eq!(
        ScannerConfig::new(4, Duration::ZERO),
        Err(ConfigError::ZeroTimeout)
    );
    let config = ScannerConfig::new(4, Duration::from_secs(1)).expect("valid config");
    assert_eq!(
        config.with_channel_capacity(0),
        Err(ConfigError::ZeroCapacity)
    );
}
