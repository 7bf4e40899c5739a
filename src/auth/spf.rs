//! SPF record selection and weakness heuristics.

const SPF_PREFIX: &str = "v=spf1";

const HARD_FAIL: &str = "-all";

/// Tokens that undermine a hard-fail policy even when `-all` is present.
const WEAK_INDICATORS: [&str; 4] = [
    "~all",     // softfail
    "+all",     // pass
    "?all",     // neutral
    "redirect", // delegated elsewhere
];

/// Returns `true` when the SPF record lets unauthenticated senders through.
///
/// A record without `-all` is vulnerable. A record that has `-all` is still
/// vulnerable if it also carries one of the soft qualifiers or a `redirect`
/// modifier. Matching is case-insensitive and substring based.
pub fn analyze_spf(record: &str) -> bool {
    let record = record.to_ascii_lowercase();

    if !record.contains(HARD_FAIL) {
        return true;
    }

    WEAK_INDICATORS
        .iter()
        .any(|indicator| record.contains(*indicator))
}

/// Picks the first TXT record that starts with `v=spf1` (case-sensitive).
pub(crate) fn select(records: &[String]) -> Option<String> {
    records
        .iter()
        .find(|record| record.starts_with(SPF_PREFIX))
        .cloned()
}
