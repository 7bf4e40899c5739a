const DMARC_PREFIX: &str = "v=DMARC1";

/// Returns `true` when the DMARC record does not enforce rejection/quarantine.
///
/// The `pct=` check is a plain substring match on `pct=0` / `pct=1`, so
/// `pct=10` and `pct=100` are flagged as well.
pub fn analyze_dmarc(record: &str) -> bool {
    let record = record.to_ascii_lowercase();

    if record.contains("p=none") {
        return true;
    }

    if !record.contains("p=quarantine") && !record.contains("p=reject") {
        return true;
    }

    if record.contains("pct=") && (record.contains("pct=0") || record.contains("pct=1")) {
        return true;
    }

    false
}

pub(crate) fn select(records: &[String]) -> Option<String> {
    records
        .iter()
        .find(|record| record.starts_with(DMARC_PREFIX))
        .cloned()
}
