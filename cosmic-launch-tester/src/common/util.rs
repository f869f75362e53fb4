use chrono::Utc;
use serde::Serialize;
use std::hash::Hasher;
use twox_hash::XxHash64;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// UTC timestamp stamped on generated reports.
pub fn report_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Stable 64-bit digest of a value's JSON form, used to compare replays.
pub fn fingerprint<T: Serialize>(value: &T) -> anyhow::Result<u64> {
    let bytes = serde_json::to_vec(value)?;
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let a = fingerprint(&vec![1, 2, 3]).unwrap();
        assert_eq!(a, fingerprint(&vec![1, 2, 3]).unwrap());
        assert_ne!(a, fingerprint(&vec![3, 2, 1]).unwrap());
    }

    #[test]
    fn report_timestamp_is_utc_iso() {
        let ts = report_timestamp();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2025-01-01T00:00:00Z".len());
    }
}
