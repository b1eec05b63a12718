// ============================================================================
// 版本比较 & 稳定版过滤
// ============================================================================
//
// Heuristics, not a Maven version-range implementation. Callers must tolerate
// a stable version being classified as unstable.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

static STABLE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+").expect("valid stable-version regex"));

const UNSTABLE_MARKERS: &[&str] = &["snapshot", "rc", "alpha", "beta", "m1", "m2", "cr"];

/// Compare two version strings segment by segment.
///
/// Each `.`-separated segment contributes its leading run of digits; any
/// suffix after the digits is ignored. When either side of a segment has no
/// leading digits the segments are compared lexicographically. A missing
/// segment counts as `0`.
///
/// As a consequence `compare("1.0-SNAPSHOT", "1.0")` is `Equal`: the suffix
/// of the last segment never takes part in the comparison.
pub fn compare(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");

        let ord = match (numeric_prefix(l), numeric_prefix(r)) {
            (Some(x), Some(y)) => compare_digits(x, y),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

/// True for versions like `2.0` or `5.10.1` that carry no pre-release marker.
pub fn is_stable(version: &str) -> bool {
    if !STABLE_PREFIX.is_match(version) {
        return false;
    }
    let lower = version.to_lowercase();
    !UNSTABLE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Sort versions newest first.
pub fn sort_descending(versions: &mut [String]) {
    versions.sort_by(|a, b| compare(b, a));
}

fn numeric_prefix(segment: &str) -> Option<&str> {
    let end = segment
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(segment.len());
    if end == 0 {
        None
    } else {
        Some(&segment[..end])
    }
}

// Digit runs can exceed u64 (timestamps, build numbers), so compare them as
// numbers without parsing.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_numeric_not_lexicographic() {
        assert_eq!(compare("2.10", "2.9"), Ordering::Greater);
        assert_eq!(compare("2.9", "2.10"), Ordering::Less);
        assert_eq!(compare("10.0", "9.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_zero_padding() {
        assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1", "1.0.0"), Ordering::Equal);
        assert_eq!(compare("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn test_compare_ignores_suffix_of_segment() {
        // Documented, imperfect semantics: suffixes never break a tie.
        assert_eq!(compare("1.0-SNAPSHOT", "1.0"), Ordering::Equal);
        assert_eq!(compare("33.2.1-jre", "33.2.1-android"), Ordering::Equal);
        assert_eq!(compare("5.10.0-M1", "5.9.3"), Ordering::Greater);
    }

    #[test]
    fn test_compare_falls_back_to_lexicographic() {
        assert_eq!(compare("1.x", "1.y"), Ordering::Less);
        assert_eq!(compare("abc", "abd"), Ordering::Less);
        assert_eq!(compare("1.final", "1.0"), "final".cmp("0"));
    }

    #[test]
    fn test_compare_huge_numbers() {
        assert_eq!(
            compare("1.20240101120000", "1.9999999999999999999999"),
            Ordering::Less
        );
        assert_eq!(compare("1.007", "1.7"), Ordering::Equal);
    }

    #[test]
    fn test_is_stable() {
        assert!(is_stable("2.0"));
        assert!(is_stable("5.10.1"));
        assert!(is_stable("33.2.1-jre"));
        assert!(!is_stable("2.0-RC1"));
        assert!(!is_stable("2.0-SNAPSHOT"));
        assert!(!is_stable("5.0.0-M2"));
        assert!(!is_stable("1.0-alpha-3"));
        assert!(!is_stable("3.0.0-beta"));
        assert!(!is_stable("7.0.0.CR1"));
        assert!(!is_stable("3"));
        assert!(!is_stable("release"));
    }

    #[test]
    fn test_sort_descending() {
        let mut versions = vec![
            "2.9".to_string(),
            "2.10".to_string(),
            "1.0".to_string(),
        ];
        sort_descending(&mut versions);
        assert_eq!(versions, vec!["2.10", "2.9", "1.0"]);
    }
}
