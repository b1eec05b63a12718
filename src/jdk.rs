// ============================================================================
// JDK 运行时库 & 语言级别
// ============================================================================

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

static JAVA_VERSION_CONSTANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"VERSION_(\d+)(?:_(\d+))?").expect("valid JavaVersion regex")
});

/// Runtime classes of the JDK: `lib/rt.jar` up to Java 8, `lib/jrt-fs.jar` after.
pub fn runtime_library(java_home: &Path) -> Option<PathBuf> {
    let lib = java_home.join("lib");
    [lib.join("rt.jar"), lib.join("jrt-fs.jar")]
        .into_iter()
        .find(|p| p.is_file())
}

/// Normalise a language level token.
///
/// `1.8` stays `1.8`, `17` stays `17`, `JavaVersion.VERSION_1_8` becomes
/// `1.8` and `VERSION_21` becomes `21`. Anything else is rejected.
pub fn normalize_compliance(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();

    if let Some(caps) = JAVA_VERSION_CONSTANT.captures(value) {
        let major = caps.get(1)?.as_str();
        return Some(match caps.get(2) {
            Some(minor) => format!("{major}.{}", minor.as_str()),
            None => major.to_string(),
        });
    }

    let numeric = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    match value.split_once('.') {
        Some((major, minor)) if numeric(major) && numeric(minor) => Some(value.to_string()),
        None if numeric(value) => Some(value.to_string()),
        _ => None,
    }
}
