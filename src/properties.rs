// ============================================================================
// 属性占位符解析 - ${name}
// ============================================================================

use std::collections::{BTreeMap, HashSet};

const PROJECT_VERSION_KEYS: &[&str] = &["project.version", "pom.version"];

/// Returns the property name when `value` is exactly one `${name}` placeholder.
pub fn placeholder_name(value: &str) -> Option<&str> {
    let value = value.trim();
    let inner = value.strip_prefix("${")?.strip_suffix('}')?;
    if inner.is_empty() || inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner)
}

/// True when the value still carries a placeholder and so cannot name a
/// directory in a repository.
pub fn is_unresolved(value: &str) -> bool {
    value.contains("${")
}

/// Resolve a `${name}` placeholder against a descriptor's properties.
///
/// - Values that are not a single placeholder come back unchanged.
/// - Chains (`${a}` -> `${b}` -> `1.2`) are followed.
/// - `project.version` falls back to the descriptor's own version when the
///   properties do not declare it.
/// - A cycle or a missing property yields the original input, which callers
///   treat as "no version".
pub fn resolve(
    value: &str,
    properties: &BTreeMap<String, String>,
    project_version: Option<&str>,
) -> String {
    let mut current = value.trim().to_string();
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let Some(name) = placeholder_name(&current) else {
            return current;
        };
        if !seen.insert(name.to_string()) {
            return value.to_string();
        }

        let next = properties.get(name).cloned().or_else(|| {
            PROJECT_VERSION_KEYS
                .contains(&name)
                .then(|| project_version.map(str::to_string))
                .flatten()
        });

        match next {
            Some(next) => current = next.trim().to_string(),
            None => return value.to_string(),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_resolved_literals_are_fixed_points(
            version in "[0-9]{1,3}(\\.[0-9]{1,3}){0,3}(-[A-Za-z]{1,8})?"
        ) {
            let p = BTreeMap::new();
            let once = resolve(&version, &p, None);
            prop_assert_eq!(&once, &version);
            prop_assert_eq!(resolve(&once, &p, None), once);
        }

        #[test]
        fn prop_resolution_terminates(
            names in prop::collection::vec("[a-z]{1,3}", 1..6),
            targets in prop::collection::vec(0usize..6, 1..6)
        ) {
            // Arbitrary property graphs, cycles included, must terminate.
            let mut p = BTreeMap::new();
            for (i, name) in names.iter().enumerate() {
                let target = &names[targets[i % targets.len()] % names.len()];
                p.insert(name.clone(), format!("${{{target}}}"));
            }
            let input = format!("${{{}}}", names[0]);
            let out = resolve(&input, &p, None);
            prop_assert!(out == input || !is_unresolved(&out));
        }
    }
}
