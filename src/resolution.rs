// ============================================================================
// 依赖版本解析上下文 - explicit / managed / inherited + 推断 + 最新稳定版
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::coordinate::{Coordinate, CoordinateKey};
use crate::pom::PomDescriptor;
use crate::properties;
use crate::repository::RepositoryLayout;

/// Where a resolved version came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum VersionSource {
    Explicit,
    Managed,
    Inherited,
    Inferred,
    Suggested,
    LatestStable,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionSource::Explicit => "explicit",
            VersionSource::Managed => "managed",
            VersionSource::Inherited => "inherited",
            VersionSource::Inferred => "inferred",
            VersionSource::Suggested => "suggested",
            VersionSource::LatestStable => "latest-stable",
        };
        f.write_str(s)
    }
}

/// Version maps gathered from a project tree.
///
/// Every map is first-writer-wins: the root descriptor is absorbed before its
/// modules, so a version declared at the root is never replaced by a module's.
/// Nothing recorded in `managed` or `inherited` can affect a key that already
/// has an `explicit` version, since lookups always consult `explicit` first.
#[derive(Debug, Clone, Default)]
pub struct VersionResolutionContext {
    explicit: BTreeMap<CoordinateKey, String>,
    managed: BTreeMap<CoordinateKey, String>,
    inherited_explicit: BTreeMap<CoordinateKey, String>,
    inherited_managed: BTreeMap<CoordinateKey, String>,
    properties: BTreeMap<String, String>,
}

impl VersionResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_explicit(&mut self, key: CoordinateKey, version: &str) -> bool {
        insert_resolved(&mut self.explicit, key, version)
    }

    pub fn record_managed(&mut self, key: CoordinateKey, version: &str) -> bool {
        insert_resolved(&mut self.managed, key, version)
    }

    pub fn record_inherited(&mut self, key: CoordinateKey, version: &str, managed: bool) -> bool {
        if managed {
            insert_resolved(&mut self.inherited_managed, key, version)
        } else {
            insert_resolved(&mut self.inherited_explicit, key, version)
        }
    }

    /// Make properties visible to pattern-based suggestion. Existing keys win.
    pub fn record_properties(&mut self, props: &BTreeMap<String, String>) {
        for (k, v) in props {
            self.properties.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    /// Scan a project (or module) descriptor into `explicit` and `managed`.
    ///
    /// `props` is the descriptor's effective property map (ancestors overlaid
    /// by its own declarations).
    pub fn absorb_project(&mut self, pom: &PomDescriptor, props: &BTreeMap<String, String>) {
        let project_version = pom.effective_version();
        for dep in &pom.dependencies {
            if let Some(v) = resolved_version(dep, props, project_version) {
                self.record_explicit(dep.key(), &v);
            }
        }
        for dep in &pom.managed_dependencies {
            if let Some(v) = resolved_version(dep, props, project_version) {
                self.record_managed(dep.key(), &v);
            }
        }
        self.record_properties(props);
    }

    /// Scan an ancestor descriptor into the inherited tier.
    pub fn absorb_ancestor(&mut self, pom: &PomDescriptor, props: &BTreeMap<String, String>) {
        let project_version = pom.effective_version();
        for dep in &pom.dependencies {
            if let Some(v) = resolved_version(dep, props, project_version) {
                self.record_inherited(dep.key(), &v, false);
            }
        }
        for dep in &pom.managed_dependencies {
            if let Some(v) = resolved_version(dep, props, project_version) {
                self.record_inherited(dep.key(), &v, true);
            }
        }
        self.record_properties(props);
    }

    pub fn explicit(&self, key: &CoordinateKey) -> Option<&str> {
        self.explicit.get(key).map(String::as_str)
    }

    pub fn managed(&self, key: &CoordinateKey) -> Option<&str> {
        self.managed.get(key).map(String::as_str)
    }

    pub fn inherited(&self, key: &CoordinateKey) -> Option<&str> {
        self.inherited_explicit
            .get(key)
            .or_else(|| self.inherited_managed.get(key))
            .map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Declared version for `key`: explicit, then managed, then inherited.
    pub fn lookup(&self, key: &CoordinateKey) -> Option<(&str, VersionSource)> {
        self.explicit(key)
            .map(|v| (v, VersionSource::Explicit))
            .or_else(|| self.managed(key).map(|v| (v, VersionSource::Managed)))
            .or_else(|| self.inherited(key).map(|v| (v, VersionSource::Inherited)))
    }

    /// Version inferred from a related coordinate that is already known.
    pub fn infer(&self, key: &CoordinateKey) -> Option<String> {
        // Artifacts of a release-train group share one version.
        if RELEASE_TRAIN_GROUPS.contains(&key.group_id.as_str()) {
            if let Some(v) = self.first_known(|k| k.group_id == key.group_id && k != key) {
                return Some(v.to_string());
            }
        }

        COMPATIBILITY_TABLE.iter().find_map(|rule| {
            if !rule.target.matches(key) {
                return None;
            }
            let known = self.first_known(|k| rule.known.matches(k))?;
            rule.mapping.apply(known)
        })
    }

    /// Version suggested by naming conventions: a matching property, then a
    /// known default for the common test coordinates.
    pub fn suggest(&self, key: &CoordinateKey) -> Vec<String> {
        let Some(common) = COMMON_TEST_COORDINATES
            .iter()
            .find(|c| c.group_id == key.group_id && c.artifact_id == key.artifact_id)
        else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (name, value) in &self.properties {
            if common.property_pattern().is_some_and(|re| re.is_match(name)) {
                let v = properties::resolve(value, &self.properties, None);
                if !properties::is_unresolved(&v) && !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        if !out.iter().any(|v| v == common.default_version) {
            out.push(common.default_version.to_string());
        }
        out
    }

    /// Full precedence chain for one coordinate, deduplicated, in order.
    pub fn candidate_versions(&self, key: &CoordinateKey) -> Vec<(String, VersionSource)> {
        let mut out: Vec<(String, VersionSource)> = Vec::new();
        let mut push = |v: &str, source: VersionSource| {
            if !out.iter().any(|(existing, _)| existing == v) {
                out.push((v.to_string(), source));
            }
        };

        if let Some(v) = self.explicit(key) {
            push(v, VersionSource::Explicit);
        }
        if let Some(v) = self.managed(key) {
            push(v, VersionSource::Managed);
        }
        if let Some(v) = self.inherited(key) {
            push(v, VersionSource::Inherited);
        }
        if let Some(v) = self.infer(key) {
            push(&v, VersionSource::Inferred);
        }
        for v in self.suggest(key) {
            push(&v, VersionSource::Suggested);
        }
        out
    }

    fn first_known(&self, pred: impl Fn(&CoordinateKey) -> bool) -> Option<&str> {
        [
            &self.explicit,
            &self.managed,
            &self.inherited_explicit,
            &self.inherited_managed,
        ]
        .into_iter()
        .find_map(|map| map.iter().find(|(k, _)| pred(k)).map(|(_, v)| v.as_str()))
    }
}

fn insert_resolved(map: &mut BTreeMap<CoordinateKey, String>, key: CoordinateKey, version: &str) -> bool {
    let version = version.trim();
    if version.is_empty() || properties::is_unresolved(version) || map.contains_key(&key) {
        return false;
    }
    map.insert(key, version.to_string());
    true
}

fn resolved_version(
    dep: &Coordinate,
    props: &BTreeMap<String, String>,
    project_version: Option<&str>,
) -> Option<String> {
    let raw = dep.version.as_deref()?;
    let v = properties::resolve(raw, props, project_version);
    (!properties::is_unresolved(&v)).then_some(v)
}

// ============================================================================
// 兼容性表 & 常用测试依赖
// ============================================================================

const RELEASE_TRAIN_GROUPS: &[&str] = &[
    "org.junit.jupiter",
    "org.junit.platform",
    "org.junit.vintage",
    "org.mockito",
];

#[derive(Debug, Clone, Copy)]
enum KeyMatch {
    Group(&'static str),
    Exact(&'static str, &'static str),
}

impl KeyMatch {
    fn matches(&self, key: &CoordinateKey) -> bool {
        match self {
            KeyMatch::Group(g) => key.group_id == *g,
            KeyMatch::Exact(g, a) => key.group_id == *g && key.artifact_id == *a,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum VersionMapping {
    Same,
    /// Keep minor/patch, replace the major number.
    Major(u64),
    Fixed(&'static str),
}

impl VersionMapping {
    fn apply(&self, known: &str) -> Option<String> {
        match self {
            VersionMapping::Same => Some(known.to_string()),
            VersionMapping::Fixed(v) => Some(v.to_string()),
            VersionMapping::Major(major) => {
                let (_, rest) = known.split_once('.')?;
                Some(format!("{major}.{rest}"))
            }
        }
    }
}

struct CompatRule {
    known: KeyMatch,
    target: KeyMatch,
    mapping: VersionMapping,
}

// Approximate: pairs that are released in lock-step or conventionally shipped together.
const COMPATIBILITY_TABLE: &[CompatRule] = &[
    CompatRule {
        known: KeyMatch::Group("org.junit.jupiter"),
        target: KeyMatch::Group("org.junit.platform"),
        mapping: VersionMapping::Major(1),
    },
    CompatRule {
        known: KeyMatch::Group("org.junit.platform"),
        target: KeyMatch::Group("org.junit.jupiter"),
        mapping: VersionMapping::Major(5),
    },
    CompatRule {
        known: KeyMatch::Group("org.junit.jupiter"),
        target: KeyMatch::Group("org.junit.vintage"),
        mapping: VersionMapping::Same,
    },
    CompatRule {
        known: KeyMatch::Exact("junit", "junit"),
        target: KeyMatch::Exact("org.hamcrest", "hamcrest-core"),
        mapping: VersionMapping::Fixed("1.3"),
    },
    CompatRule {
        known: KeyMatch::Exact("org.mockito", "mockito-core"),
        target: KeyMatch::Exact("org.mockito", "mockito-junit-jupiter"),
        mapping: VersionMapping::Same,
    },
];

/// A test library that is always resolved, whether declared or not.
#[derive(Debug)]
pub struct CommonCoordinate {
    pub group_id: &'static str,
    pub artifact_id: &'static str,
    pub default_version: &'static str,
    property_regex: &'static str,
}

impl CommonCoordinate {
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.group_id, self.artifact_id)
    }

    fn property_pattern(&self) -> Option<&'static Regex> {
        PROPERTY_PATTERNS
            .iter()
            .find(|(artifact, _)| *artifact == self.artifact_id)
            .map(|(_, re)| re)
    }
}

pub const COMMON_TEST_COORDINATES: &[CommonCoordinate] = &[
    CommonCoordinate {
        group_id: "org.junit.jupiter",
        artifact_id: "junit-jupiter-api",
        default_version: "5.11.4",
        property_regex: r"^(junit[.-]?jupiter|junit5|jupiter)([.-]api)?[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.junit.jupiter",
        artifact_id: "junit-jupiter-engine",
        default_version: "5.11.4",
        property_regex: r"^(junit[.-]?jupiter|junit5|jupiter)([.-]engine)?[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.junit.jupiter",
        artifact_id: "junit-jupiter-params",
        default_version: "5.11.4",
        property_regex: r"^(junit[.-]?jupiter|junit5|jupiter)([.-]params)?[.-]version$",
    },
    CommonCoordinate {
        group_id: "junit",
        artifact_id: "junit",
        default_version: "4.13.2",
        property_regex: r"^junit4?[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.testng",
        artifact_id: "testng",
        default_version: "7.7.1",
        property_regex: r"^testng[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.mockito",
        artifact_id: "mockito-core",
        default_version: "5.15.2",
        property_regex: r"^mockito([.-]core)?[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.hamcrest",
        artifact_id: "hamcrest",
        default_version: "3.0",
        property_regex: r"^hamcrest[.-]version$",
    },
    CommonCoordinate {
        group_id: "org.assertj",
        artifact_id: "assertj-core",
        default_version: "3.26.3",
        property_regex: r"^assertj([.-]core)?[.-]version$",
    },
];

static PROPERTY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    COMMON_TEST_COORDINATES
        .iter()
        .filter_map(|c| {
            Regex::new(&format!("(?i){}", c.property_regex))
                .ok()
                .map(|re| (c.artifact_id, re))
        })
        .collect()
});

// ============================================================================
// 构件定位
// ============================================================================

/// A coordinate pinned to a version and an existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArtifact {
    pub key: CoordinateKey,
    pub version: String,
    pub path: PathBuf,
    pub source: VersionSource,
}

/// Locates jars across an ordered list of local repositories.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    layouts: Vec<RepositoryLayout>,
    extension: String,
}

impl ArtifactResolver {
    pub fn new(layouts: Vec<RepositoryLayout>) -> Self {
        Self {
            layouts,
            extension: "jar".to_string(),
        }
    }

    pub fn layouts(&self) -> &[RepositoryLayout] {
        &self.layouts
    }

    /// First layout holding the exact version wins.
    pub fn locate(&self, key: &CoordinateKey, version: &str) -> Option<PathBuf> {
        if properties::is_unresolved(version) {
            return None;
        }
        self.layouts
            .iter()
            .find_map(|l| l.locate(&key.group_id, &key.artifact_id, version, &self.extension))
    }

    /// Newest stable version from the first layout that has one.
    pub fn latest_stable(&self, key: &CoordinateKey) -> Option<(String, PathBuf)> {
        self.layouts
            .iter()
            .find_map(|l| l.latest_stable(&key.group_id, &key.artifact_id, &self.extension))
    }

    /// Resolve one declared dependency.
    ///
    /// A literal version is tried as written. A missing or unresolved version
    /// consults the context's declared tiers first. Either way a miss falls
    /// back to the newest stable version on disk.
    pub fn resolve_declared(
        &self,
        dep: &Coordinate,
        ctx: &VersionResolutionContext,
    ) -> Option<ResolvedArtifact> {
        if !dep.scope.is_analysis_scope() {
            debug!("Skipping {} (scope {:?})", dep, dep.scope);
            return None;
        }
        let key = dep.key();

        let literal = dep
            .version
            .as_deref()
            .filter(|v| !v.is_empty() && !properties::is_unresolved(v));

        let attempt = match literal {
            Some(v) => Some((v.to_string(), VersionSource::Explicit)),
            None => ctx.lookup(&key).map(|(v, s)| (v.to_string(), s)),
        };

        if let Some((version, source)) = attempt {
            if let Some(path) = self.locate(&key, &version) {
                debug!("Resolved {}:{} ({}) -> {}", key, version, source, path.display());
                return Some(ResolvedArtifact {
                    key,
                    version,
                    path,
                    source,
                });
            }
            debug!("Jar missing for {}:{}, trying latest stable", key, version);
        }

        self.fallback(key)
    }

    /// Resolve a coordinate through the whole precedence chain: the first
    /// candidate version with an existing jar wins, then latest stable.
    pub fn resolve_with_chain(
        &self,
        key: &CoordinateKey,
        ctx: &VersionResolutionContext,
    ) -> Option<ResolvedArtifact> {
        for (version, source) in ctx.candidate_versions(key) {
            if let Some(path) = self.locate(key, &version) {
                debug!("Resolved {}:{} ({}) -> {}", key, version, source, path.display());
                return Some(ResolvedArtifact {
                    key: key.clone(),
                    version,
                    path,
                    source,
                });
            }
        }
        self.fallback(key.clone())
    }

    /// Resolve every entry of [`COMMON_TEST_COORDINATES`] that exists locally.
    pub fn resolve_common_test_libraries(
        &self,
        ctx: &VersionResolutionContext,
    ) -> Vec<ResolvedArtifact> {
        COMMON_TEST_COORDINATES
            .iter()
            .filter_map(|c| {
                let resolved = self.resolve_with_chain(&c.key(), ctx);
                if resolved.is_none() {
                    debug!("Common test library {} not found locally", c.key());
                }
                resolved
            })
            .collect()
    }

    fn fallback(&self, key: CoordinateKey) -> Option<ResolvedArtifact> {
        let (version, path) = self.latest_stable(&key)?;
        Some(ResolvedArtifact {
            key,
            version,
            path,
            source: VersionSource::LatestStable,
        })
    }
}
