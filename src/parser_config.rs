// ============================================================================
// 解析器配置 - classpath / sourcepath / encodings / compliance level
// ============================================================================

use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

pub const DEFAULT_ENCODING: &str = "UTF-8";
pub const DEFAULT_COMPLIANCE_LEVEL: &str = "17";

/// A step that was skipped or fell back while building a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub subject: String,
    pub reason: String,
}

impl Degradation {
    pub fn new(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}

/// How encodings map onto sourcepath entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum EncodingPlan {
    Uniform(String),
    PerEntry(Vec<String>),
}

/// Immutable analysis environment for one project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Configuration {
    classpath: Vec<String>,
    sourcepath: Vec<String>,
    default_encoding: String,
    encodings: Vec<String>,
    compliance_level: String,
    degradations: Vec<Degradation>,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    pub fn classpath(&self) -> &[String] {
        &self.classpath
    }

    pub fn sourcepath(&self) -> &[String] {
        &self.sourcepath
    }

    pub fn compliance_level(&self) -> &str {
        &self.compliance_level
    }

    pub fn default_encoding(&self) -> &str {
        &self.default_encoding
    }

    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// One encoding per sourcepath entry when the counts line up, otherwise
    /// the default for all of them.
    pub fn encoding_plan(&self) -> EncodingPlan {
        if !self.encodings.is_empty() && self.encodings.len() == self.sourcepath.len() {
            EncodingPlan::PerEntry(self.encodings.clone())
        } else {
            EncodingPlan::Uniform(self.default_encoding.clone())
        }
    }

    /// Encoding for every sourcepath entry, in order.
    pub fn encodings(&self) -> Vec<String> {
        match self.encoding_plan() {
            EncodingPlan::PerEntry(encodings) => encodings,
            EncodingPlan::Uniform(encoding) => vec![encoding; self.sourcepath.len()],
        }
    }

    /// Human-readable report.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Compliance level: {}", self.compliance_level);
        match self.encoding_plan() {
            EncodingPlan::Uniform(enc) => {
                let _ = writeln!(out, "Encoding: {enc} (all entries)");
            }
            EncodingPlan::PerEntry(_) => {
                let _ = writeln!(out, "Encoding: per entry");
            }
        }

        let _ = writeln!(out, "Classpath ({}):", self.classpath.len());
        for entry in &self.classpath {
            let _ = writeln!(out, "  {entry}");
        }

        let _ = writeln!(out, "Sourcepath ({}):", self.sourcepath.len());
        for (entry, enc) in self.sourcepath.iter().zip(self.encodings()) {
            let _ = writeln!(out, "  {entry} [{enc}]");
        }

        if !self.degradations.is_empty() {
            let _ = writeln!(out, "Degradations ({}):", self.degradations.len());
            for d in &self.degradations {
                let _ = writeln!(out, "  {}: {}", d.subject, d.reason);
            }
        }
        out
    }
}

/// Accumulates entries in insertion order, dropping duplicates.
#[derive(Debug, Clone)]
pub struct ConfigurationBuilder {
    classpath: Vec<String>,
    sourcepath: Vec<String>,
    seen_classpath: HashSet<String>,
    seen_sourcepath: HashSet<String>,
    default_encoding: String,
    encodings: Vec<String>,
    compliance_level: String,
    degradations: Vec<Degradation>,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            classpath: Vec::new(),
            sourcepath: Vec::new(),
            seen_classpath: HashSet::new(),
            seen_sourcepath: HashSet::new(),
            default_encoding: DEFAULT_ENCODING.to_string(),
            encodings: Vec::new(),
            compliance_level: DEFAULT_COMPLIANCE_LEVEL.to_string(),
            degradations: Vec::new(),
        }
    }

    /// Add a classpath entry. Returns false when the path is already on the
    /// classpath. Each list is deduplicated on its own.
    pub fn classpath(&mut self, path: impl AsRef<Path>) -> bool {
        let entry = path.as_ref().to_string_lossy().to_string();
        if entry.is_empty() || !self.seen_classpath.insert(entry.clone()) {
            return false;
        }
        debug!("classpath += {}", entry);
        self.classpath.push(entry);
        true
    }

    pub fn sourcepath(&mut self, path: impl AsRef<Path>) -> bool {
        let entry = path.as_ref().to_string_lossy().to_string();
        if entry.is_empty() || !self.seen_sourcepath.insert(entry.clone()) {
            return false;
        }
        debug!("sourcepath += {}", entry);
        self.sourcepath.push(entry);
        true
    }

    /// Add an entry only if it exists on disk.
    pub fn classpath_if_exists(&mut self, path: &Path) -> bool {
        path.exists() && self.classpath(path)
    }

    pub fn sourcepath_if_exists(&mut self, path: &Path) -> bool {
        path.exists() && self.sourcepath(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        let entry = path.to_string_lossy();
        self.seen_classpath.contains(entry.as_ref()) || self.seen_sourcepath.contains(entry.as_ref())
    }

    pub fn default_encoding(&mut self, encoding: &str) -> &mut Self {
        self.default_encoding = encoding.to_string();
        self
    }

    /// Per-entry encoding, matched positionally against the sourcepath.
    pub fn encoding(&mut self, encoding: &str) -> &mut Self {
        self.encodings.push(encoding.to_string());
        self
    }

    pub fn compliance_level(&mut self, level: &str) -> &mut Self {
        self.compliance_level = level.to_string();
        self
    }

    /// Record a recovered failure.
    pub fn degrade(&mut self, subject: impl Into<String>, reason: impl Into<String>) {
        let d = Degradation::new(subject, reason);
        warn!("{}: {}", d.subject, d.reason);
        self.degradations.push(d);
    }

    pub fn extend_degradations(&mut self, items: impl IntoIterator<Item = Degradation>) {
        for d in items {
            self.degrade(d.subject, d.reason);
        }
    }

    pub fn build(self) -> Configuration {
        Configuration {
            classpath: self.classpath,
            sourcepath: self.sourcepath,
            default_encoding: self.default_encoding,
            encodings: self.encodings,
            compliance_level: self.compliance_level,
            degradations: self.degradations,
        }
    }
}
