// ============================================================================
// 依赖坐标 - groupId:artifactId:version + scope
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Dependency scope as declared in a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Compile,
    Provided,
    Test,
    Runtime,
    System,
    Import,
}

impl FromStr for Scope {
    type Err = std::convert::Infallible;

    /// Unknown or empty scopes fall back to `compile`, like Maven does.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "provided" => Scope::Provided,
            "test" => Scope::Test,
            "runtime" => Scope::Runtime,
            "system" => Scope::System,
            "import" => Scope::Import,
            _ => Scope::Compile,
        })
    }
}

impl Scope {
    /// Scopes whose artifacts are visible when compiling main or test sources.
    pub fn is_analysis_scope(&self) -> bool {
        matches!(self, Scope::Compile | Scope::Provided | Scope::Test)
    }
}

/// Version-independent identity of a dependency (`groupId:artifactId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordinateKey {
    pub group_id: String,
    pub artifact_id: String,
}

impl CoordinateKey {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// A declared dependency. `version` is kept exactly as written, so it may
/// still be an unresolved `${...}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Scope,
}

impl Coordinate {
    pub fn new(group_id: &str, artifact_id: &str) -> Self {
        Coordinate {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: None,
            scope: Scope::default(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.group_id.clone(), self.artifact_id.clone())
    }

    /// Parse `group:artifact[:version]` string notation.
    pub fn parse_gav(notation: &str) -> Option<Self> {
        let parts: Vec<&str> = notation.trim().split(':').collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return None;
        }
        let mut coord = Coordinate::new(parts[0], parts[1]);
        if let Some(version) = parts.get(2).filter(|v| !v.is_empty()) {
            coord.version = Some(version.to_string());
        }
        Some(coord)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}:{}:{}", self.group_id, self.artifact_id, v),
            None => write!(f, "{}:{}", self.group_id, self.artifact_id),
        }
    }
}
