// ============================================================================
// 构建工具检测 - Detector trait + 注册表
// ============================================================================
//
// Detectors are tried in registration order and the first one whose
// `supports` returns true wins. When marker files of several ecosystems
// coexist in one root, registration order is the whole tie-break: no file
// content is inspected to pick a "better" match.

pub mod gradle;
pub mod introspection;
pub mod maven;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::parser_config::Configuration;
use crate::settings::ResolverSettings;

pub use gradle::GradleDetector;
pub use introspection::{GradleCliService, IntrospectionError, IntrospectionService};
pub use maven::MavenDetector;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no registered build tool detector supports {}", root.display())]
    NoDetector { root: PathBuf },

    #[error("failed to detect project configuration for {}: {reason}", root.display())]
    Failed { root: PathBuf, reason: String },
}

impl DetectionError {
    pub fn failed(root: &Path, reason: impl std::fmt::Display) -> Self {
        DetectionError::Failed {
            root: root.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        match self {
            DetectionError::NoDetector { root } | DetectionError::Failed { root, .. } => root,
        }
    }
}

/// One build ecosystem.
pub trait BuildToolDetector {
    /// Short identifier shown by `status`.
    fn name(&self) -> &'static str;

    /// True when the root carries this ecosystem's marker files.
    fn supports(&self, root: &Path) -> bool;

    /// Build a configuration. Only an unreadable root descriptor is an error;
    /// everything else degrades.
    fn detect(&self, root: &Path) -> Result<Configuration, DetectionError>;
}

/// Ordered set of detectors, built by the caller and passed around.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn BuildToolDetector>>,
}

impl DetectorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maven first, then Gradle.
    pub fn with_defaults(settings: &ResolverSettings) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MavenDetector::new(settings.clone())));
        registry.register(Box::new(GradleDetector::new(
            settings.clone(),
            Box::new(GradleCliService::default()),
        )));
        registry
    }

    /// Append a detector; it is consulted after every detector already registered.
    pub fn register(&mut self, detector: Box<dyn BuildToolDetector>) -> &mut Self {
        self.detectors.push(detector);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn detect(&self, root: &Path) -> Result<Configuration, DetectionError> {
        for detector in &self.detectors {
            debug!("Trying {} detector for {}", detector.name(), root.display());
            if detector.supports(root) {
                info!("Detected {} project at {}", detector.name(), root.display());
                return detector.detect(root);
            }
        }
        Err(DetectionError::NoDetector {
            root: root.to_path_buf(),
        })
    }
}
