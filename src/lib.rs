// ============================================================================
// Java Project Introspection - Library Interface
// ============================================================================
//
// Resolves a Java project root into the classpath / sourcepath / encoding /
// language level a source analyser needs, and lists the test methods of its
// test sources. The binary (main.rs) is a thin CLI over these modules.

pub mod cli;
pub mod coordinate;
pub mod detect;
pub mod jdk;
pub mod modules;
pub mod parser_config;
pub mod pom;
pub mod properties;
pub mod repository;
pub mod resolution;
pub mod scanner;
pub mod settings;
pub mod version;

pub use coordinate::{Coordinate, CoordinateKey, Scope};
pub use detect::{BuildToolDetector, DetectionError, DetectorRegistry};
pub use parser_config::{Configuration, ConfigurationBuilder, Degradation, EncodingPlan};
pub use repository::RepositoryLayout;
pub use resolution::{ArtifactResolver, VersionResolutionContext, VersionSource};
pub use scanner::{discover_tests, TestDiscovery, TestRecord};
pub use settings::{ResolverSettings, SettingsOverrides};
