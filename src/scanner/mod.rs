// ============================================================================
// 测试发现 - 配置检测 + 语法树遍历
// ============================================================================

pub mod test_visitor;
pub mod tree_sitter_java;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::detect::{DetectionError, DetectorRegistry};
use crate::parser_config::{Configuration, Degradation};

pub use test_visitor::{collect_tests, is_test_annotation, TEST_ANNOTATIONS};
pub use tree_sitter_java::JavaSourceParser;

/// One discovered test method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRecord {
    pub class_name: String,
    pub method_name: String,
    pub file_path: PathBuf,
}

/// Records plus the files that could not be read or parsed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestDiscovery {
    pub records: Vec<TestRecord>,
    pub skipped: Vec<Degradation>,
}

/// Detect the configuration of `root` and list the test methods of its test sources.
///
/// Fails only when detection fails. A file that cannot be read or parsed is
/// reported in `skipped` and the remaining files are still processed.
pub fn discover_tests(root: &Path, registry: &DetectorRegistry) -> Result<TestDiscovery, DetectionError> {
    let config = registry.detect(root)?;
    let root = fs::canonicalize(root).map_err(|e| DetectionError::failed(root, e))?;
    Ok(scan_test_sources(&root, &config))
}

/// Sourcepath entries below `root` with a `test` directory in their
/// relative path, or `src/test/java` when there are none.
pub fn test_source_dirs(root: &Path, config: &Configuration) -> Vec<PathBuf> {
    let dirs: Vec<PathBuf> = config
        .sourcepath()
        .iter()
        .map(PathBuf::from)
        .filter(|entry| {
            entry
                .strip_prefix(root)
                .is_ok_and(|rel| rel.components().any(|c| c.as_os_str() == "test"))
        })
        .collect();

    if dirs.is_empty() {
        let fallback = root.join("src").join("test").join("java");
        debug!("No test sourcepath entries, falling back to {}", fallback.display());
        return vec![fallback];
    }
    dirs
}

pub fn scan_test_sources(root: &Path, config: &Configuration) -> TestDiscovery {
    let parser = JavaSourceParser::from_configuration(config);
    let encodings: HashMap<&str, String> = config
        .sourcepath()
        .iter()
        .map(String::as_str)
        .zip(config.encodings())
        .collect();

    let mut discovery = TestDiscovery::default();
    for dir in test_source_dirs(root, config) {
        let encoding = encodings.get(dir.to_string_lossy().as_ref()).map(String::as_str);
        let files = WalkDir::new(&dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"));

        for entry in files {
            let path = entry.path();
            match parser.parse_file(path, encoding) {
                Ok(parsed) => {
                    let found = collect_tests(&parsed.tree, &parsed.source, path);
                    debug!("{}: {} test(s)", path.display(), found.len());
                    discovery.records.extend(found);
                }
                Err(e) => {
                    warn!("Skipping {}: {:#}", path.display(), e);
                    discovery
                        .skipped
                        .push(Degradation::new(path.display().to_string(), format!("{e:#}")));
                }
            }
        }
    }

    info!(
        "Discovered {} test method(s), skipped {} file(s)",
        discovery.records.len(),
        discovery.skipped.len()
    );
    discovery
}
