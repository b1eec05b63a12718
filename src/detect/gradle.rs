// ============================================================================
// Gradle 检测器 - 内省 (>= 6.0) + 文件系统约定
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

use crate::coordinate::{Coordinate, Scope};
use crate::detect::introspection::{with_session, IntrospectionService, ProjectModel};
use crate::detect::{BuildToolDetector, DetectionError};
use crate::jdk;
use crate::parser_config::{Configuration, ConfigurationBuilder};
use crate::repository::RepositoryLayout;
use crate::resolution::{ArtifactResolver, VersionResolutionContext};
use crate::settings::ResolverSettings;
use crate::version;

const BUILD_SCRIPTS: &[&str] = &["build.gradle", "build.gradle.kts"];
const SETTINGS_SCRIPTS: &[&str] = &["settings.gradle", "settings.gradle.kts"];

/// Assumed when the wrapper does not say; new enough for introspection.
pub const ASSUMED_GRADLE_VERSION: &str = "7.0";

const SOURCE_DIRS: &[&[&str]] = &[&["src", "main", "java"], &["src", "test", "java"]];

const CLASSPATH_DIRS: &[&[&str]] = &[
    &["src", "main", "resources"],
    &["src", "test", "resources"],
    &["build", "classes", "java", "main"],
    &["build", "classes", "java", "test"],
    &["build", "resources", "main"],
    &["build", "resources", "test"],
    // Layout of Gradle < 4
    &["build", "classes", "main"],
    &["build", "classes", "test"],
];

static STRING_NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(implementation|testImplementation|compileOnly|runtimeOnly|testCompileOnly|testRuntimeOnly|api|annotationProcessor)\s*[\(]?\s*["']([^"']+)["']\s*[\)]?"#,
    )
    .expect("valid Gradle dependency regex")
});

static PLATFORM_NOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*(implementation|testImplementation|compileOnly|runtimeOnly|testCompileOnly|testRuntimeOnly|api)\s*[\(]?\s*(?:enforcedPlatform|platform)\s*\("#,
    )
    .expect("valid Gradle platform regex")
});

static DEFINITION_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*:\s*"([^"]+)""#).expect("valid definition regex"));

static WRAPPER_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"gradle-(\d+\.\d+(?:\.\d+)?)-").expect("valid wrapper regex"));

static SOURCE_COMPATIBILITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"sourceCompatibility\s*=\s*(JavaVersion\.VERSION_\w+|['"]?[\d.]+['"]?)"#)
        .expect("valid sourceCompatibility regex")
});

static TOOLCHAIN_VERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"JavaLanguageVersion\.of\(\s*(\d+)\s*\)").expect("valid toolchain regex")
});

static JAVA_VERSION_CONSTANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"JavaVersion\.VERSION_\d+(?:_\d+)?").expect("valid JavaVersion regex"));

// ============================================================================
// 构建脚本解析
// ============================================================================

/// Dependency configuration in build.gradle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradleConfiguration {
    Implementation,
    TestImplementation,
    CompileOnly,
    RuntimeOnly,
    TestCompileOnly,
    TestRuntimeOnly,
    Api,
    AnnotationProcessor,
    Other(String),
}

impl FromStr for GradleConfiguration {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "implementation" => GradleConfiguration::Implementation,
            "testImplementation" => GradleConfiguration::TestImplementation,
            "compileOnly" => GradleConfiguration::CompileOnly,
            "runtimeOnly" => GradleConfiguration::RuntimeOnly,
            "testCompileOnly" => GradleConfiguration::TestCompileOnly,
            "testRuntimeOnly" => GradleConfiguration::TestRuntimeOnly,
            "api" => GradleConfiguration::Api,
            "annotationProcessor" => GradleConfiguration::AnnotationProcessor,
            other => GradleConfiguration::Other(other.to_string()),
        })
    }
}

impl GradleConfiguration {
    /// Closest Maven scope, which decides whether the jar is analysis-relevant.
    pub fn scope(&self) -> Scope {
        match self {
            GradleConfiguration::Implementation | GradleConfiguration::Api => Scope::Compile,
            GradleConfiguration::CompileOnly | GradleConfiguration::AnnotationProcessor => {
                Scope::Provided
            }
            GradleConfiguration::TestImplementation | GradleConfiguration::TestCompileOnly => {
                Scope::Test
            }
            GradleConfiguration::RuntimeOnly
            | GradleConfiguration::TestRuntimeOnly
            | GradleConfiguration::Other(_) => Scope::Runtime,
        }
    }
}

/// Parse string-notation dependencies from a build.gradle or build.gradle.kts.
///
/// Comments and `platform(...)` BOM imports are skipped. Versions built by
/// Groovy/Kotlin interpolation (`$junitVersion`) are treated as absent.
pub fn parse_gradle_build(content: &str) -> Vec<Coordinate> {
    let mut dependencies = Vec::new();
    let mut in_block_comment = false;

    for line in content.lines() {
        let mut trimmed = line.trim();

        if in_block_comment {
            match trimmed.find("*/") {
                Some(idx) => {
                    in_block_comment = false;
                    trimmed = trimmed[idx + 2..].trim();
                }
                None => continue,
            }
        }
        if trimmed.starts_with("/*") && !trimmed.contains("*/") {
            in_block_comment = true;
            continue;
        }
        if trimmed.starts_with("//") {
            continue;
        }

        let line_without_comment = match trimmed.find("//") {
            // Keep `//` inside a quoted string (URLs) intact.
            Some(idx) if !trimmed[..idx].contains("http") => &trimmed[..idx],
            _ => trimmed,
        };

        if PLATFORM_NOTATION.is_match(line_without_comment) {
            continue;
        }

        if let Some(caps) = STRING_NOTATION.captures(line_without_comment) {
            let config_str = caps.get(1).map(|m| m.as_str()).unwrap_or("implementation");
            let dep_str = caps.get(2).map(|m| m.as_str()).unwrap_or("");

            if let Some(dep) = parse_dependency_string(dep_str, config_str) {
                dependencies.push(dep);
            }
        }
    }

    dependencies
}

fn parse_dependency_string(dep_str: &str, config_str: &str) -> Option<Coordinate> {
    let mut coord = Coordinate::parse_gav(dep_str)?;
    if coord.version.as_deref().is_some_and(|v| v.contains('$')) {
        coord.version = None;
    }
    let configuration: GradleConfiguration = config_str.parse().ok()?;
    Some(coord.with_scope(configuration.scope()))
}

/// `ext.externalDependency = [ "key": "group:artifact:version", ... ]` entries.
pub fn parse_dependency_definitions(content: &str) -> BTreeMap<String, String> {
    let mut definitions = BTreeMap::new();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.trim();
        if !in_block {
            in_block = line.contains("ext.externalDependency = [");
            continue;
        }
        if line == "]" {
            break;
        }
        if let Some(caps) = DEFINITION_ENTRY.captures(line) {
            definitions.insert(caps[1].to_string(), caps[2].to_string());
        }
    }

    definitions
}

/// Gradle version from `gradle/wrapper/gradle-wrapper.properties`.
pub fn wrapper_version(root: &Path) -> String {
    let props = root.join("gradle").join("wrapper").join("gradle-wrapper.properties");
    let detected = fs::read_to_string(&props).ok().and_then(|content| {
        content
            .lines()
            .filter(|l| l.contains("distributionUrl"))
            .find_map(|l| WRAPPER_VERSION.captures(l).map(|c| c[1].to_string()))
    });

    match detected {
        Some(v) => {
            debug!("Gradle wrapper version {}", v);
            v
        }
        None => {
            debug!("Gradle version unknown, assuming {}", ASSUMED_GRADLE_VERSION);
            ASSUMED_GRADLE_VERSION.to_string()
        }
    }
}

pub fn tooling_supported(gradle_version: &str, minimum: &str) -> bool {
    version::compare(gradle_version, minimum) != std::cmp::Ordering::Less
}

/// Language level declared in a build script.
pub fn compliance_level(content: &str) -> Option<String> {
    let raw = SOURCE_COMPATIBILITY
        .captures(content)
        .map(|c| c[1].to_string())
        .or_else(|| TOOLCHAIN_VERSION.captures(content).map(|c| c[1].to_string()))
        .or_else(|| JAVA_VERSION_CONSTANT.find(content).map(|m| m.as_str().to_string()))?;
    jdk::normalize_compliance(&raw)
}

/// Directories holding a build script, root first, then sorted by path.
/// Hidden directories and `build/` output trees are not entered.
pub fn discover_modules(root: &Path) -> Vec<PathBuf> {
    let mut modules: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !name.starts_with('.') && name != "build"
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| BUILD_SCRIPTS.iter().any(|s| e.file_name() == *s))
        .filter_map(|e| e.path().parent().map(Path::to_path_buf))
        .collect();
    modules.dedup();

    // The root counts as a module even when only settings.gradle exists there.
    if !modules.iter().any(|m| m == root) {
        modules.insert(0, root.to_path_buf());
    }
    modules
}

fn read_build_script(dir: &Path) -> Option<String> {
    BUILD_SCRIPTS
        .iter()
        .find_map(|name| fs::read_to_string(dir.join(name)).ok())
}

// ============================================================================
// 检测器
// ============================================================================

pub struct GradleDetector {
    settings: ResolverSettings,
    service: Box<dyn IntrospectionService>,
}

impl GradleDetector {
    pub fn new(settings: ResolverSettings, service: Box<dyn IntrospectionService>) -> Self {
        Self { settings, service }
    }

    /// Project-local cache, user cache, then the Maven local repository.
    fn resolver(&self, root: &Path) -> ArtifactResolver {
        let files = |base: &Path| base.join("caches").join("modules-2").join("files-2.1");
        ArtifactResolver::new(vec![
            RepositoryLayout::gradle_cache(files(&root.join(".gradle"))),
            RepositoryLayout::gradle_cache(files(&self.settings.gradle_user_home)),
            RepositoryLayout::maven(&self.settings.maven_repo),
        ])
    }

    fn introspect(&self, root: &Path, builder: &mut ConfigurationBuilder) {
        if !self.settings.introspection {
            debug!("Introspection disabled");
            return;
        }
        let gradle_version = wrapper_version(root);
        if !tooling_supported(&gradle_version, &self.settings.min_tooling_version) {
            debug!(
                "Gradle {} is older than {}, using filesystem detection only",
                gradle_version, self.settings.min_tooling_version
            );
            return;
        }

        match with_session(self.service.as_ref(), root, |session| session.project_model()) {
            Ok(model) => apply_model(&model, builder),
            Err(e) => builder.degrade("gradle introspection", e.to_string()),
        }
    }
}

impl BuildToolDetector for GradleDetector {
    fn name(&self) -> &'static str {
        "gradle"
    }

    fn supports(&self, root: &Path) -> bool {
        BUILD_SCRIPTS
            .iter()
            .chain(SETTINGS_SCRIPTS)
            .any(|name| root.join(name).is_file())
    }

    fn detect(&self, root: &Path) -> Result<Configuration, DetectionError> {
        if !self.supports(root) {
            return Err(DetectionError::failed(root, "not a Gradle project"));
        }
        let root = fs::canonicalize(root).map_err(|e| DetectionError::failed(root, e))?;

        let mut builder = Configuration::builder();
        builder.default_encoding(&self.settings.default_encoding);
        builder.extend_degradations(self.settings.degradations.iter().cloned());

        let mut ctx = VersionResolutionContext::new();
        let definitions = root.join("gradle").join("scripts").join("dependencyDefinitions.gradle");
        if let Ok(content) = fs::read_to_string(&definitions) {
            for gav in parse_dependency_definitions(&content).values() {
                let Some(coord) = Coordinate::parse_gav(gav) else {
                    continue;
                };
                if let Some(v) = coord.version.as_deref() {
                    ctx.record_managed(coord.key(), v);
                }
            }
        }

        // Introspection first; the filesystem strategy always runs afterwards
        // and the builder drops paths already added.
        self.introspect(&root, &mut builder);

        let mut declared: Vec<Coordinate> = Vec::new();
        for module in discover_modules(&root) {
            debug!("Gradle module at {}", module.display());
            add_module_directories(&module, &mut builder);
            if let Some(script) = read_build_script(&module) {
                for dep in parse_gradle_build(&script) {
                    if let Some(v) = dep.version.as_deref() {
                        ctx.record_explicit(dep.key(), v);
                    }
                    declared.push(dep);
                }
            }
        }

        let resolver = self.resolver(&root);
        for dep in &declared {
            if !dep.scope.is_analysis_scope() {
                continue;
            }
            match resolver.resolve_declared(dep, &ctx) {
                Some(artifact) => {
                    builder.classpath(&artifact.path);
                }
                None => builder.degrade(format!("dependency {dep}"), "no jar in any local cache"),
            }
        }
        for artifact in resolver.resolve_common_test_libraries(&ctx) {
            builder.classpath(&artifact.path);
        }

        let level = read_build_script(&root)
            .and_then(|script| compliance_level(&script))
            .unwrap_or_else(|| self.settings.default_compliance_level.clone());
        builder.compliance_level(&level);

        if let Some(java_home) = &self.settings.java_home {
            if let Some(runtime) = jdk::runtime_library(java_home) {
                builder.classpath(runtime);
            }
        }

        Ok(builder.build())
    }
}

fn apply_model(model: &ProjectModel, builder: &mut ConfigurationBuilder) {
    debug!("Introspection reported {} modules", model.modules.len());
    for module in &model.modules {
        for dir in &module.source_dirs {
            builder.sourcepath_if_exists(dir);
        }
        for dir in &module.output_dirs {
            builder.classpath_if_exists(dir);
        }
        for jar in &module.dependencies {
            if jar.extension().is_some_and(|e| e == "jar") && jar.is_file() {
                builder.classpath(jar);
            } else {
                debug!("Ignoring introspected dependency {}", jar.display());
            }
        }
    }
}

fn add_module_directories(module: &Path, builder: &mut ConfigurationBuilder) {
    let join = |parts: &[&str]| parts.iter().fold(module.to_path_buf(), |p, part| p.join(part));

    for parts in SOURCE_DIRS {
        builder.sourcepath_if_exists(&join(parts));
    }
    for parts in CLASSPATH_DIRS {
        builder.classpath_if_exists(&join(parts));
    }

    let libs = module.join("build").join("libs");
    if let Ok(entries) = fs::read_dir(&libs) {
        let mut jars: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "jar"))
            .collect();
        jars.sort();
        for jar in jars {
            builder.classpath(jar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::introspection::fake::FakeService;
    use crate::detect::introspection::ModuleModel;
    use std::fs::File;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn wrapper(root: &Path, version: &str) {
        write(
            &root.join("gradle/wrapper/gradle-wrapper.properties"),
            &format!("distributionUrl=https\\://services.gradle.org/distributions/gradle-{version}-bin.zip\n"),
        );
    }

    fn settings(home: &Path) -> ResolverSettings {
        ResolverSettings::new(home.join("m2"), home.join("gradle-home"))
    }

    #[test]
    fn test_parse_gradle_build_basic() {
        let content = r#"
dependencies {
    implementation 'org.springframework:spring-core:5.3.10'
    testImplementation "org.junit.jupiter:junit-jupiter-api:5.8.1"
    compileOnly 'org.projectlombok:lombok'
    runtimeOnly 'com.h2database:h2:2.1.214'
}
"#;
        let deps = parse_gradle_build(content);
        assert_eq!(deps.len(), 4);
        assert_eq!(deps[0].to_string(), "org.springframework:spring-core:5.3.10");
        assert_eq!(deps[0].scope, Scope::Compile);
        assert_eq!(deps[1].scope, Scope::Test);
        assert_eq!(deps[2].version, None);
        assert_eq!(deps[2].scope, Scope::Provided);
        assert_eq!(deps[3].scope, Scope::Runtime);
    }

    #[test]
    fn test_parse_gradle_build_kotlin_dsl() {
        let content = r#"
dependencies {
    implementation("com.google.guava:guava:33.2.1-jre")
    testImplementation("org.mockito:mockito-core:$mockitoVersion")
    implementation(platform("org.springframework.boot:spring-boot-dependencies:3.2.0"))
}
"#;
        let deps = parse_gradle_build(content);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].version.as_deref(), Some("33.2.1-jre"));
        assert_eq!(deps[1].version, None);
    }

    #[test]
    fn test_parse_gradle_build_skips_comments() {
        let content = r#"
dependencies {
    // implementation 'commented:out:1.0'
    /*
    implementation 'block:comment:1.0'
    */
    implementation 'real:dep:1.0' // trailing comment
}
"#;
        let deps = parse_gradle_build(content);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].artifact_id, "dep");
    }

    #[test]
    fn test_parse_dependency_definitions() {
        let content = r#"
ext.externalDependency = [
    "testng": "org.testng:testng:6.14.3",
    "mockito": "org.mockito:mockito-core:4.11.0",
]
ext.other = [ "x": "ignored:after:1.0" ]
"#;
        let defs = parse_dependency_definitions(content);
        assert_eq!(defs.len(), 2);
        assert_eq!(defs["testng"], "org.testng:testng:6.14.3");
    }

    #[test]
    fn test_wrapper_version_and_threshold() {
        let dir = tempdir().unwrap();
        assert_eq!(wrapper_version(dir.path()), "7.0");
        wrapper(dir.path(), "5.6.4");
        assert_eq!(wrapper_version(dir.path()), "5.6.4");

        assert!(!tooling_supported("5.6.4", "6.0"));
        assert!(tooling_supported("6.0", "6.0"));
        assert!(tooling_supported("8.10.2", "6.0"));
    }

    #[test]
    fn test_compliance_level() {
        assert_eq!(compliance_level("sourceCompatibility = '11'").as_deref(), Some("11"));
        assert_eq!(
            compliance_level("sourceCompatibility = JavaVersion.VERSION_1_8").as_deref(),
            Some("1.8")
        );
        assert_eq!(
            compliance_level("java { toolchain { languageVersion = JavaLanguageVersion.of(21) } }").as_deref(),
            Some("21")
        );
        assert_eq!(compliance_level("targetCompatibility = JavaVersion.VERSION_17").as_deref(), Some("17"));
        assert_eq!(compliance_level("apply plugin: 'java'"), None);
    }

    #[test]
    fn test_discover_modules_skips_hidden_and_build() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(&root.join("settings.gradle"), "include 'app'");
        write(&root.join("app/build.gradle"), "");
        write(&root.join("lib/build.gradle.kts"), "");
        write(&root.join(".gradle/nested/build.gradle"), "");
        write(&root.join("app/build/tmp/build.gradle"), "");

        let modules = discover_modules(root);
        assert_eq!(modules, vec![root.to_path_buf(), root.join("app"), root.join("lib")]);
    }

    #[test]
    fn test_filesystem_strategy_below_threshold_skips_introspection() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let root = fs::canonicalize(project.path()).unwrap();
        wrapper(&root, "5.6.4");
        write(&root.join("build.gradle"), "dependencies {\n  testImplementation 'org.testng:testng:7.7.1'\n}\nsourceCompatibility = '11'\n");
        fs::create_dir_all(root.join("src/test/java")).unwrap();
        touch(&root.join("build/libs/app-1.0.jar"));

        let cache = RepositoryLayout::gradle_cache(root.join(".gradle/caches/modules-2/files-2.1"));
        let testng = cache.version_dir("org.testng", "testng", "7.7.1").join("abc").join("testng-7.7.1.jar");
        touch(&testng);

        let service = FakeService::with_model(ProjectModel::default());
        let detector = GradleDetector::new(settings(home.path()), Box::new(service.clone()));
        let config = detector.detect(&root).unwrap();

        assert_eq!(service.connects.get(), 0);
        assert!(config.classpath().contains(&testng.to_string_lossy().to_string()));
        assert!(config.classpath().iter().any(|p| p.ends_with("app-1.0.jar")));
        assert_eq!(config.sourcepath().len(), 1);
        assert_eq!(config.compliance_level(), "11");
    }

    #[test]
    fn test_introspection_merges_with_filesystem_and_releases_session() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let root = fs::canonicalize(project.path()).unwrap();
        wrapper(&root, "8.5");
        write(&root.join("build.gradle"), "");
        let main_java = root.join("src/main/java");
        fs::create_dir_all(&main_java).unwrap();
        let generated = root.join("build/generated/sources");
        fs::create_dir_all(&generated).unwrap();
        let jar = home.path().join("external.jar");
        touch(&jar);

        let model = ProjectModel {
            modules: vec![ModuleModel {
                name: ":".to_string(),
                source_dirs: vec![main_java.clone(), generated.clone(), root.join("src/missing")],
                output_dirs: vec![],
                dependencies: vec![jar.clone(), home.path().join("absent.jar")],
            }],
        };
        let service = FakeService::with_model(model);
        let detector = GradleDetector::new(settings(home.path()), Box::new(service.clone()));
        let config = detector.detect(&root).unwrap();

        assert_eq!(service.connects.get(), 1);
        assert_eq!(service.closes.get(), 1);
        // src/main/java came from both strategies but appears once.
        assert_eq!(
            config.sourcepath(),
            &[
                main_java.to_string_lossy().to_string(),
                generated.to_string_lossy().to_string()
            ]
        );
        assert!(config.classpath().contains(&jar.to_string_lossy().to_string()));
        assert!(!config.classpath().iter().any(|p| p.ends_with("absent.jar")));
    }

    #[test]
    fn test_introspection_failure_degrades_and_releases() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        write(&project.path().join("settings.gradle"), "");

        let service = FakeService::failing();
        let detector = GradleDetector::new(settings(home.path()), Box::new(service.clone()));
        let config = detector.detect(project.path()).unwrap();

        assert_eq!(service.connects.get(), 1);
        assert_eq!(service.closes.get(), 1);
        assert!(config.degradations().iter().any(|d| d.subject == "gradle introspection"));
        assert_eq!(config.compliance_level(), "17");
    }

    #[test]
    fn test_introspection_can_be_disabled() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        write(&project.path().join("build.gradle.kts"), "");

        let service = FakeService::with_model(ProjectModel::default());
        let detector = GradleDetector::new(
            settings(home.path()).with_introspection(false),
            Box::new(service.clone()),
        );
        detector.detect(project.path()).unwrap();
        assert_eq!(service.connects.get(), 0);
    }

    #[test]
    fn test_dependency_definitions_feed_managed_versions() {
        let home = tempdir().unwrap();
        let project = tempdir().unwrap();
        let root = fs::canonicalize(project.path()).unwrap();
        write(&root.join("build.gradle"), "");
        write(
            &root.join("gradle/scripts/dependencyDefinitions.gradle"),
            "ext.externalDependency = [\n  \"mockito\": \"org.mockito:mockito-core:4.11.0\",\n]\n",
        );

        let user_cache = RepositoryLayout::gradle_cache(home.path().join("gradle-home/caches/modules-2/files-2.1"));
        let managed = user_cache
            .version_dir("org.mockito", "mockito-core", "4.11.0")
            .join("h1")
            .join("mockito-core-4.11.0.jar");
        touch(&managed);
        let newer = user_cache
            .version_dir("org.mockito", "mockito-core", "5.15.2")
            .join("h2")
            .join("mockito-core-5.15.2.jar");
        touch(&newer);

        let detector = GradleDetector::new(
            settings(home.path()).with_introspection(false),
            Box::new(FakeService::default()),
        );
        let config = detector.detect(&root).unwrap();
        assert!(config.classpath().contains(&managed.to_string_lossy().to_string()));
        assert!(!config.classpath().contains(&newer.to_string_lossy().to_string()));
    }
}
