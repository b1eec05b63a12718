// ============================================================================
// Maven 检测器
// ============================================================================

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::coordinate::Coordinate;
use crate::detect::{BuildToolDetector, DetectionError};
use crate::jdk;
use crate::modules::{self, Module, POM_FILE};
use crate::parser_config::{Configuration, ConfigurationBuilder};
use crate::pom::PomDescriptor;
use crate::repository::RepositoryLayout;
use crate::resolution::{ArtifactResolver, VersionResolutionContext};
use crate::settings::ResolverSettings;

/// Properties consulted for the language level, in priority order.
const COMPLIANCE_PROPERTIES: &[&str] = &[
    "maven.compiler.release",
    "maven.compiler.source",
    "maven.compiler.target",
    "java.version",
];

#[derive(Debug, Clone)]
pub struct MavenDetector {
    settings: ResolverSettings,
}

impl MavenDetector {
    pub fn new(settings: ResolverSettings) -> Self {
        Self { settings }
    }
}

impl BuildToolDetector for MavenDetector {
    fn name(&self) -> &'static str {
        "maven"
    }

    fn supports(&self, root: &Path) -> bool {
        root.join(POM_FILE).is_file()
    }

    fn detect(&self, root: &Path) -> Result<Configuration, DetectionError> {
        if !self.supports(root) {
            return Err(DetectionError::failed(root, "not a Maven project"));
        }
        let root = fs::canonicalize(root).map_err(|e| DetectionError::failed(root, e))?;
        let descriptor =
            PomDescriptor::read(&root.join(POM_FILE)).map_err(|e| DetectionError::failed(&root, e))?;

        let repo = RepositoryLayout::maven(&self.settings.maven_repo);
        debug!("Using local Maven repository {}", repo.root().display());

        let mut builder = Configuration::builder();
        builder.default_encoding(&self.settings.default_encoding);
        builder.extend_degradations(self.settings.degradations.iter().cloned());

        let project = modules::aggregate(&root, descriptor, &repo);
        builder.extend_degradations(project.degradations.iter().cloned());

        for module in &project.modules {
            module.contribute_directories(&mut builder);
        }

        let resolver = ArtifactResolver::new(vec![repo]);
        for module in &project.modules {
            add_declared_dependencies(&resolver, module, &project.context, &mut builder);
        }
        for artifact in resolver.resolve_common_test_libraries(&project.context) {
            builder.classpath(&artifact.path);
        }

        let level = project
            .root()
            .and_then(compliance_level)
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

fn add_declared_dependencies(
    resolver: &ArtifactResolver,
    module: &Module,
    ctx: &VersionResolutionContext,
    builder: &mut ConfigurationBuilder,
) {
    for declared in &module.descriptor.dependencies {
        if !declared.scope.is_analysis_scope() {
            continue;
        }
        let dep = Coordinate {
            version: declared.version.as_deref().map(|v| module.resolve_property(v)),
            ..declared.clone()
        };
        match resolver.resolve_declared(&dep, ctx) {
            Some(artifact) => {
                builder.classpath(&artifact.path);
            }
            None => builder.degrade(format!("dependency {dep}"), "no jar in the local repository"),
        }
    }
}

/// Language level from the effective properties of a module.
fn compliance_level(module: &Module) -> Option<String> {
    COMPLIANCE_PROPERTIES.iter().find_map(|name| {
        let raw = module.properties.get(*name)?;
        jdk::normalize_compliance(&module.resolve_property(raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        File::create(path).unwrap();
    }

    fn detector(repo: &Path) -> MavenDetector {
        MavenDetector::new(ResolverSettings::new(repo, repo.join("gradle-home")))
    }

    #[test]
    fn test_supports_requires_pom() {
        let dir = tempdir().unwrap();
        let d = detector(dir.path());
        assert!(!d.supports(dir.path()));
        write(&dir.path().join("pom.xml"), "<project/>");
        assert!(d.supports(dir.path()));
    }

    #[test]
    fn test_malformed_root_pom_is_detection_failure() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("pom.xml"), "<project><dependencies></project>");
        let err = detector(dir.path()).detect(dir.path()).unwrap_err();
        assert!(matches!(err, DetectionError::Failed { .. }));
    }

    #[test]
    fn test_conventional_dirs_and_dependencies() {
        let project = tempdir().unwrap();
        let repo_dir = tempdir().unwrap();
        let repo = RepositoryLayout::maven(repo_dir.path());
        let root = fs::canonicalize(project.path()).unwrap();

        write(
            &root.join("pom.xml"),
            r#"<project>
                <properties><maven.compiler.release>21</maven.compiler.release>
                            <lib.version>1.0</lib.version></properties>
                <dependencies>
                    <dependency><groupId>com.acme</groupId><artifactId>lib</artifactId><version>${lib.version}</version></dependency>
                    <dependency><groupId>com.acme</groupId><artifactId>tool</artifactId><version>9.9</version><scope>runtime</scope></dependency>
                    <dependency><groupId>com.acme</groupId><artifactId>missing</artifactId><version>1.0</version></dependency>
                </dependencies>
            </project>"#,
        );
        fs::create_dir_all(root.join("src/main/java")).unwrap();
        fs::create_dir_all(root.join("target/classes")).unwrap();
        let lib = repo.artifact_path("com.acme", "lib", "1.0", "jar");
        touch(&lib);
        touch(&repo.artifact_path("com.acme", "tool", "9.9", "jar"));

        let config = detector(repo_dir.path()).detect(&root).unwrap();
        let lib = lib.to_string_lossy().to_string();
        assert!(config.classpath().contains(&lib));
        assert!(config.classpath().iter().all(|p| !p.contains("tool")));
        assert!(config.classpath().iter().any(|p| p.ends_with("classes")));
        assert_eq!(config.sourcepath(), &[root.join("src/main/java").to_string_lossy().to_string()]);
        assert_eq!(config.compliance_level(), "21");
        assert!(config
            .degradations()
            .iter()
            .any(|d| d.subject == "dependency com.acme:missing:1.0"));
    }

    #[test]
    fn test_common_test_library_via_inherited_management() {
        let project = tempdir().unwrap();
        let repo_dir = tempdir().unwrap();
        let repo = RepositoryLayout::maven(repo_dir.path());

        write(
            &repo.artifact_path("org.corp", "parent", "3", "pom"),
            r#"<project><groupId>org.corp</groupId><artifactId>parent</artifactId><version>3</version>
                <dependencyManagement><dependencies>
                  <dependency><groupId>org.junit.jupiter</groupId><artifactId>junit-jupiter-api</artifactId><version>5.9.2</version></dependency>
                </dependencies></dependencyManagement></project>"#,
        );
        write(
            &project.path().join("pom.xml"),
            r#"<project><parent><groupId>org.corp</groupId><artifactId>parent</artifactId><version>3</version>
                <relativePath/></parent><artifactId>app</artifactId></project>"#,
        );
        let inherited = repo.artifact_path("org.junit.jupiter", "junit-jupiter-api", "5.9.2", "jar");
        touch(&inherited);
        touch(&repo.artifact_path("org.junit.jupiter", "junit-jupiter-api", "5.11.4", "jar"));
        // Same train: the params artifact follows the known api version.
        let params = repo.artifact_path("org.junit.jupiter", "junit-jupiter-params", "5.9.2", "jar");
        touch(&params);

        let config = detector(repo_dir.path()).detect(project.path()).unwrap();
        let cp: Vec<PathBuf> = config.classpath().iter().map(PathBuf::from).collect();
        assert!(cp.contains(&inherited));
        assert!(cp.contains(&params));
        assert!(!cp.iter().any(|p| p.to_string_lossy().contains("5.11.4")));
        assert_eq!(config.compliance_level(), "17");
    }

    #[test]
    fn test_jdk_runtime_library_is_appended() {
        let project = tempdir().unwrap();
        let jdk_dir = tempdir().unwrap();
        write(&project.path().join("pom.xml"), "<project/>");
        let jrt = jdk_dir.path().join("lib").join("jrt-fs.jar");
        touch(&jrt);

        let settings = ResolverSettings::new(project.path().join("m2"), project.path().join("g"))
            .with_java_home(jdk_dir.path());
        let config = MavenDetector::new(settings).detect(project.path()).unwrap();
        let jrt = jrt.to_string_lossy().to_string();
        assert_eq!(config.classpath().last(), Some(&jrt));
    }
}
