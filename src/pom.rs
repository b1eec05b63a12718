// ============================================================================
// Maven POM 解析 (quick-xml)
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::coordinate::{Coordinate, CoordinateKey};
use crate::properties;

#[derive(Debug, thiserror::Error)]
pub enum PomError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse XML in {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: quick_xml::Error,
    },
}

/// `<parent>` section of a POM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    /// `None` = not declared (Maven default `../pom.xml`),
    /// `Some("")` = explicitly disabled with `<relativePath/>`.
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn key(&self) -> Option<CoordinateKey> {
        Some(CoordinateKey::new(
            self.group_id.clone()?,
            self.artifact_id.clone()?,
        ))
    }
}

/// The parts of a `pom.xml` the resolver queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDescriptor {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub parent: Option<ParentRef>,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<Coordinate>,
    pub managed_dependencies: Vec<Coordinate>,
    pub modules: Vec<String>,
}

impl PomDescriptor {
    pub fn read(path: &Path) -> Result<Self, PomError> {
        let content = fs::read_to_string(path).map_err(|source| PomError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_pom(&content).map_err(|source| PomError::Xml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The project's own version, falling back to the parent's (Maven inherits it).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.version.as_deref()))
    }

    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.group_id.as_deref()))
    }

    /// Resolve a `${...}` value against this descriptor's own properties.
    pub fn resolve_property(&self, value: &str) -> String {
        properties::resolve(value, &self.properties, self.effective_version())
    }
}

// Element paths relative to the document root, without the root itself.
const DEPENDENCY: &[&str] = &["dependencies", "dependency"];
const MANAGED_DEPENDENCY: &[&str] = &["dependencyManagement", "dependencies", "dependency"];

/// Parse POM content.
///
/// Only direct sections of `<project>` count: dependencies nested in
/// `<profiles>` or `<build><plugins>` are ignored, and commented-out elements
/// never produce events.
pub fn parse_pom(content: &str) -> Result<PomDescriptor, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut pom = PomDescriptor::default();
    let mut buf = Vec::new();

    // Element names below <project>.
    let mut path: Vec<String> = Vec::new();
    let mut depth = 0usize;
    let mut text = String::new();
    let mut current_dep: Option<PartialDependency> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                depth += 1;
                if depth > 1 {
                    path.push(name);
                }
                text.clear();

                if is_path(&path, DEPENDENCY) || is_path(&path, MANAGED_DEPENDENCY) {
                    current_dep = Some(PartialDependency::default());
                }
            }
            Event::Empty(ref e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if depth == 1 && name == "parent" {
                    pom.parent.get_or_insert_with(ParentRef::default);
                }
                if depth >= 1 {
                    path.push(name);
                    // `<relativePath/>` explicitly disables the filesystem lookup.
                    if is_path(&path, &["parent", "relativePath"]) {
                        pom.parent.get_or_insert_with(ParentRef::default).relative_path =
                            Some(String::new());
                    }
                    path.pop();
                }
            }
            Event::Text(ref e) => {
                text.push_str(&e.unescape()?);
            }
            Event::CData(ref e) => {
                text.push_str(&String::from_utf8_lossy(e));
            }
            Event::End(_) => {
                let value = text.trim().to_string();
                text.clear();
                apply_value(&mut pom, &mut current_dep, &path, value);

                if is_path(&path, DEPENDENCY) {
                    if let Some(dep) = current_dep.take().and_then(|p| p.into_coordinate()) {
                        pom.dependencies.push(dep);
                    }
                } else if is_path(&path, MANAGED_DEPENDENCY) {
                    if let Some(dep) = current_dep.take().and_then(|p| p.into_coordinate()) {
                        pom.managed_dependencies.push(dep);
                    }
                }

                if depth > 1 {
                    path.pop();
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            // Comments, declarations and processing instructions carry nothing.
            _ => {}
        }
        buf.clear();
    }

    Ok(pom)
}

fn apply_value(
    pom: &mut PomDescriptor,
    current_dep: &mut Option<PartialDependency>,
    path: &[String],
    value: String,
) {
    if value.is_empty() {
        return;
    }
    let segments: Vec<&str> = path.iter().map(String::as_str).collect();

    match segments.as_slice() {
        ["groupId"] => pom.group_id = Some(value),
        ["artifactId"] => pom.artifact_id = Some(value),
        ["version"] => pom.version = Some(value),
        ["packaging"] => pom.packaging = Some(value),
        ["parent", field] => {
            let parent = pom.parent.get_or_insert_with(ParentRef::default);
            match *field {
                "groupId" => parent.group_id = Some(value),
                "artifactId" => parent.artifact_id = Some(value),
                "version" => parent.version = Some(value),
                "relativePath" => parent.relative_path = Some(value),
                _ => {}
            }
        }
        ["properties", key] => {
            pom.properties.insert(key.to_string(), value);
        }
        ["modules", "module"] => pom.modules.push(value),
        ["dependencies", "dependency", field]
        | ["dependencyManagement", "dependencies", "dependency", field] => {
            if let Some(dep) = current_dep.as_mut() {
                match *field {
                    "groupId" => dep.group_id = Some(value),
                    "artifactId" => dep.artifact_id = Some(value),
                    "version" => dep.version = Some(value),
                    "scope" => dep.scope = Some(value),
                    "type" => dep.type_ = Some(value),
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn is_path(path: &[String], expected: &[&str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

/// Helper struct for building a Coordinate during parsing
#[derive(Default)]
struct PartialDependency {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
    scope: Option<String>,
    type_: Option<String>,
}

impl PartialDependency {
    fn into_coordinate(self) -> Option<Coordinate> {
        let group_id = self.group_id?;
        let artifact_id = self.artifact_id?;

        // Only plain jars and BOM imports matter for the classpath.
        if let Some(t) = self.type_.as_deref() {
            if t != "jar" && t != "pom" && t != "test-jar" {
                return None;
            }
        }

        let scope = self
            .scope
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();

        Some(Coordinate {
            group_id,
            artifact_id,
            version: self.version,
            scope,
        })
    }
}

/// Extract `<localRepository>` from a Maven `settings.xml`.
pub fn parse_local_repository(content: &str) -> Result<Option<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut in_local_repo = false;
    let mut value = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) if e.local_name().as_ref() == b"localRepository" => {
                in_local_repo = true;
            }
            Event::Text(ref e) if in_local_repo => {
                value.push_str(&e.unescape()?);
            }
            Event::End(ref e) if e.local_name().as_ref() == b"localRepository" => {
                let trimmed = value.trim();
                return Ok((!trimmed.is_empty()).then(|| trimmed.to_string()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Scope;

    const FULL_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>com.example</groupId>
        <artifactId>example-parent</artifactId>
        <version>2.0.0</version>
    </parent>
    <artifactId>app</artifactId>
    <packaging>pom</packaging>
    <properties>
        <junit.version>5.10.0</junit.version>
        <maven.compiler.release>21</maven.compiler.release>
    </properties>
    <modules>
        <module>core</module>
        <module>web</module>
    </modules>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.mockito</groupId>
                <artifactId>mockito-core</artifactId>
                <version>5.11.0</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>org.junit.jupiter</groupId>
            <artifactId>junit-jupiter-api</artifactId>
            <version>${junit.version}</version>
            <scope>test</scope>
        </dependency>
        <!--
        <dependency>
            <groupId>commented</groupId>
            <artifactId>out</artifactId>
        </dependency>
        -->
        <dependency>
            <groupId>org.mockito</groupId>
            <artifactId>mockito-core</artifactId>
        </dependency>
    </dependencies>
    <build>
        <plugins>
            <plugin>
                <groupId>org.apache.maven.plugins</groupId>
                <artifactId>maven-surefire-plugin</artifactId>
                <version>3.2.5</version>
                <dependencies>
                    <dependency>
                        <groupId>plugin</groupId>
                        <artifactId>only</artifactId>
                    </dependency>
                </dependencies>
            </plugin>
        </plugins>
    </build>
</project>"#;

    #[test]
    fn test_parse_top_level_fields() {
        let pom = parse_pom(FULL_POM).unwrap();
        assert_eq!(pom.group_id, None);
        assert_eq!(pom.artifact_id.as_deref(), Some("app"));
        assert_eq!(pom.version, None);
        assert_eq!(pom.packaging.as_deref(), Some("pom"));
        assert_eq!(pom.effective_version(), Some("2.0.0"));
        assert_eq!(pom.effective_group_id(), Some("com.example"));
        assert_eq!(pom.modules, vec!["core", "web"]);
    }

    #[test]
    fn test_parse_parent() {
        let pom = parse_pom(FULL_POM).unwrap();
        let parent = pom.parent.unwrap();
        assert_eq!(parent.group_id.as_deref(), Some("com.example"));
        assert_eq!(parent.artifact_id.as_deref(), Some("example-parent"));
        assert_eq!(parent.version.as_deref(), Some("2.0.0"));
        assert_eq!(parent.relative_path, None);
    }

    #[test]
    fn test_parse_dependencies_ignores_comments_and_plugins() {
        let pom = parse_pom(FULL_POM).unwrap();
        assert_eq!(pom.dependencies.len(), 2);
        assert_eq!(pom.dependencies[0].artifact_id, "junit-jupiter-api");
        assert_eq!(pom.dependencies[0].version.as_deref(), Some("${junit.version}"));
        assert_eq!(pom.dependencies[0].scope, Scope::Test);
        assert_eq!(pom.dependencies[1].artifact_id, "mockito-core");
        assert_eq!(pom.dependencies[1].version, None);
        assert_eq!(pom.dependencies[1].scope, Scope::Compile);
    }

    #[test]
    fn test_parse_dependency_management() {
        let pom = parse_pom(FULL_POM).unwrap();
        assert_eq!(pom.managed_dependencies.len(), 1);
        assert_eq!(pom.managed_dependencies[0].version.as_deref(), Some("5.11.0"));
    }

    #[test]
    fn test_parse_properties_and_resolve() {
        let pom = parse_pom(FULL_POM).unwrap();
        assert_eq!(pom.properties.get("junit.version").map(String::as_str), Some("5.10.0"));
        assert_eq!(pom.resolve_property("${junit.version}"), "5.10.0");
        assert_eq!(pom.resolve_property("${project.version}"), "2.0.0");
    }

    #[test]
    fn test_empty_relative_path() {
        let pom = parse_pom(
            r#"<project><parent><groupId>g</groupId><artifactId>p</artifactId>
               <version>1</version><relativePath/></parent></project>"#,
        )
        .unwrap();
        assert_eq!(pom.parent.unwrap().relative_path.as_deref(), Some(""));
    }

    #[test]
    fn test_non_jar_types_are_skipped() {
        let pom = parse_pom(
            r#"<project><dependencies>
                <dependency><groupId>g</groupId><artifactId>zip</artifactId><type>zip</type></dependency>
                <dependency><groupId>g</groupId><artifactId>jar</artifactId><type>jar</type></dependency>
            </dependencies></project>"#,
        )
        .unwrap();
        assert_eq!(pom.dependencies.len(), 1);
        assert_eq!(pom.dependencies[0].artifact_id, "jar");
    }

    #[test]
    fn test_malformed_pom_is_error() {
        assert!(parse_pom("<project><dependencies></project>").is_err());
    }

    #[test]
    fn test_parse_local_repository() {
        let settings = r#"<settings><localRepository> /opt/m2 </localRepository></settings>"#;
        assert_eq!(parse_local_repository(settings).unwrap().as_deref(), Some("/opt/m2"));
        assert_eq!(parse_local_repository("<settings/>").unwrap(), None);
    }
}
