// ============================================================================
// 构建工具内省服务 - 会话获取 / 释放
// ============================================================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tracing::debug;

const MODEL_BEGIN: &str = "JAVA_INTROSPECT_MODEL_BEGIN";
const MODEL_END: &str = "JAVA_INTROSPECT_MODEL_END";
const MODEL_TASK: &str = "printIntrospectModel";

#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    ExitStatus {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("introspection output has no model block")]
    MissingModel,

    #[error("invalid introspection model: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to prepare introspection session: {0}")]
    Io(#[from] io::Error),
}

/// Module/dependency model reported by the build tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub modules: Vec<ModuleModel>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleModel {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub output_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub dependencies: Vec<PathBuf>,
}

impl ProjectModel {
    /// Parse the JSON block between the sentinel lines of `output`.
    pub fn from_output(output: &str) -> Result<Self, IntrospectionError> {
        let json = extract_sentinel_block(output, MODEL_BEGIN, MODEL_END)
            .ok_or(IntrospectionError::MissingModel)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// An out-of-process service that can describe a project.
pub trait IntrospectionService {
    fn connect(&self, root: &Path) -> Result<Box<dyn IntrospectionSession>, IntrospectionError>;
}

/// An open connection. `close` must be idempotent.
pub trait IntrospectionSession {
    fn project_model(&mut self) -> Result<ProjectModel, IntrospectionError>;
    fn close(&mut self);
}

/// Closes the wrapped session when dropped, on success and error paths alike.
pub struct SessionGuard {
    session: Box<dyn IntrospectionSession>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn IntrospectionSession>) -> Self {
        Self { session }
    }

    pub fn project_model(&mut self) -> Result<ProjectModel, IntrospectionError> {
        self.session.project_model()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.close();
    }
}

/// Acquire a session, run `f` against it and release it before returning.
pub fn with_session<T>(
    service: &dyn IntrospectionService,
    root: &Path,
    f: impl FnOnce(&mut SessionGuard) -> Result<T, IntrospectionError>,
) -> Result<T, IntrospectionError> {
    let mut guard = SessionGuard::new(service.connect(root)?);
    f(&mut guard)
}

// ============================================================================
// Gradle 命令行实现
// ============================================================================

/// Runs the project's wrapper (or `gradle` from PATH) with a generated init
/// script that prints the model.
#[derive(Debug, Clone)]
pub struct GradleCliService {
    gradle_path: PathBuf,
    prefer_wrapper: bool,
}

impl Default for GradleCliService {
    fn default() -> Self {
        Self {
            gradle_path: PathBuf::from("gradle"),
            prefer_wrapper: true,
        }
    }
}

impl GradleCliService {
    pub fn new(gradle_path: impl Into<PathBuf>, prefer_wrapper: bool) -> Self {
        Self {
            gradle_path: gradle_path.into(),
            prefer_wrapper,
        }
    }

    fn executable(&self, root: &Path) -> PathBuf {
        if self.prefer_wrapper {
            let wrappers = if cfg!(windows) {
                ["gradlew.bat", "gradlew"]
            } else {
                ["gradlew", "gradlew.bat"]
            };
            if let Some(wrapper) = wrappers.iter().map(|w| root.join(w)).find(|p| p.is_file()) {
                return wrapper;
            }
        }
        self.gradle_path.clone()
    }
}

impl IntrospectionService for GradleCliService {
    fn connect(&self, root: &Path) -> Result<Box<dyn IntrospectionSession>, IntrospectionError> {
        let init_script = write_init_script()?;
        debug!("Gradle introspection init script at {}", init_script.display());
        Ok(Box::new(GradleCliSession {
            root: root.to_path_buf(),
            executable: self.executable(root),
            init_script: Some(init_script),
        }))
    }
}

struct GradleCliSession {
    root: PathBuf,
    executable: PathBuf,
    init_script: Option<PathBuf>,
}

impl IntrospectionSession for GradleCliSession {
    fn project_model(&mut self) -> Result<ProjectModel, IntrospectionError> {
        let init_script = self.init_script.as_ref().ok_or(IntrospectionError::MissingModel)?;
        let program = self.executable.to_string_lossy().to_string();
        let output = Command::new(&self.executable)
            .args(["--no-daemon", "--console=plain", "-q", "--init-script"])
            .arg(init_script)
            .arg(MODEL_TASK)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| IntrospectionError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(IntrospectionError::ExitStatus {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        ProjectModel::from_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn close(&mut self) {
        if let Some(script) = self.init_script.take() {
            let _ = fs::remove_file(&script);
            debug!("Closed Gradle introspection session for {}", self.root.display());
        }
    }
}

impl Drop for GradleCliSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_init_script() -> io::Result<PathBuf> {
    let token = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "java_introspect_init_{}_{token}.gradle",
        std::process::id()
    ));
    fs::write(&path, INIT_SCRIPT)?;
    Ok(path)
}

const INIT_SCRIPT: &str = r#"
import groovy.json.JsonOutput

rootProject {
    tasks.register("printIntrospectModel") {
        doLast {
            def modules = []
            rootProject.allprojects.each { proj ->
                def module = [name: proj.path, sourceDirs: [], outputDirs: [], dependencies: []]
                def sourceSets = proj.extensions.findByName("sourceSets")
                if (sourceSets != null) {
                    sourceSets.each { ss ->
                        try { module.sourceDirs.addAll(ss.java.srcDirs.collect { it.absolutePath }) } catch (Throwable ignored) {}
                        try { module.outputDirs.addAll(ss.output.classesDirs.files.collect { it.absolutePath }) } catch (Throwable ignored) {}
                    }
                }
                ["compileClasspath", "testCompileClasspath"].each { name ->
                    def cfg = proj.configurations.findByName(name)
                    if (cfg != null && cfg.canBeResolved) {
                        try { module.dependencies.addAll(cfg.resolve().collect { it.absolutePath }) } catch (Throwable ignored) {}
                    }
                }
                modules << module
            }
            println("JAVA_INTROSPECT_MODEL_BEGIN")
            println(JsonOutput.toJson([modules: modules]))
            println("JAVA_INTROSPECT_MODEL_END")
        }
    }
}
"#;

fn extract_sentinel_block(output: &str, begin: &str, end: &str) -> Option<String> {
    let mut in_block = false;
    let mut lines = Vec::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if !in_block {
            if trimmed == begin {
                in_block = true;
            }
            continue;
        }
        if trimmed == end {
            return Some(lines.join("\n"));
        }
        lines.push(line);
    }
    None
}
