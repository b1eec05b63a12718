//! CLI 模式处理器
//!
//! 提供命令行接口，默认输出人类可读格式
//! 使用 --json 参数可输出 JSON 格式

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::detect::DetectorRegistry;
use crate::scanner::{self, TestDiscovery};
use crate::settings::{ResolverSettings, SettingsOverrides};

/// CLI Commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// 🧭 解析项目配置 (classpath / sourcepath / encoding / compliance level)
    Config {
        /// 项目路径
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// 🧪 列出测试方法
    Tests {
        /// 项目路径
        #[arg(short, long, default_value = ".")]
        path: String,
    },

    /// ℹ️ 引擎状态
    Status,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub json: bool,
    pub maven_repo: Option<PathBuf>,
    pub gradle_home: Option<PathBuf>,
    pub no_introspection: bool,
}

impl GlobalOptions {
    pub fn settings(&self) -> ResolverSettings {
        ResolverSettings::with_overrides(&SettingsOverrides {
            maven_repo: self.maven_repo.clone(),
            gradle_user_home: self.gradle_home.clone(),
            java_home: None,
            introspection: self.no_introspection.then_some(false),
        })
    }
}

/// 处理 CLI 命令
pub fn handle_command(cmd: Command, options: &GlobalOptions) -> Result<()> {
    let registry = DetectorRegistry::with_defaults(&options.settings());
    let json_output = options.json;

    let result = match cmd {
        Command::Config { path } => config_command(Path::new(&path), &registry, json_output),
        Command::Tests { path } => tests_command(Path::new(&path), &registry, json_output),
        Command::Status => Ok(status(&registry, json_output)),
    };

    // 输出结果
    match result {
        Ok(value) => {
            if json_output {
                // JSON 格式：包装 success 字段
                let output = json!({
                    "success": true,
                    "data": value
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_value(&value);
            }
        }
        Err(e) => {
            if json_output {
                let output = json!({
                    "success": false,
                    "error": format!("{e:#}")
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                eprintln!("❌ {e:#}");
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

pub fn config_command(root: &Path, registry: &DetectorRegistry, json_output: bool) -> Result<Value> {
    let config = registry.detect(root)?;
    if json_output {
        Ok(json!({
            "root": root.display().to_string(),
            "configuration": config,
            "encodingPlan": config.encoding_plan(),
        }))
    } else {
        Ok(json!(format!("📦 {}\n{}", root.display(), config.describe())))
    }
}

pub fn tests_command(root: &Path, registry: &DetectorRegistry, json_output: bool) -> Result<Value> {
    let discovery = scanner::discover_tests(root, registry)?;
    if json_output {
        Ok(serde_json::to_value(&discovery)?)
    } else {
        Ok(json!(format_discovery(&discovery)))
    }
}

fn format_discovery(discovery: &TestDiscovery) -> String {
    let mut lines = vec![format!("🧪 {} test method(s)", discovery.records.len())];
    lines.extend(discovery.records.iter().map(|r| {
        format!("  {}#{}  ({})", r.class_name, r.method_name, r.file_path.display())
    }));
    if !discovery.skipped.is_empty() {
        lines.push(format!("⚠️ {} file(s) skipped", discovery.skipped.len()));
        lines.extend(
            discovery
                .skipped
                .iter()
                .map(|s| format!("  {}: {}", s.subject, s.reason)),
        );
    }
    lines.join("\n")
}

fn status(registry: &DetectorRegistry, json_output: bool) -> Value {
    let version = env!("CARGO_PKG_VERSION");
    if json_output {
        json!({
            "version": version,
            "detectors": registry.names(),
            "testAnnotations": scanner::TEST_ANNOTATIONS,
        })
    } else {
        json!(format!(
            "Java Introspect v{}\n\
            Detectors: {}\n\
            Parser: Tree-sitter Java",
            version,
            registry.names().join(" > ")
        ))
    }
}

/// 打印 Value，智能处理字符串和其他类型
fn print_value(value: &Value) {
    match value {
        Value::String(s) => println!("{s}"),
        _ => println!("{}", serde_json::to_string_pretty(value).unwrap_or_default()),
    }
}
