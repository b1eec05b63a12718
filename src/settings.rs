// ============================================================================
// 解析环境设置 - 本地仓库 / Gradle home / JAVA_HOME
// ============================================================================

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::parser_config::{Degradation, DEFAULT_COMPLIANCE_LEVEL, DEFAULT_ENCODING};
use crate::pom;

pub const DEFAULT_MIN_TOOLING_VERSION: &str = "6.0";

/// Values supplied on the command line; each one beats the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub maven_repo: Option<PathBuf>,
    pub gradle_user_home: Option<PathBuf>,
    pub java_home: Option<PathBuf>,
    pub introspection: Option<bool>,
}

/// Environment-derived inputs of the resolution engine.
#[derive(Debug, Clone, Serialize)]
pub struct ResolverSettings {
    pub maven_repo: PathBuf,
    pub gradle_user_home: PathBuf,
    pub java_home: Option<PathBuf>,
    pub default_encoding: String,
    pub default_compliance_level: String,
    pub introspection: bool,
    pub min_tooling_version: String,
    #[serde(skip)]
    pub degradations: Vec<Degradation>,
}

impl ResolverSettings {
    /// Settings with explicit repository roots and no JDK. Used by tests and
    /// embedders that do not want the process environment consulted.
    pub fn new(maven_repo: impl Into<PathBuf>, gradle_user_home: impl Into<PathBuf>) -> Self {
        Self {
            maven_repo: maven_repo.into(),
            gradle_user_home: gradle_user_home.into(),
            java_home: None,
            default_encoding: DEFAULT_ENCODING.to_string(),
            default_compliance_level: DEFAULT_COMPLIANCE_LEVEL.to_string(),
            introspection: true,
            min_tooling_version: DEFAULT_MIN_TOOLING_VERSION.to_string(),
            degradations: Vec::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::with_overrides(&SettingsOverrides::default())
    }

    pub fn with_overrides(overrides: &SettingsOverrides) -> Self {
        Self::resolve(overrides, |key| std::env::var_os(key))
    }

    pub fn with_introspection(mut self, enabled: bool) -> Self {
        self.introspection = enabled;
        self
    }

    pub fn with_java_home(mut self, java_home: impl Into<PathBuf>) -> Self {
        self.java_home = Some(java_home.into());
        self
    }

    fn resolve(overrides: &SettingsOverrides, env: impl Fn(&str) -> Option<OsString>) -> Self {
        let home = env("HOME")
            .or_else(|| env("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_default();
        let mut degradations = Vec::new();

        let maven_repo = match &overrides.maven_repo {
            Some(path) => path.clone(),
            None => {
                let candidates = [
                    env("M2_HOME").map(|m2| PathBuf::from(m2).join("conf").join("settings.xml")),
                    Some(home.join(".m2").join("settings.xml")),
                ];
                candidates
                    .into_iter()
                    .flatten()
                    .find_map(|settings| read_local_repository(&settings, &mut degradations))
                    .unwrap_or_else(|| home.join(".m2").join("repository"))
            }
        };

        let gradle_user_home = overrides
            .gradle_user_home
            .clone()
            .or_else(|| env("GRADLE_USER_HOME").map(PathBuf::from))
            .unwrap_or_else(|| home.join(".gradle"));

        let java_home = overrides
            .java_home
            .clone()
            .or_else(|| env("JAVA_HOME").map(PathBuf::from));

        debug!(
            "Settings: maven_repo={}, gradle_user_home={}",
            maven_repo.display(),
            gradle_user_home.display()
        );

        Self {
            maven_repo,
            gradle_user_home,
            java_home,
            introspection: overrides.introspection.unwrap_or(true),
            degradations,
            ..Self::new(PathBuf::new(), PathBuf::new())
        }
    }
}

fn read_local_repository(settings: &Path, degradations: &mut Vec<Degradation>) -> Option<PathBuf> {
    let content = fs::read_to_string(settings).ok()?;
    match pom::parse_local_repository(&content) {
        Ok(Some(repo)) => Some(PathBuf::from(repo)),
        Ok(None) => None,
        Err(e) => {
            warn!("Ignoring malformed {}: {}", settings.display(), e);
            degradations.push(Degradation::new(
                format!("settings {}", settings.display()),
                format!("malformed settings file: {e}"),
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &Path)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_os_str().to_os_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_under_home() {
        let home = tempdir().unwrap();
        let s = ResolverSettings::resolve(
            &SettingsOverrides::default(),
            env_of(&[("HOME", home.path())]),
        );
        assert_eq!(s.maven_repo, home.path().join(".m2").join("repository"));
        assert_eq!(s.gradle_user_home, home.path().join(".gradle"));
        assert_eq!(s.java_home, None);
        assert_eq!(s.default_encoding, "UTF-8");
        assert_eq!(s.default_compliance_level, "17");
        assert!(s.introspection);
    }

    #[test]
    fn test_userprofile_is_used_without_home() {
        let home = tempdir().unwrap();
        let s = ResolverSettings::resolve(
            &SettingsOverrides::default(),
            env_of(&[("USERPROFILE", home.path())]),
        );
        assert_eq!(s.gradle_user_home, home.path().join(".gradle"));
    }

    #[test]
    fn test_m2_home_settings_local_repository() {
        let home = tempdir().unwrap();
        let m2 = tempdir().unwrap();
        fs::create_dir_all(m2.path().join("conf")).unwrap();
        fs::write(
            m2.path().join("conf").join("settings.xml"),
            "<settings><localRepository>/srv/m2</localRepository></settings>",
        )
        .unwrap();

        let s = ResolverSettings::resolve(
            &SettingsOverrides::default(),
            env_of(&[("HOME", home.path()), ("M2_HOME", m2.path())]),
        );
        assert_eq!(s.maven_repo, PathBuf::from("/srv/m2"));
    }

    #[test]
    fn test_user_settings_and_malformed_fallthrough() {
        let home = tempdir().unwrap();
        let m2 = tempdir().unwrap();
        fs::create_dir_all(m2.path().join("conf")).unwrap();
        fs::write(
            m2.path().join("conf").join("settings.xml"),
            "<settings><localRepository>/x</wrong></settings>",
        )
        .unwrap();
        fs::create_dir_all(home.path().join(".m2")).unwrap();
        fs::write(
            home.path().join(".m2").join("settings.xml"),
            "<settings><localRepository>/home/repo</localRepository></settings>",
        )
        .unwrap();

        let s = ResolverSettings::resolve(
            &SettingsOverrides::default(),
            env_of(&[("HOME", home.path()), ("M2_HOME", m2.path())]),
        );
        assert_eq!(s.maven_repo, PathBuf::from("/home/repo"));
        assert_eq!(s.degradations.len(), 1);
    }

    #[test]
    fn test_overrides_win() {
        let home = tempdir().unwrap();
        let gradle = tempdir().unwrap();
        let overrides = SettingsOverrides {
            maven_repo: Some(PathBuf::from("/override/m2")),
            gradle_user_home: Some(PathBuf::from("/override/gradle")),
            java_home: Some(PathBuf::from("/override/jdk")),
            introspection: Some(false),
        };
        let s = ResolverSettings::resolve(
            &overrides,
            env_of(&[("HOME", home.path()), ("GRADLE_USER_HOME", gradle.path())]),
        );
        assert_eq!(s.maven_repo, PathBuf::from("/override/m2"));
        assert_eq!(s.gradle_user_home, PathBuf::from("/override/gradle"));
        assert_eq!(s.java_home, Some(PathBuf::from("/override/jdk")));
        assert!(!s.introspection);
    }

    #[test]
    fn test_gradle_user_home_env() {
        let home = tempdir().unwrap();
        let gradle = tempdir().unwrap();
        let s = ResolverSettings::resolve(
            &SettingsOverrides::default(),
            env_of(&[("HOME", home.path()), ("GRADLE_USER_HOME", gradle.path())]),
        );
        assert_eq!(s.gradle_user_home, gradle.path());
    }
}
