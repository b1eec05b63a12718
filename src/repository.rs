// ============================================================================
// 本地仓库布局 - 坐标 -> 构件路径
// ============================================================================

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::version;

/// Directory convention of a local package cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// `root/org/junit/jupiter/junit-jupiter-api/5.10.0/junit-jupiter-api-5.10.0.jar`
    Maven,
    /// `root/org.junit.jupiter/junit-jupiter-api/5.10.0/<sha1>/junit-jupiter-api-5.10.0.jar`
    GradleCache,
}

/// A local package cache: a root directory plus its path convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    root: PathBuf,
    kind: LayoutKind,
}

impl RepositoryLayout {
    pub fn maven(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kind: LayoutKind::Maven,
        }
    }

    pub fn gradle_cache(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            kind: LayoutKind::GradleCache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Directory holding every version of `group:artifact`.
    pub fn artifact_dir(&self, group_id: &str, artifact_id: &str) -> PathBuf {
        let mut dir = self.root.clone();
        match self.kind {
            // One path component per group segment; `join` picks the platform separator.
            LayoutKind::Maven => {
                for segment in group_id.split('.').filter(|s| !s.is_empty()) {
                    dir.push(segment);
                }
            }
            LayoutKind::GradleCache => dir.push(group_id),
        }
        dir.push(artifact_id);
        dir
    }

    pub fn version_dir(&self, group_id: &str, artifact_id: &str, version: &str) -> PathBuf {
        self.artifact_dir(group_id, artifact_id).join(version)
    }

    /// Expected path of `artifact-version.ext`. Pure; does not touch the disk.
    ///
    /// For [`LayoutKind::GradleCache`] the real file sits one checksum
    /// directory deeper, so this is only the conventional location; use
    /// [`RepositoryLayout::locate`] to find the file.
    pub fn artifact_path(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        extension: &str,
    ) -> PathBuf {
        self.version_dir(group_id, artifact_id, version)
            .join(artifact_file_name(artifact_id, version, extension))
    }

    /// Find an existing artifact file for an exact version.
    pub fn locate(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        extension: &str,
    ) -> Option<PathBuf> {
        match self.kind {
            LayoutKind::Maven => {
                let path = self.artifact_path(group_id, artifact_id, version, extension);
                path.is_file().then_some(path)
            }
            LayoutKind::GradleCache => {
                let version_dir = self.version_dir(group_id, artifact_id, version);
                let file_name = artifact_file_name(artifact_id, version, extension);
                let mut hash_dirs = list_subdirectories(&version_dir);
                hash_dirs.sort();
                hash_dirs
                    .into_iter()
                    .map(|dir| version_dir.join(dir).join(&file_name))
                    .find(|candidate| candidate.is_file())
            }
        }
    }

    /// Version directory names present under `group:artifact`, unsorted.
    pub fn available_versions(&self, group_id: &str, artifact_id: &str) -> Vec<String> {
        list_subdirectories(&self.artifact_dir(group_id, artifact_id))
    }

    /// Newest stable version whose artifact file exists.
    pub fn latest_stable(
        &self,
        group_id: &str,
        artifact_id: &str,
        extension: &str,
    ) -> Option<(String, PathBuf)> {
        let mut versions: Vec<String> = self
            .available_versions(group_id, artifact_id)
            .into_iter()
            .filter(|v| version::is_stable(v))
            .collect();
        version::sort_descending(&mut versions);

        for v in versions {
            if let Some(path) = self.locate(group_id, artifact_id, &v, extension) {
                debug!("Latest stable {}:{} -> {}", group_id, artifact_id, v);
                return Some((v, path));
            }
        }
        None
    }
}

pub fn artifact_file_name(artifact_id: &str, version: &str, extension: &str) -> String {
    format!("{artifact_id}-{version}.{extension}")
}

fn list_subdirectories(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect()
}
