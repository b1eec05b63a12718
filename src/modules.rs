// ============================================================================
// 多模块聚合 & 父 POM 继承链
// ============================================================================

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::coordinate::CoordinateKey;
use crate::parser_config::{ConfigurationBuilder, Degradation};
use crate::pom::PomDescriptor;
use crate::repository::RepositoryLayout;
use crate::resolution::VersionResolutionContext;

pub const POM_FILE: &str = "pom.xml";
const DEFAULT_RELATIVE_PATH: &str = "../pom.xml";

/// Maven's conventional output and resource directories (classpath).
const MAVEN_CLASSPATH_DIRS: &[&[&str]] = &[
    &["target", "classes"],
    &["target", "test-classes"],
    &["src", "main", "resources"],
    &["src", "test", "resources"],
];

const MAVEN_SOURCE_DIRS: &[&[&str]] = &[&["src", "main", "java"], &["src", "test", "java"]];

/// An ancestor descriptor and its effective property map.
#[derive(Debug, Clone)]
pub struct Ancestor {
    pub descriptor: PomDescriptor,
    pub location: PathBuf,
    pub properties: BTreeMap<String, String>,
}

/// One project or submodule, after its ancestors were loaded.
#[derive(Debug, Clone)]
pub struct Module {
    pub dir: PathBuf,
    pub descriptor: PomDescriptor,
    /// Ancestor properties overlaid by the module's own.
    pub properties: BTreeMap<String, String>,
    pub ancestors: Vec<Ancestor>,
}

impl Module {
    /// Load `dir`'s parent chain and compute effective properties.
    pub fn load(
        dir: &Path,
        descriptor: PomDescriptor,
        repo: &RepositoryLayout,
        degradations: &mut Vec<Degradation>,
    ) -> Self {
        let ancestors = load_ancestors(&dir.join(POM_FILE), &descriptor, repo, degradations);
        let properties = overlay(
            ancestors.first().map(|a| &a.properties),
            &descriptor.properties,
        );
        Self {
            dir: dir.to_path_buf(),
            descriptor,
            properties,
            ancestors,
        }
    }

    /// Add the module's existing conventional directories.
    pub fn contribute_directories(&self, builder: &mut ConfigurationBuilder) {
        for parts in MAVEN_CLASSPATH_DIRS {
            builder.classpath_if_exists(&join_all(&self.dir, parts));
        }
        for parts in MAVEN_SOURCE_DIRS {
            builder.sourcepath_if_exists(&join_all(&self.dir, parts));
        }
    }

    pub fn resolve_property(&self, value: &str) -> String {
        crate::properties::resolve(value, &self.properties, self.descriptor.effective_version())
    }
}

/// The root project plus every reachable submodule, with merged versions.
#[derive(Debug, Default)]
pub struct AggregatedProject {
    /// Root first, then submodules breadth-first in declaration order.
    pub modules: Vec<Module>,
    pub context: VersionResolutionContext,
    pub degradations: Vec<Degradation>,
}

impl AggregatedProject {
    pub fn root(&self) -> Option<&Module> {
        self.modules.first()
    }
}

/// Walk the module tree below `root`.
///
/// Module names are resolved against the directory of the descriptor that
/// declares them, starting from `root`, never against the process working
/// directory. A module directory is visited at most once.
pub fn aggregate(root: &Path, root_descriptor: PomDescriptor, repo: &RepositoryLayout) -> AggregatedProject {
    let mut project = AggregatedProject::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut queue: VecDeque<(PathBuf, PomDescriptor)> = VecDeque::new();

    visited.insert(canonical(root));
    queue.push_back((root.to_path_buf(), root_descriptor));

    while let Some((dir, descriptor)) = queue.pop_front() {
        let module = Module::load(&dir, descriptor, repo, &mut project.degradations);

        project.context.absorb_project(&module.descriptor, &module.properties);
        // Inherited declarations interpolate against the inheriting module's properties.
        for ancestor in &module.ancestors {
            project
                .context
                .absorb_ancestor(&ancestor.descriptor, &module.properties);
        }

        for name in &module.descriptor.modules {
            let (module_dir, pom_path) = module_location(&dir, name);
            if !visited.insert(canonical(&module_dir)) {
                debug!("Module {} already visited", module_dir.display());
                continue;
            }
            if !pom_path.is_file() {
                degrade(
                    &mut project.degradations,
                    format!("module {name}"),
                    format!("no descriptor at {}", pom_path.display()),
                );
                continue;
            }
            match PomDescriptor::read(&pom_path) {
                Ok(child) => {
                    debug!("Aggregating module {} at {}", name, module_dir.display());
                    queue.push_back((module_dir, child));
                }
                Err(e) => degrade(&mut project.degradations, format!("module {name}"), e.to_string()),
            }
        }

        project.modules.push(module);
    }

    project
}

/// Walk the parent chain of `descriptor`, nearest ancestor first.
///
/// Each parent is looked up next to the child (`relativePath`, default
/// `../pom.xml`) when the coordinates match, then in the local repository.
/// A parent that cannot be found ends the chain; repeated coordinates end it
/// as well.
pub fn load_ancestors(
    pom_path: &Path,
    descriptor: &PomDescriptor,
    repo: &RepositoryLayout,
    degradations: &mut Vec<Degradation>,
) -> Vec<Ancestor> {
    let mut chain: Vec<(PomDescriptor, PathBuf)> = Vec::new();
    let mut seen: HashSet<CoordinateKey> = HashSet::new();
    let mut child_path = pom_path.to_path_buf();
    let mut child = descriptor.clone();

    while let Some(parent) = child.parent.clone() {
        let (Some(key), Some(version)) = (parent.key(), parent.version.clone()) else {
            degrade(degradations, format!("parent of {}", child_path.display()), "incomplete coordinates");
            break;
        };
        if !seen.insert(key.clone()) {
            degrade(degradations, format!("parent {key}"), "cycle in parent chain");
            break;
        }

        let found = find_on_disk(&child_path, parent.relative_path.as_deref(), &key)
            .or_else(|| find_in_repository(repo, &key, &version));
        let Some((path, parent_descriptor)) = found else {
            degrade(
                degradations,
                format!("parent {key}:{version}"),
                "descriptor not found locally, inheritance truncated",
            );
            break;
        };

        debug!("Parent {}:{} -> {}", key, version, path.display());
        child_path = path.clone();
        child = parent_descriptor.clone();
        chain.push((parent_descriptor, path));
    }

    // Effective properties are computed from the farthest ancestor inward.
    let mut ancestors: Vec<Ancestor> = Vec::with_capacity(chain.len());
    let mut inherited: Option<BTreeMap<String, String>> = None;
    for (descriptor, location) in chain.into_iter().rev() {
        let properties = overlay(inherited.as_ref(), &descriptor.properties);
        inherited = Some(properties.clone());
        ancestors.push(Ancestor {
            descriptor,
            location,
            properties,
        });
    }
    ancestors.reverse();
    ancestors
}

fn find_on_disk(
    child_path: &Path,
    relative_path: Option<&str>,
    key: &CoordinateKey,
) -> Option<(PathBuf, PomDescriptor)> {
    let relative = relative_path.unwrap_or(DEFAULT_RELATIVE_PATH);
    if relative.is_empty() {
        return None;
    }
    let mut candidate = child_path.parent()?.join(relative);
    if candidate.is_dir() {
        candidate = candidate.join(POM_FILE);
    }
    if !candidate.is_file() || same_file(&candidate, child_path) {
        return None;
    }

    let descriptor = PomDescriptor::read(&candidate).ok()?;
    let matches = descriptor.effective_group_id() == Some(key.group_id.as_str())
        && descriptor.artifact_id.as_deref() == Some(key.artifact_id.as_str());
    matches.then_some((candidate, descriptor))
}

fn find_in_repository(
    repo: &RepositoryLayout,
    key: &CoordinateKey,
    version: &str,
) -> Option<(PathBuf, PomDescriptor)> {
    let path = repo.locate(&key.group_id, &key.artifact_id, version, "pom")?;
    match PomDescriptor::read(&path) {
        Ok(descriptor) => Some((path, descriptor)),
        Err(e) => {
            warn!("Unreadable parent descriptor: {}", e);
            None
        }
    }
}

fn module_location(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let target = dir.join(name);
    if name.ends_with(".xml") {
        let module_dir = target.parent().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
        (module_dir, target)
    } else {
        let pom = target.join(POM_FILE);
        (target, pom)
    }
}

fn overlay(base: Option<&BTreeMap<String, String>>, own: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged = base.cloned().unwrap_or_default();
    merged.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

fn join_all(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |p, part| p.join(part))
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn same_file(a: &Path, b: &Path) -> bool {
    canonical(a) == canonical(b)
}

fn degrade(degradations: &mut Vec<Degradation>, subject: impl Into<String>, reason: impl Into<String>) {
    let d = Degradation::new(subject, reason);
    debug!("{}: {}", d.subject, d.reason);
    degradations.push(d);
}
