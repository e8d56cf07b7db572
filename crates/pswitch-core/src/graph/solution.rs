//! A solution and the project graph reachable from its members.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{Project, SwitchConfig};
use crate::dotnet::solution::SolutionCli;
use crate::error::{Result, SwitchError};
use crate::graph::project_graph::{ProjectGraph, ProjectId};
use crate::paths::{file_stem, normalize, resolve};
use crate::process::CommandRunner;

/// A package referenced somewhere in a solution, folded across projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    /// Distinct requested versions in first-seen order.
    pub versions: Vec<String>,
    pub project_count: usize,
    pub switched: bool,
}

impl PackageSummary {
    pub fn versions_text(&self) -> String {
        self.versions.join(". ")
    }
}

/// A parsed solution. Re-parse to observe manifest or project changes.
#[derive(Debug)]
pub struct Solution {
    pub name: String,
    pub absolute_path: PathBuf,
    graph: ProjectGraph,
    members: Vec<ProjectId>,
}

impl Solution {
    /// Query the manifest for members and parse each one with its references.
    ///
    /// Members missing on disk are skipped with a warning. A member that
    /// exists but cannot be parsed fails the whole parse.
    pub fn parse(
        absolute_path: &Path,
        runner: &dyn CommandRunner,
        config: &SwitchConfig,
    ) -> Result<Self> {
        let absolute_path = normalize(absolute_path);
        if !absolute_path.is_file() {
            return Err(SwitchError::ManifestNotFound(
                absolute_path.display().to_string(),
            ));
        }

        let solution_dir = absolute_path.parent().unwrap_or(Path::new(""));
        let specified_paths = SolutionCli::new(runner, config).list_projects(&absolute_path)?;

        let mut graph = ProjectGraph::new();
        let mut members = Vec::new();
        for specified in &specified_paths {
            let project_path = resolve(solution_dir, specified);
            if !project_path.is_file() {
                log::warn!(
                    "Project '{}' not found at '{}'",
                    specified,
                    project_path.display()
                );
                continue;
            }

            let id = graph.load_project(&project_path, specified)?;
            if !members.contains(&id) {
                graph.set_specified_path(id, specified);
                members.push(id);
            }
        }

        Ok(Self {
            name: file_stem(&absolute_path),
            absolute_path,
            graph,
            members,
        })
    }

    pub fn graph(&self) -> &ProjectGraph {
        &self.graph
    }

    pub fn members(&self) -> &[ProjectId] {
        &self.members
    }

    pub fn projects(&self) -> impl Iterator<Item = &Project> + '_ {
        self.members.iter().map(|&id| self.graph.project(id))
    }

    pub fn project(&self, id: ProjectId) -> &Project {
        self.graph.project(id)
    }

    /// Member whose specified path, file name or file stem matches `selector`.
    pub fn find_project(&self, selector: &str) -> Option<ProjectId> {
        let wanted = selector.trim().replace('\\', "/");
        self.members.iter().copied().find(|&id| {
            let p = self.graph.project(id);
            p.specified_path.replace('\\', "/") == wanted
                || p.name.eq_ignore_ascii_case(&wanted)
                || file_stem(&p.absolute_path).eq_ignore_ascii_case(&wanted)
        })
    }

    /// Members declaring `package_name` as a live package.
    pub fn projects_with_live_package(&self, package_name: &str) -> Vec<ProjectId> {
        self.members
            .iter()
            .copied()
            .filter(|&id| self.graph.project(id).has_live_package(package_name))
            .collect()
    }

    /// Members holding a switched declaration of `package_name`.
    pub fn projects_with_switched_package(&self, package_name: &str) -> Vec<ProjectId> {
        self.members
            .iter()
            .copied()
            .filter(|&id| self.graph.project(id).has_switched_package(package_name))
            .collect()
    }

    /// Projects substituted for `package_name` plus everything they reference.
    pub fn external_projects_for(&self, package_name: &str) -> Vec<ProjectId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for target in self.graph.switched_targets(package_name) {
            let closure = self.graph.referenced_projects_transitive(target);
            for id in std::iter::once(target).chain(closure) {
                if seen.insert(id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Distinct packages across member projects, in first-seen order.
    pub fn packages(&self) -> Vec<PackageSummary> {
        let mut summaries: Vec<PackageSummary> = Vec::new();
        for project in self.projects() {
            let mut counted = HashSet::new();
            for reference in &project.package_references {
                let index = match summaries.iter().position(|s| s.name == reference.name) {
                    Some(i) => i,
                    None => {
                        summaries.push(PackageSummary {
                            name: reference.name.clone(),
                            versions: Vec::new(),
                            project_count: 0,
                            switched: false,
                        });
                        summaries.len() - 1
                    }
                };
                let summary = &mut summaries[index];
                if !reference.version.is_empty() && !summary.versions.contains(&reference.version) {
                    summary.versions.push(reference.version.clone());
                }
                if counted.insert(reference.name.as_str()) {
                    summary.project_count += 1;
                }
                summary.switched |= reference.switch.is_switched;
            }
        }
        summaries
    }
}
