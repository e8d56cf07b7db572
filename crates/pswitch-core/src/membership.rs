//! Adding and removing external projects in a solution manifest.
//!
//! One `dotnet sln` invocation per project. The first failure stops the run;
//! projects already added or removed stay that way.

use std::path::PathBuf;

use crate::config::SwitchConfig;
use crate::dotnet::solution::SolutionCli;
use crate::error::Result;
use crate::graph::project_graph::{ProjectGraph, ProjectId};
use crate::graph::solution::Solution;
use crate::process::CommandRunner;

/// A project the manifest was changed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub name: String,
    pub absolute_path: PathBuf,
}

/// `target` followed by its transitive references, in closure order.
pub fn project_with_references(graph: &ProjectGraph, target: ProjectId) -> Vec<ProjectId> {
    std::iter::once(target)
        .chain(graph.referenced_projects_transitive(target))
        .collect()
}

/// Add `target` and its transitive references under the configured solution folder.
///
/// `graph` is the graph `target` was parsed into, usually another solution's.
pub fn add_external_projects(
    solution: &Solution,
    graph: &ProjectGraph,
    target: ProjectId,
    runner: &dyn CommandRunner,
    config: &SwitchConfig,
    mut on_change: impl FnMut(&MembershipChange),
) -> Result<Vec<MembershipChange>> {
    let cli = SolutionCli::new(runner, config);
    let mut added = Vec::new();

    for id in project_with_references(graph, target) {
        let project = graph.project(id);
        cli.add_project(
            &solution.absolute_path,
            &config.solution_folder,
            &project.absolute_path,
        )?;
        let change = MembershipChange {
            name: project.name.clone(),
            absolute_path: project.absolute_path.clone(),
        };
        log::info!("added {} to {}", change.absolute_path.display(), solution.name);
        on_change(&change);
        added.push(change);
    }

    Ok(added)
}

/// Remove every project substituted for `package_name`, plus their transitive references.
pub fn remove_external_projects(
    solution: &Solution,
    package_name: &str,
    runner: &dyn CommandRunner,
    config: &SwitchConfig,
    mut on_change: impl FnMut(&MembershipChange),
) -> Result<Vec<MembershipChange>> {
    let cli = SolutionCli::new(runner, config);
    let mut removed = Vec::new();

    for id in solution.external_projects_for(package_name) {
        let project = solution.project(id);
        cli.remove_project(&solution.absolute_path, &project.absolute_path)?;
        let change = MembershipChange {
            name: project.name.clone(),
            absolute_path: project.absolute_path.clone(),
        };
        log::info!("removed {} from {}", change.absolute_path.display(), solution.name);
        on_change(&change);
        removed.push(change);
    }

    Ok(removed)
}
