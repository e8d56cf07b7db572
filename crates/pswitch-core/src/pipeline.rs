//! Switch and restore runs: plan first, then apply step by step.

use crate::config::SwitchConfig;
use crate::error::{Result, SwitchError};
use crate::graph::project_graph::ProjectId;
use crate::graph::solution::Solution;
use crate::membership::{
    add_external_projects, project_with_references, remove_external_projects, MembershipChange,
};
use crate::process::CommandRunner;
use crate::switch::{restore_package, switch_package, RestoreReport, SwitchReport};

/// Progress callback type: (step, message).
pub type ProgressCallback = Box<dyn FnMut(&str, &str)>;

/// Everything a switch will change, computed before any file is touched.
#[derive(Debug, Clone)]
pub struct SwitchPlan {
    pub package_name: String,
    /// Distinct versions of the package across the projects to switch.
    pub versions: Vec<String>,
    /// Target project, in the target solution's graph.
    pub target: ProjectId,
    /// Target followed by its transitive references, in the target solution's graph.
    pub external_projects: Vec<ProjectId>,
    /// Work solution members that reference the package, in the work graph.
    pub projects_to_switch: Vec<ProjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct SwitchOutcome {
    pub added: Vec<MembershipChange>,
    pub switched: Vec<SwitchReport>,
}

/// Everything a restore will change, all in the work solution's graph.
#[derive(Debug, Clone)]
pub struct RestorePlan {
    pub package_name: String,
    pub external_projects: Vec<ProjectId>,
    pub projects_to_restore: Vec<ProjectId>,
}

#[derive(Debug, Clone, Default)]
pub struct RestoreOutcome {
    pub removed: Vec<MembershipChange>,
    pub restored: Vec<RestoreReport>,
}

/// Plan switching `package_name` in `work` to `target` from `target_solution`.
pub fn plan_switch(
    work: &Solution,
    package_name: &str,
    target_solution: &Solution,
    target: ProjectId,
) -> Result<SwitchPlan> {
    let projects_to_switch = work.projects_with_live_package(package_name);
    if projects_to_switch.is_empty() {
        return Err(SwitchError::PackageNotFound {
            project: work.name.clone(),
            package: package_name.to_string(),
        });
    }

    let mut versions: Vec<String> = Vec::new();
    for &id in &projects_to_switch {
        if let Some(reference) = work.project(id).package(package_name) {
            if !reference.version.is_empty() && !versions.contains(&reference.version) {
                versions.push(reference.version.clone());
            }
        }
    }

    Ok(SwitchPlan {
        package_name: package_name.to_string(),
        versions,
        target,
        external_projects: project_with_references(target_solution.graph(), target),
        projects_to_switch,
    })
}

/// Add the external projects to `work`, then switch each project in the plan.
pub fn run_switch(
    work: &Solution,
    target_solution: &Solution,
    plan: &SwitchPlan,
    runner: &dyn CommandRunner,
    config: &SwitchConfig,
    mut progress_callback: Option<ProgressCallback>,
) -> Result<SwitchOutcome> {
    let mut report = |step: &str, message: &str| {
        if let Some(ref mut cb) = progress_callback {
            cb(step, message);
        }
    };

    let added = add_external_projects(
        work,
        target_solution.graph(),
        plan.target,
        runner,
        config,
        |change| {
            report(
                "add",
                &format!("Added: {} ({})", change.name, change.absolute_path.display()),
            )
        },
    )?;

    let target = target_solution.project(plan.target);
    let mut switched = Vec::new();
    for &id in &plan.projects_to_switch {
        let result = switch_package(work.project(id), &plan.package_name, target)?;
        report("switch", &result.to_string());
        switched.push(result);
    }

    Ok(SwitchOutcome { added, switched })
}

/// Plan restoring `package_name` in `work`.
pub fn plan_restore(work: &Solution, package_name: &str) -> Result<RestorePlan> {
    let projects_to_restore = work.projects_with_switched_package(package_name);
    if projects_to_restore.is_empty() {
        return Err(SwitchError::SwitchStateNotFound {
            project: work.name.clone(),
            package: package_name.to_string(),
        });
    }

    Ok(RestorePlan {
        package_name: package_name.to_string(),
        external_projects: work.external_projects_for(package_name),
        projects_to_restore,
    })
}

/// Remove the external projects from `work`, then restore each project in the plan.
pub fn run_restore(
    work: &Solution,
    plan: &RestorePlan,
    runner: &dyn CommandRunner,
    config: &SwitchConfig,
    mut progress_callback: Option<ProgressCallback>,
) -> Result<RestoreOutcome> {
    let mut report = |step: &str, message: &str| {
        if let Some(ref mut cb) = progress_callback {
            cb(step, message);
        }
    };

    let removed = remove_external_projects(work, &plan.package_name, runner, config, |change| {
        report(
            "remove",
            &format!("Removed: {} ({})", change.name, change.absolute_path.display()),
        )
    })?;

    let mut restored = Vec::new();
    for &id in &plan.projects_to_restore {
        let result = restore_package(work.project(id), &plan.package_name)?;
        report("restore", &result.to_string());
        restored.push(result);
    }

    Ok(RestoreOutcome { removed, restored })
}
