//! JSON report of a solution's project graph and package switch state.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::config::{PackageReference, SwitchState};
use crate::error::{Result, SwitchError};
use crate::graph::solution::{PackageSummary, Solution};

#[derive(Debug, Clone, Serialize)]
pub struct SolutionReport {
    pub version: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub stats: HashMap<String, serde_json::Value>,
    pub projects: Vec<ProjectOutput>,
    pub packages: Vec<PackageSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectOutput {
    pub name: String,
    pub specified_path: String,
    pub absolute_path: String,
    pub package_references: Vec<PackageReference>,
    pub project_references: Vec<ReferenceOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferenceOutput {
    pub name: String,
    pub specified_path: String,
    pub absolute_path: String,
    #[serde(flatten)]
    pub switch: SwitchState,
}

/// Build the report for every member project of `solution`.
pub fn build_report(solution: &Solution) -> SolutionReport {
    let graph = solution.graph();

    let projects: Vec<ProjectOutput> = solution
        .members()
        .iter()
        .map(|&id| {
            let project = graph.project(id);
            ProjectOutput {
                name: project.name.clone(),
                specified_path: project.specified_path.clone(),
                absolute_path: project.absolute_path.to_string_lossy().to_string(),
                package_references: project.package_references.clone(),
                project_references: graph
                    .references(id)
                    .into_iter()
                    .map(|(target, reference)| {
                        let target = graph.project(target);
                        ReferenceOutput {
                            name: target.name.clone(),
                            specified_path: reference.specified_path.clone(),
                            absolute_path: target.absolute_path.to_string_lossy().to_string(),
                            switch: reference.switch.clone(),
                        }
                    })
                    .collect(),
            }
        })
        .collect();

    let packages = solution.packages();
    let switched = packages.iter().filter(|p| p.switched).count();

    let mut metadata = HashMap::new();
    metadata.insert(
        "solution_name".to_string(),
        serde_json::Value::String(solution.name.clone()),
    );
    metadata.insert(
        "solution_path".to_string(),
        serde_json::Value::String(solution.absolute_path.to_string_lossy().to_string()),
    );
    metadata.insert(
        "generated_at".to_string(),
        serde_json::Value::String(Utc::now().to_rfc3339()),
    );
    metadata.insert(
        "pswitch_version".to_string(),
        serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
    );

    let mut stats = HashMap::new();
    stats.insert("projects".to_string(), serde_json::json!(projects.len()));
    stats.insert("graph_projects".to_string(), serde_json::json!(graph.len()));
    stats.insert("packages".to_string(), serde_json::json!(packages.len()));
    stats.insert("switched_packages".to_string(), serde_json::json!(switched));

    SolutionReport {
        version: "1.0".to_string(),
        metadata,
        stats,
        projects,
        packages,
    }
}

/// Pretty-printed JSON for `report`.
pub fn to_json(report: &SolutionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write `report` as JSON to `output_path`, creating parent folders.
pub fn write_output(report: &SolutionReport, output_path: &str) -> Result<()> {
    let path = Path::new(output_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SwitchError::io(parent, e))?;
    }
    std::fs::write(path, to_json(report)?).map_err(|e| SwitchError::io(path, e))
}
