//! Core data types and configuration for pswitch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Switch metadata derived from a `Condition` attribute.
///
/// `switch_reference` holds the right-hand value of the marker: the relative
/// target path on a disabled package reference, the package name on the
/// synthetic project reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchState {
    pub is_switched: bool,
    pub switch_reference: String,
}

impl SwitchState {
    pub fn switched(reference: impl Into<String>) -> Self {
        Self {
            is_switched: true,
            switch_reference: reference.into(),
        }
    }
}

/// A `<PackageReference>` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub switch: SwitchState,
}

/// A `<ProjectReference>` declaration as written in the referencing project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    /// The `Include` value, separators untouched.
    pub specified_path: String,
    #[serde(flatten)]
    pub switch: SwitchState,
}

/// A parsed project file. Edges to other projects live in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// File name of the project file, e.g. `Scrutor.csproj`.
    pub name: String,
    /// Path as first written by whoever referenced this project.
    pub specified_path: String,
    pub absolute_path: PathBuf,
    pub package_references: Vec<PackageReference>,
}

impl Project {
    /// First declaration of `package_name`, switched or not.
    pub fn package(&self, package_name: &str) -> Option<&PackageReference> {
        self.package_references
            .iter()
            .find(|p| p.name == package_name)
    }

    /// True when the first declaration of `package_name` is a live package.
    pub fn has_live_package(&self, package_name: &str) -> bool {
        self.package(package_name).is_some_and(|p| !p.switch.is_switched)
    }

    /// True when some declaration of `package_name` carries a switch marker.
    pub fn has_switched_package(&self, package_name: &str) -> bool {
        self.package_references
            .iter()
            .any(|p| p.name == package_name && p.switch.is_switched)
    }
}

/// Build property used by the condition marker. Never assigned by any build.
pub const SWITCH_PROPERTY: &str = "PSWITCH";

/// Configuration for a pswitch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(default = "default_dotnet_program")]
    pub dotnet_program: String,
    #[serde(default = "default_solution_folder")]
    pub solution_folder: String,
    #[serde(default = "default_project_extensions")]
    pub project_extensions: Vec<String>,
    #[serde(default)]
    pub assume_yes: bool,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub quiet: bool,
}

fn default_dotnet_program() -> String {
    "dotnet".to_string()
}
fn default_solution_folder() -> String {
    "ExternalProjects".to_string()
}
fn default_project_extensions() -> Vec<String> {
    ["csproj", "vbproj", "fsproj"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            dotnet_program: default_dotnet_program(),
            solution_folder: default_solution_folder(),
            project_extensions: default_project_extensions(),
            assume_yes: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl SwitchConfig {
    /// True when `path` ends with one of the configured project extensions.
    pub fn is_project_path(&self, path: &str) -> bool {
        let path = path.trim();
        self.project_extensions
            .iter()
            .any(|ext| path.len() > ext.len() + 1 && path.ends_with(&format!(".{ext}")))
    }
}
