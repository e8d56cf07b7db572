//! Solution manifest access through `dotnet sln`.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::SwitchConfig;
use crate::error::{Result, SwitchError};
use crate::paths::normalize;
use crate::process::CommandRunner;

/// Thin wrapper over `dotnet sln <solution> list|add|remove`.
pub struct SolutionCli<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a SwitchConfig,
}

impl<'a> SolutionCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a SwitchConfig) -> Self {
        Self { runner, config }
    }

    fn sln(&self, solution_path: &Path, rest: &[&str]) -> Result<String> {
        let mut args = vec!["sln".to_string(), solution_path.to_string_lossy().to_string()];
        args.extend(rest.iter().map(|s| s.to_string()));
        self.runner.run(&self.config.dotnet_program, &args)
    }

    /// Member project paths as written in the manifest.
    pub fn list_projects(&self, solution_path: &Path) -> Result<Vec<String>> {
        let output = self.sln(solution_path, &["list"])?;
        Ok(parse_list_output(&output, self.config))
    }

    /// Add `project_path` under the virtual `solution_folder`.
    pub fn add_project(
        &self,
        solution_path: &Path,
        solution_folder: &str,
        project_path: &Path,
    ) -> Result<()> {
        let project = project_path.to_string_lossy();
        self.sln(
            solution_path,
            &["add", "--solution-folder", solution_folder, project.as_ref()],
        )?;
        Ok(())
    }

    pub fn remove_project(&self, solution_path: &Path, project_path: &Path) -> Result<()> {
        let project = project_path.to_string_lossy();
        self.sln(solution_path, &["remove", project.as_ref()])?;
        Ok(())
    }
}

/// Keep the lines of `dotnet sln list` output that name project files.
///
/// The header (`Project(s)` and the dashed rule) and blank lines drop out.
pub fn parse_list_output(output: &str, config: &SwitchConfig) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| config.is_project_path(line))
        .map(String::from)
        .collect()
}

/// Resolve a solution argument to an absolute `.sln` path.
///
/// A directory must contain exactly one `.sln` file at its top level.
pub fn find_solution(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        normalize(path)
    } else {
        let cwd = std::env::current_dir().map_err(|e| SwitchError::io(path, e))?;
        normalize(&cwd.join(path))
    };

    if absolute.is_file() {
        return Ok(absolute);
    }
    if !absolute.is_dir() {
        return Err(SwitchError::ManifestNotFound(absolute.display().to_string()));
    }

    let solutions: Vec<PathBuf> = WalkDir::new(&absolute)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sln")))
        .collect();

    match solutions.as_slice() {
        [single] => Ok(single.clone()),
        [] => Err(SwitchError::ManifestNotFound(format!(
            "{} (no .sln file in folder)",
            absolute.display()
        ))),
        _ => Err(SwitchError::ManifestNotFound(format!(
            "{} ({} .sln files in folder, specify one)",
            absolute.display(),
            solutions.len()
        ))),
    }
}
