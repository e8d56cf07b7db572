//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use pswitch_core::config::SwitchConfig;
use pswitch_core::graph::solution::Solution;
use pswitch_core::process::CommandRunner;
use pswitch_core::{Result, SwitchError};

// ---------------------------------------------------------------------------
// Fake `dotnet sln`
// ---------------------------------------------------------------------------

/// Answers `sln <path> list` from canned listings and records every call.
#[derive(Default)]
pub struct FakeRunner {
    listings: HashMap<String, Vec<String>>,
    /// Any call with an argument containing this text fails.
    pub fail_on: Option<String>,
    pub calls: RefCell<Vec<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, solution: &Path, members: &[&str]) -> Self {
        self.listings.insert(
            solution.to_string_lossy().to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }

    pub fn failing_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    /// Recorded calls whose sub-command (third argument) is `verb`.
    pub fn calls_for(&self, verb: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|args| args.get(2).map(String::as_str) == Some(verb))
            .cloned()
            .collect()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String> {
        self.calls.borrow_mut().push(args.to_vec());

        if let Some(ref fail) = self.fail_on {
            if args.iter().any(|a| a.contains(fail.as_str())) {
                return Err(SwitchError::ExternalToolFailure {
                    command: format!("{program} {}", args.join(" ")),
                    message: "simulated failure".to_string(),
                });
            }
        }

        match args.get(2).map(String::as_str) {
            Some("list") => {
                let members = self.listings.get(&args[1]).cloned().unwrap_or_default();
                Ok(format!("Project(s)\n----------\n{}\n", members.join("\n")))
            }
            _ => Ok(String::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Temporary workspaces
// ---------------------------------------------------------------------------

pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).unwrap()
    }

    /// SDK-style project with the given packages (name, version) and project references.
    pub fn project(&self, rel: &str, packages: &[(&str, &str)], references: &[&str]) -> PathBuf {
        self.write(rel, &project_xml(packages, references))
    }

    /// An empty `.sln` file; membership comes from the [`FakeRunner`] listing.
    pub fn solution(&self, rel: &str) -> PathBuf {
        self.write(rel, "Microsoft Visual Studio Solution File, Format Version 12.00\n")
    }
}

pub fn project_xml(packages: &[(&str, &str)], references: &[&str]) -> String {
    let mut xml = String::from(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>net8.0</TargetFramework>\n  </PropertyGroup>\n",
    );
    if !references.is_empty() {
        xml.push_str("  <ItemGroup>\n");
        for r in references {
            xml.push_str(&format!("    <ProjectReference Include=\"{r}\" />\n"));
        }
        xml.push_str("  </ItemGroup>\n");
    }
    if !packages.is_empty() {
        xml.push_str("  <ItemGroup>\n");
        for (name, version) in packages {
            xml.push_str(&format!(
                "    <PackageReference Include=\"{name}\" Version=\"{version}\" />\n"
            ));
        }
        xml.push_str("  </ItemGroup>\n");
    }
    xml.push_str("</Project>\n");
    xml
}

// ---------------------------------------------------------------------------
// Work + target solution fixture
// ---------------------------------------------------------------------------

/// A work solution consuming Scrutor as a package and a Scrutor source solution.
///
/// ```text
/// work/Work.sln         src/App (Scrutor, Serilog) -> src/Core (Scrutor), src/Missing (absent)
/// scrutor/Scrutor.sln   src/Scrutor -> src/Scrutor.Abstractions, test/Scrutor.Tests -> src/Scrutor
/// ```
pub struct Fixture {
    pub ws: Workspace,
    pub work_sln: PathBuf,
    pub target_sln: PathBuf,
    pub runner: FakeRunner,
    pub config: SwitchConfig,
}

pub const APP: &str = "work/src/App/App.csproj";
pub const CORE: &str = "work/src/Core/Core.csproj";
pub const SCRUTOR: &str = "scrutor/src/Scrutor/Scrutor.csproj";
pub const ABSTRACTIONS: &str = "scrutor/src/Scrutor.Abstractions/Scrutor.Abstractions.csproj";

impl Fixture {
    pub fn new() -> Self {
        Self::with_runner(|runner| runner)
    }

    pub fn with_runner(customise: impl FnOnce(FakeRunner) -> FakeRunner) -> Self {
        let ws = Workspace::new();
        let work_sln = ws.solution("work/Work.sln");
        ws.project(
            APP,
            &[("Scrutor", "3.3.0"), ("Serilog", "3.1.1")],
            &["..\\Core\\Core.csproj"],
        );
        ws.project(CORE, &[("Scrutor", "3.3.0")], &[]);

        let target_sln = ws.solution("scrutor/Scrutor.sln");
        ws.project(
            SCRUTOR,
            &[("Microsoft.Extensions.DependencyInjection.Abstractions", "8.0.0")],
            &["../Scrutor.Abstractions/Scrutor.Abstractions.csproj"],
        );
        ws.project(ABSTRACTIONS, &[], &[]);
        ws.project(
            "scrutor/test/Scrutor.Tests/Scrutor.Tests.csproj",
            &[("xunit", "2.6.1")],
            &["../../src/Scrutor/Scrutor.csproj"],
        );

        let runner = FakeRunner::new()
            .with_listing(
                &work_sln,
                &[
                    "src\\App\\App.csproj",
                    "src/Core/Core.csproj",
                    "src/Missing/Missing.csproj",
                ],
            )
            .with_listing(
                &target_sln,
                &[
                    "src/Scrutor/Scrutor.csproj",
                    "src/Scrutor.Abstractions/Scrutor.Abstractions.csproj",
                    "test/Scrutor.Tests/Scrutor.Tests.csproj",
                ],
            );

        Self {
            ws,
            work_sln,
            target_sln,
            runner: customise(runner),
            config: SwitchConfig::default(),
        }
    }

    pub fn work(&self) -> Solution {
        Solution::parse(&self.work_sln, &self.runner, &self.config).unwrap()
    }

    pub fn target(&self) -> Solution {
        Solution::parse(&self.target_sln, &self.runner, &self.config).unwrap()
    }
}

/// Names of the given projects, in order.
pub fn names(solution: &Solution, ids: &[pswitch_core::graph::project_graph::ProjectId]) -> Vec<String> {
    ids.iter().map(|&id| solution.project(id).name.clone()).collect()
}
