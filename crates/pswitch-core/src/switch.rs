//! Switch a package reference to a project reference inside a project file, and back.
//!
//! Both declarations stay in the file while switched; the condition marker
//! decides which one the build sees. Edits splice byte ranges located with
//! `roxmltree` into the raw text, so unrelated formatting is never touched.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::config::Project;
use crate::dotnet::condition::{disabling_condition, enabling_condition, parse_condition};
use crate::dotnet::element::{empty_element, line_ending, line_indent, remove_attribute, set_attribute};
use crate::dotnet::project::{elements, parse_document, PACKAGE_REFERENCE, PROJECT_REFERENCE};
use crate::error::{Result, SwitchError};
use crate::paths::{file_name, relative_path};
use crate::text_file::TextFile;

/// What a successful switch changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub project: String,
    pub package: String,
    pub target: String,
    pub target_path: PathBuf,
    /// Path written into the project file, relative to the project.
    pub reference_path: String,
}

impl fmt::Display for SwitchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Switched {} package {} reference => {} {}",
            self.project,
            self.package,
            self.target,
            self.target_path.display()
        )
    }
}

/// What a successful restore changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub project: String,
    pub package: String,
    /// `Include` of the project reference that was removed.
    pub removed_reference: String,
}

impl fmt::Display for RestoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Restored {} package {} reference (removed: => {})",
            self.project, self.package, self.removed_reference
        )
    }
}

/// Disable `package_name` in `project` and reference `target` in its place.
pub fn switch_package(project: &Project, package_name: &str, target: &Project) -> Result<SwitchReport> {
    let reference_path = relative_path(&project.absolute_path, &target.absolute_path);

    let mut file = TextFile::read(&project.absolute_path)?;
    let updated = switch_text(&file.text, &project.absolute_path, package_name, &reference_path)?;
    file.write(updated)?;

    let report = SwitchReport {
        project: project.name.clone(),
        package: package_name.to_string(),
        target: target.name.clone(),
        target_path: target.absolute_path.clone(),
        reference_path,
    };
    log::info!("{report}");
    Ok(report)
}

/// Re-enable `package_name` in `project` and drop the project reference that replaced it.
pub fn restore_package(project: &Project, package_name: &str) -> Result<RestoreReport> {
    let mut file = TextFile::read(&project.absolute_path)?;
    let (updated, removed_reference) = restore_text(&file.text, &project.absolute_path, package_name)?;
    file.write(updated)?;

    let report = RestoreReport {
        project: project.name.clone(),
        package: package_name.to_string(),
        removed_reference,
    };
    log::info!("{report}");
    Ok(report)
}

/// Apply a switch to project file text. `path` is used for messages only.
pub fn switch_text(text: &str, path: &Path, package_name: &str, reference_path: &str) -> Result<String> {
    let doc = parse_document(text, path)?;

    let package = elements(&doc, PACKAGE_REFERENCE)
        .find(|n| n.attribute("Include") == Some(package_name))
        .ok_or_else(|| SwitchError::PackageNotFound {
            project: file_name(path),
            package: package_name.to_string(),
        })?;

    if parse_condition(package.attribute("Condition").unwrap_or("")).is_switched {
        return Err(SwitchError::AlreadySwitched {
            project: file_name(path),
            package: package_name.to_string(),
        });
    }

    let range = package.range();
    let original = &text[range.clone()];
    let disabled = set_attribute(original, "Condition", &disabling_condition(reference_path))
        .ok_or_else(|| malformed(path, PACKAGE_REFERENCE))?;
    let project_reference = empty_element(
        PROJECT_REFERENCE,
        &[
            ("Include", reference_path),
            ("Condition", &enabling_condition(package_name)),
        ],
    );

    // the new reference goes on its own line when the package reference has one
    let separator = match line_indent(text, range.start) {
        Some(indent) => format!("{}{indent}", line_ending(text)),
        None => String::new(),
    };

    let mut updated = text.to_string();
    updated.replace_range(range, &format!("{disabled}{separator}{project_reference}"));
    Ok(updated)
}

/// Undo a switch in project file text, returning the new text and the removed `Include`.
pub fn restore_text(text: &str, path: &Path, package_name: &str) -> Result<(String, String)> {
    let doc = parse_document(text, path)?;
    let not_found = || SwitchError::SwitchStateNotFound {
        project: file_name(path),
        package: package_name.to_string(),
    };

    let package = elements(&doc, PACKAGE_REFERENCE)
        .find(|n| {
            n.attribute("Include") == Some(package_name)
                && parse_condition(n.attribute("Condition").unwrap_or("")).is_switched
        })
        .ok_or_else(not_found)?;

    let project_reference = elements(&doc, PROJECT_REFERENCE)
        .find(|n| {
            let state = parse_condition(n.attribute("Condition").unwrap_or(""));
            state.is_switched && state.switch_reference == package_name
        })
        .ok_or_else(not_found)?;

    let removed_reference = project_reference.attribute("Include").unwrap_or("").to_string();
    let expected = parse_condition(package.attribute("Condition").unwrap_or("")).switch_reference;
    if removed_reference != expected {
        log::warn!(
            "'{}': package {package_name} points at '{expected}' but its project reference includes '{removed_reference}'",
            path.display()
        );
    }

    let package_range = package.range();
    let restored = remove_attribute(&text[package_range.clone()], "Condition")
        .ok_or_else(|| malformed(path, PACKAGE_REFERENCE))?;

    let reference_range = with_preceding_line_break(text, project_reference.range());

    let mut edits: Vec<(Range<usize>, String)> = vec![
        (package_range, restored),
        (reference_range, String::new()),
    ];
    edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));

    let mut updated = text.to_string();
    for (range, replacement) in edits {
        updated.replace_range(range, &replacement);
    }
    Ok((updated, removed_reference))
}

/// Widen `range` backwards over the indentation and line break before it.
fn with_preceding_line_break(text: &str, range: Range<usize>) -> Range<usize> {
    let before = text[..range.start].trim_end_matches([' ', '\t']);
    let Some(without_lf) = before.strip_suffix('\n') else {
        return range;
    };
    let start = without_lf.strip_suffix('\r').unwrap_or(without_lf).len();
    start..range.end
}

fn malformed(path: &Path, tag: &str) -> SwitchError {
    SwitchError::ParseFailure {
        path: path.to_path_buf(),
        message: format!("unexpected <{tag}> element layout"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dotnet::project::parse_project_file;
    use pretty_assertions::assert_eq;

    const APP: &str = r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Scrutor" Version="3.3.0" />
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>
"#;

    const REL: &str = "../../../Scrutor/src/Scrutor/Scrutor.csproj";

    fn path() -> &'static Path {
        Path::new("/w/src/App/App.csproj")
    }

    #[test]
    fn switch_produces_marker_pair() {
        let out = switch_text(APP, path(), "Scrutor", REL).unwrap();
        assert_eq!(
            out,
            r#"<Project Sdk="Microsoft.NET.Sdk">
  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
  </PropertyGroup>
  <ItemGroup>
    <PackageReference Include="Scrutor" Version="3.3.0" Condition="'$(PSWITCH)' == '../../../Scrutor/src/Scrutor/Scrutor.csproj'" />
    <ProjectReference Include="../../../Scrutor/src/Scrutor/Scrutor.csproj" Condition="'$(PSWITCH)' != 'Scrutor'" />
    <PackageReference Include="Serilog" Version="3.1.1" />
  </ItemGroup>
</Project>
"#
        );
    }

    #[test]
    fn switched_text_parses_as_switched() {
        let out = switch_text(APP, path(), "Scrutor", REL).unwrap();
        let info = parse_project_file(&out, path()).unwrap();
        let scrutor = &info.package_references[0];
        assert!(scrutor.switch.is_switched);
        assert_eq!(scrutor.switch.switch_reference, REL);
        assert_eq!(info.project_references.len(), 1);
        assert_eq!(info.project_references[0].specified_path, REL);
        assert_eq!(info.project_references[0].switch.switch_reference, "Scrutor");
        assert!(!info.package_references[1].switch.is_switched);
    }

    #[test]
    fn restore_round_trips() {
        let switched = switch_text(APP, path(), "Scrutor", REL).unwrap();
        let (restored, removed) = restore_text(&switched, path(), "Scrutor").unwrap();
        assert_eq!(restored, APP);
        assert_eq!(removed, REL);
        let info = parse_project_file(&restored, path()).unwrap();
        assert!(info.package_references.iter().all(|p| !p.switch.is_switched));
        assert!(info.project_references.is_empty());
    }

    #[test]
    fn round_trip_with_crlf() {
        let app = APP.replace('\n', "\r\n");
        let switched = switch_text(&app, path(), "Scrutor", REL).unwrap();
        assert!(switched.contains("/>\r\n    <ProjectReference"));
        let (restored, _) = restore_text(&switched, path(), "Scrutor").unwrap();
        assert_eq!(restored, app);
    }

    #[test]
    fn round_trip_single_line_file() {
        let app = r#"<Project><ItemGroup><PackageReference Include="A" Version="1.0" /></ItemGroup></Project>"#;
        let switched = switch_text(app, path(), "A", "../A/A.csproj").unwrap();
        assert!(switched.contains(r#"'$(PSWITCH)' == '../A/A.csproj'" /><ProjectReference"#));
        let (restored, _) = restore_text(&switched, path(), "A").unwrap();
        assert_eq!(restored, app);
    }

    #[test]
    fn restores_concatenated_marker_pair() {
        let switched = r#"<Project>
  <ItemGroup>
    <PackageReference Include="A" Version="1.0" Condition="'$(PSWITCH)' == '../A/A.csproj'" /><ProjectReference Include="../A/A.csproj" Condition="'$(PSWITCH)' != 'A'" />
  </ItemGroup>
</Project>"#;
        let (restored, _) = restore_text(switched, path(), "A").unwrap();
        assert_eq!(
            restored,
            r#"<Project>
  <ItemGroup>
    <PackageReference Include="A" Version="1.0" />
  </ItemGroup>
</Project>"#
        );
    }

    #[test]
    fn switch_element_with_version_child() {
        let app = "<Project>\n  <ItemGroup>\n    <PackageReference Include=\"A\">\n      <Version>1.0</Version>\n    </PackageReference>\n  </ItemGroup>\n</Project>";
        let switched = switch_text(app, path(), "A", "../A/A.csproj").unwrap();
        assert!(switched.contains(
            "<PackageReference Include=\"A\" Condition=\"'$(PSWITCH)' == '../A/A.csproj'\">\n      <Version>1.0</Version>\n    </PackageReference>\n    <ProjectReference"
        ));
        let (restored, _) = restore_text(&switched, path(), "A").unwrap();
        assert_eq!(restored, app);
    }

    #[test]
    fn only_first_declaration_is_switched() {
        let app = r#"<Project>
  <ItemGroup Condition="'$(TargetFramework)' == 'net6.0'">
    <PackageReference Include="A" Version="1.0" />
  </ItemGroup>
  <ItemGroup Condition="'$(TargetFramework)' == 'net8.0'">
    <PackageReference Include="A" Version="2.0" />
  </ItemGroup>
</Project>"#;
        let switched = switch_text(app, path(), "A", "../A/A.csproj").unwrap();
        assert_eq!(switched.matches("PSWITCH").count(), 2);
        assert!(switched.contains(r#"<PackageReference Include="A" Version="2.0" />"#));
    }

    #[test]
    fn switch_missing_package() {
        let err = switch_text(APP, path(), "Dapper", REL).unwrap_err();
        assert!(matches!(err, SwitchError::PackageNotFound { .. }));
    }

    #[test]
    fn switch_twice_is_rejected() {
        let switched = switch_text(APP, path(), "Scrutor", REL).unwrap();
        let err = switch_text(&switched, path(), "Scrutor", REL).unwrap_err();
        assert!(matches!(err, SwitchError::AlreadySwitched { .. }));
    }

    #[test]
    fn restore_without_switch() {
        let err = restore_text(APP, path(), "Scrutor").unwrap_err();
        assert!(matches!(err, SwitchError::SwitchStateNotFound { .. }));
    }

    #[test]
    fn restore_with_missing_project_reference() {
        let half = APP.replace(
            r#"Version="3.3.0" />"#,
            r#"Version="3.3.0" Condition="'$(PSWITCH)' == '../T/T.csproj'" />"#,
        );
        let err = restore_text(&half, path(), "Scrutor").unwrap_err();
        assert!(matches!(err, SwitchError::SwitchStateNotFound { .. }));
    }

    #[test]
    fn restore_leaves_other_switches() {
        let once = switch_text(APP, path(), "Scrutor", REL).unwrap();
        let twice = switch_text(&once, path(), "Serilog", "../Serilog/Serilog.csproj").unwrap();
        let (restored, _) = restore_text(&twice, path(), "Scrutor").unwrap();
        let info = parse_project_file(&restored, path()).unwrap();
        assert!(!info.package_references[0].switch.is_switched);
        assert!(info.package_references[1].switch.is_switched);
        assert_eq!(info.project_references.len(), 1);
        assert_eq!(info.project_references[0].switch.switch_reference, "Serilog");
    }

    #[test]
    fn malformed_xml() {
        let err = switch_text("<Project>", path(), "A", "x").unwrap_err();
        assert!(matches!(err, SwitchError::ParseFailure { .. }));
    }

    #[test]
    fn reports_display() {
        let report = RestoreReport {
            project: "App.csproj".into(),
            package: "Scrutor".into(),
            removed_reference: REL.into(),
        };
        assert_eq!(
            report.to_string(),
            format!("Restored App.csproj package Scrutor reference (removed: => {REL})")
        );
    }
}
