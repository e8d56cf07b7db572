//! .csproj/.vbproj/.fsproj XML parser.

use std::path::Path;

use roxmltree::{Document, Node};

use crate::config::{PackageReference, ProjectReference};
use crate::dotnet::condition::parse_condition;
use crate::error::{Result, SwitchError};

pub const PACKAGE_REFERENCE: &str = "PackageReference";
pub const PROJECT_REFERENCE: &str = "ProjectReference";

/// References declared by one project file, in document order.
#[derive(Debug, Clone, Default)]
pub struct ProjectFile {
    pub package_references: Vec<PackageReference>,
    pub project_references: Vec<ProjectReference>,
}

/// Parse project file content. `path` is only used in error messages.
///
/// Elements are matched on local name, so legacy projects with the MSBuild
/// default namespace parse the same as SDK-style ones.
pub fn parse_project_file(content: &str, path: &Path) -> Result<ProjectFile> {
    let doc = parse_document(content, path)?;
    let mut info = ProjectFile::default();

    for node in doc.descendants().filter(Node::is_element) {
        match node.tag_name().name() {
            PACKAGE_REFERENCE => {
                // `Update` items amend an existing reference rather than declare one
                let name = match node.attribute("Include") {
                    Some(name) if !name.trim().is_empty() => name.to_string(),
                    _ => continue,
                };
                let version = node
                    .attribute("Version")
                    .map(str::to_string)
                    .or_else(|| child_text(&node, "Version"))
                    .unwrap_or_default();
                info.package_references.push(PackageReference {
                    name,
                    version,
                    switch: parse_condition(node.attribute("Condition").unwrap_or("")),
                });
            }
            PROJECT_REFERENCE => {
                let specified_path = match node.attribute("Include") {
                    Some(include) if !include.trim().is_empty() => include.to_string(),
                    _ => {
                        log::warn!("Empty project reference in project file '{}'", path.display());
                        continue;
                    }
                };
                info.project_references.push(ProjectReference {
                    specified_path,
                    switch: parse_condition(node.attribute("Condition").unwrap_or("")),
                });
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Parse XML, mapping syntax errors to [`SwitchError::ParseFailure`].
pub(crate) fn parse_document<'a>(content: &'a str, path: &Path) -> Result<Document<'a>> {
    Document::parse(content).map_err(|e| SwitchError::ParseFailure {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Elements named `tag` (local name), in document order.
pub(crate) fn elements<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    doc.descendants()
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn child_text(node: &Node, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
