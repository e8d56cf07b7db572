//! Project reference graph backed by petgraph::DiGraph.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::config::{Project, ProjectReference, SwitchState};
use crate::dotnet::project::parse_project_file;
use crate::error::{Result, SwitchError};
use crate::paths::{file_name, normalize, resolve};
use crate::text_file::TextFile;

/// Stable identifier of a project within one [`ProjectGraph`].
pub type ProjectId = NodeIndex;

/// A reference waiting for its target to be looked up or parsed.
struct PendingReference {
    from: ProjectId,
    absolute_path: PathBuf,
    reference: ProjectReference,
}

/// Projects keyed by absolute path, edges carrying the reference as written.
///
/// Every project file is parsed at most once, so reference cycles produce
/// cyclic edges rather than unbounded parsing.
#[derive(Debug, Default)]
pub struct ProjectGraph {
    graph: DiGraph<Project, ProjectReference>,
    /// O(1) absolute path → node lookup.
    path_index: HashMap<PathBuf, ProjectId>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn project(&self, id: ProjectId) -> &Project {
        &self.graph[id]
    }

    /// Record the path a solution manifest lists `id` under.
    ///
    /// A member first reached through another project's reference was
    /// stored with that reference's `Include`.
    pub fn set_specified_path(&mut self, id: ProjectId, specified_path: &str) {
        self.graph[id].specified_path = specified_path.to_string();
    }

    /// Parse `absolute_path` and every project reachable from it.
    ///
    /// A project already in the graph is returned without re-reading. The
    /// entry project must exist and be well-formed; referenced projects that
    /// are missing or malformed are logged and their edge omitted.
    pub fn load_project(&mut self, absolute_path: &Path, specified_path: &str) -> Result<ProjectId> {
        let absolute_path = normalize(absolute_path);
        if let Some(&id) = self.path_index.get(&absolute_path) {
            return Ok(id);
        }
        if !absolute_path.is_file() {
            return Err(SwitchError::ProjectNotFound(absolute_path));
        }

        let (root, pending) = self.parse_node(&absolute_path, specified_path)?;
        let mut stack: Vec<PendingReference> = pending.into_iter().rev().collect();

        while let Some(next) = stack.pop() {
            if let Some(&target) = self.path_index.get(&next.absolute_path) {
                self.graph.add_edge(next.from, target, next.reference);
                continue;
            }

            if !next.absolute_path.is_file() {
                log::warn!(
                    "Project '{}' reference to '{}' not found at '{}'",
                    self.graph[next.from].absolute_path.display(),
                    next.reference.specified_path,
                    next.absolute_path.display()
                );
                continue;
            }

            match self.parse_node(&next.absolute_path, &next.reference.specified_path) {
                Ok((target, children)) => {
                    self.graph.add_edge(next.from, target, next.reference);
                    stack.extend(children.into_iter().rev());
                }
                Err(e) => {
                    log::warn!(
                        "Project '{}' reference to '{}' skipped: {e}",
                        self.graph[next.from].absolute_path.display(),
                        next.reference.specified_path
                    );
                }
            }
        }

        Ok(root)
    }

    /// Read and parse one file, add its node, and return its outgoing references.
    fn parse_node(
        &mut self,
        absolute_path: &Path,
        specified_path: &str,
    ) -> Result<(ProjectId, Vec<PendingReference>)> {
        log::debug!("parsing project {}", absolute_path.display());
        let file = TextFile::read(absolute_path)?;
        let info = parse_project_file(&file.text, absolute_path)?;

        let id = self.graph.add_node(Project {
            name: file_name(absolute_path),
            specified_path: specified_path.to_string(),
            absolute_path: absolute_path.to_path_buf(),
            package_references: info.package_references,
        });
        self.path_index.insert(absolute_path.to_path_buf(), id);

        let project_dir = absolute_path.parent().unwrap_or(Path::new(""));
        let pending = info
            .project_references
            .into_iter()
            .map(|reference| PendingReference {
                from: id,
                absolute_path: resolve(project_dir, &reference.specified_path),
                reference,
            })
            .collect();

        Ok((id, pending))
    }

    /// Direct references of `id` in declaration order.
    pub fn references(&self, id: ProjectId) -> Vec<(ProjectId, &ProjectReference)> {
        let mut edges: Vec<_> = self.graph.edges(id).collect();
        edges.sort_by_key(|e| e.id());
        edges.into_iter().map(|e| (e.target(), e.weight())).collect()
    }

    fn reference_ids(&self, id: ProjectId) -> Vec<ProjectId> {
        self.references(id).into_iter().map(|(target, _)| target).collect()
    }

    /// Every project reachable from `id`, depth-first pre-order, each once.
    ///
    /// `id` itself is never part of the result, even when a cycle leads back to it.
    pub fn referenced_projects_transitive(&self, id: ProjectId) -> Vec<ProjectId> {
        let mut seen: HashSet<ProjectId> = HashSet::from([id]);
        let mut order = Vec::new();
        let mut stack: Vec<ProjectId> = self.reference_ids(id).into_iter().rev().collect();

        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            order.push(next);
            stack.extend(self.reference_ids(next).into_iter().rev());
        }

        order
    }

    /// Switch metadata of the first switched reference pointing at `id`.
    pub fn incoming_switch(&self, id: ProjectId) -> SwitchState {
        let mut edges: Vec<_> = self.graph.edges_directed(id, Direction::Incoming).collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| &e.weight().switch)
            .find(|s| s.is_switched)
            .cloned()
            .unwrap_or_default()
    }

    /// Projects substituted for `package_name` anywhere in the graph.
    pub fn switched_targets(&self, package_name: &str) -> Vec<ProjectId> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .filter(|e| e.weight().switch.is_switched && e.weight().switch.switch_reference == package_name)
            .collect();
        edges.sort_by_key(|e| e.id());

        let mut seen = HashSet::new();
        edges
            .into_iter()
            .map(|e| e.target())
            .filter(|t| seen.insert(*t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_project(dir: &Path, rel: &str, refs: &[&str]) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let items: String = refs
            .iter()
            .map(|r| format!("    <ProjectReference Include=\"{r}\" />\n"))
            .collect();
        fs::write(
            &path,
            format!("<Project Sdk=\"Microsoft.NET.Sdk\">\n  <ItemGroup>\n{items}  </ItemGroup>\n</Project>\n"),
        )
        .unwrap();
        path
    }

    fn names(graph: &ProjectGraph, ids: &[ProjectId]) -> Vec<String> {
        ids.iter().map(|&id| graph.project(id).name.clone()).collect()
    }

    #[test]
    fn cycle_terminates_and_excludes_start() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(dir.path(), "A/A.csproj", &["../B/B.csproj"]);
        write_project(dir.path(), "B/B.csproj", &["../C/C.csproj"]);
        write_project(dir.path(), "C/C.csproj", &["../A/A.csproj"]);

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&a, "A/A.csproj").unwrap();
        assert_eq!(graph.len(), 3);

        let closure = graph.referenced_projects_transitive(id);
        assert_eq!(names(&graph, &closure), vec!["B.csproj", "C.csproj"]);
    }

    #[test]
    fn diamond_visits_shared_project_once() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(dir.path(), "A/A.csproj", &["../B/B.csproj", "../C/C.csproj"]);
        write_project(dir.path(), "B/B.csproj", &["../D/D.csproj"]);
        write_project(dir.path(), "C/C.csproj", &["../D/D.csproj"]);
        write_project(dir.path(), "D/D.csproj", &[]);

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&a, "A/A.csproj").unwrap();
        let closure = graph.referenced_projects_transitive(id);
        assert_eq!(names(&graph, &closure), vec!["B.csproj", "D.csproj", "C.csproj"]);
    }

    #[test]
    fn references_keep_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(
            dir.path(),
            "A/A.csproj",
            &["../C/C.csproj", "../B/B.csproj", "..\\D\\D.csproj"],
        );
        write_project(dir.path(), "B/B.csproj", &[]);
        write_project(dir.path(), "C/C.csproj", &["../B/B.csproj"]);
        write_project(dir.path(), "D/D.csproj", &[]);

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&a, "A/A.csproj").unwrap();
        let direct: Vec<ProjectId> = graph.references(id).into_iter().map(|(t, _)| t).collect();
        assert_eq!(names(&graph, &direct), vec!["C.csproj", "B.csproj", "D.csproj"]);
    }

    #[test]
    fn missing_reference_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(dir.path(), "A/A.csproj", &["../Gone/Gone.csproj", "../B/B.csproj"]);
        write_project(dir.path(), "B/B.csproj", &[]);

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&a, "A/A.csproj").unwrap();
        assert_eq!(graph.references(id).len(), 1);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn malformed_reference_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(dir.path(), "A/A.csproj", &["../Bad/Bad.csproj"]);
        fs::create_dir_all(dir.path().join("Bad")).unwrap();
        fs::write(dir.path().join("Bad/Bad.csproj"), "<Project><ItemGroup>").unwrap();

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&a, "A/A.csproj").unwrap();
        assert!(graph.references(id).is_empty());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn missing_entry_project_is_an_error() {
        let mut graph = ProjectGraph::new();
        let err = graph
            .load_project(Path::new("/definitely/not/here.csproj"), "here.csproj")
            .unwrap_err();
        assert!(matches!(err, SwitchError::ProjectNotFound(_)));
    }

    #[test]
    fn loading_twice_reuses_node() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_project(dir.path(), "A/A.csproj", &[]);
        let mut graph = ProjectGraph::new();
        let first = graph.load_project(&a, "A/A.csproj").unwrap();
        let second = graph.load_project(&dir.path().join("A/../A/A.csproj"), "x").unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn switched_edges_are_found_by_package() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path().join("App/App.csproj");
        fs::create_dir_all(app.parent().unwrap()).unwrap();
        fs::write(
            &app,
            r#"<Project>
  <ItemGroup>
    <PackageReference Include="Lib" Version="1.0.0" Condition="'$(PSWITCH)' == '../Lib/Lib.csproj'" />
    <ProjectReference Include="../Lib/Lib.csproj" Condition="'$(PSWITCH)' != 'Lib'" />
  </ItemGroup>
</Project>"#,
        )
        .unwrap();
        write_project(dir.path(), "Lib/Lib.csproj", &[]);

        let mut graph = ProjectGraph::new();
        let id = graph.load_project(&app, "App/App.csproj").unwrap();
        let lib = graph.switched_targets("Lib");
        assert_eq!(names(&graph, &lib), vec!["Lib.csproj"]);
        assert!(graph.switched_targets("Other").is_empty());
        assert_eq!(graph.incoming_switch(lib[0]), SwitchState::switched("Lib"));
        assert!(!graph.incoming_switch(id).is_switched);
    }
}
