pub mod project_graph;
pub mod solution;
