use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Undirected weighted co-modification graph, cached on disk as
/// `{sessionCount, graph}`.
///
/// Stored as a directed adjacency map for lookup convenience; every edge
/// is written in both directions when built, but is logically undirected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComodGraph {
    #[serde(rename = "sessionCount")]
    pub session_count: usize,
    pub graph: HashMap<String, Vec<(String, u32)>>,
}

impl ComodGraph {
    pub fn neighbours_of(&self, path: &str) -> &[(String, u32)] {
        self.graph.get(path).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
