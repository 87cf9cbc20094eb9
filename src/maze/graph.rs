use super::{ExpansionCounter, Maze};
use crate::core::errors::{Result, SolverError};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Serializable description of a labelled maze
///
/// ```yaml
/// origin: A
/// goals: [D]
/// edges:
///   A: [B, C]
///   B: [D]
///   C: [D]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MazeDefinition {
    pub origin: String,
    #[serde(default)]
    pub goals: Vec<String>,
    /// Adjacency lists; the list order is the neighbor order
    #[serde(default)]
    pub edges: BTreeMap<String, Vec<String>>,
    /// Add the reverse of every edge as well
    #[serde(default)]
    pub undirected: bool,
}

impl MazeDefinition {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Maze backed by a petgraph digraph with string labels
#[derive(Debug)]
pub struct GraphMaze {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    origin: String,
    goals: HashSet<String>,
    expansions: ExpansionCounter<String>,
}

impl GraphMaze {
    pub fn builder<S: Into<String>>(origin: S) -> GraphMazeBuilder {
        GraphMazeBuilder::new(origin)
    }

    pub fn from_definition(definition: &MazeDefinition) -> Result<Self> {
        let mut builder = GraphMazeBuilder::new(definition.origin.clone());
        for (from, targets) in &definition.edges {
            builder = builder.edges(from.clone(), targets.iter().cloned());
        }
        for goal in &definition.goals {
            builder = builder.goal(goal.clone());
        }
        builder.undirected(definition.undirected).build()
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::from_definition(&MazeDefinition::from_yaml_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| SolverError::io(format!("read maze {}", path.display()), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }

    /// Whether there is an edge `from -> to`
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Per-node neighbor query counts
    pub fn expansions(&self) -> &ExpansionCounter<String> {
        &self.expansions
    }
}

impl Maze for GraphMaze {
    type Node = String;

    fn origin(&self) -> String {
        self.origin.clone()
    }

    fn neighbors(&self, node: &String) -> anyhow::Result<Vec<String>> {
        let idx = *self
            .index
            .get(node)
            .ok_or_else(|| anyhow::anyhow!("Unknown maze node: {}", node))?;
        self.expansions.record(node);

        // Edge indices grow with insertion, so sorting restores definition order
        let mut out: Vec<_> = self
            .graph
            .edges(idx)
            .map(|edge| (edge.id(), edge.target()))
            .collect();
        out.sort_by_key(|(id, _)| *id);
        Ok(out
            .into_iter()
            .map(|(_, target)| self.graph[target].clone())
            .collect())
    }

    fn is_goal(&self, node: &String) -> bool {
        self.goals.contains(node)
    }
}

/// Incremental construction of a [`GraphMaze`]
#[derive(Debug, Clone)]
pub struct GraphMazeBuilder {
    origin: String,
    edges: Vec<(String, String)>,
    goals: Vec<String>,
    undirected: bool,
}

impl GraphMazeBuilder {
    pub fn new<S: Into<String>>(origin: S) -> Self {
        Self {
            origin: origin.into(),
            edges: Vec::new(),
            goals: Vec::new(),
            undirected: false,
        }
    }

    pub fn edge<A: Into<String>, B: Into<String>>(mut self, from: A, to: B) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn edges<A, I, B>(mut self, from: A, targets: I) -> Self
    where
        A: Into<String>,
        I: IntoIterator<Item = B>,
        B: Into<String>,
    {
        let from = from.into();
        for to in targets {
            self.edges.push((from.clone(), to.into()));
        }
        self
    }

    pub fn goal<S: Into<String>>(mut self, goal: S) -> Self {
        self.goals.push(goal.into());
        self
    }

    pub fn undirected(mut self, undirected: bool) -> Self {
        self.undirected = undirected;
        self
    }

    pub fn build(self) -> Result<GraphMaze> {
        if self.origin.is_empty() {
            return Err(SolverError::maze_format("origin label cannot be empty"));
        }

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        let mut intern = |graph: &mut DiGraph<String, ()>, label: &str| -> NodeIndex {
            *index
                .entry(label.to_string())
                .or_insert_with(|| graph.add_node(label.to_string()))
        };

        intern(&mut graph, &self.origin);
        for (from, to) in &self.edges {
            if from.is_empty() || to.is_empty() {
                return Err(SolverError::maze_format("edge endpoints cannot be empty"));
            }
            let a = intern(&mut graph, from);
            let b = intern(&mut graph, to);
            graph.add_edge(a, b, ());
        }
        if self.undirected {
            for (from, to) in &self.edges {
                let a = intern(&mut graph, to);
                let b = intern(&mut graph, from);
                if !graph.contains_edge(a, b) {
                    graph.add_edge(a, b, ());
                }
            }
        }
        for goal in &self.goals {
            intern(&mut graph, goal);
        }

        Ok(GraphMaze {
            graph,
            index,
            origin: self.origin,
            goals: self.goals.into_iter().collect(),
            expansions: ExpansionCounter::new(),
        })
    }
}
