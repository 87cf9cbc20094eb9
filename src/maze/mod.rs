//! Graph oracles the solver searches.
//!
//! The solver only ever talks to a maze through the [`Maze`] trait: where to
//! start, which positions are adjacent to a given one, and which positions are
//! goals. Two implementations ship with the crate:
//! - [`GraphMaze`]: an explicit labelled digraph, loadable from YAML
//! - [`GridMaze`]: an ASCII grid of walls and open cells

pub mod graph;
pub mod grid;

pub use graph::{GraphMaze, GraphMazeBuilder, MazeDefinition};
pub use grid::{Cell, GridMaze};

use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Bounds every node identifier must satisfy
pub trait MazeNode: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

impl<T> MazeNode for T where T: Clone + Eq + Hash + Ord + Debug + Send + Sync + 'static {}

/// Read-only view of a maze, shared by every search task of a run
pub trait Maze: Send + Sync + 'static {
    type Node: MazeNode;

    /// The fixed starting position
    fn origin(&self) -> Self::Node;

    /// Positions reachable in one step from `node`.
    ///
    /// The order must be deterministic for a given node. Errors are handed to
    /// the caller of the solver unchanged.
    fn neighbors(&self, node: &Self::Node) -> anyhow::Result<Vec<Self::Node>>;

    /// Whether `node` is a goal
    fn is_goal(&self, node: &Self::Node) -> bool;
}

/// Counts neighbor queries per node
#[derive(Debug)]
pub struct ExpansionCounter<N: MazeNode> {
    counts: DashMap<N, usize>,
}

impl<N: MazeNode> Default for ExpansionCounter<N> {
    fn default() -> Self {
        Self {
            counts: DashMap::new(),
        }
    }
}

impl<N: MazeNode> ExpansionCounter<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, node: &N) {
        *self.counts.entry(node.clone()).or_insert(0) += 1;
    }

    /// How many times `node` was expanded
    pub fn count(&self, node: &N) -> usize {
        self.counts.get(node).map(|c| *c).unwrap_or(0)
    }

    /// Number of distinct nodes expanded at least once
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }

    /// Highest expansion count of any single node
    pub fn max_count(&self) -> usize {
        self.counts
            .iter()
            .map(|entry| *entry.value())
            .max()
            .unwrap_or(0)
    }

    pub fn reset(&self) {
        self.counts.clear();
    }
}
