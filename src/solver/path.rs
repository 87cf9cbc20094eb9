use crate::core::errors::{Result, SolverError};
use crate::maze::{Maze, MazeNode};
use dashmap::DashMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Read access to a predecessor relation
pub trait Predecessors<N> {
    /// The node that claimed `node`, if any
    fn predecessor(&self, node: &N) -> Option<N>;

    /// Number of recorded entries
    fn recorded(&self) -> usize;
}

impl<N: MazeNode> Predecessors<N> for DashMap<N, N> {
    fn predecessor(&self, node: &N) -> Option<N> {
        self.get(node).map(|entry| entry.value().clone())
    }

    fn recorded(&self) -> usize {
        self.len()
    }
}

impl<N: MazeNode> Predecessors<N> for HashMap<N, N> {
    fn predecessor(&self, node: &N) -> Option<N> {
        self.get(node).cloned()
    }

    fn recorded(&self) -> usize {
        self.len()
    }
}

impl<N: MazeNode> Predecessors<N> for BTreeMap<N, N> {
    fn predecessor(&self, node: &N) -> Option<N> {
        self.get(node).cloned()
    }

    fn recorded(&self) -> usize {
        self.len()
    }
}

/// Route from the origin to a goal, origin first.
///
/// Never empty: `reconstruct` always starts from the goal and deserializing
/// rejects an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Path<N> {
    nodes: Vec<N>,
}

impl<N: MazeNode> Path<N> {
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    pub fn origin(&self) -> &N {
        &self.nodes[0]
    }

    pub fn goal(&self) -> &N {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Number of nodes, both ends included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, a path holds at least its origin
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, N> {
        self.nodes.iter()
    }

    pub fn into_vec(self) -> Vec<N> {
        self.nodes
    }

    /// Check the path against `maze`: starts at the origin, ends on a goal
    /// and only follows edges the maze reports. Queries the maze's neighbors.
    pub fn is_valid_in<M: Maze<Node = N>>(&self, maze: &M) -> anyhow::Result<bool> {
        if *self.origin() != maze.origin() || !maze.is_goal(self.goal()) {
            return Ok(false);
        }
        for step in self.nodes.windows(2) {
            if !maze.neighbors(&step[0])?.contains(&step[1]) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<'de, N: Deserialize<'de>> Deserialize<'de> for Path<N> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nodes = Vec::<N>::deserialize(deserializer)?;
        if nodes.is_empty() {
            return Err(de::Error::invalid_length(0, &"a path of at least one node"));
        }
        Ok(Self { nodes })
    }
}

impl<N: fmt::Debug> fmt::Display for Path<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{:?}", node)?;
        }
        Ok(())
    }
}

impl<'a, N> IntoIterator for &'a Path<N> {
    type Item = &'a N;
    type IntoIter = std::slice::Iter<'a, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Walk the predecessor relation from `goal` back to `origin`.
///
/// Every node on the chain except `origin` must have an entry. A missing
/// entry, or a chain longer than the relation itself, means the claim
/// bookkeeping is broken and yields `InconsistentState`.
pub fn reconstruct<N, P>(goal: &N, origin: &N, predecessors: &P) -> Result<Path<N>>
where
    N: MazeNode,
    P: Predecessors<N> + ?Sized,
{
    let limit = predecessors.recorded();
    let mut nodes = vec![goal.clone()];
    let mut current = goal.clone();

    while current != *origin {
        if nodes.len() > limit {
            return Err(SolverError::inconsistent(
                goal,
                format!("predecessor chain exceeds {} entries without reaching the origin", limit),
            ));
        }
        current = predecessors.predecessor(&current).ok_or_else(|| {
            SolverError::inconsistent(&current, "no predecessor recorded for a claimed node")
        })?;
        nodes.push(current.clone());
    }

    nodes.reverse();
    Ok(Path { nodes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::GraphMaze;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn chain() -> HashMap<&'static str, &'static str> {
        HashMap::from([("B", "A"), ("C", "B"), ("D", "C")])
    }

    #[test]
    fn test_reconstruct_chain() {
        let path = reconstruct(&"D", &"A", &chain()).unwrap();
        assert_eq!(path.nodes(), &["A", "B", "C", "D"]);
        assert_eq!(*path.origin(), "A");
        assert_eq!(*path.goal(), "D");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_goal_is_origin() {
        let empty: HashMap<&str, &str> = HashMap::new();
        let path = reconstruct(&"A", &"A", &empty).unwrap();
        assert_eq!(path.into_vec(), vec!["A"]);
    }

    #[test]
    fn test_missing_link_is_inconsistent() {
        let mut preds = chain();
        preds.remove("C");
        let err = reconstruct(&"D", &"A", &preds).unwrap_err();
        assert!(matches!(err, SolverError::InconsistentState { ref node, .. } if node == "\"C\""));
    }

    #[test]
    fn test_cycle_is_inconsistent_not_endless() {
        let preds = BTreeMap::from([("B", "C"), ("C", "B")]);
        let err = reconstruct(&"B", &"A", &preds).unwrap_err();
        assert_eq!(err.category(), "inconsistent_state");
    }

    #[test]
    fn test_reconstruct_from_dashmap() {
        let preds: DashMap<u32, u32> = DashMap::new();
        preds.insert(2, 1);
        preds.insert(3, 2);
        let path = reconstruct(&3, &1, &preds).unwrap();
        assert_eq!(path.to_string(), "1 -> 2 -> 3");
    }

    #[test]
    fn test_path_validity() {
        let maze = Arc::new(
            GraphMaze::builder("A")
                .edges("A", ["B", "C"])
                .edge("B", "D")
                .goal("D")
                .build()
                .unwrap(),
        );
        let preds = HashMap::from([
            ("B".to_string(), "A".to_string()),
            ("D".to_string(), "B".to_string()),
            ("C".to_string(), "A".to_string()),
        ]);

        let good = reconstruct(&"D".to_string(), &"A".to_string(), &preds).unwrap();
        assert!(good.is_valid_in(maze.as_ref()).unwrap());

        let not_goal = reconstruct(&"C".to_string(), &"A".to_string(), &preds).unwrap();
        assert!(!not_goal.is_valid_in(maze.as_ref()).unwrap());
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let path = reconstruct(&"C", &"A", &chain()).unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["A","B","C"]"#);
    }

    #[test]
    fn test_deserialize_rejects_empty_path() {
        let path: Path<String> = serde_json::from_str(r#"["A","B"]"#).unwrap();
        assert_eq!(path.goal(), "B");
        assert!(!path.is_empty());

        let err = serde_json::from_str::<Path<String>>("[]").unwrap_err();
        assert!(err.to_string().contains("at least one node"));
    }
}
