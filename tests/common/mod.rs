#![allow(dead_code)]

use amazed::maze::{Cell, GraphMaze, GridMaze, Maze, MazeNode};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;

pub fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Delegates to `inner` but fails every neighbor query for `poisoned`
pub struct FailingMaze<M: Maze> {
    pub inner: M,
    pub poisoned: M::Node,
}

impl<M: Maze> Maze for FailingMaze<M> {
    type Node = M::Node;

    fn origin(&self) -> Self::Node {
        self.inner.origin()
    }

    fn neighbors(&self, node: &Self::Node) -> anyhow::Result<Vec<Self::Node>> {
        if *node == self.poisoned {
            anyhow::bail!("neighbor query for {:?} failed", node);
        }
        self.inner.neighbors(node)
    }

    fn is_goal(&self, node: &Self::Node) -> bool {
        self.inner.is_goal(node)
    }
}

/// Breadth-first reachability used as the reference answer.
/// Goals are not expanded, matching the solver.
pub fn reachable<M: Maze>(maze: &M) -> (HashSet<M::Node>, bool) {
    let mut seen = HashSet::from([maze.origin()]);
    let mut queue = VecDeque::from([maze.origin()]);
    let mut goal_reachable = false;

    while let Some(node) = queue.pop_front() {
        if maze.is_goal(&node) {
            goal_reachable = true;
            continue;
        }
        for next in maze.neighbors(&node).expect("reference search") {
            if seen.insert(next.clone()) {
                queue.push_back(next);
            }
        }
    }
    (seen, goal_reachable)
}

/// Random grid with walls at roughly `wall_percent` percent of cells
pub fn random_grid(seed: u64, rows: usize, cols: usize, wall_percent: u8, goals: usize) -> String {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut grid: Vec<Vec<char>> = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| if rng.u8(0..100) < wall_percent { '#' } else { '.' })
                .collect()
        })
        .collect();
    for _ in 0..goals {
        let (r, c) = (rng.usize(0..rows), rng.usize(0..cols));
        grid[r][c] = '*';
    }
    grid[0][0] = 'S';

    let mut text = String::new();
    for line in grid {
        text.extend(line);
        text.push('\n');
    }
    text
}

pub fn parse_grid(text: &str) -> GridMaze {
    text.parse().expect("generated grid parses")
}

/// `hub -> B1..Bn -> goal`, every branch leading to the same goal
pub fn fan_in(branches: usize) -> GraphMaze {
    let mut builder = GraphMaze::builder("A").goal("G");
    for i in 1..=branches {
        let branch = format!("B{}", i);
        builder = builder.edge("A", branch.clone()).edge(branch, "G");
    }
    builder.build().expect("fan-in maze")
}

/// Undirected random graph over `n` nodes with `degree` edges per node
pub fn random_graph(seed: u64, n: usize, degree: usize, goal: usize) -> GraphMaze {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut builder = GraphMaze::builder("n0").undirected(true).goal(format!("n{}", goal));
    for from in 0..n {
        for _ in 0..degree {
            let to = rng.usize(0..n);
            if to != from {
                builder = builder.edge(format!("n{}", from), format!("n{}", to));
            }
        }
    }
    builder.build().expect("random graph")
}

pub fn assert_adjacent_cells(path: &[Cell]) {
    for step in path.windows(2) {
        assert!(step[0].is_adjacent(&step[1]), "{} -> {} is not a step", step[0], step[1]);
    }
}

pub fn assert_no_duplicates<N: MazeNode>(path: &[N]) {
    let distinct: HashSet<&N> = path.iter().collect();
    assert_eq!(distinct.len(), path.len(), "path revisits a node: {:?}", path);
}
