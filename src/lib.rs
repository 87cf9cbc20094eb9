// Core infrastructure modules
pub mod core {
    pub mod errors;
    pub mod stats;
}

pub mod maze; // Graph oracles: explicit digraphs and ASCII grids
pub mod solver; // Fork/join depth-first search

// Re-exports for convenience
pub use core::errors::{Result, SolverError};
pub use core::stats::{SearchStats, SearchStatsSnapshot};
pub use maze::{Cell, GraphMaze, GridMaze, Maze, MazeDefinition, MazeNode};
pub use solver::{solve, solve_async, Path, SearchReport, Solver, SolverConfig};
