pub mod config;
pub mod coordinator;
pub mod path;
pub mod state;
pub mod task;

pub use config::SolverConfig;
pub use coordinator::{solve, solve_async, SearchReport, Solver};
pub use path::{reconstruct, Path, Predecessors};
pub use state::SharedSearchState;
pub use task::{SearchContext, SearchTask, TaskHandle, TaskOutcome};
