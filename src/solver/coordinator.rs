//! Search coordinator - creates the shared state, runs the root task and
//! collects the result.

use crate::core::errors::{Result, SolverError};
use crate::core::stats::SearchStatsSnapshot;
use crate::maze::{Maze, MazeNode};
use crate::solver::config::SolverConfig;
use crate::solver::path::{reconstruct, Path};
use crate::solver::state::SharedSearchState;
use crate::solver::task::{SearchContext, SearchTask, TaskOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport<N> {
    pub run_id: Uuid,
    /// Origin-to-goal path, `None` when no goal is reachable
    pub path: Option<Path<N>>,
    pub stats: SearchStatsSnapshot,
    pub visited_nodes: usize,
    pub claimed_nodes: usize,
    pub elapsed: Duration,
}

impl<N> SearchReport<N> {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Parallel depth-first solver for one maze
pub struct Solver<M: Maze> {
    maze: Arc<M>,
    config: SolverConfig,
}

impl<M: Maze> Solver<M> {
    pub fn new(maze: Arc<M>, config: SolverConfig) -> Self {
        Self { maze, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the search on the caller's tokio runtime
    pub async fn run(&self) -> Result<SearchReport<M::Node>> {
        self.config.validate()?;

        let run_id = Uuid::new_v4();
        let span = info_span!("search", %run_id);
        self.run_inner(run_id).instrument(span).await
    }

    /// Build a multi-thread runtime and run the search on it.
    ///
    /// Must not be called from inside another tokio runtime.
    pub fn run_blocking(&self) -> Result<SearchReport<M::Node>> {
        self.config.validate()?;

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(workers) = self.config.worker_threads {
            builder.worker_threads(workers);
        }
        let runtime = builder
            .thread_name("amazed-worker")
            .enable_all()
            .build()
            .map_err(|source| SolverError::Runtime { source })?;

        runtime.block_on(self.run())
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<SearchReport<M::Node>> {
        let started = Instant::now();
        let origin = self.maze.origin();
        let state = Arc::new(SharedSearchState::new());
        state.claim_origin(origin.clone())?;

        let ctx = Arc::new(SearchContext {
            maze: Arc::clone(&self.maze),
            state: Arc::clone(&state),
            config: self.config.clone(),
            origin: origin.clone(),
        });

        info!(
            origin = ?origin,
            fork_after = ?self.config.fork_threshold(),
            forking = self.config.forking,
            "Starting search"
        );
        let outcome = SearchTask::root(ctx).spawn().join().await;

        // Tasks abandoned by an early-returning parent are still joined here
        join_detached(&state).await;
        let outcome = outcome?;

        let path = match state.peek_solution() {
            Some(goal) => Some(reconstruct(&goal, &origin, state.as_ref())?),
            None => None,
        };
        if matches!(outcome, TaskOutcome::NotFound) && path.is_some() {
            warn!("Root task reported no goal but a solution is committed");
        }

        let report = SearchReport {
            run_id,
            path,
            stats: state.stats().snapshot(),
            visited_nodes: state.visited_count(),
            claimed_nodes: state.claimed_count(),
            elapsed: started.elapsed(),
        };
        info!(
            found = report.found(),
            path_len = report.path.as_ref().map(|p| p.len()),
            nodes_expanded = report.stats.nodes_expanded,
            tasks = report.stats.total_tasks(),
            elapsed = ?report.elapsed,
            "Search finished"
        );
        Ok(report)
    }
}

async fn join_detached<N: MazeNode>(state: &SharedSearchState<N>) {
    loop {
        let batch = state.take_detached();
        if batch.is_empty() {
            break;
        }
        for handle in batch {
            let task_id = handle.task_id();
            if let Err(e) = handle.join().await {
                warn!(task = task_id, "Detached search task failed: {}", e);
            }
        }
    }
}

/// Solve `maze` from its origin, blocking the calling thread
pub fn solve<M: Maze>(maze: Arc<M>, config: SolverConfig) -> Result<Option<Path<M::Node>>> {
    Ok(Solver::new(maze, config).run_blocking()?.path)
}

/// Solve `maze` from its origin on the current runtime
pub async fn solve_async<M: Maze>(
    maze: Arc<M>,
    config: SolverConfig,
) -> Result<Option<Path<M::Node>>> {
    Ok(Solver::new(maze, config).run().await?.path)
}
