//! Recursive fork/join search task.
//!
//! A task pops nodes from its private frontier depth-first. Before a node
//! reaches any frontier its expanding task claims it in the shared state, so
//! each node sits in exactly one frontier. At a branch the first newly claimed
//! neighbor stays with the task and every other one is handed to a freshly
//! spawned child. Once the frontier runs dry the task joins its children in
//! fork order.

use crate::core::errors::{Result, SolverError};
use crate::maze::{Maze, MazeNode};
use crate::solver::config::SolverConfig;
use crate::solver::path::{reconstruct, Path};
use crate::solver::state::SharedSearchState;
use futures::future::{BoxFuture, FutureExt};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, Instrument};

/// Result of one task's share of the search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<N> {
    /// A goal was reached; carries the committed solution's path
    Found(Path<N>),
    NotFound,
}

/// Everything a task needs besides its own frontier, shared with its children
#[derive(Debug)]
pub struct SearchContext<M: Maze> {
    pub maze: Arc<M>,
    pub state: Arc<SharedSearchState<M::Node>>,
    pub config: SolverConfig,
    /// Origin of the whole run, not of the individual task
    pub origin: M::Node,
}

/// Join handle of a spawned search task
#[derive(Debug)]
pub struct TaskHandle<N: MazeNode> {
    task_id: u64,
    handle: JoinHandle<Result<TaskOutcome<N>>>,
}

impl<N: MazeNode> TaskHandle<N> {
    pub fn task_id(&self) -> u64 {
        self.task_id
    }

    /// Wait for the task; suspends the caller without holding a worker
    pub async fn join(self) -> Result<TaskOutcome<N>> {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(source) => Err(SolverError::TaskJoin {
                task_id: self.task_id,
                source,
            }),
        }
    }
}

pub struct SearchTask<M: Maze> {
    id: u64,
    ctx: Arc<SearchContext<M>>,
    frontier: Vec<M::Node>,
    /// Spawned and not yet joined, in fork order
    children: VecDeque<TaskHandle<M::Node>>,
    expanded_since_fork: usize,
}

impl<M: Maze> SearchTask<M> {
    /// Task 0, starting from the run's origin
    pub fn root(ctx: Arc<SearchContext<M>>) -> Self {
        let origin = ctx.origin.clone();
        Self::with_frontier(0, ctx, origin)
    }

    fn with_frontier(id: u64, ctx: Arc<SearchContext<M>>, start: M::Node) -> Self {
        Self {
            id,
            ctx,
            frontier: vec![start],
            children: VecDeque::new(),
            expanded_since_fork: 0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Submit the task to the runtime
    pub fn spawn(self) -> TaskHandle<M::Node> {
        let task_id = self.id;
        let handle = tokio::spawn(self.run().in_current_span());
        TaskHandle { task_id, handle }
    }

    /// Drive the task inline on the caller's task
    pub fn run(self) -> BoxFuture<'static, Result<TaskOutcome<M::Node>>> {
        self.search().boxed()
    }

    async fn search(mut self) -> Result<TaskOutcome<M::Node>> {
        let ctx = Arc::clone(&self.ctx);
        let running = ctx.state.stats().start_task();
        trace!(task = self.id, start = ?self.frontier.last(), "Search task started");

        match self.explore() {
            Err(e) => {
                ctx.state.abort();
                ctx.state.detach(self.children.drain(..));
                debug!(task = self.id, category = e.category(), "Search task failed: {}", e);
                return Err(e);
            }
            Ok(Some(path)) => {
                // Children see the committed solution and wind down on their own
                ctx.state.detach(self.children.drain(..));
                return Ok(TaskOutcome::Found(path));
            }
            Ok(None) => {}
        }

        while let Some(child) = self.children.pop_front() {
            let child_id = child.task_id();
            match child.join().await {
                Ok(TaskOutcome::Found(path)) => {
                    debug!(task = self.id, child = child_id, "Child reported a goal");
                    ctx.state.detach(self.children.drain(..));
                    return Ok(TaskOutcome::Found(path));
                }
                Ok(TaskOutcome::NotFound) => {
                    trace!(task = self.id, child = child_id, "Child joined without a goal");
                }
                Err(e) => {
                    ctx.state.abort();
                    ctx.state.detach(self.children.drain(..));
                    return Err(e);
                }
            }
        }

        trace!(
            task = self.id,
            elapsed = ?running.elapsed(),
            "Search task exhausted its frontier"
        );
        Ok(TaskOutcome::NotFound)
    }

    /// Depth-first expansion until the frontier is empty, the run should
    /// stop, or a goal is reached
    fn explore(&mut self) -> Result<Option<Path<M::Node>>> {
        let ctx = Arc::clone(&self.ctx);
        let state = ctx.state.as_ref();

        loop {
            if state.should_stop() {
                trace!(task = self.id, "Stopping early");
                return Ok(None);
            }
            let Some(current) = self.frontier.pop() else {
                return Ok(None);
            };

            if !state.try_expand(&current) {
                state.stats().record_stale_pop();
                trace!(task = self.id, node = ?current, "Already expanded elsewhere");
                continue;
            }
            state.stats().record_expansion();
            self.expanded_since_fork += 1;

            if ctx.maze.is_goal(&current) {
                let won = state.try_commit_solution(current.clone());
                state.stats().record_goal(won);
                if won {
                    info!(task = self.id, goal = ?current, "Committed solution");
                } else {
                    debug!(task = self.id, goal = ?current, "Lost the commit race");
                }
                let committed = state.peek_solution().ok_or_else(|| {
                    SolverError::inconsistent(&current, "solution slot empty after commit")
                })?;
                return reconstruct(&committed, &ctx.origin, state).map(Some);
            }

            let neighbors = ctx
                .maze
                .neighbors(&current)
                .map_err(|e| SolverError::oracle(&current, e))?;

            let mut claimed = Vec::with_capacity(neighbors.len());
            for neighbor in neighbors {
                if state.claim(neighbor.clone(), current.clone())? {
                    claimed.push(neighbor);
                }
            }
            state.stats().record_claims(claimed.len());
            trace!(task = self.id, node = ?current, claimed = claimed.len(), "Expanded");

            self.branch(claimed);
        }
    }

    fn branch(&mut self, claimed: Vec<M::Node>) {
        let mut claimed = claimed.into_iter();
        let Some(first) = claimed.next() else {
            return;
        };
        let rest: Vec<M::Node> = claimed.collect();

        if rest.is_empty() || !self.ctx.config.may_fork(self.expanded_since_fork) {
            // first on top so it is explored next
            self.frontier.extend(rest.into_iter().rev());
            self.frontier.push(first);
            return;
        }

        self.frontier.push(first);
        for node in rest {
            self.fork(node);
        }
        self.expanded_since_fork = 0;
    }

    fn fork(&mut self, start: M::Node) {
        let child_id = self.ctx.state.next_task_id();
        debug!(task = self.id, child = child_id, start = ?start, "Forking");

        let child = Self::with_frontier(child_id, Arc::clone(&self.ctx), start);
        self.ctx.state.stats().record_spawn();
        self.children.push_back(child.spawn());
    }
}

// A task dropped before joining its children (a panic in the oracle, or
// runtime shutdown) hands them to the coordinator.
impl<M: Maze> Drop for SearchTask<M> {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        if std::thread::panicking() {
            self.ctx.state.abort();
        }
        self.ctx.state.detach(self.children.drain(..));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::GraphMaze;
    use pretty_assertions::assert_eq;

    fn context(maze: GraphMaze, config: SolverConfig) -> Arc<SearchContext<GraphMaze>> {
        let state = Arc::new(SharedSearchState::new());
        let origin = maze.origin();
        state.claim_origin(origin.clone()).unwrap();
        Arc::new(SearchContext {
            maze: Arc::new(maze),
            state,
            config,
            origin,
        })
    }

    #[tokio::test]
    async fn test_root_task_finds_goal_without_forking() {
        let maze = GraphMaze::builder("A")
            .edges("A", ["B", "C"])
            .edge("C", "D")
            .goal("D")
            .build()
            .unwrap();
        let ctx = context(maze, SolverConfig::sequential());

        let outcome = SearchTask::root(Arc::clone(&ctx)).run().await.unwrap();
        match outcome {
            TaskOutcome::Found(path) => assert_eq!(path.nodes(), &["A", "C", "D"]),
            TaskOutcome::NotFound => panic!("expected a path"),
        }
        assert_eq!(ctx.state.stats().snapshot().tasks_spawned, 0);
    }

    #[tokio::test]
    async fn test_sequential_explores_first_neighbor_first() {
        // Both B and C lead to goals; without forking B's subtree goes first
        let maze = GraphMaze::builder("A")
            .edges("A", ["B", "C"])
            .edge("B", "G1")
            .edge("C", "G2")
            .goal("G1")
            .goal("G2")
            .build()
            .unwrap();
        let ctx = context(maze, SolverConfig::sequential());

        let outcome = SearchTask::root(Arc::clone(&ctx)).run().await.unwrap();
        assert_eq!(ctx.state.peek_solution().as_deref(), Some("G1"));
        assert!(matches!(outcome, TaskOutcome::Found(ref p) if p.len() == 3));
        assert!(!ctx.state.is_visited(&"C".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_branch_forks_children() {
        let maze = GraphMaze::builder("A")
            .edges("A", ["B", "C", "D"])
            .build()
            .unwrap();
        let ctx = context(maze, SolverConfig::default());

        let outcome = SearchTask::root(Arc::clone(&ctx)).spawn().join().await.unwrap();
        assert_eq!(outcome, TaskOutcome::NotFound);

        let stats = ctx.state.stats().snapshot();
        assert_eq!(stats.tasks_spawned, 2);
        assert_eq!(stats.nodes_expanded, 4);
        assert_eq!(stats.active_tasks, 0);
    }

    #[tokio::test]
    async fn test_stopped_run_does_not_expand() {
        let maze = GraphMaze::builder("A").edge("A", "B").goal("B").build().unwrap();
        let ctx = context(maze, SolverConfig::default());
        ctx.state.abort();

        let outcome = SearchTask::root(Arc::clone(&ctx)).run().await.unwrap();
        assert_eq!(outcome, TaskOutcome::NotFound);
        assert_eq!(ctx.state.visited_count(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_aborts_run() {
        struct Broken;
        impl Maze for Broken {
            type Node = u32;
            fn origin(&self) -> u32 {
                0
            }
            fn neighbors(&self, node: &u32) -> anyhow::Result<Vec<u32>> {
                anyhow::bail!("no map for {}", node)
            }
            fn is_goal(&self, _node: &u32) -> bool {
                false
            }
        }

        let state = Arc::new(SharedSearchState::new());
        state.claim_origin(0).unwrap();
        let ctx = Arc::new(SearchContext {
            maze: Arc::new(Broken),
            state,
            config: SolverConfig::default(),
            origin: 0,
        });

        let err = SearchTask::root(Arc::clone(&ctx)).run().await.unwrap_err();
        assert_eq!(err.category(), "graph_oracle");
        assert!(ctx.state.is_aborted());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_task_hands_over_children() {
        struct PanicsOnB(GraphMaze);
        impl Maze for PanicsOnB {
            type Node = String;
            fn origin(&self) -> String {
                self.0.origin()
            }
            fn neighbors(&self, node: &String) -> anyhow::Result<Vec<String>> {
                if node == "B" {
                    panic!("oracle blew up on B");
                }
                self.0.neighbors(node)
            }
            fn is_goal(&self, node: &String) -> bool {
                self.0.is_goal(node)
            }
        }

        let inner = GraphMaze::builder("A")
            .edges("A", ["B", "C"])
            .edge("C", "D")
            .build()
            .unwrap();
        let state = Arc::new(SharedSearchState::new());
        state.claim_origin("A".to_string()).unwrap();
        let ctx = Arc::new(SearchContext {
            maze: Arc::new(PanicsOnB(inner)),
            state,
            config: SolverConfig::default(),
            origin: "A".to_string(),
        });

        let err = SearchTask::root(Arc::clone(&ctx)).spawn().join().await.unwrap_err();
        assert_eq!(err.category(), "task_join");
        assert!(ctx.state.is_aborted());

        // The child forked on C was handed over instead of being dropped
        let detached = ctx.state.take_detached();
        assert_eq!(detached.len(), 1);
        for handle in detached {
            handle.join().await.unwrap();
        }
    }
}
