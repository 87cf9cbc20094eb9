use crate::core::errors::{Result, SolverError};
use crate::core::stats::SearchStats;
use crate::maze::MazeNode;
use crate::solver::path::Predecessors;
use crate::solver::task::TaskHandle;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use tracing::{debug, warn};

/// State shared by every task of one search run.
///
/// `claimed` and `visited` are insert-if-absent sets: the call that performs
/// the insertion owns the node. `predecessor` is written once per claimed node
/// by its owner before the node reaches any frontier. `solution` is a
/// single-assignment cell.
#[derive(Debug)]
pub struct SharedSearchState<N: MazeNode> {
    visited: DashSet<N>,
    claimed: DashSet<N>,
    predecessor: DashMap<N, N>,
    solution: OnceLock<N>,
    aborted: AtomicBool,
    detached: Mutex<Vec<TaskHandle<N>>>,
    next_task_id: AtomicU64,
    stats: SearchStats,
}

impl<N: MazeNode> Default for SharedSearchState<N> {
    fn default() -> Self {
        Self {
            visited: DashSet::new(),
            claimed: DashSet::new(),
            predecessor: DashMap::new(),
            solution: OnceLock::new(),
            aborted: AtomicBool::new(false),
            detached: Mutex::new(Vec::new()),
            // 0 is the root task
            next_task_id: AtomicU64::new(1),
            stats: SearchStats::new(),
        }
    }
}

impl<N: MazeNode> SharedSearchState<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `node` for expansion. True iff this call inserted it.
    pub fn try_claim(&self, node: N) -> bool {
        self.claimed.insert(node)
    }

    /// Record who claimed `node`. Only the task whose claim succeeded may call
    /// this, and only once per node.
    pub fn record_predecessor(&self, node: N, parent: N) -> Result<()> {
        if !self.claimed.contains(&node) {
            return Err(SolverError::inconsistent(
                &node,
                "predecessor recorded for a node nobody claimed",
            ));
        }
        match self.predecessor.entry(node) {
            Entry::Occupied(existing) => Err(SolverError::inconsistent(
                existing.key(),
                format!(
                    "predecessor already recorded as {:?}, refusing {:?}",
                    existing.get(),
                    parent
                ),
            )),
            Entry::Vacant(slot) => {
                slot.insert(parent);
                Ok(())
            }
        }
    }

    /// Claim `node` on behalf of `parent` and record the edge on success
    pub fn claim(&self, node: N, parent: N) -> Result<bool> {
        if !self.try_claim(node.clone()) {
            return Ok(false);
        }
        self.record_predecessor(node, parent)?;
        Ok(true)
    }

    /// Claim the origin of the run, which has no predecessor
    pub fn claim_origin(&self, origin: N) -> Result<()> {
        if !self.try_claim(origin.clone()) {
            return Err(SolverError::inconsistent(
                &origin,
                "origin was already claimed in a fresh search state",
            ));
        }
        Ok(())
    }

    /// Gate for expansion. True iff this call inserted `node` into `visited`.
    pub fn try_expand(&self, node: &N) -> bool {
        self.visited.insert(node.clone())
    }

    /// Commit `node` as the solution if none is set. True iff this call won.
    pub fn try_commit_solution(&self, node: N) -> bool {
        self.solution.set(node).is_ok()
    }

    pub fn peek_solution(&self) -> Option<N> {
        self.solution.get().cloned()
    }

    /// Stop every task at its next check after a fatal failure
    pub fn abort(&self) {
        if !self.aborted.swap(true, Ordering::SeqCst) {
            warn!("Search run aborted");
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    /// Cooperative early-exit check
    pub fn should_stop(&self) -> bool {
        self.solution.get().is_some() || self.is_aborted()
    }

    pub fn predecessor_of(&self, node: &N) -> Option<N> {
        self.predecessor.get(node).map(|entry| entry.value().clone())
    }

    pub fn is_claimed(&self, node: &N) -> bool {
        self.claimed.contains(node)
    }

    pub fn is_visited(&self, node: &N) -> bool {
        self.visited.contains(node)
    }

    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub(crate) fn next_task_id(&self) -> u64 {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Hand over children whose parent stopped waiting for them
    pub(crate) fn detach<I>(&self, handles: I)
    where
        I: IntoIterator<Item = TaskHandle<N>>,
    {
        let mut detached = self.detached.lock().unwrap_or_else(|e| e.into_inner());
        let before = detached.len();
        detached.extend(handles);
        if detached.len() > before {
            debug!("Detached {} search tasks", detached.len() - before);
        }
    }

    pub(crate) fn take_detached(&self) -> Vec<TaskHandle<N>> {
        let mut detached = self.detached.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *detached)
    }
}

impl<N: MazeNode> Predecessors<N> for SharedSearchState<N> {
    fn predecessor(&self, node: &N) -> Option<N> {
        self.predecessor_of(node)
    }

    fn recorded(&self) -> usize {
        self.predecessor.len()
    }
}
