use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Lock-free counters shared by every task of a search run
#[derive(Debug, Default)]
pub struct SearchStats {
    nodes_expanded: AtomicU64,
    claims_won: AtomicU64,
    stale_pops: AtomicU64,
    tasks_spawned: AtomicU64,
    goals_found: AtomicU64,
    commits_lost: AtomicU64,

    active_tasks: AtomicUsize,
    peak_active_tasks: AtomicUsize,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_expansion(&self) {
        self.nodes_expanded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_claims(&self, count: usize) {
        self.claims_won.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// A popped node that some other task had already expanded
    pub fn record_stale_pop(&self) {
        self.stale_pops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spawn(&self) {
        self.tasks_spawned.fetch_add(1, Ordering::Relaxed);
    }

    /// A goal was reached; `won` tells whether this task's commit landed
    pub fn record_goal(&self, won: bool) {
        self.goals_found.fetch_add(1, Ordering::Relaxed);
        if !won {
            self.commits_lost.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Mark a task as running until the returned guard is dropped
    pub fn start_task(&self) -> TaskExecution<'_> {
        let now_active = self.active_tasks.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active_tasks.fetch_max(now_active, Ordering::SeqCst);
        debug!("Started search task, active: {}", now_active);

        TaskExecution {
            stats: self,
            start_time: Instant::now(),
        }
    }

    fn end_task(&self, start_time: Instant) {
        let previous = self.active_tasks.fetch_sub(1, Ordering::SeqCst);
        debug!(
            "Ended search task, active: {}, duration: {:?}",
            previous.saturating_sub(1),
            start_time.elapsed()
        );
    }

    pub fn snapshot(&self) -> SearchStatsSnapshot {
        SearchStatsSnapshot {
            nodes_expanded: self.nodes_expanded.load(Ordering::Relaxed),
            claims_won: self.claims_won.load(Ordering::Relaxed),
            stale_pops: self.stale_pops.load(Ordering::Relaxed),
            tasks_spawned: self.tasks_spawned.load(Ordering::Relaxed),
            goals_found: self.goals_found.load(Ordering::Relaxed),
            commits_lost: self.commits_lost.load(Ordering::Relaxed),
            active_tasks: self.active_tasks.load(Ordering::SeqCst),
            peak_active_tasks: self.peak_active_tasks.load(Ordering::SeqCst),
        }
    }
}

/// RAII task execution tracker
pub struct TaskExecution<'a> {
    stats: &'a SearchStats,
    start_time: Instant,
}

impl TaskExecution<'_> {
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Drop for TaskExecution<'_> {
    fn drop(&mut self) {
        self.stats.end_task(self.start_time);
    }
}

/// Point-in-time copy of [`SearchStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatsSnapshot {
    pub nodes_expanded: u64,
    pub claims_won: u64,
    pub stale_pops: u64,
    pub tasks_spawned: u64,
    pub goals_found: u64,
    pub commits_lost: u64,
    pub active_tasks: usize,
    pub peak_active_tasks: usize,
}

impl SearchStatsSnapshot {
    /// Tasks that ran in total, the root included
    pub fn total_tasks(&self) -> u64 {
        self.tasks_spawned + 1
    }

    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Nodes expanded: {}\n", self.nodes_expanded));
        s.push_str(&format!("Nodes claimed: {}\n", self.claims_won));
        s.push_str(&format!("Tasks run: {}\n", self.total_tasks()));
        s.push_str(&format!("Peak concurrent tasks: {}\n", self.peak_active_tasks));
        if self.stale_pops > 0 {
            s.push_str(&format!("Stale pops skipped: {}\n", self.stale_pops));
        }
        if self.goals_found > 0 {
            s.push_str(&format!(
                "Goals reached: {} ({} lost the commit race)\n",
                self.goals_found, self.commits_lost
            ));
        }
        s
    }
}
