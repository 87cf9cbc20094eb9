use crate::core::errors::{Result, SolverError};
use serde::{Deserialize, Serialize};

/// Tuning knobs for one search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Nodes a task must expand since its last fork before it may fork
    /// again. `None` or `Some(0)` forks at every multi-neighbor branch.
    pub fork_after: Option<usize>,
    /// When false the root task keeps every branch on its own frontier
    pub forking: bool,
    /// Worker threads for the runtime built by the blocking entry point.
    /// `None` uses one per CPU.
    pub worker_threads: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            fork_after: None,
            forking: true,
            worker_threads: None,
        }
    }
}

impl SolverConfig {
    /// Single-task depth-first search
    pub fn sequential() -> Self {
        Self {
            forking: false,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads == Some(0) {
            return Err(SolverError::configuration_field(
                "worker_threads must be greater than 0",
                "worker_threads",
            ));
        }
        if !self.forking && self.fork_after.is_some_and(|n| n > 0) {
            return Err(SolverError::configuration_field(
                "fork_after has no effect when forking is disabled",
                "fork_after",
            ));
        }
        Ok(())
    }

    pub fn with_fork_after(mut self, fork_after: usize) -> Self {
        self.fork_after = Some(fork_after);
        self
    }

    pub fn with_fork_after_option(mut self, fork_after: Option<usize>) -> Self {
        self.fork_after = fork_after;
        self
    }

    pub fn with_forking(mut self, forking: bool) -> Self {
        self.forking = forking;
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = Some(worker_threads);
        self
    }

    /// Threshold actually enforced; `None` means no throttling
    pub fn fork_threshold(&self) -> Option<usize> {
        self.fork_after.filter(|&n| n > 0)
    }

    /// Whether a task that has expanded `expanded_since_fork` nodes since its
    /// last fork may fork now
    pub fn may_fork(&self, expanded_since_fork: usize) -> bool {
        if !self.forking {
            return false;
        }
        match self.fork_threshold() {
            None => true,
            Some(threshold) => expanded_since_fork >= threshold,
        }
    }
}
