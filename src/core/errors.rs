use thiserror::Error;

/// Unified error type for the solver
#[derive(Debug, Error)]
pub enum SolverError {
    /// The shared predecessor/claim bookkeeping was found broken
    #[error("Inconsistent search state at {node}: {message}")]
    InconsistentState { node: String, message: String },

    /// The maze failed to answer a neighbor query
    #[error("Graph oracle failed while expanding {node}")]
    GraphOracle {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// A search task panicked or was cancelled by the runtime
    #[error("Search task {task_id} could not be joined")]
    TaskJoin {
        task_id: u64,
        #[source]
        source: tokio::task::JoinError,
    },

    /// The blocking entry point could not start its runtime
    #[error("Failed to build search runtime")]
    Runtime {
        #[source]
        source: std::io::Error,
    },

    /// A maze description could not be understood
    #[error("Invalid maze definition: {message}")]
    MazeFormat { message: String, line: Option<usize> },

    /// IO errors while reading maze files
    #[error("IO operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SolverError {
    /// Create an inconsistent-state error for `node`
    pub fn inconsistent<N: std::fmt::Debug, S: Into<String>>(node: &N, message: S) -> Self {
        Self::InconsistentState {
            node: format!("{:?}", node),
            message: message.into(),
        }
    }

    /// Wrap a failure reported by the maze while expanding `node`
    pub fn oracle<N: std::fmt::Debug>(node: &N, source: anyhow::Error) -> Self {
        Self::GraphOracle {
            node: format!("{:?}", node),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error naming the offending field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a maze format error
    pub fn maze_format<S: Into<String>>(message: S) -> Self {
        Self::MazeFormat {
            message: message.into(),
            line: None,
        }
    }

    /// Create a maze format error pointing at a 1-based input line
    pub fn maze_format_at<S: Into<String>>(message: S, line: usize) -> Self {
        Self::MazeFormat {
            message: message.into(),
            line: Some(line),
        }
    }

    /// Create an IO error
    pub fn io<S: Into<String>>(operation: S, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Fatal errors mean the exclusivity guarantees can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InconsistentState { .. } | Self::TaskJoin { .. }
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::InconsistentState { .. } => "inconsistent_state",
            Self::GraphOracle { .. } => "graph_oracle",
            Self::Configuration { .. } => "configuration",
            Self::TaskJoin { .. } => "task_join",
            Self::Runtime { .. } => "runtime",
            Self::MazeFormat { .. } => "maze_format",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SolverError>;

impl From<std::io::Error> for SolverError {
    fn from(err: std::io::Error) -> Self {
        Self::io("io_operation", err)
    }
}

impl From<serde_json::Error> for SolverError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for SolverError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}
