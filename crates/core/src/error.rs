use crate::domain::Metric;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Everything that can abort a single pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A required business field (`revenue`, `cost`, `customers`) is absent.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// `profit` or `cac` overflowed for finite inputs.
    #[error("metric `{metric}` is not a finite number")]
    NonFiniteMetric { metric: Metric },

    #[error("invalid business data: {0}")]
    InvalidInput(String),

    /// A task read state that its dependencies should have produced.
    #[error("task `{task}` ran without `{input}` in state")]
    MissingStageInput {
        task: &'static str,
        input: &'static str,
    },

    #[error("invalid task graph: {0}")]
    Graph(String),

    #[error("task `{task}` panicked")]
    TaskPanicked { task: &'static str },
}

impl PipelineError {
    /// Stable machine-readable name, used in error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::InvalidField { .. } => "invalid_field",
            Self::NonFiniteMetric { .. } => "non_finite_metric",
            Self::InvalidInput(_) => "invalid_input",
            Self::MissingStageInput { .. } => "missing_stage_input",
            Self::Graph(_) => "graph",
            Self::TaskPanicked { .. } => "task_panicked",
        }
    }

    /// True when the caller sent bad data, as opposed to an internal fault.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::NonFiniteMetric { .. }
                | Self::InvalidInput(_)
        )
    }
}
