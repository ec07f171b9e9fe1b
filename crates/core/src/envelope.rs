use crate::domain::PipelineOutput;
use crate::error::PipelineError;
use serde::Serialize;

/// Response wrapper shared by the HTTP and CLI adapters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Success { data: PipelineOutput },
    Error { error: ErrorBody },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl Envelope {
    pub fn from_result(result: Result<PipelineOutput, PipelineError>) -> Self {
        match result {
            Ok(data) => Self::Success { data },
            Err(e) => Self::Error {
                error: ErrorBody {
                    kind: e.kind(),
                    message: e.to_string(),
                },
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
