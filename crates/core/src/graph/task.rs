use crate::error::Result;
use std::fmt;
use std::str::FromStr;

/// State threaded through a graph run. Tasks only read it; the executor
/// applies the updates they return.
pub trait GraphState {
    type Update: Send;

    fn apply(&mut self, update: Self::Update);
}

pub(crate) type TaskFn<S> = Box<dyn Fn(&S) -> Result<<S as GraphState>::Update> + Send + Sync>;

pub(crate) struct TaskNode<S: GraphState> {
    pub(crate) name: &'static str,
    pub(crate) deps: Vec<&'static str>,
    pub(crate) run: TaskFn<S>,
}

/// How the tasks of one wave are run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One scoped thread per task when a wave has more than one task.
    #[default]
    Parallel,
    /// Tasks of a wave run one after another in declaration order.
    Sequential,
}

impl FromStr for ExecutionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parallel" => Ok(Self::Parallel),
            "sequential" => Ok(Self::Sequential),
            other => anyhow::bail!("unknown execution mode `{other}` (expected parallel or sequential)"),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parallel => f.write_str("parallel"),
            Self::Sequential => f.write_str("sequential"),
        }
    }
}
