use super::plan::TaskGraph;
use super::task::{ExecutionMode, GraphState, TaskNode};
use crate::error::{PipelineError, Result};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Final state of a graph run plus the waves that produced it.
#[derive(Debug)]
pub struct GraphRun<S> {
    pub state: S,
    pub waves: Vec<Vec<&'static str>>,
}

/// Runs every task of `graph` against `state`, one wave at a time.
///
/// The first failing task aborts the run and its error is returned; the
/// partially updated state is dropped. A panicking task is reported as
/// `TaskPanicked` in both modes.
pub fn execute<S>(graph: &TaskGraph<S>, mut state: S, mode: ExecutionMode) -> Result<GraphRun<S>>
where
    S: GraphState + Sync,
{
    let mut waves = Vec::with_capacity(graph.waves.len());

    for wave in &graph.waves {
        let updates = match mode {
            ExecutionMode::Parallel if wave.len() > 1 => run_parallel(graph, wave, &state)?,
            _ => wave
                .iter()
                .map(|&i| run_task(&graph.nodes[i], &state))
                .collect::<Result<Vec<_>>>()?,
        };

        for update in updates {
            state.apply(update);
        }
        waves.push(wave.iter().map(|&i| graph.nodes[i].name).collect());
    }

    Ok(GraphRun { state, waves })
}

fn run_parallel<S>(graph: &TaskGraph<S>, wave: &[usize], state: &S) -> Result<Vec<S::Update>>
where
    S: GraphState + Sync,
{
    std::thread::scope(|scope| {
        let handles: Vec<_> = wave
            .iter()
            .map(|&i| {
                let node = &graph.nodes[i];
                (node.name, scope.spawn(move || run_task(node, state)))
            })
            .collect();

        // Join everything before looking at results so no thread outlives
        // an early return.
        let joined: Vec<Result<S::Update>> = handles
            .into_iter()
            .map(|(task, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(PipelineError::TaskPanicked { task }))
            })
            .collect();

        joined.into_iter().collect()
    })
}

fn run_task<S: GraphState>(node: &TaskNode<S>, state: &S) -> Result<S::Update> {
    let started = Instant::now();
    let out = panic::catch_unwind(AssertUnwindSafe(|| (node.run)(state)))
        .unwrap_or_else(|_| Err(PipelineError::TaskPanicked { task: node.name }));
    let elapsed_us = started.elapsed().as_micros() as u64;

    match &out {
        Ok(_) => tracing::debug!(task = node.name, elapsed_us, "task finished"),
        Err(e) => tracing::debug!(task = node.name, elapsed_us, error = %e, "task failed"),
    }
    out
}
