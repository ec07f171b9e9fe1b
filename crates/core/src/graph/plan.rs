use super::task::{GraphState, TaskNode};
use crate::error::{PipelineError, Result};
use std::collections::HashMap;

pub struct TaskGraphBuilder<S: GraphState> {
    nodes: Vec<TaskNode<S>>,
}

impl<S: GraphState> Default for TaskGraphBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: GraphState> TaskGraphBuilder<S> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Adds a task. Declaration order decides the order in which updates of
    /// the same wave are applied.
    pub fn task<F>(mut self, name: &'static str, deps: &[&'static str], run: F) -> Self
    where
        F: Fn(&S) -> Result<S::Update> + Send + Sync + 'static,
    {
        let mut unique = Vec::with_capacity(deps.len());
        for dep in deps {
            if !unique.contains(dep) {
                unique.push(*dep);
            }
        }

        self.nodes.push(TaskNode {
            name,
            deps: unique,
            run: Box::new(run),
        });
        self
    }

    pub fn build(self) -> Result<TaskGraph<S>> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.name, i).is_some() {
                return Err(PipelineError::Graph(format!("duplicate task `{}`", node.name)));
            }
        }

        for node in &self.nodes {
            for dep in &node.deps {
                if !index.contains_key(dep) {
                    return Err(PipelineError::Graph(format!(
                        "task `{}` depends on unknown task `{dep}`",
                        node.name
                    )));
                }
            }
        }

        let waves = layer(&self.nodes)?;
        Ok(TaskGraph {
            nodes: self.nodes,
            waves,
        })
    }
}

/// A validated, acyclic task graph.
pub struct TaskGraph<S: GraphState> {
    pub(crate) nodes: Vec<TaskNode<S>>,
    pub(crate) waves: Vec<Vec<usize>>,
}

impl<S: GraphState> TaskGraph<S> {
    pub fn builder() -> TaskGraphBuilder<S> {
        TaskGraphBuilder::new()
    }

    /// Task names grouped by wave, in execution order.
    pub fn waves(&self) -> Vec<Vec<&'static str>> {
        self.waves
            .iter()
            .map(|wave| wave.iter().map(|&i| self.nodes[i].name).collect())
            .collect()
    }

    /// Tasks nothing else depends on.
    pub fn sinks(&self) -> Vec<&'static str> {
        self.nodes
            .iter()
            .filter(|n| !self.nodes.iter().any(|other| other.deps.contains(&n.name)))
            .map(|n| n.name)
            .collect()
    }
}

/// Groups tasks into waves: each wave holds every not-yet-scheduled task
/// whose dependencies were all scheduled in earlier waves.
fn layer<S: GraphState>(nodes: &[TaskNode<S>]) -> Result<Vec<Vec<usize>>> {
    let mut scheduled = vec![false; nodes.len()];
    let mut remaining = nodes.len();
    let mut waves = Vec::new();

    while remaining > 0 {
        let wave: Vec<usize> = (0..nodes.len())
            .filter(|&i| !scheduled[i])
            .filter(|&i| {
                nodes[i].deps.iter().all(|dep| {
                    nodes
                        .iter()
                        .position(|n| n.name == *dep)
                        .is_some_and(|j| scheduled[j])
                })
            })
            .collect();

        if wave.is_empty() {
            let stuck: Vec<_> = (0..nodes.len())
                .filter(|&i| !scheduled[i])
                .map(|i| nodes[i].name)
                .collect();
            return Err(PipelineError::Graph(format!(
                "circular dependency among tasks: {}",
                stuck.join(", ")
            )));
        }

        for &i in &wave {
            scheduled[i] = true;
        }
        remaining -= wave.len();
        waves.push(wave);
    }

    Ok(waves)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    impl GraphState for Noop {
        type Update = ();

        fn apply(&mut self, _: ()) {}
    }

    fn ok(_: &Noop) -> Result<()> {
        Ok(())
    }

    #[test]
    fn diamond_layers_into_three_waves() {
        let graph = TaskGraph::<Noop>::builder()
            .task("source", &[], ok)
            .task("left", &["source"], ok)
            .task("right", &["source"], ok)
            .task("sink", &["left", "right"], ok)
            .build()
            .unwrap();

        assert_eq!(graph.waves(), vec![vec!["source"], vec!["left", "right"], vec!["sink"]]);
        assert_eq!(graph.sinks(), vec!["sink"]);
    }

    #[test]
    fn declaration_order_does_not_need_to_be_topological() {
        let graph = TaskGraph::<Noop>::builder()
            .task("b", &["a"], ok)
            .task("a", &[], ok)
            .build()
            .unwrap();
        assert_eq!(graph.waves(), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn rejects_cycles() {
        let err = TaskGraph::<Noop>::builder()
            .task("root", &[], ok)
            .task("a", &["b"], ok)
            .task("b", &["a"], ok)
            .build()
            .err()
            .unwrap();
        assert_eq!(
            err,
            PipelineError::Graph("circular dependency among tasks: a, b".to_string())
        );
    }

    #[test]
    fn rejects_self_dependency() {
        let res = TaskGraph::<Noop>::builder().task("a", &["a"], ok).build();
        assert!(matches!(res, Err(PipelineError::Graph(_))));
    }

    #[test]
    fn rejects_unknown_dependency() {
        let err = TaskGraph::<Noop>::builder()
            .task("a", &["ghost"], ok)
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown task `ghost`"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = TaskGraph::<Noop>::builder()
            .task("a", &[], ok)
            .task("a", &[], ok)
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("duplicate task `a`"));
    }

    #[test]
    fn repeated_dependencies_are_collapsed() {
        let graph = TaskGraph::<Noop>::builder()
            .task("a", &[], ok)
            .task("b", &["a", "a"], ok)
            .build()
            .unwrap();
        assert_eq!(graph.nodes[1].deps, vec!["a"]);
        assert_eq!(graph.waves(), vec![vec!["a"], vec!["b"]]);
    }
}
