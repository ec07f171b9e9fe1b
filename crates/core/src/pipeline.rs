use crate::domain::{Alert, BusinessRecord, MetricsResult, PipelineOutput};
use crate::error::{PipelineError, Result};
use crate::graph::{execute, ExecutionMode, GraphState, TaskGraph};
use crate::rules;
use serde_json::Value;

pub const COMPUTE_METRICS: &str = "compute_metrics";
pub const GENERATE_ALERTS: &str = "generate_alerts";
pub const GENERATE_RECOMMENDATIONS: &str = "generate_recommendations";
pub const ASSEMBLE_OUTPUT: &str = "assemble_output";

/// Working record for one invocation. Each stage fills exactly one slot.
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub business_data: BusinessRecord,
    pub metrics: Option<MetricsResult>,
    pub alerts: Option<Vec<Alert>>,
    pub recommendations: Option<Vec<String>>,
    pub output: Option<PipelineOutput>,
}

impl PipelineState {
    pub fn new(business_data: BusinessRecord) -> Self {
        Self {
            business_data,
            metrics: None,
            alerts: None,
            recommendations: None,
            output: None,
        }
    }
}

#[derive(Debug)]
pub enum StateUpdate {
    Metrics(MetricsResult),
    Alerts(Vec<Alert>),
    Recommendations(Vec<String>),
    Output(PipelineOutput),
}

impl GraphState for PipelineState {
    type Update = StateUpdate;

    fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::Metrics(m) => self.metrics = Some(m),
            StateUpdate::Alerts(a) => self.alerts = Some(a),
            StateUpdate::Recommendations(r) => self.recommendations = Some(r),
            StateUpdate::Output(o) => self.output = Some(o),
        }
    }
}

fn require<'a, T>(slot: &'a Option<T>, task: &'static str, input: &'static str) -> Result<&'a T> {
    slot.as_ref().ok_or(PipelineError::MissingStageInput { task, input })
}

fn compute_metrics_stage(state: &PipelineState) -> Result<StateUpdate> {
    let metrics = rules::compute_metrics(&state.business_data)?;
    Ok(StateUpdate::Metrics(metrics))
}

fn generate_alerts_stage(state: &PipelineState) -> Result<StateUpdate> {
    let metrics = require(&state.metrics, GENERATE_ALERTS, "metrics")?;
    Ok(StateUpdate::Alerts(rules::generate_alerts(metrics)))
}

fn generate_recommendations_stage(state: &PipelineState) -> Result<StateUpdate> {
    let metrics = require(&state.metrics, GENERATE_RECOMMENDATIONS, "metrics")?;
    Ok(StateUpdate::Recommendations(rules::generate_recommendations(metrics)))
}

fn assemble_output_stage(state: &PipelineState) -> Result<StateUpdate> {
    Ok(StateUpdate::Output(PipelineOutput {
        metrics: *require(&state.metrics, ASSEMBLE_OUTPUT, "metrics")?,
        alerts: require(&state.alerts, ASSEMBLE_OUTPUT, "alerts")?.clone(),
        recommendations: require(&state.recommendations, ASSEMBLE_OUTPUT, "recommendations")?
            .clone(),
    }))
}

/// Metrics → (alerts ‖ recommendations) → output.
pub struct MetricsPipeline {
    graph: TaskGraph<PipelineState>,
    mode: ExecutionMode,
}

impl MetricsPipeline {
    pub fn new(mode: ExecutionMode) -> Result<Self> {
        let graph = TaskGraph::<PipelineState>::builder()
            .task(COMPUTE_METRICS, &[], compute_metrics_stage)
            .task(GENERATE_ALERTS, &[COMPUTE_METRICS], generate_alerts_stage)
            .task(
                GENERATE_RECOMMENDATIONS,
                &[COMPUTE_METRICS],
                generate_recommendations_stage,
            )
            .task(
                ASSEMBLE_OUTPUT,
                &[COMPUTE_METRICS, GENERATE_ALERTS, GENERATE_RECOMMENDATIONS],
                assemble_output_stage,
            )
            .build()?;

        tracing::debug!(
            waves = ?graph.waves(),
            sinks = ?graph.sinks(),
            %mode,
            "pipeline graph built"
        );
        Ok(Self { graph, mode })
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Entry point for adapters: `business_data` is the raw JSON object.
    pub fn invoke(&self, business_data: &Value) -> Result<PipelineOutput> {
        let record = BusinessRecord::from_value(business_data)?;
        self.run(record)
    }

    pub fn run(&self, record: BusinessRecord) -> Result<PipelineOutput> {
        let run = execute(&self.graph, PipelineState::new(record), self.mode)?;
        let output = run.state.output.ok_or(PipelineError::MissingStageInput {
            task: ASSEMBLE_OUTPUT,
            input: "output",
        })?;

        tracing::debug!(
            mode = %self.mode,
            waves = ?run.waves,
            alerts = output.alerts.len(),
            recommendations = output.recommendations.len(),
            "pipeline finished"
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertKind;
    use serde_json::json;

    fn valid_data() -> Value {
        json!({
            "revenue": 12000,
            "cost": 8000,
            "customers": 100,
            "previous_revenue": 10000,
            "previous_cost": 7000,
            "previous_customers": 90
        })
    }

    fn negative_profit_data() -> Value {
        json!({
            "revenue": 5000,
            "cost": 6000,
            "customers": 50,
            "previous_revenue": 4000,
            "previous_cost": 3000,
            "previous_customers": 40
        })
    }

    fn pipeline() -> MetricsPipeline {
        MetricsPipeline::new(ExecutionMode::Parallel).unwrap()
    }

    #[test]
    fn graph_has_two_independent_branches_and_one_join() {
        let p = pipeline();
        assert_eq!(
            p.graph.waves(),
            vec![
                vec![COMPUTE_METRICS],
                vec![GENERATE_ALERTS, GENERATE_RECOMMENDATIONS],
                vec![ASSEMBLE_OUTPUT],
            ]
        );
        assert_eq!(p.graph.sinks(), vec![ASSEMBLE_OUTPUT]);
    }

    #[test]
    fn profit_and_cac() {
        let out = pipeline().invoke(&valid_data()).unwrap();
        assert_eq!(out.metrics.profit, 4000.0);
        assert_eq!(out.metrics.cac, 80.0);
        assert!((out.metrics.revenue_change.unwrap() - 20.0).abs() < 1e-9);
        assert!((out.metrics.cost_change.unwrap() - 14.2857).abs() < 1e-4);
        assert!(out.metrics.cac_change.is_some());
    }

    #[test]
    fn healthy_growth_gets_no_alerts() {
        let out = pipeline().invoke(&valid_data()).unwrap();
        assert!(out.alerts.is_empty());
        assert_eq!(
            out.recommendations,
            [
                "Reinvest profits to grow the business",
                "Increase the scalability of operations",
            ]
        );
    }

    #[test]
    fn negative_profit_alerts_and_recommends_cost_cuts() {
        let out = pipeline().invoke(&negative_profit_data()).unwrap();

        assert!(out
            .alerts
            .iter()
            .any(|a| a.kind == AlertKind::Warning && a.message.contains("negative profit")));
        assert_eq!(out.recommendations[0], "Reduce operating costs");

        // CAC went from 75 to 120.
        assert_eq!(
            out.alerts[1].message,
            "Customer acquisition costs have increased by 60.00%"
        );
        assert_eq!(
            out.recommendations,
            [
                "Reduce operating costs",
                "Increase the scalability of operations",
                "Optimize marketing channels",
            ]
        );
    }

    #[test]
    fn output_has_exactly_the_three_sections() {
        let out = serde_json::to_value(pipeline().invoke(&valid_data()).unwrap()).unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(out["recommendations"].is_array());
        assert!(out["alerts"].is_array());
        assert!(out["metrics"].is_object());
    }

    #[test]
    fn missing_history_leaves_change_metrics_absent() {
        let out = pipeline()
            .invoke(&json!({"revenue": 100, "cost": 40, "customers": 4}))
            .unwrap();
        let metrics = serde_json::to_value(out.metrics).unwrap();
        assert_eq!(metrics, json!({"profit": 60.0, "cac": 10.0}));
    }

    #[test]
    fn zero_customers_is_not_a_fault() {
        let out = pipeline()
            .invoke(&json!({"revenue": 100, "cost": 40, "customers": 0}))
            .unwrap();
        assert_eq!(out.metrics.cac, 0.0);
    }

    #[test]
    fn zero_previous_customers_is_not_a_fault() {
        let out = pipeline()
            .invoke(&json!({
                "revenue": 100, "cost": 40, "customers": 4,
                "previous_revenue": 90, "previous_cost": 30, "previous_customers": 0
            }))
            .unwrap();
        assert_eq!(out.metrics.cac_change, None);
        assert!(out.metrics.revenue_change.is_some());
    }

    #[test]
    fn overflowing_base_metrics_fail_instead_of_serializing_null() {
        let p = pipeline();

        let err = p
            .invoke(&json!({"revenue": 1.7e308, "cost": -1.7e308, "customers": 1}))
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::NonFiniteMetric {
                metric: crate::domain::Metric::Profit
            }
        );
        assert!(err.is_precondition());

        let err = p
            .invoke(&json!({"revenue": 1, "cost": 1e308, "customers": 1e-10}))
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::NonFiniteMetric {
                metric: crate::domain::Metric::Cac
            }
        );
    }

    #[test]
    fn missing_required_field_aborts() {
        let err = pipeline()
            .invoke(&json!({"revenue": 100, "cost": 40}))
            .unwrap_err();
        assert_eq!(err, PipelineError::MissingField { field: "customers" });
    }

    #[test]
    fn repeated_invocations_are_byte_identical() {
        let p = pipeline();
        let a = serde_json::to_string(&p.invoke(&negative_profit_data()).unwrap()).unwrap();
        let b = serde_json::to_string(&p.invoke(&negative_profit_data()).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn execution_mode_does_not_change_output() {
        let par = MetricsPipeline::new(ExecutionMode::Parallel).unwrap();
        let seq = MetricsPipeline::new(ExecutionMode::Sequential).unwrap();
        for data in [valid_data(), negative_profit_data()] {
            let a = serde_json::to_string(&par.invoke(&data).unwrap()).unwrap();
            let b = serde_json::to_string(&seq.invoke(&data).unwrap()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn stages_refuse_to_run_out_of_order() {
        let state = PipelineState::new(BusinessRecord::new(1.0, 1.0, 1.0));
        let err = assemble_output_stage(&state).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingStageInput {
                task: ASSEMBLE_OUTPUT,
                input: "metrics"
            }
        );
    }

    #[test]
    fn pipeline_is_shareable_across_threads() {
        let p = std::sync::Arc::new(pipeline());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let p = p.clone();
                std::thread::spawn(move || {
                    let data = json!({"revenue": 100 + i, "cost": 50, "customers": 5});
                    p.invoke(&data).unwrap().metrics.profit
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            assert_eq!(h.join().unwrap(), 50.0 + i as f64);
        }
    }
}
