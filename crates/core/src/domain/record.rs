use crate::error::{PipelineError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// One period of business figures, plus optional figures for the prior period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BusinessRecord {
    pub revenue: f64,
    pub cost: f64,
    pub customers: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_customers: Option<f64>,
}

impl BusinessRecord {
    pub fn new(revenue: f64, cost: f64, customers: f64) -> Self {
        Self {
            revenue,
            cost,
            customers,
            previous_revenue: None,
            previous_cost: None,
            previous_customers: None,
        }
    }

    pub fn with_previous(mut self, revenue: f64, cost: f64, customers: f64) -> Self {
        self.previous_revenue = Some(revenue);
        self.previous_cost = Some(cost);
        self.previous_customers = Some(customers);
        self
    }

    /// Parses a loosely-typed JSON object. Unknown keys are ignored and
    /// `null` counts as absent.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            PipelineError::InvalidInput(format!("expected a JSON object, got {}", type_name(value)))
        })?;

        Ok(Self {
            revenue: required(obj, "revenue")?,
            cost: required(obj, "cost")?,
            customers: required(obj, "customers")?,
            previous_revenue: optional(obj, "previous_revenue")?,
            previous_cost: optional(obj, "previous_cost")?,
            previous_customers: optional(obj, "previous_customers")?,
        })
    }
}

fn required(obj: &Map<String, Value>, field: &'static str) -> Result<f64> {
    optional(obj, field)?.ok_or(PipelineError::MissingField { field })
}

fn optional(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(PipelineError::InvalidField {
                field,
                reason: format!("{n} is not a finite number"),
            }),
        },
        Some(other) => Err(PipelineError::InvalidField {
            field,
            reason: format!("expected a number, got {}", type_name(other)),
        }),
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
