use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bizmetrics_core::graph::ExecutionMode;
use bizmetrics_core::{Envelope, MetricsPipeline, PipelineError};
use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "bizmetrics")]
struct Args {
    /// JSON file holding one business record or an array of records. Reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Run the alert and recommendation stages one after another instead of in parallel.
    #[arg(long)]
    sequential: bool,

    /// Pretty-print the JSON written to stdout.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = bizmetrics_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    // stdout carries the results, so logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let mode = if args.sequential {
        ExecutionMode::Sequential
    } else {
        settings.execution_mode
    };

    let raw = read_input(args.input.as_deref()).await?;
    let input: Value = serde_json::from_str(&raw).context("input is not valid JSON")?;

    let pipeline = Arc::new(MetricsPipeline::new(mode)?);
    let (records, is_batch) = match input {
        Value::Array(records) => (records, true),
        single => (vec![single], false),
    };

    let total = records.len();
    let envelopes = run_batch(Arc::clone(&pipeline), records).await;
    let failed = envelopes.iter().filter(|e| !e.is_success()).count();

    println!("{}", render(&envelopes, is_batch, args.pretty)?);
    tracing::info!(total, failed, mode = %pipeline.mode(), "analysis finished");

    if failed > 0 {
        let err = anyhow::anyhow!("{failed} of {total} records could not be analyzed");
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Runs every record on its own blocking task and returns the envelopes in
/// input order. A record whose task dies gets an error envelope of its own.
async fn run_batch(pipeline: Arc<MetricsPipeline>, records: Vec<Value>) -> Vec<Envelope> {
    let handles: Vec<_> = records
        .into_iter()
        .map(|record| {
            let pipeline = Arc::clone(&pipeline);
            tokio::task::spawn_blocking(move || Envelope::from_result(pipeline.invoke(&record)))
        })
        .collect();

    let mut out = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let envelope = settle(index, handle.await);
        if let Envelope::Error { error } = &envelope {
            tracing::warn!(index, kind = error.kind, message = %error.message, "record rejected");
        }
        out.push(envelope);
    }
    out
}

fn settle(index: usize, joined: Result<Envelope, tokio::task::JoinError>) -> Envelope {
    joined.unwrap_or_else(|e| {
        tracing::error!(index, error = %e, "record task did not complete");
        Envelope::from_result(Err(PipelineError::TaskPanicked { task: "record" }))
    })
}

fn render(envelopes: &[Envelope], is_batch: bool, pretty: bool) -> anyhow::Result<String> {
    let value = if is_batch {
        serde_json::to_value(envelopes)?
    } else {
        let first = envelopes.first().context("no result for single record")?;
        serde_json::to_value(first)?
    };

    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

fn init_sentry(settings: &bizmetrics_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
