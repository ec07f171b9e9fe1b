pub mod domain;
pub mod envelope;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod rules;

pub use envelope::Envelope;
pub use error::PipelineError;
pub use pipeline::MetricsPipeline;

pub mod config {
    use crate::graph::ExecutionMode;
    use anyhow::Context;

    const DEFAULT_PORT: u16 = 8000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub sentry_dsn: Option<String>,
        pub execution_mode: ExecutionMode,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let port = match lookup("PORT").filter(|s| !s.trim().is_empty()) {
                Some(s) => s
                    .trim()
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a port number (got {s:?})"))?,
                None => DEFAULT_PORT,
            };

            let execution_mode = match lookup("PIPELINE_EXECUTION").filter(|s| !s.trim().is_empty()) {
                Some(s) => s.parse::<ExecutionMode>().context("invalid PIPELINE_EXECUTION")?,
                None => ExecutionMode::default(),
            };

            Ok(Self {
                port,
                sentry_dsn: lookup("SENTRY_DSN").filter(|s| !s.trim().is_empty()),
                execution_mode,
            })
        }
    }

}
