use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use shuttle_core::app::{WorkerBuilder, WorkerExit, run_supervised};
use shuttle_core::config::{LocatorConfig, SettleDelay, WorkerConfig};
use shuttle_core::impls::{LineSink, LineSource};

/// Run one task module as a worker process.
///
/// Reads newline-delimited JSON from stdin and writes to stdout; diagnostics
/// go to stderr.
#[derive(Debug, Parser)]
#[command(name = "shuttle-worker", version, about)]
struct Args {
    /// Module to run (text-transform, request, browser-extract).
    #[arg(long, env = "SHUTTLE_MODULE")]
    module: String,

    /// Default wait for one step of the locator cascade.
    #[arg(long, default_value_t = 5000)]
    element_wait_ms: u64,

    #[arg(long, default_value_t = 100)]
    poll_interval_ms: u64,

    /// Lower bound of the randomized pause after a successful read.
    #[arg(long, default_value_t = 250)]
    settle_min_ms: u64,

    #[arg(long, default_value_t = 750)]
    settle_max_ms: u64,

    /// Exit right after sending the result.
    #[arg(long)]
    exit_after_result: bool,

    /// Only resolve `${name}` placeholders, not `{{name}}`.
    #[arg(long)]
    dollar_only: bool,

    /// tracing filter directives.
    #[arg(long, env = "SHUTTLE_LOG", default_value = "info")]
    log_filter: String,
}

impl Args {
    fn worker_config(&self) -> WorkerConfig {
        let mut config = WorkerConfig::new(self.module.clone());
        config.locator = LocatorConfig {
            element_wait: Duration::from_millis(self.element_wait_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            settle: SettleDelay::new(
                Duration::from_millis(self.settle_min_ms),
                Duration::from_millis(self.settle_max_ms),
            ),
        };
        config.exit_after_result = self.exit_after_result;
        config.brace_placeholders = !self.dollar_only;
        config
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_filter);

    let exit = match WorkerBuilder::new(args.worker_config()).build() {
        Ok(worker) => {
            tracing::info!(module = worker.module_name(), run_id = %worker.run_id(), "worker starting");
            run_supervised(worker, LineSource::stdin(), Arc::new(LineSink::stdout())).await
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to start worker");
            WorkerExit::Fault
        }
    };

    std::process::exit(exit.code());
}
