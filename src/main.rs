use anyhow::{Context, Result};
use ragtagger::{store, PipelineConfig, PipelineController, RunRequest};
use std::{env, process::ExitCode};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("").add_directive(log_level.parse().unwrap_or(Level::INFO.into()))
    });
    fmt()
        .with_env_filter(filter)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<bool> {
    // ─── 1) config + per-invocation overrides ────────────────────────
    let base = PipelineConfig::from_env().context("loading pipeline config")?;
    let request = env::args()
        .nth(1)
        .map(|body| RunRequest::parse_lenient(&body))
        .unwrap_or_default();
    let config = base.with_request(&request);
    info!(
        catalogue = %config.catalogue,
        records = %config.records,
        output = %config.output,
        "configured"
    );

    // ─── 2) open blob store ──────────────────────────────────────────
    let store = store::open(&config.store).context("opening blob store")?;

    // ─── 3) run + report ─────────────────────────────────────────────
    let summary = PipelineController::new(config, store).run();
    println!("{}", summary.to_json());
    Ok(summary.is_success())
}

fn main() -> ExitCode {
    init_logging();
    info!("startup");

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
