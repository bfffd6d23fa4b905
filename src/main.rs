use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use clinic_billing::billing::{
    billing_router, BillingService, MemoryStore, OrganizationId, ScheduleWindows,
    TracingAuditSink,
};
use clinic_billing::config::AppConfig;
use clinic_billing::error::AppError;
use clinic_billing::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct OpsState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "clinic-billing",
    about = "Billing rate resolution and monthly contract settlement for clinic operations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Normalize a spreadsheet export of assignment rows and print the tally
    Import(ImportArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// CSV export of assignment rows
    #[arg(long)]
    csv: PathBuf,
    /// Tenant the imported assignments belong to
    #[arg(long)]
    organization: String,
    /// Morning window as START-END hours (default 8-13)
    #[arg(long, value_parser = parse_window)]
    morning: Option<(u8, u8)>,
    /// Afternoon window as START-END hours (default 13-20)
    #[arg(long, value_parser = parse_window)]
    afternoon: Option<(u8, u8)>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Import(args) => run_import(args),
    }
}

fn parse_window(raw: &str) -> Result<(u8, u8), String> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected START-END hours, got '{raw}'"))?;
    let start: u8 = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid start hour in '{raw}'"))?;
    let end: u8 = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid end hour in '{raw}'"))?;
    if start >= end || end > 24 {
        return Err(format!("window '{raw}' must satisfy start < end <= 24"));
    }
    Ok((start, end))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(TracingAuditSink);
    let service = Arc::new(BillingService::new(store, audit, ScheduleWindows::default()));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let ops_state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(ops_state)
        .merge(billing_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "billing service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let mut windows = ScheduleWindows::default();
    if let Some(morning) = args.morning {
        windows.morning = morning;
    }
    if let Some(afternoon) = args.afternoon {
        windows.afternoon = afternoon;
    }

    let organization_id = OrganizationId(args.organization);
    let store = Arc::new(MemoryStore::new());
    let audit = Arc::new(TracingAuditSink);
    let service = BillingService::new(store, audit, windows);

    let file = std::fs::File::open(&args.csv)?;
    let outcome = service.import_assignments(file, &organization_id, "import-cli")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&outcome).unwrap_or_else(|_| "{}".to_string())
    );

    if outcome.failed > 0 {
        eprintln!(
            "{} of {} rows failed; see errors above",
            outcome.failed,
            outcome.failed + outcome.succeeded
        );
    }

    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
