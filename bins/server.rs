use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use configs::AppConfig;

/// Credential and role server.
#[derive(Debug, Parser)]
#[command(name = "authsv-server", version)]
struct Args {
    /// TOML config file; defaults to `$CONFIG_PATH` or `config.toml`
    #[arg(short, long)]
    config: Option<String>,
    /// Snapshot file to load at startup and store at shutdown
    #[arg(short = 'd', long)]
    data_file: Option<PathBuf>,
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    /// Emit JSON structured logs
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    // load .env first so RUST_LOG and friends reach the filter
    dotenv().ok();
    common::utils::logging::init_logging(json);
    info!(service = "server", event = "logger_init", "tracing subscriber initialized");
}

// file, then env, then flags; validated once at the end
fn load_config(args: &Args) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::load(args.config.as_deref())?;
    if let Some(file) = &args.data_file {
        cfg.store.data_file = file.clone();
    }
    if let Some(host) = &args.host {
        cfg.server.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_json);

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "server",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "server", event = "config_invalid", error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };

    // worker_threads is always Some after normalization
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = cfg.server.worker_threads { builder.worker_threads(w); }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "server", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "server",
        event = "start",
        %service_id,
        pid,
        version,
        data_file = %cfg.store.data_file.display(),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        "server service starting"
    );

    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(service = "server", event = "stop", %service_id, pid, "server stopped normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "server", event = "run_failed", %service_id, pid, error = %e, "server::run returned error");
            ExitCode::from(e.exit_code())
        }
    }
}
