use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use service::auth::{SecretKey, UserKey, ROLE_ADMIN};
use service::bootstrap;
use service::storage::JsonFileSnapshot;

/// Write an initial snapshot holding one administrator.
#[derive(Debug, Parser)]
#[command(name = "authsv-setup", version)]
struct Args {
    /// Initial administrator
    #[arg(short, long, default_value = "admin")]
    name: String,
    /// Secret for the administrator
    #[arg(short, long, default_value = "password")]
    secret: String,
    /// Whitespace separated roles for the administrator
    #[arg(short, long, default_value = ROLE_ADMIN)]
    roles: String,
    /// Output snapshot file
    #[arg(short, long)]
    file: PathBuf,
    /// Octal permission bits of the written file
    #[arg(long, default_value = "600", value_parser = configs::parse_file_mode)]
    mode: u32,
}

async fn write(args: Args) -> anyhow::Result<()> {
    let roles = bootstrap::parse_roles(&args.roles);
    let table = bootstrap::initial_table(UserKey::from(args.name), SecretKey::from(args.secret), roles)?;
    let codec = JsonFileSnapshot::with_mode(args.mode);
    bootstrap::write_snapshot(&codec, &table, &args.file).await?;
    info!(service = "setup", event = "snapshot_written", path = %args.file.display(), "initial snapshot written");
    Ok(())
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_default();
    let args = Args::parse();

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "setup", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::from(2);
        }
    };

    match rt.block_on(write(args)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(service = "setup", event = "setup_failed", error = %e, "cannot write initial snapshot");
            ExitCode::from(2)
        }
    }
}
