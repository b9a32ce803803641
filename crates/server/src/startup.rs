use std::{future::Future, sync::Arc, time::Duration};

use tokio::{net::TcpListener, sync::watch};
use tracing::{debug, error, info};

use configs::AppConfig;
use service::{
    auth::CredentialStore,
    storage::{JsonFileSnapshot, SnapshotCodec},
};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

/// Public entry: load the snapshot, serve until a shutdown signal, store the snapshot
pub async fn run(cfg: AppConfig) -> Result<(), StartupError> {
    let codec: Arc<dyn SnapshotCodec> = Arc::new(JsonFileSnapshot::with_mode(cfg.store.file_mode));
    let store = Arc::new(CredentialStore::new());

    let path = &cfg.store.data_file;
    let users = store.load_snapshot(codec.as_ref(), path).await?;
    info!(service = "server", event = "snapshot_loaded", path = %path.display(), users, "credential snapshot loaded");
    common::env::warn_if_world_readable(path).await;

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    info!(%addr, "starting authsv server");

    let interval = cfg.store.snapshot_interval_secs.map(Duration::from_secs);
    serve(listener, store, codec, interval, shutdown_signal()).await
}

/// Serve on `listener` until `shutdown` resolves, then write the final snapshot.
///
/// With `snapshot_interval` set, the snapshot is also stored on that period.
/// The final store runs even when serving failed; its error takes precedence.
pub async fn serve<F>(
    listener: TcpListener,
    store: Arc<CredentialStore>,
    codec: Arc<dyn SnapshotCodec>,
    snapshot_interval: Option<Duration>,
    shutdown: F,
) -> Result<(), StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stop_tx, stop_rx) = watch::channel(false);
    let periodic = snapshot_interval.map(|every| {
        tokio::spawn(periodic_snapshots(Arc::clone(&store), Arc::clone(&codec), every, stop_rx))
    });

    let app = routes::build_router(ServerState::new(Arc::clone(&store)));
    let served = axum::serve(listener, app).with_graceful_shutdown(shutdown).await;

    let _ = stop_tx.send(true);
    if let Some(handle) = periodic {
        if let Err(e) = handle.await {
            error!(service = "server", event = "task_join_error", error = %e, "periodic snapshot task failed");
        }
    }

    store.store_snapshot(codec.as_ref()).await?;
    info!(service = "server", event = "snapshot_stored", users = store.len(), "credential snapshot stored");
    served.map_err(StartupError::Serve)
}

async fn periodic_snapshots(
    store: Arc<CredentialStore>,
    codec: Arc<dyn SnapshotCodec>,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    // first tick fires immediately; the snapshot was just loaded
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => match store.store_snapshot(codec.as_ref()).await {
                Ok(()) => debug!(event = "snapshot_stored", "periodic snapshot stored"),
                Err(e) => error!(service = "server", event = "snapshot_failed", error = %e, "periodic snapshot failed"),
            },
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
        }
    }
}

/// Resolves on SIGINT, SIGTERM or SIGQUIT (Ctrl+C only on other platforms).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let unix_signals = async {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::quit())) {
            (Ok(mut term), Ok(mut quit)) => {
                tokio::select! {
                    _ = term.recv() => {}
                    _ = quit.recv() => {}
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "cannot install unix signal handlers");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let unix_signals = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = unix_signals => {}
    }
    info!(service = "server", event = "shutdown_signal", "shutdown signal received, stopping server");
}
