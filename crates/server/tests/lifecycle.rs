use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use service::auth::{CredentialStore, CredentialTable, RoleKey, UserRecord};
use service::storage::{JsonFileSnapshot, SnapshotCodec};

fn temp_snapshot(prefix: &str) -> PathBuf {
    std::env::temp_dir().join(format!("{}_{}.json", prefix, uuid::Uuid::new_v4()))
}

async fn seeded(path: &PathBuf) -> anyhow::Result<(Arc<CredentialStore>, Arc<dyn SnapshotCodec>)> {
    let codec: Arc<dyn SnapshotCodec> = Arc::new(JsonFileSnapshot::new());
    let table: CredentialTable =
        [("alice".into(), UserRecord::new("s1".into(), vec![RoleKey::admin()]))].into_iter().collect();
    codec.store(&table, path).await?;

    let store = Arc::new(CredentialStore::new());
    store.load_snapshot(codec.as_ref(), path).await?;
    Ok((store, codec))
}

#[tokio::test]
async fn shutdown_stores_final_snapshot() -> anyhow::Result<()> {
    let path = temp_snapshot("lifecycle_shutdown");
    let (store, codec) = seeded(&path).await?;

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, Arc::clone(&store), Arc::clone(&codec), None, async {
        let _ = rx.await;
    }));

    store.add_user("bob".into(), "b1".into(), vec!["ops".into()])?;
    let _ = tx.send(());
    server.await??;

    let reloaded = codec.load(&path).await?;
    assert_eq!(reloaded, store.dump());
    assert!(reloaded.contains(&"bob".into()));

    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}

#[tokio::test]
async fn periodic_snapshots_run_while_serving() -> anyhow::Result<()> {
    let path = temp_snapshot("lifecycle_periodic");
    let (store, codec) = seeded(&path).await?;

    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let (tx, rx) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(
        listener,
        Arc::clone(&store),
        Arc::clone(&codec),
        Some(Duration::from_millis(20)),
        async {
            let _ = rx.await;
        },
    ));

    store.add_user("carol".into(), "c1".into(), vec![])?;

    let mut seen = false;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if codec.load(&path).await?.contains(&"carol".into()) {
            seen = true;
            break;
        }
    }
    assert!(seen, "periodic snapshot never picked up the new user");

    let _ = tx.send(());
    server.await??;
    let _ = tokio::fs::remove_file(&path).await;
    Ok(())
}
