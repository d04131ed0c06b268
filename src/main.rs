/*!
 * VFS Host - Main Entry Point
 *
 * Small demonstration host that:
 * - Registers an in-memory provider under the `mem` authority
 * - Routes a handful of operations through it
 * - Logs the change batches the provider reports
 */

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vfs_host::{init_tracing, FileSystemHost, HostConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured tracing
    init_tracing();

    info!("VFS host starting...");
    let host = FileSystemHost::new(HostConfig::from_env());

    let changes = host
        .on_did_change(|batch| {
            for change in batch.changes.iter() {
                info!(
                    authority = %batch.authority,
                    kind = ?change.change_type,
                    resource = %change.resource,
                    "change"
                );
            }
        })
        .context("subscribing to file changes")?;

    let registration = host
        .register_file_system_provider("mem", Arc::new(host.observable_memfs()))
        .context("registering the in-memory provider")?;

    let router = host.router();
    router.mkdir("mem:/notes").await?;
    router
        .write("mem:/notes/hello.txt", "hello from the vfs host")
        .await?;
    router
        .rename("mem:/notes/hello.txt", "mem:/notes/greeting.txt")
        .await?;

    let content = router
        .read_to_end("mem:/notes/greeting.txt", &CancellationToken::new())
        .await?;
    info!(bytes = content.len(), "read back greeting");

    for stat in router.readdir("mem:/notes").await? {
        info!(resource = %stat.resource, size = stat.size, kind = %stat.file_type, "entry");
    }

    if let Err(e) = router.rename("mem:/notes", "disk:/notes").await {
        warn!(error = %e, "cross-authority move rejected as expected");
    }

    // Let the listener drain before shutting down
    tokio::task::yield_now().await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    registration.dispose();
    changes.dispose();
    let released = host.teardown();
    info!(released, "VFS host stopped");
    Ok(())
}
