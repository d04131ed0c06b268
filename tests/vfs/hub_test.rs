/*!
 * Change Hub Tests
 * Unified change stream: tagging, ordering and unsubscription
 */

use futures::StreamExt;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};

use vfs_host::vfs::{
    Authority, ChangeBatch, FileChange, FileChangeType, FileSystemHost,
    FileSystemProvider, HostConfig, MemFS, Observable, ObservableProvider, ResourceId,
    SubscriptionState,
};

use super::support::runtime;

fn id(raw: &str) -> ResourceId {
    ResourceId::parse(raw).unwrap()
}

async fn expect_silence(rx: &mut broadcast::Receiver<ChangeBatch>) {
    let next = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(next.is_err(), "unexpected batch: {next:?}");
}

/// Change source the test can emit on and close
struct Source(Mutex<Option<broadcast::Sender<Vec<FileChange>>>>);

impl Source {
    fn emit(&self, changes: Vec<FileChange>) {
        if let Some(sender) = self.0.lock().unwrap().as_ref() {
            let _ = sender.send(changes);
        }
    }

    fn subscriber_count(&self) -> usize {
        self.0
            .lock()
            .unwrap()
            .as_ref()
            .map_or(0, |sender| sender.receiver_count())
    }

    fn close(&self) {
        self.0.lock().unwrap().take();
    }
}

impl Observable for Source {
    fn subscribe(&self) -> broadcast::Receiver<Vec<FileChange>> {
        match self.0.lock().unwrap().as_ref() {
            Some(sender) => sender.subscribe(),
            None => broadcast::channel(1).1,
        }
    }
}

/// Provider exposing a change source the test drives directly
struct Scripted {
    inner: MemFS,
    events: Source,
}

impl Scripted {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemFS::new(),
            events: Source(Mutex::new(Some(broadcast::channel(256).0))),
        })
    }
}

#[async_trait::async_trait]
impl FileSystemProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn observable(&self) -> Option<&dyn Observable> {
        Some(&self.events)
    }

    async fn stat(&self, r: &ResourceId) -> vfs_host::vfs::FsResult<vfs_host::vfs::FileStat> {
        self.inner.stat(r).await
    }

    async fn read(
        &self,
        r: &ResourceId,
        p: &dyn vfs_host::vfs::ProgressSink,
        c: &tokio_util::sync::CancellationToken,
    ) -> vfs_host::vfs::FsResult<()> {
        self.inner.read(r, p, c).await
    }

    async fn write(&self, r: &ResourceId, b: bytes::Bytes) -> vfs_host::vfs::FsResult<()> {
        self.inner.write(r, b).await
    }

    async fn unlink(&self, r: &ResourceId) -> vfs_host::vfs::FsResult<()> {
        self.inner.unlink(r).await
    }

    async fn rename(&self, r: &ResourceId, t: &ResourceId) -> vfs_host::vfs::FsResult<()> {
        self.inner.rename(r, t).await
    }

    async fn mkdir(&self, r: &ResourceId) -> vfs_host::vfs::FsResult<()> {
        self.inner.mkdir(r).await
    }

    async fn readdir(&self, r: &ResourceId) -> vfs_host::vfs::FsResult<Vec<vfs_host::vfs::FileStat>> {
        self.inner.readdir(r).await
    }

    async fn rmdir(&self, r: &ResourceId) -> vfs_host::vfs::FsResult<()> {
        self.inner.rmdir(r).await
    }

    async fn utimes(
        &self,
        r: &ResourceId,
        m: std::time::SystemTime,
    ) -> vfs_host::vfs::FsResult<vfs_host::vfs::FileStat> {
        self.inner.utimes(r, m).await
    }
}

#[tokio::test]
async fn test_router_mutations_arrive_tagged() {
    let host = FileSystemHost::default();
    let mut rx = host.subscribe();
    let _d = host
        .register_file_system_provider("mem", Arc::new(host.observable_memfs()))
        .unwrap();

    let router = host.router();
    router.mkdir("mem:/d").await.unwrap();
    router.write("mem:/d/f", "1").await.unwrap();
    router.write("mem:/d/f", "2").await.unwrap();
    router.rename("mem:/d/f", "mem:/d/g").await.unwrap();
    router.unlink("mem:/d/g").await.unwrap();

    let mut kinds = Vec::new();
    for _ in 0..5 {
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.authority.as_str(), "mem");
        kinds.push(
            batch
                .changes
                .iter()
                .map(|c| (c.change_type, c.resource.to_string()))
                .collect::<Vec<_>>(),
        );
    }
    assert_eq!(
        kinds,
        vec![
            vec![(FileChangeType::Added, "mem:/d".to_string())],
            vec![(FileChangeType::Added, "mem:/d/f".to_string())],
            vec![(FileChangeType::Updated, "mem:/d/f".to_string())],
            vec![
                (FileChangeType::Deleted, "mem:/d/f".to_string()),
                (FileChangeType::Added, "mem:/d/g".to_string()),
            ],
            vec![(FileChangeType::Deleted, "mem:/d/g".to_string())],
        ]
    );
}

#[tokio::test]
async fn test_failed_mutation_publishes_nothing() {
    let host = FileSystemHost::default();
    let mut rx = host.subscribe();
    let _d = host
        .register_file_system_provider("mem", Arc::new(host.observable_memfs()))
        .unwrap();

    assert!(host.router().rmdir("mem:/missing").await.is_err());
    expect_silence(&mut rx).await;
}

#[tokio::test]
async fn test_dispose_stops_forwarding() {
    let host = FileSystemHost::default();
    let provider = Scripted::new();
    let mut rx = host.subscribe();
    let registration = host
        .register_file_system_provider("s", provider.clone())
        .unwrap();

    provider.events.emit(vec![FileChange::added(id("s:/a"))]);
    assert_eq!(rx.recv().await.unwrap().changes.len(), 1);

    registration.dispose();
    assert_eq!(
        host.registry().subscription_state(&Authority::new("s").unwrap()),
        SubscriptionState::Unsubscribed
    );
    provider.events.emit(vec![FileChange::added(id("s:/b"))]);
    expect_silence(&mut rx).await;
}

#[tokio::test]
async fn test_rejected_duplicate_never_publishes() {
    let host = FileSystemHost::default();
    let _first = host
        .register_file_system_provider("s", Arc::new(MemFS::new()))
        .unwrap();
    let mut rx = host.subscribe();

    let rejected = Scripted::new();
    assert!(host
        .register_file_system_provider("s", rejected.clone())
        .is_err());
    rejected.events.emit(vec![FileChange::updated(id("s:/x"))]);

    expect_silence(&mut rx).await;
    assert_eq!(rejected.events.subscriber_count(), 0);
}

#[tokio::test]
async fn test_closed_provider_stream_is_terminal() {
    let host = FileSystemHost::default();
    let mut rx = host.subscribe();
    let provider = Scripted::new();
    let _d = host
        .register_file_system_provider("s", provider.clone())
        .unwrap();
    let authority = Authority::new("s").unwrap();
    assert_eq!(
        host.registry().subscription_state(&authority),
        SubscriptionState::Subscribed
    );

    provider.events.close();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    while host.registry().subscription_state(&authority) != SubscriptionState::Unsubscribed {
        assert!(tokio::time::Instant::now() < deadline, "never unsubscribed");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Still routable, just silent
    host.router().mkdir("s:/d").await.unwrap();
    expect_silence(&mut rx).await;
}

#[tokio::test]
async fn test_lagging_subscriber_is_told_how_many_were_skipped() {
    let host = FileSystemHost::new(HostConfig {
        event_capacity: 2,
        ..HostConfig::default()
    });
    let provider = Scripted::new();
    let mut rx = host.subscribe();
    let _d = host
        .register_file_system_provider("s", provider.clone())
        .unwrap();

    for n in 0..5 {
        provider
            .events
            .emit(vec![FileChange::updated(id(&format!("s:/{n}")))]);
    }
    // Let the forwarder drain the provider stream
    tokio::time::sleep(Duration::from_millis(50)).await;
    match rx.recv().await {
        Err(RecvError::Lagged(skipped)) => assert_eq!(skipped, 3),
        other => panic!("expected lag, got {other:?}"),
    }
    let next = rx.recv().await.unwrap();
    assert_eq!(next.changes[0].resource, id("s:/3"));
}

#[tokio::test]
async fn test_stream_adapter_yields_batches() {
    let host = FileSystemHost::default();
    let mut stream = host.stream();
    let _d = host
        .register_file_system_provider("mem", Arc::new(ObservableProvider::new(MemFS::new())))
        .unwrap();

    host.router().mkdir("mem:/x").await.unwrap();
    let batch = stream.next().await.unwrap().unwrap();
    assert_eq!(&batch.changes[..], &[FileChange::added(id("mem:/x"))]);
}

#[tokio::test]
async fn test_on_did_change_until_disposed() {
    let host = FileSystemHost::default();
    let provider = Scripted::new();
    let _d = host
        .register_file_system_provider("s", provider.clone())
        .unwrap();

    let (tx, mut seen) = tokio::sync::mpsc::unbounded_channel();
    let listener = host
        .on_did_change(move |batch| {
            let _ = tx.send(batch.changes[0].resource.to_string());
        })
        .unwrap();

    provider.events.emit(vec![FileChange::deleted(id("s:/gone"))]);
    assert_eq!(seen.recv().await.unwrap(), "s:/gone");

    listener.dispose();
    assert!(seen.recv().await.is_none());
}

proptest! {
    #[test]
    fn prop_per_provider_order_preserved(
        plan in prop::collection::vec((any::<bool>(), 1usize..4), 1..40)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let host = FileSystemHost::default();
            let mut rx = host.subscribe();
            let a = Scripted::new();
            let b = Scripted::new();
            let _da = host.register_file_system_provider("a", a.clone()).unwrap();
            let _db = host.register_file_system_provider("b", b.clone()).unwrap();

            let mut expected_a = Vec::new();
            let mut expected_b = Vec::new();
            for (seq, (to_a, size)) in plan.iter().enumerate() {
                let (source, authority, expected) = if *to_a {
                    (&a, "a", &mut expected_a)
                } else {
                    (&b, "b", &mut expected_b)
                };
                let batch: Vec<FileChange> = (0..*size)
                    .map(|i| FileChange::updated(id(&format!("{authority}:/{seq}/{i}"))))
                    .collect();
                expected.push(batch.clone());
                source.events.emit(batch);
            }

            let mut got_a = Vec::new();
            let mut got_b = Vec::new();
            for _ in 0..plan.len() {
                let batch = match rx.recv().await {
                    Ok(batch) => batch,
                    Err(RecvError::Lagged(n)) => panic!("lagged by {n}"),
                    Err(RecvError::Closed) => panic!("hub closed"),
                };
                match batch.authority.as_str() {
                    "a" => got_a.push(batch.changes.to_vec()),
                    _ => got_b.push(batch.changes.to_vec()),
                }
            }

            prop_assert_eq!(got_a, expected_a);
            prop_assert_eq!(got_b, expected_b);
            Ok(())
        })?;
    }
}
