/*!
 * Operation Router Tests
 * Dispatch, error wrapping and cancellation across providers
 */

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use vfs_host::vfs::{
    BufferSink, ChannelSink, FileSystemHost, FsError, MemFS, Operation, VfsError,
};

use super::support::{runtime, CountingProvider, StallingProvider};

#[tokio::test]
async fn test_mkdir_twice_reports_provider_error() {
    let host = FileSystemHost::default();
    let _d = host
        .register_file_system_provider("mem", Arc::new(MemFS::new()))
        .unwrap();

    host.router().mkdir("mem:/a").await.unwrap();
    let err = host.router().mkdir("mem:/a").await.unwrap_err();
    assert_eq!(
        err,
        VfsError::Provider {
            authority: "mem".into(),
            operation: Operation::Mkdir,
            cause: FsError::AlreadyExists("mem:/a".into()),
        }
    );
}

#[tokio::test]
async fn test_unknown_authority_never_touches_other_providers() {
    let host = FileSystemHost::default();
    let counting = CountingProvider::new();
    let _d = host
        .register_file_system_provider("mem", counting.clone())
        .unwrap();

    let router = host.router();
    assert_eq!(
        router.stat("nope:/x").await.unwrap_err(),
        VfsError::NoProvider("nope".into())
    );
    assert!(router.write("nope:/x", "data").await.is_err());
    assert!(router.readdir("nope:/").await.is_err());
    assert!(router.rename("nope:/a", "mem:/b").await.is_err());
    assert!(router.stat("bad authority:/x").await.is_err());
    assert_eq!(counting.calls(), 0);

    router.stat("mem:/").await.unwrap();
    assert_eq!(counting.calls(), 1);
}

#[tokio::test]
async fn test_routes_by_authority() {
    let host = FileSystemHost::default();
    let left = CountingProvider::new();
    let right = CountingProvider::new();
    let _l = host.register_file_system_provider("left", left.clone()).unwrap();
    let _r = host.register_file_system_provider("right", right.clone()).unwrap();

    host.router().write("left:/f", "l").await.unwrap();
    host.router().write("right:/f", "rr").await.unwrap();
    host.router().write("right:/g", "rrr").await.unwrap();

    assert_eq!(left.calls(), 1);
    assert_eq!(right.calls(), 2);
    assert_eq!(host.router().stat("left:/f").await.unwrap().size, 1);
    assert_eq!(host.router().stat("right:/f").await.unwrap().size, 2);
}

#[tokio::test]
async fn test_read_streams_chunks_in_order() {
    let host = FileSystemHost::default();
    let _d = host
        .register_file_system_provider("mem", Arc::new(MemFS::new().with_chunk_size(3)))
        .unwrap();
    host.router().write("mem:/f", "abcdefgh").await.unwrap();

    let (sink, mut chunks) = ChannelSink::new();
    host.router()
        .read("mem:/f", &sink, &CancellationToken::new())
        .await
        .unwrap();
    drop(sink);

    let mut seen = Vec::new();
    while let Some(chunk) = chunks.recv().await {
        seen.push(chunk);
    }
    assert_eq!(seen, vec!["abc", "def", "gh"]);
}

#[tokio::test]
async fn test_cancel_stops_waiting_on_stalled_provider() {
    let host = FileSystemHost::default();
    let _d = host
        .register_file_system_provider("slow", Arc::new(StallingProvider))
        .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let sink = BufferSink::new();
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        host.router().read("slow:/big", &sink, &cancel),
    )
    .await
    .expect("read must return once cancelled");

    assert_eq!(
        result.unwrap_err(),
        VfsError::Cancelled {
            authority: "slow".into(),
            operation: Operation::Read,
        }
    );
    assert_eq!(&sink.take()[..], b"partial");
    // Cancelling leaves the registration alone
    assert!(host.registry().contains("slow"));
}

#[tokio::test]
async fn test_in_flight_operation_survives_unregister() {
    let host = FileSystemHost::default();
    let registration = host
        .register_file_system_provider("mem", Arc::new(MemFS::new().with_chunk_size(1)))
        .unwrap();
    host.router().write("mem:/f", vec![7u8; 64]).await.unwrap();

    let sink = BufferSink::new();
    let token = CancellationToken::new();
    let read = host.router().read("mem:/f", &sink, &token);
    tokio::pin!(read);

    // Start the read, then unregister while it is in progress
    let poll_once = futures::poll!(read.as_mut());
    assert!(poll_once.is_pending());
    registration.dispose();

    read.await.unwrap();
    assert_eq!(sink.len(), 64);
    assert!(host.router().stat("mem:/f").await.is_err());
}

proptest! {
    #[test]
    fn prop_cross_authority_rename_always_rejected(
        a in "[a-z][a-z0-9]{0,8}",
        b in "[a-z][a-z0-9]{0,8}",
        path in "(/[a-z]{1,6}){1,3}",
    ) {
        prop_assume!(a != b);
        let rt = runtime();
        rt.block_on(async {
            let host = FileSystemHost::default();
            let _a = host.register_file_system_provider(&a, Arc::new(MemFS::new())).unwrap();
            let _b = host.register_file_system_provider(&b, Arc::new(MemFS::new())).unwrap();

            let err = host
                .router()
                .rename(format!("{a}:{path}"), format!("{b}:{path}"))
                .await
                .unwrap_err();
            prop_assert_eq!(
                err,
                VfsError::CrossAuthorityUnsupported { from: a.clone(), to: b.clone() }
            );
            Ok(())
        })?;
    }
}
