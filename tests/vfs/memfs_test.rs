/*!
 * MemFS Tests
 * In-memory provider behavior through the provider trait
 */

use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use vfs_host::vfs::{BufferSink, FileSystemProvider, FileType, FsError, MemFS, ResourceId};

fn id(raw: &str) -> ResourceId {
    ResourceId::parse(raw).unwrap()
}

#[tokio::test]
async fn test_memfs_basic() {
    let fs = MemFS::new();

    fs.write(&id("mem:/test.txt"), Bytes::from_static(b"hello"))
        .await
        .unwrap();

    let sink = BufferSink::new();
    fs.read(&id("mem:/test.txt"), &sink, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(&sink.take()[..], b"hello");

    let stat = fs.stat(&id("mem:/test.txt")).await.unwrap();
    assert_eq!(stat.file_type, FileType::File);
    assert_eq!(stat.size, 5);

    fs.unlink(&id("mem:/test.txt")).await.unwrap();
    assert!(matches!(
        fs.stat(&id("mem:/test.txt")).await,
        Err(FsError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_memfs_directories() {
    let fs = MemFS::new();

    fs.mkdir(&id("mem:/testdir")).await.unwrap();
    fs.mkdir(&id("mem:/testdir/nested")).await.unwrap();
    fs.write(&id("mem:/testdir/file.txt"), Bytes::from_static(b"content"))
        .await
        .unwrap();

    let entries = fs.readdir(&id("mem:/testdir")).await.unwrap();
    let listed: Vec<(String, FileType)> = entries
        .iter()
        .map(|e| (e.resource.to_string(), e.file_type))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("mem:/testdir/file.txt".to_string(), FileType::File),
            ("mem:/testdir/nested".to_string(), FileType::Directory),
        ]
    );
}

#[tokio::test]
async fn test_capacity_limit() {
    let fs = MemFS::with_capacity(100);

    fs.write(&id("mem:/small.txt"), Bytes::from(vec![0u8; 50]))
        .await
        .unwrap();

    let result = fs.write(&id("mem:/large.txt"), Bytes::from(vec![0u8; 60])).await;
    assert_eq!(result, Err(FsError::OutOfSpace));
    assert!(fs.stat(&id("mem:/large.txt")).await.is_err());
}

#[tokio::test]
async fn test_rename_moves_directory_contents() {
    let fs = MemFS::new();
    fs.mkdir(&id("mem:/a")).await.unwrap();
    fs.write(&id("mem:/a/f"), Bytes::from_static(b"x")).await.unwrap();

    fs.rename(&id("mem:/a"), &id("mem:/b")).await.unwrap();
    assert!(fs.stat(&id("mem:/b/f")).await.is_ok());
    assert!(fs.stat(&id("mem:/a")).await.is_err());
}

#[tokio::test]
async fn test_concurrent_writes_to_distinct_files() {
    let fs = Arc::new(MemFS::new());
    let handles: Vec<_> = (0..32)
        .map(|n| {
            let fs = fs.clone();
            tokio::spawn(async move {
                fs.write(&id(&format!("mem:/f{n}")), Bytes::from(vec![n as u8; 4]))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(fs.readdir(&id("mem:/")).await.unwrap().len(), 32);
    assert_eq!(fs.used_bytes(), 32 * 4);
}

#[test]
fn test_memfs_has_no_declared_root_or_change_source() {
    let fs = MemFS::new();
    assert_eq!(fs.name(), "memfs");
    assert!(fs.root().is_none());
    assert!(fs.observable().is_none());
}
