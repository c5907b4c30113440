mod common;

use bytes::Bytes;
use futures::TryStreamExt;
use oss_storage::{ErrorKind, FileStore, LocalBackend, StorageError};
use rstest::rstest;
use tempfile::TempDir;

async fn store() -> (TempDir, LocalBackend) {
    let dir = tempfile::tempdir().unwrap();
    let backend = LocalBackend::new(dir.path().join("store")).await.unwrap();
    (dir, backend)
}

#[tokio::test]
async fn test_hello_world() {
    let (_dir, store) = store().await;
    common::hello_world(&store).await;
}

#[tokio::test]
async fn test_overwrite_replaces_content() {
    let (_dir, store) = store().await;
    common::overwrite_replaces_content(&store).await;
}

#[tokio::test]
async fn test_existence_follows_lifecycle() {
    let (_dir, store) = store().await;
    common::existence_follows_lifecycle(&store).await;
}

#[tokio::test]
async fn test_delete_missing_key_is_ok() {
    let (_dir, store) = store().await;
    common::delete_missing_key_is_ok(&store).await;
}

#[tokio::test]
async fn test_missing_key_is_not_found() {
    let (_dir, store) = store().await;
    common::missing_key_is_not_found(&store).await;
}

#[tokio::test]
async fn test_listing_reflects_state() {
    let (_dir, store) = store().await;
    common::listing_reflects_state(&store).await;
}

#[tokio::test]
async fn test_early_drop_releases_listing() {
    let (_dir, store) = store().await;
    common::early_drop_releases_listing(&store).await;
}

#[tokio::test]
async fn test_upload_from_file() {
    let (_dir, store) = store().await;
    common::upload_from_file(&store).await;
}

#[tokio::test]
async fn test_upload_reader_leaves_reader_usable() {
    let (_dir, store) = store().await;
    common::upload_reader_leaves_reader_usable(&store).await;
}

#[tokio::test]
async fn test_download_to_sink() {
    let (_dir, store) = store().await;
    common::download_to_sink(&store).await;
}

#[tokio::test]
async fn test_empty_key_is_rejected() {
    let (_dir, store) = store().await;
    common::empty_key_is_rejected(&store).await;
}

#[tokio::test]
async fn test_key_below_a_blob_is_absent() {
    let (_dir, store) = store().await;
    common::key_below_a_blob_is_absent(&store).await;
}

#[tokio::test]
async fn test_download_url_is_unsupported() {
    let (_dir, store) = store().await;
    store
        .upload_bytes("txt/test.txt", Bytes::from_static(b"Hello World"))
        .await
        .unwrap();

    let err = store.generate_download_url("txt/test.txt", 60).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let err = store.generate_default_download_url("txt/test.txt").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[tokio::test]
async fn test_blobs_are_plain_files_under_root() {
    let (dir, store) = store().await;
    store
        .upload_bytes("a/b/c.txt", Bytes::from_static(b"abc"))
        .await
        .unwrap();

    let on_disk = std::fs::read(dir.path().join("store/a/b/c.txt")).unwrap();
    assert_eq!(on_disk, b"abc");
}

#[tokio::test]
async fn test_files_written_outside_the_store_are_listed() {
    let (dir, store) = store().await;
    std::fs::create_dir_all(dir.path().join("store/imported")).unwrap();
    std::fs::write(dir.path().join("store/imported/one.txt"), b"1").unwrap();

    let keys: Vec<String> = store.list(Some("imported")).try_collect().await.unwrap();
    assert_eq!(keys, vec!["imported/one.txt"]);
    assert_eq!(&store.download_bytes("imported/one.txt").await.unwrap()[..], b"1");
}

#[tokio::test]
async fn test_prefix_is_a_path_segment() {
    let (_dir, store) = store().await;
    store
        .upload_bytes("txt/test.txt", Bytes::from_static(b"x"))
        .await
        .unwrap();

    assert_eq!(common::keys(&store, Some("txt")).await, vec!["txt/test.txt"]);
    assert_eq!(common::keys(&store, Some("txt/")).await, vec!["txt/test.txt"]);
    assert_eq!(common::keys(&store, Some("txt/test.txt")).await, vec!["txt/test.txt"]);
    assert!(common::keys(&store, Some("tx")).await.is_empty());
}

#[rstest]
#[case::parent("../outside.txt")]
#[case::nested_parent("a/../../outside.txt")]
#[case::absolute("/etc/passwd")]
#[tokio::test]
async fn test_keys_cannot_escape_root(#[case] key: &str) {
    let (dir, store) = store().await;

    let err = store
        .upload_bytes(key, Bytes::from_static(b"x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(..)));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(!dir.path().join("outside.txt").exists());

    assert!(store.exists(key).await.is_err());
    assert!(store.delete(key).await.is_err());
}

#[tokio::test]
async fn test_concurrent_listings_are_independent() {
    let (_dir, store) = store().await;
    for key in ["x/1", "x/2", "y/1"] {
        store.upload_bytes(key, Bytes::from_static(b"-")).await.unwrap();
    }

    let (x, y) = tokio::join!(common::keys(&store, Some("x")), common::keys(&store, Some("y")));
    assert_eq!(x, vec!["x/1", "x/2"]);
    assert_eq!(y, vec!["y/1"]);
}
