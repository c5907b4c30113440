//! Behaviour every `FileStore` must share, run against each backend.
#![allow(dead_code)]

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use oss_storage::{FileStore, StorageError};
use std::io::Cursor;
use tokio::io::AsyncReadExt;

pub async fn keys(store: &dyn FileStore, prefix: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = store.list(prefix).try_collect().await.unwrap();
    keys.sort();
    keys
}

pub async fn hello_world(store: &dyn FileStore) {
    store
        .upload_bytes("txt/test.txt", Bytes::from_static(b"Hello World"))
        .await
        .unwrap();

    let content = store.download_bytes("txt/test.txt").await.unwrap();
    assert_eq!(content.len(), 11);
    assert_eq!(&content[..], b"Hello World");

    store.delete("txt/test.txt").await.unwrap();
    assert_eq!(store.list(Some("txt")).count().await, 0);
}

pub async fn overwrite_replaces_content(store: &dyn FileStore) {
    store
        .upload_bytes("docs/readme.md", Bytes::from_static(b"a much longer first version"))
        .await
        .unwrap();
    store
        .upload_bytes("docs/readme.md", Bytes::from_static(b"short"))
        .await
        .unwrap();

    let content = store.download_bytes("docs/readme.md").await.unwrap();
    assert_eq!(&content[..], b"short");
    assert_eq!(keys(store, Some("docs")).await, vec!["docs/readme.md"]);
}

pub async fn existence_follows_lifecycle(store: &dyn FileStore) {
    assert!(!store.exists("life/cycle.bin").await.unwrap());

    store
        .upload_bytes("life/cycle.bin", Bytes::from_static(&[0, 1, 2, 255]))
        .await
        .unwrap();
    assert!(store.exists("life/cycle.bin").await.unwrap());

    store.delete("life/cycle.bin").await.unwrap();
    assert!(!store.exists("life/cycle.bin").await.unwrap());
}

pub async fn delete_missing_key_is_ok(store: &dyn FileStore) {
    store.delete("never/uploaded").await.unwrap();
    store.delete("never/uploaded").await.unwrap();
}

pub async fn missing_key_is_not_found(store: &dyn FileStore) {
    let err = store.download_bytes("missing/key").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {}", err);

    let mut sink = Vec::new();
    let err = store.download_to("missing/key", &mut sink).await.unwrap_err();
    assert!(matches!(err, StorageError::FileNotFound(k) if k == "missing/key"));
    assert!(sink.is_empty());
}

pub async fn listing_reflects_state(store: &dyn FileStore) {
    for key in ["list/a.txt", "list/b.txt", "list/nested/c.txt", "other/d.txt"] {
        store.upload_bytes(key, Bytes::from(key.as_bytes().to_vec())).await.unwrap();
    }

    assert_eq!(
        keys(store, Some("list")).await,
        vec!["list/a.txt", "list/b.txt", "list/nested/c.txt"]
    );
    assert!(keys(store, Some("nothing-here")).await.is_empty());

    store.delete("list/b.txt").await.unwrap();
    assert_eq!(
        keys(store, Some("list")).await,
        vec!["list/a.txt", "list/nested/c.txt"]
    );

    let all = keys(store, None).await;
    assert_eq!(all.iter().filter(|k| *k == "list/a.txt").count(), 1);
    assert!(all.contains(&"other/d.txt".to_string()));
    assert_eq!(keys(store, Some("")).await, all);
}

pub async fn early_drop_releases_listing(store: &dyn FileStore) {
    for i in 0..10 {
        store
            .upload_bytes(&format!("many/{:02}", i), Bytes::from_static(b"x"))
            .await
            .unwrap();
    }

    let mut listing = store.list(Some("many"));
    let first = listing.next().await.unwrap().unwrap();
    assert!(first.starts_with("many/"));
    drop(listing);

    // The store stays fully usable after an abandoned listing
    assert_eq!(keys(store, Some("many")).await.len(), 10);
}

pub async fn upload_from_file(store: &dyn FileStore) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.bin");
    let content: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    tokio::fs::write(&path, &content).await.unwrap();

    store.upload_file("files/source.bin", &path).await.unwrap();

    let downloaded = store.download_bytes("files/source.bin").await.unwrap();
    assert_eq!(downloaded.len(), content.len());
    assert_eq!(&downloaded[..], &content[..]);
}

pub async fn upload_reader_leaves_reader_usable(store: &dyn FileStore) {
    let mut reader = Cursor::new(b"streamed content".to_vec());

    store.upload_reader("streams/one", &mut reader).await.unwrap();
    assert_eq!(reader.position(), 16);

    // Still owned and readable by the caller
    reader.set_position(0);
    let mut again = String::new();
    reader.read_to_string(&mut again).await.unwrap();
    assert_eq!(again, "streamed content");

    assert_eq!(
        &store.download_bytes("streams/one").await.unwrap()[..],
        b"streamed content"
    );
}

pub async fn download_to_sink(store: &dyn FileStore) {
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    store
        .upload_bytes("sink/large.bin", Bytes::from(content.clone()))
        .await
        .unwrap();

    let mut sink = Vec::new();
    store.download_to("sink/large.bin", &mut sink).await.unwrap();
    assert_eq!(sink, content);
}

pub async fn empty_key_is_rejected(store: &dyn FileStore) {
    let err = store.upload_bytes("", Bytes::from_static(b"x")).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(..)));
}

pub async fn key_below_a_blob_is_absent(store: &dyn FileStore) {
    store.upload_bytes("leaf", Bytes::from_static(b"file")).await.unwrap();

    assert!(!store.exists("leaf/child").await.unwrap());
    store.delete("leaf/child").await.unwrap();
    assert!(store.download_bytes("leaf/child").await.unwrap_err().is_not_found());
    assert!(keys(store, Some("leaf/child")).await.is_empty());

    assert_eq!(&store.download_bytes("leaf").await.unwrap()[..], b"file");
}
