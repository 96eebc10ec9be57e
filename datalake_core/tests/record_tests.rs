use bytes::Bytes;
use datalake_core::storage::{
    DatalakeStorage, DatalakeUrl, InMemoryStorage, LocalStorage, StorageError,
};
use datalake_core::utils::delete_dir_if_exists;
use datalake_core::{
    DatalakeError, Metadata, RecordFactory, MAXIMUM_BUCKET_SPAN, TIME_BUCKET_SIZE_IN_MS,
};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

fn random_metadata() -> Metadata {
    let seed = Uuid::new_v4().as_u128();
    // Somewhere in 2015, at most ten buckets long.
    let start = 1_420_070_400_000 + (seed % (365 * TIME_BUCKET_SIZE_IN_MS as u128)) as u64;
    let end = start + ((seed >> 64) % (10 * TIME_BUCKET_SIZE_IN_MS as u128)) as u64;
    Metadata::new(start, Some(end))
        .with_field("version", 0)
        .with_field("where", "nebraska")
        .with_field("what", "apache")
        .with_field("id", Uuid::new_v4().to_string())
        .with_field("hash", "12345")
        .with_field("work_id", serde_json::Value::Null)
}

async fn storage_with_file(url: &str, metadata: &Metadata) -> Arc<InMemoryStorage> {
    let storage = Arc::new(InMemoryStorage::new());
    let datalake_url = DatalakeUrl::from_str(url).unwrap();
    storage.create_container(datalake_url.container()).await.unwrap();
    storage.put_file(&datalake_url, metadata, Bytes::from_static(b"datalake")).await.unwrap();
    storage
}

#[test_log::test(tokio::test)]
async fn it_lists_from_s3_url() {
    let url = "s3://foo/bar";
    let metadata = random_metadata();
    let storage = storage_with_file(url, &metadata).await;
    let factory = RecordFactory::default().with_storage(storage);
    let records = factory.list_from_url(url).await.unwrap();
    assert!(!records.is_empty());
    for record in records {
        assert_eq!(record.metadata, metadata);
        assert_eq!(record.url, url);
    }
}

#[test_log::test(tokio::test)]
async fn it_fails_from_url_without_storage() {
    let factory = RecordFactory::default();
    assert!(!factory.backend_available());
    let err = factory.list_from_url("s3://foo/bar").await.unwrap_err();
    assert!(err.is_insufficient_configuration());
    // the configuration check happens before the url is even looked at
    let err = factory.list_from_url("not a url").await.unwrap_err();
    assert!(err.is_insufficient_configuration());
}

#[test_log::test]
fn it_lists_from_metadata() {
    let url = "s3://foo/baz";
    let metadata = random_metadata();
    let factory = RecordFactory::default();
    let records = factory.list_from_metadata(url, &metadata).unwrap();
    assert!(!records.is_empty());
    let first = metadata.start / TIME_BUCKET_SIZE_IN_MS;
    let last = metadata.effective_end() / TIME_BUCKET_SIZE_IN_MS;
    assert_eq!(records.len() as u64, last - first + 1);
    for (record, bucket) in records.iter().zip(first..=last) {
        assert_eq!(record.bucket, bucket);
        assert_eq!(record.metadata, metadata);
    }
}

#[test_log::test]
fn it_lists_identical_records_twice() {
    let url = "s3://foo/baz";
    let metadata = random_metadata();
    let factory = RecordFactory::default();
    let key = |records: Vec<datalake_core::DatalakeRecord>| {
        records.into_iter().map(|r| (r.bucket, r.url, r.metadata)).collect::<Vec<_>>()
    };
    let first = key(factory.list_from_metadata(url, &metadata).unwrap());
    let second = key(factory.list_from_metadata(url, &metadata).unwrap());
    assert_eq!(first, second);
}

#[test_log::test]
fn it_rejects_timespan_too_big() {
    let url = "s3://foo/blapp";
    let mut metadata = random_metadata();
    metadata.start = 0;
    metadata.end = Some((MAXIMUM_BUCKET_SPAN + 1) * TIME_BUCKET_SIZE_IN_MS);
    let err = RecordFactory::default().list_from_metadata(url, &metadata).unwrap_err();
    assert!(matches!(err, DatalakeError::UnsupportedTimeRange { .. }));
}

#[test_log::test(tokio::test)]
async fn it_rejects_timespan_too_big_from_url() {
    let url = "s3://foo/blapp";
    let mut metadata = random_metadata();
    metadata.start = 0;
    metadata.end = Some((MAXIMUM_BUCKET_SPAN + 1) * TIME_BUCKET_SIZE_IN_MS);
    let storage = storage_with_file(url, &metadata).await;
    let factory = RecordFactory::default().with_storage(storage);
    let err = factory.list_from_url(url).await.unwrap_err();
    assert!(err.is_unsupported_time_range());
}

#[test_log::test(tokio::test)]
async fn it_reports_no_such_datalake_file_in_bucket() {
    let storage = Arc::new(InMemoryStorage::new());
    storage.create_container("test-bucket").await.unwrap();
    let factory = RecordFactory::default().with_storage(storage);
    let err = factory.list_from_url("s3://test-bucket/such/file").await.unwrap_err();
    assert!(err.is_no_such_datalake_file());
}

#[test_log::test(tokio::test)]
async fn it_reports_no_such_bucket() {
    let factory = RecordFactory::default().with_storage(Arc::new(InMemoryStorage::new()));
    let err = factory.list_from_url("s3://no/such/file").await.unwrap_err();
    match err {
        DatalakeError::NoSuchDatalakeFile { url, source } => {
            assert_eq!(url, "s3://no/such/file");
            assert!(source.is_not_found());
        },
        other => panic!("expected NoSuchDatalakeFile, got {:?}", other),
    }
}

#[test_log::test]
fn it_lists_without_end() {
    let url = "s3://foo/baz";
    let mut metadata = random_metadata();
    metadata.end = None;
    let factory = RecordFactory::default();
    let records = factory.list_from_metadata(url, &metadata).unwrap();
    assert_eq!(records.len(), 1);
    for record in &records {
        assert_eq!(record.metadata, metadata);
    }
    let with_end = Metadata { end: Some(metadata.start), ..metadata.clone() };
    let buckets = |records: &[datalake_core::DatalakeRecord]| {
        records.iter().map(|r| r.bucket).collect::<Vec<_>>()
    };
    assert_eq!(buckets(&records), buckets(&factory.list_from_metadata(url, &with_end).unwrap()));
}

#[test_log::test]
fn it_buckets_misaligned_time_ranges() {
    // querying from the end of B0 to the start of B2 touches three buckets
    let start = TIME_BUCKET_SIZE_IN_MS * 4 / 5;
    let end = TIME_BUCKET_SIZE_IN_MS * 11 / 5;
    let buckets = RecordFactory::default().indexer().compute_buckets(start, Some(end)).unwrap();
    assert_eq!(buckets, vec![0, 1, 2]);
}

#[test_log::test(tokio::test)]
async fn it_round_trips_through_local_storage() {
    let root = std::env::temp_dir().join(format!("datalake-records-{}", Uuid::new_v4()));
    let storage = Arc::new(LocalStorage::new(root.clone()));
    let url = "file://archive/2015/apache.log";
    let metadata = random_metadata();
    storage.create_container("archive").await.unwrap();
    storage
        .put_file(&DatalakeUrl::from_str(url).unwrap(), &metadata, Bytes::from_static(b"GET /"))
        .await
        .unwrap();
    let storage_handle = storage.clone();
    let factory = RecordFactory::default().with_storage(storage);
    let records = factory.list_from_url(url).await.unwrap();
    assert!(!records.is_empty());
    for record in &records {
        assert_eq!(record.metadata, metadata);
        assert_eq!(record.size, 5);
    }
    let err = factory.list_from_url("file://archive/2015/missing.log").await.unwrap_err();
    assert!(err.is_no_such_datalake_file());
    let err = factory.list_from_url("file://missing/2015/apache.log").await.unwrap_err();
    assert!(err.is_no_such_datalake_file());
    // metadata documents are not files of their own
    let sidecar = "file://archive/2015/apache.log.datalake.json";
    let err = factory.list_from_url(sidecar).await.unwrap_err();
    assert!(matches!(err, DatalakeError::Storage(StorageError::InvalidUrl(_, _))));
    let sidecar_url = DatalakeUrl::from_str(sidecar).unwrap();
    let overwrite =
        storage_handle.put_object(&sidecar_url, Bytes::new(), Bytes::from_static(b"x")).await;
    assert!(overwrite.is_err());
    assert_eq!(factory.list_from_url(url).await.unwrap().len(), records.len());
    delete_dir_if_exists(&root).unwrap();
}
