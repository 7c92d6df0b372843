//! Option parsing, input loading and the write runner against the in-memory store.

use clap::Parser;
use feature_store::input::{parse_collection, read_collection};
use feature_store::{apply, InputOpts, StoreOpts, WriteOutput, WriteRequest};
use feature_types::{FeatureDeletion, NAMESPACE_KEY};
use feature_writer::testing::MemoryStore;
use feature_writer::{
    ConcurrencyCheck, FeatureWriter, TableTarget, WritePhase, OBJECT_DOES_NOT_EXIST,
};
use std::io::Write;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    store: StoreOpts,

    #[command(flatten)]
    input: InputOpts,
}

const COLLECTION: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "id": "a",
            "geometry": {"type": "Point", "coordinates": [8.5, 50.1, 12.0]},
            "properties": {"name": "first", "@ns:com:here:xyz": {"uuid": "a2", "puuid": "a1"}}
        },
        {
            "type": "Feature",
            "id": "b",
            "geometry": null,
            "properties": {"name": "second"}
        }
    ]
}"#;

#[test]
fn test_store_opts_defaults() {
    let cli = TestCli::try_parse_from([
        "feature-store",
        "--connection-string",
        "postgresql://localhost/db",
        "--table",
        "buildings",
        "--input",
        "in.geojson",
    ])
    .unwrap();

    assert_eq!(cli.store.schema, "public");
    assert_eq!(cli.store.table, "buildings");
    assert!(cli.store.statement_timeout.is_none());
    assert!(!cli.store.dry_run);
    assert_eq!(cli.input.input.to_str(), Some("in.geojson"));
}

#[test]
fn test_store_opts_overrides() {
    let cli = TestCli::try_parse_from([
        "feature-store",
        "--connection-string",
        "postgresql://localhost/db",
        "--schema",
        "tiles",
        "--table",
        "roads",
        "--statement-timeout",
        "5m",
        "--dry-run",
        "--input",
        "-",
    ])
    .unwrap();

    assert_eq!(cli.store.schema, "tiles");
    assert_eq!(cli.store.statement_timeout.as_deref(), Some("5m"));
    assert!(cli.store.dry_run);
}

#[test]
fn test_table_is_required() {
    let result = TestCli::try_parse_from([
        "feature-store",
        "--connection-string",
        "postgresql://localhost/db",
        "--input",
        "in.geojson",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_read_collection_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(COLLECTION.as_bytes()).unwrap();

    let collection = read_collection(file.path()).unwrap();
    assert_eq!(collection.features.len(), 2);
    assert_eq!(collection.features[0].previous_uuid(), Some("a1"));
    assert!(collection.features[1].geometry.is_none());
}

#[test]
fn test_read_collection_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.geojson");

    let err = read_collection(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("missing.geojson"));
}

#[test]
fn test_update_output_keeps_failures() {
    tokio_test::block_on(async {
        let store = MemoryStore::new();
        let writer = FeatureWriter::new(TableTarget::new("public", "features"));

        let seed = parse_collection(COLLECTION).unwrap();
        let (_, result) = apply(&writer, &store, WriteRequest::Insert(seed.features)).await;
        result.unwrap();

        let mut update = parse_collection(COLLECTION).unwrap();
        update.features[1].id = Some("ghost".to_string());
        let (output, result) = apply(
            &writer,
            &store,
            WriteRequest::Update {
                features: update.features,
                check: ConcurrencyCheck::disabled(),
            },
        )
        .await;

        assert_eq!(WritePhase::terminal(&result), WritePhase::Failed);
        assert_eq!(output.failures().len(), 1);
        assert_eq!(output.failures()[0].id(), "ghost");
        assert_eq!(output.failures()[0].message(), OBJECT_DOES_NOT_EXIST);

        let printed = serde_json::to_value(&output).unwrap();
        assert_eq!(printed["type"], "FeatureCollection");
        assert_eq!(printed["features"].as_array().map(Vec::len), Some(2));
        assert_eq!(printed["failed"][0]["id"], "ghost");
    });
}

#[test]
fn test_delete_output_is_failure_list() {
    tokio_test::block_on(async {
        let store = MemoryStore::new();
        let writer = FeatureWriter::new(TableTarget::new("public", "features"));
        let seed = parse_collection(COLLECTION).unwrap();
        apply(&writer, &store, WriteRequest::Insert(seed.features))
            .await
            .1
            .unwrap();

        let (output, result) = apply(
            &writer,
            &store,
            WriteRequest::Delete {
                deletions: vec![FeatureDeletion::new("a"), FeatureDeletion::new("b")],
                check: ConcurrencyCheck::enabled(),
            },
        )
        .await;

        result.unwrap();
        assert!(matches!(output, WriteOutput::Failures(ref f) if f.is_empty()));
        assert_eq!(serde_json::to_string(&output).unwrap(), "[]");
        assert!(store.is_empty().await);
    });
}

#[test]
fn test_namespace_survives_insert() {
    tokio_test::block_on(async {
        let store = MemoryStore::new();
        let writer = FeatureWriter::new(TableTarget::new("public", "features"));
        let seed = parse_collection(COLLECTION).unwrap();
        apply(&writer, &store, WriteRequest::Insert(seed.features))
            .await
            .1
            .unwrap();

        let row = store.row("a").await.unwrap();
        assert_eq!(row.jsondata["properties"]["name"], "first");
        assert_eq!(row.jsondata["properties"][NAMESPACE_KEY]["puuid"], "a1");
        assert_eq!(row.uuid(), Some("a2"));
    });
}
