//! Backup round-trips across stores and backends.

use std::time::Duration;

use localnoteapp::backup;
use localnoteapp::config::{ConfigStore, StorageType};
use localnoteapp::migration::MigrationEngine;
use localnoteapp::service::StorageService;
use localnoteapp::store::{FsBackendFactory, StoragePaths};

fn service_in(dir: &tempfile::TempDir) -> StorageService<FsBackendFactory> {
    let paths = StoragePaths::new(dir.path().to_path_buf());
    let config = ConfigStore::new(paths.config_file());
    StorageService::new(config, FsBackendFactory::new(paths))
        .with_retry_delay(Duration::ZERO)
}

#[test]
fn test_backup_restores_into_a_fresh_store() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = service_in(&source_dir);

    let a = source.create("Alpha", "a body").unwrap();
    let b = source.create("Beta", "b body").unwrap();

    let raw = backup::export(&source).unwrap().to_json_pretty().unwrap();

    let target_dir = tempfile::tempdir().unwrap();
    let target = service_in(&target_dir);
    let report = backup::import(&target, &raw).unwrap();
    assert_eq!(report.imported, 2);
    assert_eq!(report.failed, 0);

    let restored = target.list().unwrap();
    for original in [a, b] {
        let copy = restored.iter().find(|n| n.id == original.id).unwrap();
        assert_eq!(copy.title, original.title);
        assert_eq!(copy.content, original.content);
    }
}

#[test]
fn test_backup_is_backend_independent() {
    let source_dir = tempfile::tempdir().unwrap();
    let source = service_in(&source_dir);

    let note = source.create("Crossing", "payload").unwrap();
    let raw = backup::export(&source).unwrap().to_json_pretty().unwrap();

    // Import into a store whose active backend is the directory one.
    let target_dir = tempfile::tempdir().unwrap();
    let target = service_in(&target_dir);
    MigrationEngine::new(&target)
        .migrate_to(StorageType::Directory)
        .unwrap();

    let report = backup::import(&target, &raw).unwrap();
    assert_eq!(report.imported, 1);

    let restored = target.get(&note.id).unwrap().unwrap();
    assert_eq!(restored.content, "payload");
    assert!(target_dir
        .path()
        .join("notes")
        .join(format!("note-{}.json", note.id))
        .exists());
}

#[test]
fn test_malformed_envelope_aborts_before_writes() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_in(&dir);

    let result = backup::import(&service, r#"{"version": "1.0", "notes": 42}"#);
    assert!(result.is_err());
    assert!(service.list().unwrap().is_empty());
}
