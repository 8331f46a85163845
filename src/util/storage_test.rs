use super::*;

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("auth-store-{}", uuid::Uuid::new_v4())).join("storage.json")
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_get_missing_is_none() {
    let storage = MemoryStorage::new();
    assert!(storage.get_item(ACCESS_TOKEN_KEY).is_none());
    assert!(storage.is_empty());
}

#[test]
fn memory_set_then_get() {
    let storage = MemoryStorage::new();
    storage.set_item(ACCESS_TOKEN_KEY, "tok").unwrap();
    assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));
    assert_eq!(storage.len(), 1);
}

#[test]
fn memory_set_overwrites() {
    let storage = MemoryStorage::new();
    storage.set_item("k", "a").unwrap();
    storage.set_item("k", "b").unwrap();
    assert_eq!(storage.get_item("k").as_deref(), Some("b"));
}

#[test]
fn memory_remove_missing_is_ok() {
    let storage = MemoryStorage::new();
    storage.remove_item("absent").unwrap();
    storage.set_item("k", "v").unwrap();
    storage.remove_item("k").unwrap();
    assert!(storage.get_item("k").is_none());
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_open_missing_starts_empty() {
    let path = temp_path();
    let storage = FileStorage::open(&path).unwrap();
    assert!(storage.get_item(PERSIST_KEY).is_none());
    assert!(!path.exists());
}

#[test]
fn file_writes_survive_reopen() {
    let path = temp_path();
    {
        let storage = FileStorage::open(&path).unwrap();
        storage.set_item(ACCESS_TOKEN_KEY, "tok").unwrap();
        storage.set_item(PERSIST_KEY, r#"{"state":{}}"#).unwrap();
    }
    let reopened = FileStorage::open(&path).unwrap();
    assert_eq!(reopened.get_item(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));
    assert_eq!(reopened.get_item(PERSIST_KEY).as_deref(), Some(r#"{"state":{}}"#));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_remove_survives_reopen() {
    let path = temp_path();
    {
        let storage = FileStorage::open(&path).unwrap();
        storage.set_item(ACCESS_TOKEN_KEY, "tok").unwrap();
        storage.remove_item(ACCESS_TOKEN_KEY).unwrap();
    }
    let reopened = FileStorage::open(&path).unwrap();
    assert!(reopened.get_item(ACCESS_TOKEN_KEY).is_none());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_open_rejects_garbage() {
    let path = temp_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();
    let err = FileStorage::open(&path).unwrap_err();
    assert!(matches!(err, StorageError::Serialize(_)));
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_open_blank_file_starts_empty() {
    let path = temp_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "\n").unwrap();
    let storage = FileStorage::open(&path).unwrap();
    assert!(storage.get_item(ACCESS_TOKEN_KEY).is_none());
    assert_eq!(storage.path(), path.as_path());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

// =============================================================
// open_storage
// =============================================================

#[test]
fn backend_without_path_is_memory() {
    assert_eq!(storage_backend(None, false), StorageBackend::Memory);
}

#[test]
fn backend_with_path_is_file() {
    let path = Path::new("/tmp/auth.json");
    assert_eq!(storage_backend(Some(path), false), StorageBackend::File(path));
}

#[test]
fn backend_in_browser_is_local_regardless_of_path() {
    assert_eq!(storage_backend(None, true), StorageBackend::Local);
    assert_eq!(storage_backend(Some(Path::new("/tmp/auth.json")), true), StorageBackend::Local);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn native_builds_never_select_browser_storage() {
    // Holds with and without `--features hydrate`.
    assert_eq!(storage_backend(None, BROWSER_STORAGE), StorageBackend::Memory);
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn open_storage_without_path_is_memory() {
    let storage = open_storage(None).unwrap();
    storage.set_item("k", "v").unwrap();
    assert_eq!(storage.get_item("k").as_deref(), Some("v"));
}

#[cfg(not(target_arch = "wasm32"))]
#[test]
fn open_storage_with_path_is_file() {
    let path = temp_path();
    let storage = open_storage(Some(&path)).unwrap();
    storage.set_item("k", "v").unwrap();
    assert!(path.exists());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
