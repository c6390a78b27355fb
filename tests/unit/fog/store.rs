use super::*;
use kurbo::Point;

fn sample() -> PathCommands {
    PathCommands::polygon(&[
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
    ])
}

fn temp_root(name: &str) -> PathBuf {
    let dir = PathBuf::from("target")
        .join("umbra_store_tests")
        .join(format!("{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn memory_store_round_trips_and_clears() {
    let mut store = MemoryStore::new();
    assert_eq!(store.read("p1", "s1").unwrap(), None);
    store.write("p1", "s1", &sample()).unwrap();
    assert_eq!(store.read("p1", "s1").unwrap(), Some(sample()));
    assert_eq!(store.read("p2", "s1").unwrap(), None);
    assert_eq!(store.len(), 1);
    store.clear("p1", "s1").unwrap();
    assert!(store.is_empty());
    store.clear("p1", "s1").unwrap();
}

#[test]
fn json_store_persists_across_instances() {
    let root = temp_root("persist");
    let mut store = JsonFileStore::new(&root);
    store.write("player/1", "scene:a", &sample()).unwrap();

    let path = store.entry_path("player/1", "scene:a");
    assert!(path.is_file());
    assert!(path.starts_with(root.join("fog-cache")));
    assert!(!path.with_extension("json.tmp").exists());
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"reuse\""));

    let reopened = JsonFileStore::new(&root);
    assert_eq!(reopened.read("player/1", "scene:a").unwrap(), Some(sample()));

    store.clear("player/1", "scene:a").unwrap();
    assert_eq!(reopened.read("player/1", "scene:a").unwrap(), None);
    store.clear("player/1", "scene:a").unwrap();
}

#[test]
fn json_store_reports_corrupt_files() {
    let root = temp_root("corrupt");
    let store = JsonFileStore::new(&root);
    let path = store.entry_path("p", "s");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{not json").unwrap();
    assert!(matches!(store.read("p", "s"), Err(UmbraError::Storage(_))));
}

#[test]
fn keys_are_sanitized_to_one_component() {
    assert_eq!(sanitize_key("../etc"), "___etc");
    assert_eq!(sanitize_key(""), "_");
    assert_eq!(sanitize_key("Abc-1_2"), "Abc-1_2");
}
