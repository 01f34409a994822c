use page_fs::{ConfigStore, Error, NormalizedPath};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::fs;
use tempfile::TempDir;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct TestConfig {
    name: String,
    count: i32,
}

#[test]
fn test_load_toml() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("pagesync.toml");
    fs::write(&file_path, "name = \"site\"\ncount = 3\n").unwrap();

    let config: TestConfig = ConfigStore::new()
        .load(&NormalizedPath::new(&file_path))
        .unwrap();
    assert_eq!(
        config,
        TestConfig {
            name: "site".into(),
            count: 3
        }
    );
}

#[test]
fn test_load_yaml_and_json() {
    let temp = TempDir::new().unwrap();
    let yaml = temp.path().join("pagesync.yml");
    let json = temp.path().join("pagesync.json");
    fs::write(&yaml, "name: y\ncount: 1\n").unwrap();
    fs::write(&json, r#"{"name":"j","count":2}"#).unwrap();

    let store = ConfigStore::new();
    let from_yaml: TestConfig = store.load(&NormalizedPath::new(&yaml)).unwrap();
    let from_json: TestConfig = store.load(&NormalizedPath::new(&json)).unwrap();
    assert_eq!(from_yaml.name, "y");
    assert_eq!(from_json.count, 2);
}

#[test]
fn test_load_or_default_when_missing() {
    let temp = TempDir::new().unwrap();
    let config: TestConfig = ConfigStore::new()
        .load_or_default(&NormalizedPath::new(temp.path().join("absent.toml")))
        .unwrap();
    assert_eq!(config, TestConfig::default());
}

#[test]
fn test_parse_error_names_format() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("broken.toml");
    fs::write(&file_path, "name = ").unwrap();

    let err = ConfigStore::new()
        .load::<TestConfig>(&NormalizedPath::new(&file_path))
        .unwrap_err();
    match err {
        Error::ConfigParse { format, .. } => assert_eq!(format, "TOML"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unsupported_extension() {
    let err = ConfigStore::new()
        .load::<TestConfig>(&NormalizedPath::new("site.ini"))
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
}

#[test]
fn test_save_round_trip() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("out.toml"));
    let store = ConfigStore::new();
    let value = TestConfig {
        name: "saved".into(),
        count: 9,
    };

    store.save(&path, &value).unwrap();
    let loaded: TestConfig = store.load(&path).unwrap();
    assert_eq!(loaded, value);
}
