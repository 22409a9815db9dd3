use slipbox_core::config::loader::{ConfigError, ConfigLoader};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn load_full_config_ok() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    let toml = r#"
version = 1

[notebook]
root = "/tmp/notes"
extension = "markdown"
index_path = "{{root}}/.cache/slipbox.db"
excluded_folders = ["templates", "archive/old"]

[logging]
level = "debug"
file = "{{root}}/.slipbox/sb.log"
"#;
    write_file(&cfg_path, toml);

    let rc = ConfigLoader::load(Some(&cfg_path), None).expect("should load");

    assert_eq!(rc.root, PathBuf::from("/tmp/notes"));
    assert_eq!(rc.extension, "markdown");
    assert_eq!(rc.index_path, PathBuf::from("/tmp/notes/.cache/slipbox.db"));
    assert_eq!(
        rc.excluded_folders,
        vec![PathBuf::from("templates"), PathBuf::from("archive/old")]
    );
    assert_eq!(rc.logging.level, "debug");
    assert_eq!(rc.logging.file, Some(PathBuf::from("/tmp/notes/.slipbox/sb.log")));
}

#[test]
fn env_vars_are_expanded() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    // SAFETY: no other test reads this variable
    unsafe { std::env::set_var("SLIPBOX_TEST_NOTES", "/data/box") };
    write_file(&cfg_path, "version = 1\n[notebook]\nroot = \"$SLIPBOX_TEST_NOTES/zk\"\n");

    let rc = ConfigLoader::load(Some(&cfg_path), None).unwrap();

    assert_eq!(rc.root, PathBuf::from("/data/box/zk"));
    assert_eq!(rc.index_path, PathBuf::from("/data/box/zk/.slipbox/index.db"));
}

#[test]
fn missing_file_fails() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("nope/config.toml");
    let err = ConfigLoader::load(Some(&cfg_path), None).unwrap_err();
    match err {
        ConfigError::NotFound(_) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn bad_version_fails() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    write_file(&cfg_path, "version = 2\n[notebook]\nroot = \"/tmp\"\n");

    let err = ConfigLoader::load(Some(&cfg_path), None).unwrap_err();
    match err {
        ConfigError::BadVersion(2) => {}
        other => panic!("expected BadVersion(2), got {other:?}"),
    }
}

#[test]
fn missing_notebook_section_fails() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    write_file(&cfg_path, "version = 1\n");

    let err = ConfigLoader::load(Some(&cfg_path), None).unwrap_err();
    match err {
        ConfigError::ParseError(..) => {}
        other => panic!("expected ParseError, got {other:?}"),
    }
}
