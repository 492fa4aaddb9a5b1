use std::fs;
use std::path::Path;

use assert_cost::canonicalize_or_current;
use tempfile::tempdir;

#[test]
fn canonicalize_or_current_resolves_existing_relative_path() {
    let original = std::env::current_dir().expect("cwd");
    let tmp = tempdir().expect("tempdir");
    let subdir = tmp.path().join("with_assertions");
    fs::create_dir_all(&subdir).expect("create variant dir");
    std::env::set_current_dir(tmp.path()).expect("chdir tmp");

    let result = canonicalize_or_current(Path::new("with_assertions")).expect("canonicalize");
    let dot = canonicalize_or_current(Path::new(".")).expect("canonicalize dot");

    std::env::set_current_dir(original).expect("restore cwd");
    assert_eq!(result, subdir.canonicalize().expect("canonicalize subdir"));
    assert_eq!(dot.canonicalize().expect("canon"), tmp.path().canonicalize().expect("canon tmp"));
}

#[test]
fn canonicalize_or_current_keeps_missing_paths_absolute() {
    let result = canonicalize_or_current(Path::new("does/not/exist/yet")).expect("fallback");
    assert!(result.is_absolute());
    assert!(result.ends_with("does/not/exist/yet"));
}
