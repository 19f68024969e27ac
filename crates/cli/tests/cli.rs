use assert_cmd::Command;

fn catalog(workdir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("catalog").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("CATALOG_ENV")
        .env_remove("CATALOG_CONFIG_DIR")
        .env_remove("CATALOG_DATABASE__ENDPOINT")
        .env("RUST_LOG", "off");
    cmd
}

fn stdout(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = catalog(&dir).arg("--help").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    for command in ["serve", "migrate", "check", "routes"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn routes_prints_catalog_endpoints() {
    let dir = tempfile::tempdir().unwrap();
    let output = catalog(&dir).arg("routes").output().unwrap();
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("/api/books/{id}/reviews"));
    assert!(text.contains("/api/wishlist/{email}/status/{book_id}"));
    assert!(text.contains("DELETE"));
}

#[test]
fn migrate_is_recorded_in_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = format!("file://{}", dir.path().join("catalog.json").display());

    let first = catalog(&dir)
        .env("CATALOG_DATABASE__ENDPOINT", &endpoint)
        .arg("migrate")
        .output()
        .unwrap();
    assert!(first.status.success());
    assert!(stdout(&first).contains("applied 2 migrations"));

    let second = catalog(&dir)
        .env("CATALOG_DATABASE__ENDPOINT", &endpoint)
        .arg("migrate")
        .output()
        .unwrap();
    assert!(second.status.success());
    assert!(stdout(&second).contains("applied 0 migrations"));
}

#[test]
fn check_fails_for_unsupported_store() {
    let dir = tempfile::tempdir().unwrap();
    let output = catalog(&dir)
        .env("CATALOG_DATABASE__ENDPOINT", "mongodb://localhost:27017")
        .arg("check")
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn check_reports_default_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let output = catalog(&dir).arg("check").output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("ok: store memory://"));
}
