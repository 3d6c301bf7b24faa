//! 命令行冒烟测试

use assert_cmd::Command;

#[test]
fn test_help_lists_options() {
    let output = Command::cargo_bin("epub-translator")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--no-cache"));
    assert!(stdout.contains("--limit"));
}

#[test]
fn test_missing_input_file_fails() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("epub-translator")
        .unwrap()
        .current_dir(dir.path())
        .env("OPENROUTER_APIKEY", "test-key")
        .arg(dir.path().join("missing.epub"))
        .assert()
        .failure();
}

#[test]
fn test_init_config_writes_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    Command::cargo_bin("epub-translator")
        .unwrap()
        .current_dir(dir.path())
        .arg("--init-config")
        .arg(&path)
        .assert()
        .success();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("batch_size = 80"));
    assert!(!content.contains("api_key"));
}

#[test]
fn test_env_docs_lists_variables() {
    let output = Command::cargo_bin("epub-translator")
        .unwrap()
        .arg("--env-docs")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OPENROUTER_APIKEY"));
    assert!(stdout.contains("EPUB_TRANSLATOR_LOG_LEVEL"));
}
