mod common;
use common::TestFixture;

#[test]
fn test_enable_creates_session_tree_and_status_reports_it() {
    let fixture = TestFixture::new();

    fixture.command().arg("enable").arg("--force").assert().success();

    assert!(fixture.repo_root().join(".ai-sessions").join("active").is_dir());
    assert!(fixture.repo_root().join(".ai-sessions").join("completed").is_dir());

    let output = fixture.command().arg("status").output().expect("failed to run status");
    assert!(output.status.success(), "status failed: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("active session:") && stdout.contains("none"), "unexpected status output: {stdout}");
}

#[test]
fn test_disable_removes_only_ghost_hook_entries() {
    let fixture = TestFixture::new();
    fixture.enable();

    let settings_path = fixture.repo_root().join("claude-settings.json");
    let raw = std::fs::read_to_string(&settings_path).expect("settings file should exist after enable");
    let mut settings: serde_json::Value = serde_json::from_str(&raw).unwrap();
    settings["hooks"]["other-tool-event"] = serde_json::json!([{
        "matcher": "*",
        "hooks": [{"type": "command", "command": "some-other-tool record"}],
    }]);
    std::fs::write(&settings_path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

    fixture.command().arg("disable").assert().success();

    let raw = std::fs::read_to_string(&settings_path).expect("settings file should survive disable");
    let settings: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(settings["hooks"]["session-start"].is_null(), "ghost's own entry should be removed");
    assert_eq!(
        settings["hooks"]["other-tool-event"][0]["hooks"][0]["command"],
        "some-other-tool record",
        "disable must leave unrelated hook entries untouched"
    );
}

#[test]
fn test_mistake_and_decisions_roundtrip() {
    let fixture = TestFixture::new();
    fixture.enable();

    fixture
        .command()
        .arg("mistake")
        .arg("forgot to run migrations before deploy")
        .assert()
        .success();

    let output = fixture.command().arg("decisions").output().expect("decisions failed");
    assert!(output.status.success());

    let mistakes_path = fixture.repo_root().join(".ai-sessions").join("mistakes.md");
    let content = std::fs::read_to_string(&mistakes_path).expect("mistakes.md should exist");
    assert!(content.contains("forgot to run migrations before deploy"));
}

#[test]
fn test_validate_reports_clean_store_after_enable() {
    let fixture = TestFixture::new();
    fixture.enable();

    fixture.command().arg("validate").assert().success();
}
