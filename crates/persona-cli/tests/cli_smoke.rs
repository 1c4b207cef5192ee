use assert_cmd::Command;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

fn write_profiles(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("profiles.yaml");
    fs::write(
        &path,
        r#"
name: smoke_set
profiles:
  - openness: 50
    conscientiousness: 25
    extraversion: 50
    agreeableness: 0
    neuroticism: 50
    label: baseline
  - openness: 90
    conscientiousness: 10
    extraversion: 90
    agreeableness: 10
    neuroticism: 90
"#,
    )
    .unwrap();
    path
}

#[test]
fn create_then_status_reports_the_matrix() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("persona.db");
    let profiles = write_profiles(&dir);

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("create")
        .arg("--name")
        .arg("smoke")
        .arg("--description")
        .arg("cli smoke test")
        .arg("--providers")
        .arg("mock")
        .arg("--instruments")
        .arg("gad7,levenson")
        .arg("--input-systems")
        .arg("ocean_direct")
        .arg("--profiles")
        .arg(&profiles)
        .arg("--db")
        .arg(&db);
    cmd.assert()
        .success()
        .stdout(contains("= 4 test cases"));

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("status").arg("1").arg("--db").arg(&db);
    cmd.assert()
        .success()
        .stdout(contains("smoke"))
        .stdout(contains("pending:    4"));
}

#[test]
fn run_drains_mock_provider_to_completion() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("persona.db");
    let profiles = write_profiles(&dir);

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("create")
        .arg("--name")
        .arg("smoke-run")
        .arg("--description")
        .arg("cli run test")
        .arg("--providers")
        .arg("mock")
        .arg("--instruments")
        .arg("gad7")
        .arg("--profiles")
        .arg(&profiles)
        .arg("--db")
        .arg(&db);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("run")
        .arg("--experiment")
        .arg("1")
        .arg("--db")
        .arg(&db);
    cmd.assert()
        .success()
        .stdout(contains("2 complete, 0 failed"));

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("status").arg("1").arg("--db").arg(&db);
    cmd.assert()
        .success()
        .stdout(contains("status:       complete"))
        .stdout(contains("complete:   2"));
}

#[test]
fn unknown_provider_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("persona.db");
    let profiles = write_profiles(&dir);

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("create")
        .arg("--name")
        .arg("typo")
        .arg("--description")
        .arg("bad provider")
        .arg("--providers")
        .arg("claud")
        .arg("--profiles")
        .arg(&profiles)
        .arg("--db")
        .arg(&db);
    cmd.assert()
        .code(2)
        .stderr(contains("unknown provider"));
}

#[test]
fn init_writes_a_sample_profile_set() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("profiles.yaml");

    let mut cmd = Command::cargo_bin("persona").unwrap();
    cmd.arg("init").arg("--profiles").arg(&path);
    cmd.assert().success();

    let yaml = fs::read_to_string(&path).unwrap();
    assert!(yaml.contains("sample_extremes"));
    assert!(yaml.contains("volatile_explorer"));
}
