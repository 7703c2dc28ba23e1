#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

mod common;

use assert_cmd::Command;
use common::TestProject;
use predicates::prelude::*;

/// CLIヘルプに全オプションが表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("jocker").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--varsfile"))
        .stdout(predicate::str::contains("--templatefile"))
        .stdout(predicate::str::contains("--outputfile"))
        .stdout(predicate::str::contains("--dockerconfig"))
        .stdout(predicate::str::contains("--build"))
        .stdout(predicate::str::contains("--push"))
        .stdout(predicate::str::contains("--dryrun"));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("jocker").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

/// dry-run は展開結果を標準出力に出し、ファイルは書かない
#[test]
fn test_dryrun_prints_rendered_dockerfile() {
    let project = TestProject::new();

    project
        .jocker()
        .arg("--dryrun")
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM ubuntu:24.04"))
        .stdout(predicate::str::contains("RUN apt-get install -y git make curl"));

    assert!(!project.path().join("Dockerfile").exists());
}

#[test]
fn test_generate_writes_output_file() {
    let project = TestProject::new();

    project
        .jocker()
        .args(["-o", "out/Dockerfile.generated"])
        .assert()
        .success();

    let content =
        std::fs::read_to_string(project.path().join("out/Dockerfile.generated")).unwrap();
    assert!(content.contains("RUN apt-get install -y git make curl"));
}

#[test]
fn test_custom_vars_and_template_files() {
    let project = TestProject::empty();
    project.write("base.tmpl", "FROM {{ image }}\n");
    project.write("vars.json", r#"{"image": "alpine:3.20"}"#);

    project
        .jocker()
        .args(["-t", "base.tmpl", "-f", "vars.json", "-d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FROM alpine:3.20"));
}

#[test]
fn test_assignment_varsfile() {
    let project = TestProject::empty();
    project.write("Dockerfile.template", "FROM ubuntu\nRUN {{ packages }}\n");
    project.write("varsfile", "packages = \"git make curl\"\n");

    project
        .jocker()
        .args(["-f", "varsfile", "-d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RUN git make curl"));
}

/// dry-run とビルドの同時指定は 100 で終了
#[test]
fn test_dryrun_with_build_conflicts() {
    let project = TestProject::new();

    project
        .jocker()
        .args(["-d", "-b", "myrepo:v1"])
        .assert()
        .code(100)
        .stderr(predicate::str::contains("dryrun requested"));

    assert!(!project.path().join("Dockerfile").exists());
}

#[test]
fn test_dryrun_with_push_conflicts() {
    let project = TestProject::new();

    project.jocker().args(["-d", "-p", "myrepo"]).assert().code(100);
}

/// テンプレートが無い場合は 508（シェルからは下位8ビットの 252 に見える）
#[cfg(unix)]
#[test]
fn test_missing_template() {
    let project = TestProject::empty();
    project.write("varsfile.yaml", common::VARS);

    project
        .jocker()
        .assert()
        .code(508 & 0xff)
        .stderr(predicate::str::contains("template file missing"));
}

#[test]
fn test_missing_template_verbose_propagates_error() {
    let project = TestProject::empty();
    project.write("varsfile.yaml", common::VARS);

    project
        .jocker()
        .arg("--verbose")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("template file missing"));
}

#[test]
fn test_missing_vars_file() {
    let project = TestProject::empty();
    project.write("Dockerfile.template", common::TEMPLATE);

    project
        .jocker()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing variables file"));
}

#[test]
fn test_undefined_variable() {
    let project = TestProject::new();
    project.write("Dockerfile.template", "FROM {{ base_image }}\n");

    project
        .jocker()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("base_image"));
}

#[test]
fn test_malformed_engine_config() {
    let project = TestProject::new();
    project.write("engine.yaml", "build:\n  no_cache: true\n");

    project
        .jocker()
        .args(["-c", "engine.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid config file"));
}

/// エンジン設定は環境変数からも指定できる
#[test]
fn test_engine_config_from_env() {
    let project = TestProject::new();

    project
        .jocker()
        .env("JOCKER_DOCKER_CONFIG", project.path().join("missing.yaml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot access config file"));
}

#[test]
fn test_empty_build_repository_rejected() {
    let project = TestProject::new();

    project
        .jocker()
        .args(["-b", ":v1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("repository name is missing"));
}
