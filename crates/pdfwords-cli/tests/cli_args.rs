use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("pdfwords").unwrap()
}

#[test]
fn help_flag_prints_usage_with_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("words"))
        .stdout(predicate::str::contains("objects"));
}

#[test]
fn words_subcommand_help() {
    cmd()
        .args(["words", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FILE"))
        .stdout(predicate::str::contains("--pages"))
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--warnings"));
}

#[test]
fn objects_subcommand_help() {
    cmd()
        .args(["objects", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FILE"))
        .stdout(predicate::str::contains("--values"));
}

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn words_requires_file_argument() {
    cmd()
        .arg("words")
        .assert()
        .failure()
        .stderr(predicate::str::contains("FILE"));
}

#[test]
fn version_flag_prints_name() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pdfwords"));
}
