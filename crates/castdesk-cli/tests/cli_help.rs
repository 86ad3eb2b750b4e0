use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("castdesk")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("customers"))
        .stdout(predicate::str::contains("broadcasts"))
        .stdout(predicate::str::contains("templates"))
        .stdout(predicate::str::contains("admins"));
}

#[test]
fn test_resource_help_shows_subcommands() {
    cargo_bin_cmd!("castdesk")
        .args(["customers", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_broadcasts_help_includes_tags() {
    cargo_bin_cmd!("castdesk")
        .args(["broadcasts", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tags"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_list_help_shows_filters() {
    cargo_bin_cmd!("castdesk")
        .args(["broadcasts", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--status"))
        .stdout(predicate::str::contains("--tag"))
        .stdout(predicate::str::contains("--from"))
        .stdout(predicate::str::contains("--filter"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("castdesk")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
