use predicates::prelude::*;

mod common;

#[test]
fn test_check_path_below_allow_list() {
    let ctx = common::TestContext::new();
    let path = ctx.storage().join("inst1");

    ctx.new_cmd()
        .args(["check-path", &common::TestContext::path_arg(&path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"accepted\": true"));
}

#[test]
fn test_check_path_exact_needs_flag() {
    let ctx = common::TestContext::new();
    let path = common::TestContext::path_arg(&ctx.storage());

    ctx.new_cmd()
        .args(["check-path", &path])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not acceptable for file storage"));

    ctx.new_cmd()
        .args(["check-path", "--exact", &path])
        .assert()
        .success();
}

#[test]
fn test_check_path_forbidden_wins() {
    let ctx = common::TestContext::new();

    for path in ["/usr/lib64/xyz", "/etc/vstore"] {
        ctx.new_cmd()
            .args(["check-path", path])
            .assert()
            .failure()
            .stderr(predicate::str::contains("forbidden"));
    }

    ctx.new_cmd()
        .args(["check-path", "relative/disk"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be absolute"));
}

#[test]
fn test_check_path_usable() {
    let ctx = common::TestContext::new();
    let storage = common::TestContext::path_arg(&ctx.storage());
    let missing = common::TestContext::path_arg(&ctx.storage().join("missing"));

    ctx.new_cmd()
        .args(["check-path", "--usable", &storage])
        .assert()
        .success();

    ctx.new_cmd()
        .args(["check-path", "--usable", &missing])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not existing or not a directory"));
}

#[test]
fn test_check_path_without_allow_list() {
    let ctx = common::TestContext::new();
    std::fs::remove_file(ctx.allowed_paths_file()).unwrap();

    ctx.new_cmd()
        .args(["check-path", "-t", "file", "/srv/storage/inst1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No paths are valid"));
}

#[test]
fn test_wrong_paths_lists_system_entries() {
    let ctx = common::TestContext::new();

    ctx.new_cmd()
        .arg("wrong-paths")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"/etc\""))
        .stdout(predicate::str::contains("storage").not());
}

#[test]
fn test_space_reports_json() {
    let ctx = common::TestContext::new();

    ctx.new_cmd()
        .args(["space", &common::TestContext::path_arg(&ctx.storage())])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"file\""))
        .stdout(predicate::str::contains("free_mib"));

    ctx.new_cmd()
        .args(["space", "/path/does/not/exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to retrieve file system information"));
}
