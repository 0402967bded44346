use predicates::prelude::*;

#[test]
fn test_cli_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("when-done"))
        .stdout(predicate::str::contains("how-many"));
    Ok(())
}

#[test]
fn unknown_project_schema_fails() {
    let dataset = assert_fs::NamedTempFile::new("tasks.json").unwrap();
    std::fs::write(dataset.path(), "[]").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
    cmd.args([
        "cycle-time",
        "-d",
        dataset.path().to_str().unwrap(),
        "-p",
        "jira",
    ]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown project schema: jira"));
}

#[test]
fn unsupported_dataset_extension_fails() {
    let dataset = assert_fs::NamedTempFile::new("tasks.txt").unwrap();
    std::fs::write(dataset.path(), "Name,Type\n").unwrap();

    let mut cmd = assert_cmd::cargo_bin_cmd!("flow-analyzer");
    cmd.args(["throughput", "-d", dataset.path().to_str().unwrap(), "-o", "unused.yaml"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load dataset"));
}
