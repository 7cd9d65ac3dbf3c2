use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn part1_output_right_answer() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("example_inputs.txt");

    cmd.assert().success().stdout(
        predicate::str::contains("After 5 generation(s)")
            .and(predicate::str::contains("37 seats occupied")),
    );
}

#[test]
fn part1_parallel_output_right_answer() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("--parallel").arg("example_inputs.txt");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("37 seats occupied"));
}

#[test]
fn part1_fails_when_generation_cap_too_small() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.args(["--max-generations", "2", "example_inputs.txt"]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("doesn't stabilize within 2 generation(s)"));
}

#[test]
fn part1_fails_on_missing_input() {
    let mut cmd = Command::cargo_bin("part1").unwrap();
    cmd.arg("no_such_inputs.txt");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read map of seats layout"));
}
