use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn part2_output_right_answer() {
    let mut cmd = Command::cargo_bin("part2").unwrap();
    cmd.arg("example_inputs.txt");

    cmd.assert().success().stdout(
        predicate::str::contains("After 6 generation(s)")
            .and(predicate::str::contains("26 seats occupied")),
    );
}

#[test]
fn part2_parallel_output_right_answer() {
    let mut cmd = Command::cargo_bin("part2").unwrap();
    cmd.args(["--parallel", "--max-generations", "6", "example_inputs.txt"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("26 seats occupied"));
}
