use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

/// Assemble a fixture with debug information, returning the image path.
fn assemble(dir: &TempDir, name: &str, debug: bool) -> PathBuf {
    let out = dir.path().join(Path::new(name).with_extension("bin"));
    let mut cmd = Command::cargo_bin("basm").unwrap();
    if debug {
        cmd.arg("--debug");
    }
    cmd.arg(Path::new("tests/files").join(name))
        .arg(&out)
        .assert()
        .success();
    out
}

fn bdbg(program: &Path, commands: &str) -> Command {
    let mut cmd = Command::cargo_bin("bdbg").unwrap();
    cmd.arg(program)
        .arg("--minimal")
        .arg("--command")
        .arg(commands)
        .write_stdin("");
    cmd
}

#[test]
fn requires_debug_map() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "add.basm", false);
    Command::cargo_bin("bdbg")
        .unwrap()
        .arg(&program)
        .assert()
        .code(1)
        .stderr(contains("run the assembler with the -d flag"));
}

#[test]
fn steps_to_halt() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "add.basm", true);
    bdbg(&program, "step;step;step;step;registers")
        .assert()
        .success()
        .stderr(contains("halted"))
        .stderr(contains("r3 8\n"))
        .stderr(contains("pc 3\n"))
        .stderr(contains("zero 0 carry 0"));
}

#[test]
fn reads_commands_from_stdin() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "add.basm", true);
    Command::cargo_bin("bdbg")
        .unwrap()
        .arg(&program)
        .arg("--minimal")
        .arg("--command")
        .arg("step 2")
        .write_stdin("step\nregisters\nquit\nstep\n")
        .assert()
        .success()
        .stderr(contains("r3 8\n"))
        .stderr(contains("halted").not());
}

#[test]
fn breakpoints_and_source() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "loop.basm", true);
    bdbg(&program, "break add loop\ncontinue\ncontinue\nregisters\nlist")
        .assert()
        .success()
        .stderr(contains("Added breakpoint at 0x001"))
        .stderr(contains("breakpoint at 0x001"))
        .stderr(contains("pc 0x001 loop: line 3 add r2, r2, r1"))
        .stderr(contains("r2 3\n"))
        .stderr(contains("*-> ").and(contains("loop:   add r2, r2, r1")));
}

#[test]
fn subroutine_and_memory() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "call.basm", true);
    bdbg(&program, "continue;registers;memory;reset;registers")
        .assert()
        .success()
        .stderr(contains("halted"))
        .stderr(contains("r3 42\n"))
        .stderr(contains("00  00 00 00 00 2A"))
        .stderr(contains("Reset program"));
}

#[test]
fn reports_bad_commands() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "add.basm", true);
    bdbg(&program, "jump 3;break add nowhere;step 2;registers")
        .assert()
        .success()
        .stderr(contains("unknown command 'jump'"))
        .stderr(contains("unknown label 'nowhere'"))
        .stderr(contains("r2 3\n"));
}

#[test]
fn reports_unreadable_stdin() {
    let dir = TempDir::new().unwrap();
    let program = assemble(&dir, "add.basm", true);
    Command::cargo_bin("bdbg")
        .unwrap()
        .arg(&program)
        .arg("--minimal")
        .write_stdin(b"step\n\xff\xfe\nregisters\n".to_vec())
        .assert()
        .success()
        .stderr(contains("failed to read command"))
        .stderr(contains("r1 5").not());
}
