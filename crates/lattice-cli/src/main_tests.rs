use assert_cmd::Command;
use tempfile::tempdir;

fn lattice() -> Command {
    Command::cargo_bin("lattice").unwrap()
}

#[test]
fn init_creates_lattice_dir() {
    let dir = tempdir().unwrap();
    lattice()
        .arg("-C")
        .arg(dir.path())
        .arg("init")
        .assert()
        .success();
    assert!(dir.path().join(".lattice").is_dir());
}

#[test]
fn create_without_init_fails_with_helpful_message() {
    let dir = tempdir().unwrap();
    let output = lattice()
        .arg("-C")
        .arg(dir.path())
        .arg("--actor")
        .arg("human:alice")
        .arg("create")
        .arg("Do the thing")
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lattice init"));
}

#[test]
fn create_then_list_round_trips_via_json_output() {
    let dir = tempdir().unwrap();
    lattice().arg("-C").arg(dir.path()).arg("init").assert().success();

    lattice()
        .arg("-C")
        .arg(dir.path())
        .arg("--actor")
        .arg("human:alice")
        .arg("create")
        .arg("Ship the release")
        .assert()
        .success();

    let output = lattice()
        .arg("-C")
        .arg(dir.path())
        .arg("-o")
        .arg("json")
        .arg("list")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Ship the release"));
}
