//! End-to-end process tests, one per scenario in `spec.md` §8.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_bfind"))
}

fn lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn shallow_first() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("deep/1/2/3/4")).unwrap();
    fs::create_dir_all(root.join("shallow")).unwrap();
    fs::write(root.join("shallow/needle"), b"x").unwrap();

    let output = bin().arg(&root).output().unwrap();
    assert!(output.status.success());
    let out = lines(&output.stdout);

    let needle_idx = out
        .iter()
        .position(|l| l.ends_with("shallow/needle"))
        .expect("needle not printed");
    let deep_idx = out
        .iter()
        .position(|l| l.ends_with("deep/1/2"))
        .expect("deep/1/2 not printed");
    assert!(
        needle_idx < deep_idx,
        "expected shallow/needle (depth 2) before deep/1/2 (depth 3), got {out:?}"
    );
}

#[test]
fn prune_hides_subtree() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    fs::create_dir_all(a.join("b/c")).unwrap();
    fs::write(a.join("d"), b"x").unwrap();

    let output = bin()
        .arg(&a)
        .args(["-name", "b", "-prune", "-o", "-print"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let out = lines(&output.stdout);

    assert!(out.iter().any(|l| Path::new(l) == a), "missing root: {out:?}");
    assert!(out.iter().any(|l| l.ends_with("a/d")), "missing a/d: {out:?}");
    assert!(!out.iter().any(|l| l.ends_with("a/b/c")), "a/b/c leaked: {out:?}");
    assert!(!out.iter().any(|l| l.ends_with("a/b")), "a/b leaked: {out:?}");
}

#[test]
fn maxdepth_bounds_descent() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir_all(root.join("x/y")).unwrap();

    let output = bin().args(["--maxdepth", "1"]).arg(&root).output().unwrap();
    assert!(output.status.success());
    let out = lines(&output.stdout);

    assert!(out.iter().any(|l| Path::new(l) == root));
    assert!(out.iter().any(|l| l.ends_with("root/x")));
    assert!(!out.iter().any(|l| l.ends_with("root/x/y")));
}

#[test]
fn exit_action_sets_status() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();

    let output = bin()
        .arg(&root)
        .args(["-name", "zzz-never-matches", "-o", "-exit", "7"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
}

#[test]
fn xargs_safe_rejects_spaces() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("has space"), b"x").unwrap();

    let output = bin().arg("--xargs-safe").arg(&root).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has space"), "stderr was: {stderr}");
}

#[test]
#[cfg(unix)]
fn ignore_readdir_race_suppresses_vanished_entries() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("ok.txt"), b"x").unwrap();
    // A dangling symlink reproduces the same stat-failure path a real
    // readdir/stat race hits, without depending on timing.
    symlink(root.join("nonexistent-target"), root.join("ghost")).unwrap();

    let tolerant = bin().arg("--ignore-readdir-race").arg(&root).output().unwrap();
    assert!(tolerant.status.success(), "stderr: {:?}", String::from_utf8_lossy(&tolerant.stderr));
    assert!(tolerant.stderr.is_empty(), "stderr: {:?}", String::from_utf8_lossy(&tolerant.stderr));

    let strict = bin().arg(&root).output().unwrap();
    assert!(!strict.status.success());
    assert!(!strict.stderr.is_empty());
}

#[test]
fn default_expression_is_bare_print() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    let mut f = fs::File::create(root.join("a")).unwrap();
    f.write_all(b"x").unwrap();

    let output = bin().arg(&root).output().unwrap();
    assert!(output.status.success());
    let out = lines(&output.stdout);
    assert!(out.iter().any(|l| Path::new(l) == root));
    assert!(out.iter().any(|l| l.ends_with("root/a")));
}
