// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! CLI tests: the six subcommands end to end on a small dataset.

use assert_cmd::Command;
use predicates::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Write as _;
use std::path::Path;
use tempfile::tempdir;

const N: usize = 200;
const QN: usize = 3;
const D: usize = 4;

fn write_text_set(path: &Path, n: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut text = String::new();
    for i in 0..n {
        write!(text, "{}", i).unwrap();
        for _ in 0..D {
            write!(text, " {:.6}", rng.gen_range(-1.0f32..1.0)).unwrap();
        }
        text.push('\n');
    }
    std::fs::write(path, text).unwrap();
}

fn farbase() -> Command {
    Command::cargo_bin("farbase").unwrap()
}

#[test]
fn full_pipeline() {
    let dir = tempdir().unwrap();
    let ds = dir.path().join("data.txt");
    let qs = dir.path().join("query.txt");
    let ts = dir.path().join("truth.txt");
    let df = dir.path().join("df");
    let of = dir.path().join("of");

    write_text_set(&ds, N, 1);
    write_text_set(&qs, QN, 2);

    // ground-truth
    farbase()
        .args(["ground-truth", "-n", "200", "--qn", "3", "-d", "4"])
        .arg("--ds").arg(&ds)
        .arg("--qs").arg(&qs)
        .arg("--ts").arg(&ts)
        .assert()
        .success();
    let truth_text = std::fs::read_to_string(&ts).unwrap();
    assert!(truth_text.starts_with("3 10"));
    assert_eq!(truth_text.lines().count(), 1 + QN);

    // build RQALSH
    farbase()
        .args(["build", "-n", "200", "-d", "4", "-B", "4096"])
        .args(["--beta", "20", "--delta", "0.49", "-c", "2.0"])
        .arg("--ds").arg(&ds)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .success();
    assert!(of.join("rqalsh").join("para").exists());
    assert!(of.join("rqalsh").join("0.rqalsh").exists());
    assert!(of.join("rqalsh.index").exists());
    assert!(df.join("data").join("0.data").exists());

    // rebuilding over an existing index is refused
    farbase()
        .args(["build", "-n", "200", "-d", "4", "-B", "4096"])
        .args(["--beta", "20", "--delta", "0.49", "-c", "2.0"])
        .arg("--ds").arg(&ds)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    // query RQALSH
    farbase()
        .args(["query", "--qn", "3", "-d", "4"])
        .arg("--qs").arg(&qs)
        .arg("--ts").arg(&ts)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .success()
        .stdout(predicate::str::contains("RQALSH"));
    let out = std::fs::read_to_string(of.join("rqalsh.out")).unwrap();
    assert_eq!(out.lines().count(), 4);
    assert!(out.lines().next().unwrap().starts_with("1\t"));

    // build + query RQALSH* (L*M = 8, small enough to scan candidates)
    farbase()
        .args(["build-star", "-n", "200", "-d", "4", "-B", "4096"])
        .args(["-L", "2", "-M", "4", "--beta", "20", "--delta", "0.49", "-c", "2.0"])
        .arg("--ds").arg(&ds)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .success();
    assert!(of.join("rqalsh_star_L=2_M=4").join("rqalsh_star_para").exists());

    farbase()
        .args(["query-star", "--qn", "3", "-d", "4", "-L", "2", "-M", "4"])
        .arg("--qs").arg(&qs)
        .arg("--ts").arg(&ts)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .success();
    assert!(of.join("rqalsh_star_L=2_M=4.out").exists());

    // linear scan is exact: recall column is 100 for every k
    farbase()
        .args(["linear", "-n", "200", "--qn", "3", "-d", "4", "-B", "4096"])
        .arg("--qs").arg(&qs)
        .arg("--ts").arg(&ts)
        .arg("--df").arg(&df)
        .arg("--of").arg(&of)
        .assert()
        .success();
    let out = std::fs::read_to_string(of.join("linear.out")).unwrap();
    for line in out.lines() {
        let recall = line.split('\t').last().unwrap();
        assert!(recall.starts_with("100."), "line: {}", line);
    }
}

#[test]
fn rejects_bad_ratio() {
    let dir = tempdir().unwrap();
    let ds = dir.path().join("data.txt");
    write_text_set(&ds, 50, 3);

    farbase()
        .args(["build", "-n", "50", "-d", "4", "-B", "4096"])
        .args(["--beta", "10", "--delta", "0.49", "-c", "1.0"])
        .arg("--ds").arg(&ds)
        .arg("--df").arg(dir.path().join("df"))
        .arg("--of").arg(dir.path().join("of"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn rejects_missing_input_file() {
    let dir = tempdir().unwrap();

    farbase()
        .args(["ground-truth", "-n", "10", "--qn", "1", "-d", "4"])
        .arg("--ds").arg(dir.path().join("nope.txt"))
        .arg("--qs").arg(dir.path().join("nope.txt"))
        .arg("--ts").arg(dir.path().join("truth.txt"))
        .assert()
        .failure()
        .code(1);
}

#[test]
fn rejects_unknown_flag() {
    farbase().arg("--definitely-not-a-flag").assert().failure().code(1);
}
