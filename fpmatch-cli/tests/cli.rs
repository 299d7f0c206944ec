use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{GrayImage, Luma};
use tempfile::TempDir;

fn write_image(dir: &TempDir, name: &str, f: fn(u32, u32) -> u8) -> PathBuf {
    let path = dir.path().join(name);
    GrayImage::from_fn(100, 100, |x, y| Luma([f(x, y)]))
        .save(&path)
        .unwrap();
    path
}

fn corner(x: u32, y: u32) -> u8 {
    if x >= 50 && y >= 50 {
        200
    } else {
        50
    }
}

fn fpmatch(a: &Path, b: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fpmatch"))
        .arg(a)
        .arg(b)
        .args(extra)
        .output()
        .unwrap()
}

#[test]
fn prints_percentage_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_image(&dir, "a.png", corner);

    let output = fpmatch(&a, &a, &["--threads", "2"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "Matching Percentage: 100.00 %\n");
}

#[test]
fn missing_image_exits_two() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_image(&dir, "a.png", corner);
    let missing = dir.path().join("missing.png");

    let output = fpmatch(&a, &missing, &[]);
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn blank_reference_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let blank = write_image(&dir, "blank.png", |_, _| 255);
    let b = write_image(&dir, "b.png", corner);

    let output = fpmatch(&blank, &b, &[]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("No keypoints"));
}

#[test]
fn oversized_precision_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_image(&dir, "a.png", corner);

    let output = fpmatch(&a, &a, &["--precision", "100000"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}
