//! Integration tests for the colordb-pdf CLI binary.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_colordb-pdf"))
}

#[test]
fn test_cli_help() {
    let output = Command::new(get_binary_path())
        .arg("--help")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("catalog"));
    assert!(stdout.contains("embedded-export"));
    assert!(stdout.contains("pdf2text"));
}

#[test]
fn test_cli_version() {
    let output = Command::new(get_binary_path())
        .arg("--version")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("colordb-pdf"));
}

#[test]
fn test_cli_catalog_writes_pdf() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("colors.pdf");

    let output = Command::new(get_binary_path())
        .arg("catalog")
        .arg("--output")
        .arg(&output_path)
        .arg("--author")
        .arg("Test Author")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let pdf = fs::read(&output_path).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));

    let doc = lopdf::Document::load_mem(&pdf).unwrap();
    let colors = colordb_pdf::builtin_catalog().len();
    assert_eq!(doc.get_pages().len(), colors.div_ceil(100));
}

#[test]
fn test_cli_catalog_save_options() {
    let temp_dir = TempDir::new().unwrap();
    let compact = temp_dir.path().join("compact.pdf");
    let plain = temp_dir.path().join("plain.pdf");

    let output = Command::new(get_binary_path())
        .args(["catalog", "--output"])
        .arg(&compact)
        .output()
        .expect("Failed to run binary");
    assert!(output.status.success());

    let output = Command::new(get_binary_path())
        .args(["catalog", "--garbage", "0", "--no-deflate", "--no-clean", "--output"])
        .arg(&plain)
        .output()
        .expect("Failed to run binary");
    assert!(output.status.success());

    let pages = colordb_pdf::builtin_catalog().len().div_ceil(100);
    for path in [&compact, &plain] {
        let doc = lopdf::Document::load_mem(&fs::read(path).unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), pages, "{}", path.display());
    }
}

#[test]
fn test_cli_catalog_rejects_bad_garbage_level() {
    let output = Command::new(get_binary_path())
        .args(["catalog", "--garbage", "many", "--dry-run"])
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
}

#[test]
fn test_cli_catalog_dry_run() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("rgb.txt");
    fs::write(&catalog, "255 0 0 red\n0 255 0 green\n0 0 255 blue\n").unwrap();
    let output_path = temp_dir.path().join("unused.pdf");

    let output = Command::new(get_binary_path())
        .arg("catalog")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--output")
        .arg(&output_path)
        .arg("--dry-run")
        .output()
        .expect("Failed to run binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 colors, 1 pages, 10 drawing calls"));
    assert!(!output_path.exists());
}

#[test]
fn test_cli_catalog_empty_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = temp_dir.path().join("empty.txt");
    fs::write(&catalog, "# nothing here\n").unwrap();
    let output_path = temp_dir.path().join("empty.pdf");

    let output = Command::new(get_binary_path())
        .arg("catalog")
        .arg("--catalog")
        .arg(&catalog)
        .arg("--output")
        .arg(&output_path)
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Color catalog is empty"));
    assert!(!output_path.exists());
}

#[test]
fn test_cli_missing_file() {
    let output = Command::new(get_binary_path())
        .arg("pdf2text")
        .arg("nonexistent-file.pdf")
        .output()
        .expect("Failed to run binary");

    // Should fail with exit code 1
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("File not found"));
}

#[test]
fn test_cli_embedded_export_requires_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("in.pdf");
    fs::write(&input, b"%PDF-1.7").unwrap();

    let output = Command::new(get_binary_path())
        .arg("embedded-export")
        .arg(&input)
        .arg("attachment.txt")
        .output()
        .expect("Failed to run binary");

    assert!(!output.status.success());
}
