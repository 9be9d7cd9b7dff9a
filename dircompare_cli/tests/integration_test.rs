use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Helper struct to manage test directories
struct TestFixture {
    temp_dir: TempDir,
    left_dir: PathBuf,
    right_dir: PathBuf,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let left_dir = temp_dir.path().join("left");
        let right_dir = temp_dir.path().join("right");

        fs::create_dir(&left_dir).expect("Failed to create left dir");
        fs::create_dir(&right_dir).expect("Failed to create right dir");

        TestFixture {
            temp_dir,
            left_dir,
            right_dir,
        }
    }

    fn create_left_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.left_dir, path, content)
    }

    fn create_right_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.right_dir, path, content)
    }

    fn create_file<P: AsRef<Path>>(&self, base: &Path, path: P, content: &str) -> PathBuf {
        let file_path = base.join(path.as_ref());
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    fn left(&self) -> &str {
        self.left_dir.to_str().expect("Invalid left path")
    }

    fn right(&self) -> &str {
        self.right_dir.to_str().expect("Invalid right path")
    }

    /// Scratch directory used as working directory and config home
    fn work_dir(&self) -> PathBuf {
        let dir = self.temp_dir.path().join("work");
        fs::create_dir_all(&dir).expect("Failed to create work dir");
        dir
    }
}

fn run_cli(fixture: &TestFixture, args: &[&str]) -> std::process::Output {
    let exe = env!("CARGO_BIN_EXE_dircompare");
    let work = fixture.work_dir();
    Command::new(exe)
        .args(args)
        .current_dir(&work)
        .env("XDG_CONFIG_HOME", &work)
        .env("APPDATA", &work)
        .env("HOME", &work)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run dircompare")
}

fn run_cli_success(fixture: &TestFixture, args: &[&str]) -> String {
    let output = run_cli(fixture, args);
    assert!(
        output.status.success(),
        "command failed: {}\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout not utf-8")
}

fn run_cli_json(fixture: &TestFixture, args: &[&str]) -> Value {
    let stdout = run_cli_success(fixture, args);
    serde_json::from_str(&stdout).expect("invalid json output")
}

fn compare_json(fixture: &TestFixture, extra: &[&str]) -> Value {
    let mut args = vec!["compare", fixture.left(), fixture.right(), "--json"];
    args.extend_from_slice(extra);
    run_cli_json(fixture, &args)
}

fn statuses_by_path(report: &Value) -> HashMap<String, String> {
    report["entries"]
        .as_array()
        .expect("entries array missing")
        .iter()
        .map(|entry| {
            (
                entry["relative_path"].as_str().unwrap_or("").to_string(),
                entry["status"].as_str().unwrap_or("").to_string(),
            )
        })
        .collect()
}

#[test]
fn test_identical_directories() {
    let fixture = TestFixture::new();
    fixture.create_left_file("file.txt", "same");
    fixture.create_right_file("file.txt", "same");
    fixture.create_left_file("sub/inner.txt", "same");
    fixture.create_right_file("sub/inner.txt", "same");

    let report = compare_json(&fixture, &[]);

    assert_eq!(report["tree"]["name"], "right");
    assert_eq!(report["tree"]["status"], "IDENTICAL");
    assert_eq!(report["summary"]["total"], 3);
    assert_eq!(report["summary"]["identical"], 3);
    assert_eq!(report["moves"].as_array().unwrap().len(), 0);
}

#[test]
fn test_added_removed_and_modified() {
    let fixture = TestFixture::new();
    fixture.create_left_file("changed.txt", "one\ntwo");
    fixture.create_right_file("changed.txt", "one\nTWO");
    fixture.create_left_file("gone.txt", "bye");
    fixture.create_right_file("fresh.txt", "hi");

    let report = compare_json(&fixture, &[]);
    let statuses = statuses_by_path(&report);

    assert_eq!(statuses[""], "MODIFIED");
    assert_eq!(statuses["changed.txt"], "MODIFIED");
    assert_eq!(statuses["gone.txt"], "REMOVED");
    assert_eq!(statuses["fresh.txt"], "ADDED");

    let changed = report["entries"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["relative_path"] == "changed.txt")
        .unwrap();
    assert_eq!(changed["modified"], 1);
    assert_eq!(changed["percentage"], 50.0);
}

#[test]
fn test_moved_file_is_detected() {
    let fixture = TestFixture::new();
    let source = "package com.example;\n\npublic class Widget {}\n";
    fixture.create_left_file("old/Widget.java", source);
    fixture.create_right_file("new/Widget.java", source);

    let report = compare_json(&fixture, &[]);
    let statuses = statuses_by_path(&report);

    assert_eq!(statuses["new/Widget.java"], "MOVED");
    assert!(!statuses.contains_key("old/Widget.java"));
    assert!(!statuses.contains_key("old"));

    let moves = report["moves"].as_array().unwrap();
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0]["source_path"], "old/Widget.java");
    assert_eq!(moves[0]["destination_path"], "new/Widget.java");
    assert_eq!(report["summary"]["moved"], 1);
}

#[test]
fn test_no_moves_flag() {
    let fixture = TestFixture::new();
    fixture.create_left_file("old/Widget.java", "package a;");
    fixture.create_right_file("new/Widget.java", "package a;");

    let report = compare_json(&fixture, &["--no-moves"]);
    let statuses = statuses_by_path(&report);

    assert_eq!(statuses["old/Widget.java"], "REMOVED");
    assert_eq!(statuses["new/Widget.java"], "ADDED");
    assert!(report["moves"].as_array().unwrap().is_empty());
}

#[test]
fn test_diff_only_flag() {
    let fixture = TestFixture::new();
    fixture.create_left_file("same.txt", "x");
    fixture.create_right_file("same.txt", "x");
    fixture.create_left_file("diff.txt", "a");
    fixture.create_right_file("diff.txt", "b");

    let report = compare_json(&fixture, &["--diff-only"]);
    let statuses = statuses_by_path(&report);

    assert!(!statuses.contains_key("same.txt"));
    assert_eq!(statuses["diff.txt"], "MODIFIED");
    // Summary still counts everything
    assert_eq!(report["summary"]["identical"], 1);
}

#[test]
fn test_ignore_patterns() {
    let fixture = TestFixture::new();
    fixture.create_left_file("keep.txt", "a");
    fixture.create_right_file("keep.txt", "a");
    fixture.create_right_file("debug.log", "noise");
    fixture.create_right_file("node_modules/pkg/index.js", "noise");

    let report = compare_json(&fixture, &["--ignore", "*.log"]);
    let statuses = statuses_by_path(&report);

    assert!(!statuses.contains_key("debug.log"));
    assert!(!statuses.contains_key("node_modules"));
    assert_eq!(report["tree"]["status"], "IDENTICAL");
}

#[test]
fn test_ignore_file_replaces_defaults() {
    let fixture = TestFixture::new();
    fixture.create_right_file("node_modules/pkg/index.js", "kept now");
    fixture.create_right_file("secret/key.pem", "hidden");
    let ignore_file = fixture.temp_dir.path().join("ignore-list");
    fs::write(&ignore_file, "# local rules\nsecret\n").unwrap();

    let report = compare_json(
        &fixture,
        &["--ignore-file", ignore_file.to_str().unwrap()],
    );
    let statuses = statuses_by_path(&report);

    assert!(!statuses.contains_key("secret"));
    assert_eq!(statuses["node_modules"], "ADDED");
}

#[test]
fn test_tree_output() {
    let fixture = TestFixture::new();
    fixture.create_left_file("docs/readme.md", "old");
    fixture.create_right_file("docs/readme.md", "new");
    fixture.create_right_file("added.txt", "x");

    let stdout = run_cli_success(&fixture, &["compare", fixture.left(), fixture.right(), "--no-color"]);

    assert!(stdout.contains("Comparison Results"));
    assert!(stdout.contains("!= right/"));
    assert!(stdout.contains("  != docs/"));
    assert!(stdout.contains("    != readme.md"));
    assert!(stdout.contains(">> added.txt"));
    assert!(stdout.contains("Summary:"));
    assert!(!stdout.contains("\x1b["));
}

#[test]
fn test_table_output() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.txt", "1\n2");
    fixture.create_right_file("a.txt", "1\n3");

    let stdout = run_cli_success(
        &fixture,
        &["compare", fixture.left(), fixture.right(), "--table", "--no-color"],
    );

    assert!(stdout.contains("Status"));
    assert!(stdout.contains("50.0%"));
    assert!(stdout.contains("right/a.txt"));
}

#[test]
fn test_table_hides_stats_for_moved_rows() {
    let fixture = TestFixture::new();
    let source = "package com.example;\n\npublic class Widget {}\n";
    fixture.create_left_file("old/Widget.java", source);
    fixture.create_right_file("new/Widget.java", source);

    let stdout = run_cli_success(
        &fixture,
        &["compare", fixture.left(), fixture.right(), "--table", "--no-color"],
    );

    let moved_row = stdout
        .lines()
        .find(|line| line.contains("<- old/Widget.java"))
        .expect("moved row missing");
    assert!(!moved_row.contains('%'), "unexpected stats: {}", moved_row);
    assert_eq!(moved_row.split_whitespace().filter(|cell| *cell == "-").count(), 4);
}

#[test]
fn test_diff_command_json() {
    let fixture = TestFixture::new();
    fixture.create_left_file("old/notes.txt", "one\ntwo\nthree");
    fixture.create_right_file("new/notes.txt", "one\n2\nthree\nfour");

    let diff = run_cli_json(
        &fixture,
        &[
            "diff",
            fixture.left(),
            fixture.right(),
            "new/notes.txt",
            "--source",
            "old/notes.txt",
            "--json",
        ],
    );

    let statuses: Vec<_> = diff["lines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses, vec!["IDENTICAL", "MODIFIED", "IDENTICAL", "ADDED"]);
    assert_eq!(diff["percentage"], 50.0);
    assert!(diff["lines"][3]["left"].is_null());
}

#[test]
fn test_diff_command_text() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.txt", "alpha\nbeta");
    fixture.create_right_file("a.txt", "alpha");

    let stdout = run_cli_success(
        &fixture,
        &["diff", fixture.left(), fixture.right(), "a.txt", "--no-color"],
    );

    assert!(stdout.contains("- beta"));
    assert!(stdout.contains("0 added, 0 modified, 1 removed (50.0% changed)"));
}

#[test]
fn test_export_csv() {
    let fixture = TestFixture::new();
    fixture.create_left_file("Main.java", "class Main {}");
    fixture.create_right_file("Main.java", "class Main { }");
    fixture.create_right_file("app.yml", "key: value");

    let stdout = run_cli_success(&fixture, &["export", fixture.left(), fixture.right()]);
    let lines: Vec<_> = stdout.lines().collect();

    assert_eq!(
        lines[0],
        "Destination Path,Source Path,Type,Status,Diff %,Added,Modified,Deleted"
    );
    assert_eq!(
        lines[1],
        "\"right\",\"\",\"Directory\",\"MODIFIED\",\"-\",\"-\",\"-\",\"-\""
    );
    assert!(lines.contains(&"\"right/Main.java\",\"\",\"File\",\"MODIFIED\",\"100.0%\",\"0\",\"1\",\"0\""));
    assert!(lines.contains(&"\"right/app.yml\",\"\",\"File\",\"ADDED\",\"100.0%\",\"1\",\"0\",\"0\""));
}

#[test]
fn test_export_filters_to_file() {
    let fixture = TestFixture::new();
    fixture.create_left_file("Main.java", "a");
    fixture.create_right_file("Main.java", "b");
    fixture.create_right_file("app.yaml", "x");
    let out = fixture.temp_dir.path().join("report.csv");

    run_cli_success(
        &fixture,
        &[
            "export",
            fixture.left(),
            fixture.right(),
            "--type",
            "yaml",
            "--status",
            "added",
            "-o",
            out.to_str().unwrap(),
        ],
    );

    let content = fs::read_to_string(&out).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("\"right/app.yaml\""));
}

#[test]
fn test_ls_json() {
    let fixture = TestFixture::new();
    fixture.create_left_file(".git/HEAD", "ref");
    fixture.create_left_file("b/file.txt", "x");
    fixture.create_left_file("a/file.txt", "x");
    fixture.create_left_file("plain.txt", "x");

    let items = run_cli_json(&fixture, &["ls", fixture.left(), "--json"]);
    let names: Vec<_> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_ls_missing_path_is_empty() {
    let fixture = TestFixture::new();
    let missing = fixture.temp_dir.path().join("missing");

    let items = run_cli_json(&fixture, &["ls", missing.to_str().unwrap(), "--json"]);
    assert!(items.as_array().unwrap().is_empty());
}
