use clap::Parser;
use extcopy::cli::{Cli, EXIT_PARTIAL_FAILURE, exit_status, run_cli};
use extcopy::error::ExtcopyError;
/// Integration tests for extcopy
///
/// These tests build small source trees on disk and run the complete CLI
/// flow against them, then inspect the destination folder.
///
/// Test categories:
/// 1. Copying and exclusion
/// 2. Name collisions and repeated runs
/// 3. Extension selection and dry runs
/// 4. Log file, manifest and configuration
/// 5. Fatal and per-file errors
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A source tree and an empty area for the destination.
struct TestFixture {
    source: TempDir,
    work: TempDir,
}

impl TestFixture {
    /// Create a new test fixture with empty temporary directories.
    fn new() -> Self {
        TestFixture {
            source: TempDir::new().expect("Failed to create temp directory"),
            work: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    fn source(&self) -> &Path {
        self.source.path()
    }

    /// Destination folder; does not exist until a run creates it.
    fn dest(&self) -> PathBuf {
        self.work.path().join("dest")
    }

    /// Create a file (and its parent folders) in the source tree.
    fn create_file(&self, rel_path: &str, content: &[u8]) {
        let path = self.source().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file content");
    }

    /// Build a CLI invocation for this fixture with extra arguments.
    fn cli(&self, extra: &[&str]) -> Cli {
        let mut args: Vec<OsString> = vec![
            "extcopy".into(),
            self.source().into(),
            self.dest().into(),
            "--no-progress".into(),
        ];
        args.extend(extra.iter().map(OsString::from));
        Cli::parse_from(args)
    }

    /// Map of destination file name to content.
    fn dest_files(&self) -> BTreeMap<String, Vec<u8>> {
        let dest = self.dest();
        if !dest.exists() {
            return BTreeMap::new();
        }
        fs::read_dir(&dest)
            .expect("Failed to read destination")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| {
                (
                    entry.file_name().to_string_lossy().into_owned(),
                    fs::read(entry.path()).expect("Failed to read copy"),
                )
            })
            .collect()
    }

    /// Copies whose original name was `original`.
    fn copies_of(&self, original: &str) -> Vec<(String, Vec<u8>)> {
        let suffix = format!("_{}", original);
        self.dest_files()
            .into_iter()
            .filter(|(name, _)| name.ends_with(&suffix))
            .collect()
    }
}

/// Shared buffer that collects formatted tracing output.
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// True when permission bits do not stop this process (e.g. running as root).
#[cfg(unix)]
fn permissions_are_ignored(locked_dir: &Path) -> bool {
    fs::read_dir(locked_dir).is_ok()
}

// ============================================================================
// Test Suite 1: Copying and Exclusion
// ============================================================================

#[test]
fn test_copy_empty_source() {
    let fixture = TestFixture::new();

    let summary = run_cli(&fixture.cli(&[])).expect("Run should succeed");

    assert_eq!(summary.found, 0);
    assert!(fixture.dest().is_dir(), "Destination should be created");
    assert!(fixture.dest_files().is_empty());
}

#[test]
fn test_nested_tree_is_flattened_byte_identical() {
    let fixture = TestFixture::new();
    let binary: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    fixture.create_file("top.txt", b"top");
    fixture.create_file("2021/01/IMG_0001.jpg", &binary);
    fixture.create_file("2021/02/deep/clip.mp4", b"video bytes");

    let summary = run_cli(&fixture.cli(&[])).expect("Run should succeed");

    assert_eq!(summary.found, 3);
    assert_eq!(summary.copied, 3);
    assert_eq!(summary.failed, 0);

    let files = fixture.dest_files();
    assert_eq!(files.len(), 3);
    assert_eq!(fixture.copies_of("top.txt")[0].1, b"top");
    assert_eq!(fixture.copies_of("IMG_0001.jpg")[0].1, binary);
    assert_eq!(fixture.copies_of("clip.mp4")[0].1, b"video bytes");

    // Sources are copied, not moved.
    assert!(fixture.source().join("2021/01/IMG_0001.jpg").exists());
}

#[test]
fn test_exclude_temp_scenario() {
    let fixture = TestFixture::new();
    fixture.create_file("a/x.jpg", b"from a");
    fixture.create_file("a/x.jpg.temp", b"partial");
    fixture.create_file("b/x.jpg", b"from b");

    let summary = run_cli(&fixture.cli(&["--exclude", ".temp"])).expect("Run should succeed");

    assert_eq!(summary.found, 3);
    assert_eq!(summary.excluded, 1);
    assert_eq!(summary.copied, 2);

    let copies = fixture.copies_of("x.jpg");
    assert_eq!(copies.len(), 2, "Both x.jpg files should be copied");
    assert_ne!(copies[0].0, copies[1].0, "Copies must have distinct names");

    let mut contents: Vec<&[u8]> = copies.iter().map(|(_, c)| c.as_slice()).collect();
    contents.sort();
    assert_eq!(contents, vec![b"from a".as_slice(), b"from b".as_slice()]);

    assert!(fixture.copies_of("x.jpg.temp").is_empty());
    assert_eq!(fixture.dest_files().len(), 2);
}

#[test]
fn test_multiple_exclusions_and_case_sensitivity() {
    let fixture = TestFixture::new();
    fixture.create_file("photo.jpg", b"1");
    fixture.create_file("photo-edited.jpg", b"2");
    fixture.create_file("photo.jpg.json", b"3");
    fixture.create_file("PHOTO.JSON", b"4");

    let summary =
        run_cli(&fixture.cli(&["--exclude", "edited", ".json"])).expect("Run should succeed");

    assert_eq!(summary.excluded, 2);
    assert_eq!(summary.copied, 2);
    assert_eq!(fixture.copies_of("photo.jpg").len(), 1);
    assert_eq!(fixture.copies_of("PHOTO.JSON").len(), 1, "Match is case-sensitive");
}

// ============================================================================
// Test Suite 2: Name Collisions and Repeated Runs
// ============================================================================

#[test]
fn test_many_same_named_files_get_unique_names() {
    let fixture = TestFixture::new();
    for i in 0..25 {
        fixture.create_file(&format!("dir{:02}/IMG_0001.jpg", i), format!("{}", i).as_bytes());
    }

    let summary = run_cli(&fixture.cli(&[])).expect("Run should succeed");

    assert_eq!(summary.copied, 25);
    let copies = fixture.copies_of("IMG_0001.jpg");
    assert_eq!(copies.len(), 25);

    let mut contents: Vec<String> = copies
        .iter()
        .map(|(_, c)| String::from_utf8(c.clone()).unwrap())
        .collect();
    contents.sort_by_key(|c| c.parse::<u32>().unwrap());
    let expected: Vec<String> = (0..25).map(|i| i.to_string()).collect();
    assert_eq!(contents, expected);
}

#[test]
fn test_second_run_adds_new_copies() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", b"a");
    fixture.create_file("b.txt", b"b");

    run_cli(&fixture.cli(&[])).expect("First run should succeed");
    assert_eq!(fixture.dest_files().len(), 2);

    let summary = run_cli(&fixture.cli(&[])).expect("Second run should succeed");

    assert_eq!(summary.copied, 2);
    assert_eq!(fixture.dest_files().len(), 4, "Runs are not idempotent");
    assert_eq!(fixture.copies_of("a.txt").len(), 2);
}

#[test]
fn test_existing_destination_files_are_untouched() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", b"new");
    fs::create_dir_all(fixture.dest()).unwrap();
    fs::write(fixture.dest().join("a.txt"), b"keep me").unwrap();

    run_cli(&fixture.cli(&[])).expect("Run should succeed");

    assert_eq!(fs::read(fixture.dest().join("a.txt")).unwrap(), b"keep me");
    assert_eq!(fixture.dest_files().len(), 2);
}

#[test]
fn test_destination_inside_source() {
    let fixture = TestFixture::new();
    fixture.create_file("a.txt", b"a");
    let dest = fixture.source().join("collected");

    let cli = Cli::parse_from([
        OsString::from("extcopy"),
        fixture.source().into(),
        dest.clone().into(),
        "--no-progress".into(),
    ]);

    let first = run_cli(&cli).expect("First run should succeed");
    let second = run_cli(&cli).expect("Second run should succeed");

    assert_eq!(first.found, 1);
    assert_eq!(second.found, 1, "Earlier copies must not be picked up again");
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 2);
}

// ============================================================================
// Test Suite 3: Extension Selection and Dry Runs
// ============================================================================

#[test]
fn test_ext_limits_copied_extensions() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");
    fixture.create_file("b.JPG", b"b");
    fixture.create_file("c.png", b"c");
    fixture.create_file("README", b"d");

    let summary = run_cli(&fixture.cli(&["--ext", "jpg"])).expect("Run should succeed");

    assert_eq!(summary.found, 4);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.excluded, 2);
    assert_eq!(fixture.copies_of("a.jpg").len(), 1);
    assert_eq!(fixture.copies_of("b.JPG").len(), 1);
    assert!(fixture.copies_of("c.png").is_empty());
    assert!(fixture.copies_of("README").is_empty());
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = TestFixture::new();
    fixture.create_file("a/x.jpg", b"a");
    fixture.create_file("b/x.jpg", b"b");

    let summary = run_cli(&fixture.cli(&["--dry-run"])).expect("Run should succeed");

    assert!(summary.dry_run);
    assert_eq!(summary.copied, 2);
    assert!(!fixture.dest().exists(), "Dry run must not create the destination");
}

// ============================================================================
// Test Suite 4: Log File, Manifest and Configuration
// ============================================================================

#[test]
fn test_log_file_has_one_line_per_file_and_summary() {
    let fixture = TestFixture::new();
    fixture.create_file("keep.jpg", b"k");
    fixture.create_file("skip.jpg.temp", b"s");
    let log_path = fixture.work.path().join("logs").join("run.log");
    let log_arg = log_path.to_string_lossy().into_owned();

    run_cli(&fixture.cli(&["--exclude", ".temp", "--log-file", &log_arg]))
        .expect("Run should succeed");

    let log = fs::read_to_string(&log_path).expect("Log file should exist");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().any(|l| l.starts_with("copied") && l.contains("keep.jpg")));
    assert!(
        lines
            .iter()
            .any(|l| l.starts_with("excluded") && l.contains("name contains \".temp\""))
    );
    assert_eq!(
        lines[2],
        "summary  found 2, excluded 1, copied 1, failed 0"
    );
}

#[test]
fn test_default_run_logs_every_file() {
    let fixture = TestFixture::new();
    fixture.create_file("keep.jpg", b"k");
    fixture.create_file("skip.jpg.temp", b"s");

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let summary = tracing::subscriber::with_default(subscriber, || {
        run_cli(&fixture.cli(&["--exclude", ".temp"]))
    })
    .expect("Run should succeed");
    assert_eq!(summary.found, 2);

    let output = log.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert!(
        lines.iter().any(|l| l.contains("INFO")
            && l.contains("copied")
            && l.contains("keep.jpg ->")),
        "no record for the copied file in:\n{}",
        output
    );
    assert!(
        lines.iter().any(|l| l.contains("INFO")
            && l.contains("excluded")
            && l.contains("skip.jpg.temp (name contains \".temp\")")),
        "no record for the excluded file in:\n{}",
        output
    );
}

#[test]
fn test_manifest_records_every_file() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");
    fixture.create_file("b.jpg.temp", b"b");
    let manifest_path = fixture.work.path().join("manifest.json");
    let manifest_arg = manifest_path.to_string_lossy().into_owned();

    run_cli(&fixture.cli(&["--exclude", ".temp", "--manifest", &manifest_arg]))
        .expect("Run should succeed");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&manifest_path).unwrap()).unwrap();
    assert_eq!(json["records"].as_array().unwrap().len(), 2);
    assert_eq!(json["summary"]["found"], 2);
    assert_eq!(json["summary"]["excluded"], 1);
    assert_eq!(json["exclusions"][0], ".temp");
    assert!(json["started_at"].is_string());
}

#[test]
fn test_config_file_exclusions_merge_with_cli() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");
    fixture.create_file("a.jpg.json", b"meta");
    fixture.create_file("a.jpg.temp", b"tmp");
    let config_path = fixture.work.path().join("extcopy.toml");
    fs::write(&config_path, "[copy]\nexclude = [\".json\"]\n").unwrap();
    let config_arg = config_path.to_string_lossy().into_owned();

    let summary = run_cli(&fixture.cli(&["--config", &config_arg, "--exclude", ".temp"]))
        .expect("Run should succeed");

    assert_eq!(summary.excluded, 2);
    assert_eq!(summary.copied, 1);
}

#[test]
fn test_missing_config_file_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");

    let result = run_cli(&fixture.cli(&["--config", "/non/existent/extcopy.toml"]));

    assert!(matches!(result, Err(ExtcopyError::Config(_))));
    assert!(!fixture.dest().exists());
}

// ============================================================================
// Test Suite 5: Fatal and Per-File Errors
// ============================================================================

#[test]
fn test_missing_source_is_fatal() {
    let fixture = TestFixture::new();
    let missing = fixture.work.path().join("no_such_source");
    let cli = Cli::parse_from([
        OsString::from("extcopy"),
        missing.into(),
        fixture.dest().into(),
        "--no-progress".into(),
    ]);

    let result = run_cli(&cli);

    assert!(matches!(result, Err(ExtcopyError::NotFound(_))));
    assert!(!fixture.dest().exists(), "Nothing may be created on a fatal error");
}

#[cfg(unix)]
#[test]
fn test_unreadable_source_is_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");
    fs::set_permissions(fixture.source(), fs::Permissions::from_mode(0o000)).unwrap();

    if permissions_are_ignored(fixture.source()) {
        fs::set_permissions(fixture.source(), fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = run_cli(&fixture.cli(&[]));
    fs::set_permissions(fixture.source(), fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(ExtcopyError::Access { .. })));
    assert!(!fixture.dest().exists());
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_does_not_stop_run() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_file("ok/a.jpg", b"a");
    fixture.create_file("locked/b.jpg", b"b");
    fixture.create_file("z.jpg", b"z");
    let locked = fixture.source().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if permissions_are_ignored(&locked) {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = run_cli(&fixture.cli(&[]));
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let summary = result.expect("Run should complete");

    assert_eq!(summary.copied, 2);
    assert_eq!(summary.unreadable, 1);
    assert_eq!(exit_status(&summary, false), 0);
    assert_eq!(exit_status(&summary, true), EXIT_PARTIAL_FAILURE);
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_is_reported_and_run_continues() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_file("a.jpg", b"a");
    fixture.create_file("b.jpg", b"b");
    fixture.create_file("c.jpg", b"c");
    let locked = fixture.source().join("b.jpg");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read(&locked).is_ok() {
        return;
    }

    let summary = run_cli(&fixture.cli(&[])).expect("Run should complete");

    assert_eq!(summary.found, 3);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.failed, 1);
    assert!(fixture.copies_of("b.jpg").is_empty(), "No partial copy may remain");
    assert_eq!(
        fs::read_dir(fixture.dest()).unwrap().count(),
        2,
        "Only finished copies may be in the destination"
    );
}
