use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const STARTUP_MESSAGE: &str = "loaded runtime configuration";

struct LogEnv<'a> {
    output: &'a str,
    format: &'a str,
    file_path: Option<&'a Path>,
    filter: &'a str,
}

impl Default for LogEnv<'_> {
    fn default() -> Self {
        Self {
            output: "stderr",
            format: "pretty",
            file_path: None,
            filter: "ramai=info",
        }
    }
}

/// One-shot run against a provider that does not exist, so the turn fails
/// without any network traffic.
fn run_one_shot(log: LogEnv<'_>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ramai"));
    cmd.arg("hi")
        .env("MODEL_PROVIDER", "invalid")
        .env("GEMINI_API_KEY", "test-key-not-logged")
        .env("RUST_LOG", log.filter)
        .env("LOG_OUTPUT", log.output)
        .env("LOG_FORMAT", log.format);

    match log.file_path {
        Some(path) => cmd.env("LOG_FILE_PATH", path),
        None => cmd.env_remove("LOG_FILE_PATH"),
    };

    cmd.output().expect("failed to run ramai binary")
}

fn unique_temp_dir(suffix: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock should be after unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ramai-logging-{suffix}-{stamp}-{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("failed to create temp directory");
    dir
}

fn read_rotated_log(dir: &Path, base_file_name: &str) -> String {
    let expected_prefix = format!("{base_file_name}.");
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .expect("failed to read temp directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&expected_prefix))
        })
        .collect();

    matches.sort();
    let path = matches
        .pop()
        .expect("expected a rotated log file to be created");
    fs::read_to_string(path).expect("failed to read rotated log file")
}

#[test]
fn failed_turn_exits_non_zero_with_reason_on_stderr() {
    let output = run_one_shot(LogEnv::default());
    assert!(!output.status.success(), "failed turn should fail command");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unsupported MODEL_PROVIDER='invalid'"),
        "expected failure reason on stderr:\n{stderr}"
    );
    assert!(
        !stderr.contains("test-key-not-logged"),
        "api key must not be logged:\n{stderr}"
    );
}

#[test]
fn json_format_emits_json_log_lines_on_stderr() {
    let output = run_one_shot(LogEnv {
        format: "json",
        ..LogEnv::default()
    });
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let parsed: Vec<Value> = stderr
        .lines()
        .filter(|line| line.trim_start().starts_with('{'))
        .map(|line| serde_json::from_str::<Value>(line).expect("line should be valid JSON"))
        .collect();
    assert!(!parsed.is_empty(), "expected JSON log lines, got:\n{stderr}");

    let startup = parsed
        .iter()
        .find(|entry| entry["fields"]["message"].as_str() == Some(STARTUP_MESSAGE))
        .unwrap_or_else(|| panic!("expected startup log in JSON output, got:\n{stderr}"));
    assert_eq!(startup["fields"]["provider"].as_str(), Some("invalid"));
    assert_eq!(startup["fields"]["api_key_set"].as_bool(), Some(true));
}

#[test]
fn rust_log_filter_can_silence_startup_logging() {
    let output = run_one_shot(LogEnv {
        filter: "ramai=error",
        ..LogEnv::default()
    });

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains(STARTUP_MESSAGE),
        "info logs should be filtered out:\n{stderr}"
    );
}

#[test]
fn file_output_writes_logs_to_rotated_file() {
    let dir = unique_temp_dir("file");
    let log_path = dir.join("ramai.log");
    let output = run_one_shot(LogEnv {
        output: "file",
        file_path: Some(&log_path),
        ..LogEnv::default()
    });
    assert!(!output.status.success());

    let file_contents = read_rotated_log(&dir, "ramai.log");
    assert!(
        file_contents.contains(STARTUP_MESSAGE),
        "expected startup log message in file, got:\n{file_contents}"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains(STARTUP_MESSAGE),
        "did not expect normal logs on stderr for file-only mode:\n{stderr}"
    );
    assert!(
        stderr.contains("Unsupported MODEL_PROVIDER"),
        "expected command error output on stderr:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn both_output_writes_logs_to_stderr_and_file() {
    let dir = unique_temp_dir("both");
    let log_path = dir.join("ramai.log");
    let output = run_one_shot(LogEnv {
        output: "both",
        file_path: Some(&log_path),
        ..LogEnv::default()
    });
    assert!(!output.status.success());

    let file_contents = read_rotated_log(&dir, "ramai.log");
    assert!(file_contents.contains(STARTUP_MESSAGE), "{file_contents}");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(STARTUP_MESSAGE), "{stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_file_path_falls_back_to_stderr_logging() {
    let dir = unique_temp_dir("fallback");
    let blocking_file = dir.join("not-a-directory");
    fs::write(&blocking_file, "block").expect("failed to create blocking file");
    let log_path = blocking_file.join("ramai.log");

    let output = run_one_shot(LogEnv {
        output: "file",
        file_path: Some(&log_path),
        ..LogEnv::default()
    });
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to initialize LOG_OUTPUT=file"),
        "expected fallback warning, got:\n{stderr}"
    );
    assert!(stderr.contains("using stderr instead"), "{stderr}");
    assert!(
        stderr.contains(STARTUP_MESSAGE),
        "expected logs to continue on stderr after fallback, got:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}
