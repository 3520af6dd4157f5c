//! Command-line tests for the wkmp-pk binary
//!
//! Each test runs the compiled binary with a private config directory so a
//! user's own `wkmp-pk.toml` cannot leak in.

mod helpers;

use helpers::{generate_sine_wav, write_wav_i16, FixtureDir};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn wkmp_pk(fixtures: &FixtureDir, args: &[&str]) -> Output {
    let config_home = fixtures.path("config-home");
    fs::create_dir_all(&config_home).unwrap();

    Command::new(env!("CARGO_BIN_EXE_wkmp-pk"))
        .args(args)
        .env("XDG_CONFIG_HOME", &config_home)
        .env("HOME", &config_home)
        .env_remove("RUST_LOG")
        .env_remove("WKMP_PK_INPUT")
        .env_remove("WKMP_PK_FRAMES_PER_PACKET")
        .env_remove("WKMP_PK_LOG_LEVEL")
        .output()
        .expect("Failed to run wkmp-pk")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn read_summary(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// **Given:** A 2500-frame WAV
/// **When:** wkmp-pk runs with --output and --export
/// **Then:** Exit 0, raw PCM matches the file, summary reports 3 packets
#[test]
fn test_success_writes_output_and_summary() {
    let fixtures = FixtureDir::new();
    let input = fixtures.path("audio_file.wav");
    let output = fixtures.path("out.pcm");
    let export = fixtures.path("summary.json");
    let expected = write_wav_i16(&input, 2, 44100, 2500).unwrap();

    let result = wkmp_pk(
        &fixtures,
        &[
            path_arg(&input),
            "--output",
            path_arg(&output),
            "--export",
            path_arg(&export),
        ],
    );

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    assert_eq!(fs::read(&output).unwrap(), expected);

    let summary = read_summary(&export);
    assert_eq!(summary["geometry"]["total_frames"], 2500);
    assert_eq!(summary["geometry"]["total_packets"], 3);
    assert_eq!(summary["geometry"]["frames_per_packet"], 1024);
    assert_eq!(summary["geometry"]["packet_size_in_bytes"], 4096);
    assert_eq!(summary["packets_produced"], 3);
    assert_eq!(summary["bytes_produced"], 10_000);
}

/// **Given:** A path that does not exist
/// **When:** wkmp-pk runs
/// **Then:** Exit 2 with a message naming the source open stage
#[test]
fn test_missing_input_exits_with_source_open_code() {
    let fixtures = FixtureDir::new();
    let missing = fixtures.path("no_such_file.wav");

    let result = wkmp_pk(&fixtures, &[path_arg(&missing)]);

    assert_eq!(result.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("source open failed"), "stderr: {}", stderr);
    assert!(stderr.contains("no_such_file.wav"), "stderr: {}", stderr);
}

/// **Given:** A file that is not audio
/// **When:** wkmp-pk runs
/// **Then:** Exit 2
#[test]
fn test_unsupported_input_exits_with_source_open_code() {
    let fixtures = FixtureDir::new();
    let input = fixtures.path("notes.txt");
    fs::write(&input, "not audio at all\n".repeat(100)).unwrap();

    let result = wkmp_pk(&fixtures, &[path_arg(&input)]);

    assert_eq!(result.status.code(), Some(2));
}

/// **Given:** --frames-per-packet 0
/// **When:** wkmp-pk runs
/// **Then:** Exit 1 (configuration)
#[test]
fn test_zero_frames_per_packet_is_config_error() {
    let fixtures = FixtureDir::new();
    let input = fixtures.path("audio_file.wav");
    write_wav_i16(&input, 2, 44100, 100).unwrap();

    let result = wkmp_pk(&fixtures, &[path_arg(&input), "--frames-per-packet", "0"]);

    assert_eq!(result.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("frames_per_packet"), "stderr: {}", stderr);
}

/// **Given:** An explicit --config path that does not exist
/// **When:** wkmp-pk runs
/// **Then:** Exit 1
#[test]
fn test_missing_explicit_config_is_config_error() {
    let fixtures = FixtureDir::new();
    let config = fixtures.path("missing.toml");

    let result = wkmp_pk(&fixtures, &["--config", path_arg(&config)]);

    assert_eq!(result.status.code(), Some(1));
}

/// **Given:** A TOML file naming the input, packet size and a log file
/// **When:** wkmp-pk runs with only --config
/// **Then:** The TOML values are used and the log file records the run
#[test]
fn test_config_file_supplies_settings() {
    let fixtures = FixtureDir::new();
    let input = fixtures.path("sine.wav");
    let export = fixtures.path("summary.json");
    let log_file = fixtures.path("wkmp-pk.log");
    let config = fixtures.path("wkmp-pk.toml");
    generate_sine_wav(&input, 2000, 440.0, 0.5).unwrap();

    fs::write(
        &config,
        format!(
            "input = {:?}\nframes_per_packet = 500\n\n[logging]\nlevel = \"debug\"\nfile = {:?}\n",
            path_arg(&input),
            path_arg(&log_file)
        ),
    )
    .unwrap();

    let result = wkmp_pk(
        &fixtures,
        &["--config", path_arg(&config), "--export", path_arg(&export)],
    );

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );

    let summary = read_summary(&export);
    assert_eq!(summary["geometry"]["frames_per_packet"], 500);
    assert_eq!(summary["geometry"]["total_packets"], 4);

    let log = fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("Total Packets: 4"), "log: {}", log);
    assert!(log.contains("Configuration loaded from"), "log: {}", log);
}

/// **Given:** WKMP_PK_FRAMES_PER_PACKET in the environment and in TOML
/// **When:** wkmp-pk runs
/// **Then:** The environment wins over the file
#[test]
fn test_environment_overrides_config_file() {
    let fixtures = FixtureDir::new();
    let input = fixtures.path("audio_file.wav");
    let export = fixtures.path("summary.json");
    let config = fixtures.path("wkmp-pk.toml");
    write_wav_i16(&input, 1, 8000, 1000).unwrap();
    fs::write(&config, "frames_per_packet = 500\n").unwrap();

    let config_home = fixtures.path("config-home");
    fs::create_dir_all(&config_home).unwrap();
    let result = Command::new(env!("CARGO_BIN_EXE_wkmp-pk"))
        .args([
            path_arg(&input),
            "--config",
            path_arg(&config),
            "--export",
            path_arg(&export),
        ])
        .env("XDG_CONFIG_HOME", &config_home)
        .env("HOME", &config_home)
        .env("WKMP_PK_FRAMES_PER_PACKET", "100")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert!(result.status.success());
    let summary = read_summary(&export);
    assert_eq!(summary["geometry"]["frames_per_packet"], 100);
    assert_eq!(summary["packets_produced"], 10);
}
