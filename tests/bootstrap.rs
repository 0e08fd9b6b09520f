//! End-to-end runs of the bootstrap against scratch config files.

use std::fs;
use std::path::Path;

use lineage::{
    print_configuration, ArgumentList, Bootstrap, BootstrapError, ConfigError, LineageConfig,
    Outcome, Runnable, Selection, StopReason, DEFAULT_CONFIG_FILE,
};
use tempfile::TempDir;

const SAMPLE_CONFIG: &str = r#"
[general]
seed = 12

[evolution]
pop_size = 400
selection = "lexicase"

[landscape]
problem = 6
"#;

struct Run {
    outcome: Result<Outcome, BootstrapError>,
    stdout: String,
    stderr: String,
}

fn run_with(config_path: &Path, args: &[&str], runner: Option<&mut dyn Runnable>) -> Run {
    let mut tokens = vec!["lineage"];
    tokens.extend_from_slice(args);
    let mut out = Vec::new();
    let mut err = Vec::new();

    let outcome = Bootstrap::new(config_path).run(
        &ArgumentList::from_tokens(tokens),
        &mut out,
        &mut err,
        runner,
    );

    Run {
        outcome,
        stdout: String::from_utf8(out).expect("stdout is utf-8"),
        stderr: String::from_utf8(err).expect("stderr is utf-8"),
    }
}

fn run(config_path: &Path, args: &[&str]) -> Run {
    run_with(config_path, args, None)
}

fn sample_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), SAMPLE_CONFIG).expect("write config");
    dir
}

fn completed_config(run: Run) -> LineageConfig {
    match run.outcome.expect("bootstrap succeeds") {
        Outcome::Completed(config) => config,
        Outcome::Stopped(reason) => panic!("unexpected stop: {reason}"),
    }
}

#[test]
fn test_no_arguments_print_banner_and_dump() {
    let dir = sample_dir();
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &[]);

    assert!(result.stdout.starts_with(
        "==============================\n|    How am I configured?    |\n==============================\n"
    ));
    assert!(result.stdout.ends_with("==============================\n\n"));
    assert!(result.stdout.contains("pop_size = 400\n"));
    assert!(result.stderr.is_empty());

    let outcome = result.outcome.expect("bootstrap succeeds");
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_printed_dump_matches_write_of_resolved_config() {
    let dir = sample_dir();
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &["--generations", "50"]);
    let stdout = result.stdout.clone();
    let config = completed_config(result);

    let mut expected = Vec::new();
    print_configuration(&config, &mut expected).expect("print");
    assert_eq!(stdout.as_bytes(), expected.as_slice());
    assert_eq!(config.evolution.generations, 50);
}

#[test]
fn test_repeated_runs_print_identical_bytes() {
    let dir = sample_dir();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);

    let first = run(&path, &[]);
    let second = run(&path, &[]);

    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_help_stops_without_banner() {
    let dir = sample_dir();
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &["--help"]);

    assert!(!result.stdout.contains("How am I configured?"));
    assert!(result.stdout.contains("Usage:"));
    let outcome = result.outcome.expect("bootstrap succeeds");
    assert!(matches!(outcome, Outcome::Stopped(StopReason::Help)));
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_unknown_argument_stops_cleanly() {
    let dir = sample_dir();
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &["--not-an-option"]);

    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("--not-an-option"));
    let outcome = result.outcome.expect("bootstrap succeeds");
    assert!(matches!(outcome, Outcome::Stopped(StopReason::UnknownArguments)));
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &[]);

    assert_eq!(completed_config(result), LineageConfig::default());
}

#[test]
fn test_file_values_are_loaded_and_overridden() {
    let dir = sample_dir();
    let result = run(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &["--seed", "99", "--set", "systematics.record_interval=10"],
    );
    let config = completed_config(result);

    assert_eq!(config.general.seed, 99);
    assert_eq!(config.evolution.pop_size, 400);
    assert_eq!(config.evolution.selection, Selection::Lexicase);
    assert_eq!(config.landscape.problem, 6);
    assert_eq!(config.systematics.record_interval, 10);
}

#[test]
fn test_invalid_override_stops_cleanly() {
    let dir = sample_dir();
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &["--problem", "0"]);

    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("landscape.problem"));
    let outcome = result.outcome.expect("bootstrap succeeds");
    assert!(matches!(outcome, Outcome::Stopped(StopReason::InvalidConfig)));
    assert_eq!(outcome.exit_code(), 0);
}

#[test]
fn test_malformed_config_file_is_an_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "[evolution]\npop_size = \"many\"\n").expect("write config");

    let result = run(&path, &[]);

    assert!(matches!(
        result.outcome,
        Err(BootstrapError::Config(ConfigError::Parse(_)))
    ));
    assert!(result.stdout.is_empty());
}

#[test]
fn test_gen_output_reads_back_as_same_config() {
    let dir = sample_dir();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    let resolved = completed_config(run(&path, &["--pop-size", "64"]));

    let generated = run(&path, &["--gen", "--pop-size", "64"]);
    assert!(generated.stdout.starts_with("Generating new config file: "));
    match generated.outcome.expect("bootstrap succeeds") {
        Outcome::Stopped(StopReason::ConfigGenerated(written)) => assert_eq!(written, path),
        other => panic!("unexpected outcome: {other:?}"),
    }

    assert_eq!(completed_config(run(&path, &[])), resolved);
}

#[test]
fn test_runner_receives_printed_config() {
    let dir = sample_dir();
    let mut seen: Option<LineageConfig> = None;
    let mut runner = |config: &LineageConfig| -> anyhow::Result<()> {
        seen = Some(config.clone());
        Ok(())
    };

    let result = run_with(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &["--mut-rate", "0.2"],
        Some(&mut runner as &mut dyn Runnable),
    );
    let printed = completed_config(result);

    assert_eq!(seen, Some(printed));
}

#[test]
fn test_runner_failure_is_an_error() {
    let dir = sample_dir();
    let mut runner =
        |_: &LineageConfig| -> anyhow::Result<()> { Err(anyhow::anyhow!("engine exploded")) };

    let result = run_with(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &[],
        Some(&mut runner as &mut dyn Runnable),
    );

    let err = result.outcome.expect_err("runner error propagates");
    assert!(matches!(err, BootstrapError::Run(_)));
    assert!(err.to_string().contains("engine exploded"));
}

#[test]
fn test_runner_not_called_when_stopping() {
    let dir = sample_dir();
    let mut calls = 0;
    let mut runner = |_: &LineageConfig| -> anyhow::Result<()> {
        calls += 1;
        Ok(())
    };

    let result = run_with(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &["--write"],
        Some(&mut runner as &mut dyn Runnable),
    );

    assert!(matches!(
        result.outcome,
        Ok(Outcome::Stopped(StopReason::ConfigWritten))
    ));
    assert_eq!(calls, 0);
}

const SMALL_POPULATION_CONFIG: &str = "[evolution]\npop_size = 5\n";

fn dir_with(contents: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join(DEFAULT_CONFIG_FILE), contents).expect("write config");
    dir
}

fn stop_reason(run: Run) -> StopReason {
    match run.outcome.expect("bootstrap succeeds") {
        Outcome::Stopped(reason) => reason,
        Outcome::Completed(_) => panic!("expected the bootstrap to stop"),
    }
}

#[test]
fn test_help_ignores_config_that_needs_an_override() {
    let dir = dir_with(SMALL_POPULATION_CONFIG);
    let result = run(&dir.path().join(DEFAULT_CONFIG_FILE), &["--help"]);

    assert!(result.stdout.contains("Usage:"));
    assert_eq!(stop_reason(result), StopReason::Help);
}

#[test]
fn test_partial_config_is_checked_after_overrides() {
    let dir = dir_with(SMALL_POPULATION_CONFIG);
    let path = dir.path().join(DEFAULT_CONFIG_FILE);

    let rejected = run(&path, &[]);
    assert!(rejected.stdout.is_empty());
    assert!(rejected.stderr.contains("evolution.tournament_size"));
    assert_eq!(stop_reason(rejected), StopReason::InvalidConfig);

    let config = completed_config(run(&path, &["--set", "evolution.tournament_size=3"]));
    assert_eq!(config.evolution.pop_size, 5);
    assert_eq!(config.evolution.tournament_size, 3);
}

#[test]
fn test_gen_repairs_partial_config_with_override() {
    let dir = dir_with(SMALL_POPULATION_CONFIG);
    let path = dir.path().join(DEFAULT_CONFIG_FILE);

    let generated = run(&path, &["--gen", "--set", "evolution.tournament_size=2"]);
    assert_eq!(stop_reason(generated), StopReason::ConfigGenerated(path.clone()));

    let config = completed_config(run(&path, &[]));
    assert_eq!(config.evolution.pop_size, 5);
    assert_eq!(config.evolution.tournament_size, 2);
}

#[test]
fn test_malformed_config_does_not_block_help_or_unknown_arguments() {
    let dir = dir_with("[general\nseed = 1\n");
    let path = dir.path().join(DEFAULT_CONFIG_FILE);

    assert_eq!(stop_reason(run(&path, &["--help"])), StopReason::Help);
    assert_eq!(stop_reason(run(&path, &["--version"])), StopReason::Version);
    assert_eq!(
        stop_reason(run(&path, &["-c", "alt.cfg", "--bogus"])),
        StopReason::UnknownArguments
    );
}

#[test]
fn test_count_beyond_toml_range_is_rejected_before_printing() {
    let dir = sample_dir();
    let result = run(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &["--generations", "18446744073709551615"],
    );

    assert!(result.stdout.is_empty());
    assert!(result.stderr.contains("evolution.generations"));
    assert_eq!(stop_reason(result), StopReason::InvalidConfig);
}

#[test]
fn test_numeric_text_is_kept_for_string_setting() {
    let dir = sample_dir();
    let config = completed_config(run(
        &dir.path().join(DEFAULT_CONFIG_FILE),
        &["--set", "general.output_dir=2024"],
    ));

    assert_eq!(config.general.output_dir, "2024");
}
