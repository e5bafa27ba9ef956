//! Subcommand tests against program files on disk

use botblocks_cli::commands::{self, RunOptions};
use botblocks_cli::ProgramFile;
use botblocks_program::test_harness::SimulatorConfig;
use botblocks_runtime::RunOutcome;
use botblocks_test_utils::{build_program, forward, left, repeat, wait};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn program_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

const PATROL: &str = r#"{
    "program": [
        { "type": "repeat", "times": 2, "body": [
            { "type": "move", "direction": "forward", "steps": 1 },
            { "type": "turn", "direction": "left", "degrees": 10 }
        ] },
        { "type": "wait", "seconds": 1 }
    ]
}"#;

#[test]
fn plan_reports_totals() {
    let file = program_file(PATROL);
    let text = commands::plan(file.path(), None).unwrap();

    assert!(text.contains("repeat 2"));
    assert!(text.contains("  move forward 1"));
    assert!(text.contains("  turn left 10"));
    assert!(text.contains("instructions: 4"));
    assert!(text.contains("commands:     8"));
    // 2 * (1s + 10 * 100ms) + 1s
    assert!(text.contains(&format!("{:?}", Duration::from_secs(5))));
}

#[test]
fn plan_rejects_missing_file() {
    let err = commands::plan(std::path::Path::new("/nonexistent/program.json"), None).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/program.json"));
}

#[test]
fn plan_uses_motion_config() {
    let file = program_file(PATROL);
    let mut config = NamedTempFile::new().unwrap();
    config.write_all(b"turn_rate = 90.0\n").unwrap();
    assert!(commands::plan(file.path(), Some(config.path())).is_ok());

    let mut bad = NamedTempFile::new().unwrap();
    bad.write_all(b"turn_rate = -1.0\n").unwrap();
    assert!(commands::plan(file.path(), Some(bad.path())).is_err());
}

#[tokio::test(start_paused = true)]
async fn dry_run_completes() {
    let file = program_file(PATROL);
    let options = RunOptions {
        config: None,
        dry_run: true,
    };

    let report = commands::run(file.path(), &options).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.commands_emitted, 8);
    assert!(report.elapsed >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn published_run_completes() {
    let file = program_file(r#"{ "program": [ { "type": "sound", "clip": "bruh" } ] }"#);
    let report = commands::run(file.path(), &RunOptions::default()).await.unwrap();
    assert_eq!(report.commands_emitted, 1);
}

#[test]
fn exported_fixture_plans_like_the_original() {
    let tree = build_program(vec![repeat(3, vec![forward(1), left(15)]), wait(2)]);
    let json = ProgramFile::from_tree(&tree).to_json().unwrap();
    let reloaded = ProgramFile::from_json(&json).unwrap().to_tree().unwrap();

    let motion = botblocks_runtime::MotionConfig::default();
    assert_eq!(
        commands::render_plan(&reloaded, motion),
        commands::render_plan(&tree, motion)
    );
}

#[test]
fn simulate_is_clean() {
    let report = commands::simulate(SimulatorConfig {
        seed: 7,
        total_operations: 2_000,
        ..Default::default()
    });
    assert!(report.passed(), "{}", report.generate_text());
}
