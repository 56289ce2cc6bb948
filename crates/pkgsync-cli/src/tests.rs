use std::fs;

use clap::Parser;
use pkgsync_core::{
    BlockReason, BlockedPackage, CycleResult, InstallAttempt, InstallOutcome, TransactionId,
    VersionCode,
};
use pkgsync_resolver::{DependencyConstraint, DeviceProfile};
use pkgsync_updater::{RetryConfig, SettingsStore, UpdateSettings, UpdaterConfig};

use crate::command_flows::{run_plan_command, run_status_command};
use crate::render::{
    format_plan_lines, format_status_lines, render_status_line, resolve_output_style,
    OutputStyle,
};
use crate::{Cli, Commands};

const CATALOG: &str = r#"
timestamp = 1700000000

[[packages]]
name = "org.example.browser"

[[packages.versions]]
version_code = 120
payload = { name = "browser-120.bin" }

[[packages]]
name = "org.example.notes"

[[packages.versions]]
version_code = 8
payload = { name = "notes-8.bin" }

[[packages.versions]]
version_code = 9
min_platform = 40
payload = { name = "notes-9.bin" }

[[packages]]
name = "org.example.sharedlib"

[[packages.versions]]
version_code = 120
payload = { name = "sharedlib-120.bin" }
"#;

const INVENTORY: &str = r#"
[installed]
"org.example.browser" = 110
"org.example.notes" = 7
"org.example.sharedlib" = 119
"#;

fn sample_result() -> CycleResult {
    CycleResult {
        attempts: vec![
            InstallAttempt {
                package: "org.example.sharedlib".to_string(),
                version_code: VersionCode(120),
                outcome: InstallOutcome::Success,
            },
            InstallAttempt {
                package: "org.example.notes".to_string(),
                version_code: VersionCode(8),
                outcome: InstallOutcome::ConfirmationPending(TransactionId(4)),
            },
        ],
        blocked: vec![BlockedPackage {
            package: "org.example.browser".to_string(),
            version_code: VersionCode(121),
            library: "org.example.sharedlib".to_string(),
            reason: BlockReason::DependencyUnmet("library is not in the catalog".to_string()),
        }],
        needs_user_attention: true,
        ..CycleResult::default()
    }
}

#[test]
fn resolve_output_style_uses_rich_when_stdout_is_tty() {
    assert_eq!(resolve_output_style(true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false), OutputStyle::Plain);
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "install org.example.a 3"),
        "install org.example.a 3"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "hold org.example.b 4"),
        "[WARN] hold org.example.b 4"
    );
}

#[test]
fn plan_lines_list_attempts_then_held_back_dependents() {
    let lines = format_plan_lines(&sample_result(), OutputStyle::Plain);

    assert_eq!(
        lines,
        vec![
            "1. install org.example.sharedlib 120".to_string(),
            "2. install org.example.notes 8: waiting for confirmation (tx 4)".to_string(),
            "hold org.example.browser 121 until org.example.sharedlib: dependency unmet: library is not in the catalog".to_string(),
            "summary: 2 install(s), 1 held back, retry=false, needs_user_attention=true".to_string(),
        ]
    );
}

#[test]
fn rich_plan_lines_add_badges_and_header() {
    let lines = format_plan_lines(&sample_result(), OutputStyle::Rich);

    assert!(lines[0].contains("== plan =="));
    assert_eq!(lines[1], "[OK] 1. install org.example.sharedlib 120");
    assert!(lines[2].starts_with("[WAIT] 2. install org.example.notes 8"));
    assert!(lines[3].starts_with("[WARN] hold org.example.browser"));
}

#[test]
fn empty_plan_says_nothing_to_do() {
    assert_eq!(
        format_plan_lines(&CycleResult::default(), OutputStyle::Plain),
        vec!["no updates available".to_string()]
    );
}

#[test]
fn status_lines_show_markers_and_backoff() {
    let settings = UpdateSettings {
        last_checked_unix: Some(1_700_000_100),
        last_catalog_timestamp: None,
        consecutive_retries: 2,
        ..UpdateSettings::default()
    };

    let lines = format_status_lines(&settings, &RetryConfig::default(), OutputStyle::Plain);

    assert_eq!(
        lines,
        vec![
            "last-checked: 1700000100".to_string(),
            "catalog-timestamp: never".to_string(),
            "consecutive-retries: 2".to_string(),
            "last run asked for a retry after 60s".to_string(),
        ]
    );
}

#[test]
fn status_reads_settings_from_state_dir() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let store = SettingsStore::new(dir.path());
    let settings = UpdateSettings {
        last_catalog_timestamp: Some(42),
        ..UpdateSettings::default()
    };
    store.save(&settings).expect("must save settings");

    assert_eq!(
        run_status_command(dir.path()).expect("status must load"),
        settings
    );
}

#[tokio::test]
async fn plan_orders_library_before_dependent() {
    let dir = tempfile::tempdir().expect("must create temp dir");
    let catalog = dir.path().join("catalog.toml");
    let inventory = dir.path().join("inventory.toml");
    fs::write(&catalog, CATALOG).expect("must write catalog");
    fs::write(&inventory, INVENTORY).expect("must write inventory");
    let config = UpdaterConfig {
        dependencies: vec![DependencyConstraint::new(
            "org.example.browser",
            "org.example.sharedlib",
        )],
        ..UpdaterConfig::default()
    };

    let result = run_plan_command(
        &catalog,
        &inventory,
        &config,
        DeviceProfile::new(34, &["arm64-v8a"]),
    )
    .await
    .expect("plan must run");

    assert_eq!(
        result.attempted_packages(),
        vec![
            "org.example.sharedlib",
            "org.example.browser",
            "org.example.notes"
        ]
    );
    assert_eq!(
        result
            .attempt("org.example.notes")
            .map(|attempt| attempt.version_code),
        Some(VersionCode(8))
    );
    assert!(!result.retry);
    assert!(!result.needs_user_attention);
}

#[tokio::test]
async fn plan_fails_on_missing_catalog() {
    let dir = tempfile::tempdir().expect("must create temp dir");

    let err = run_plan_command(
        &dir.path().join("catalog.toml"),
        &dir.path().join("inventory.toml"),
        &UpdaterConfig::default(),
        DeviceProfile::default(),
    )
    .await
    .expect_err("missing catalog must fail");

    assert!(err.to_string().contains("failed reading catalog"));
}

#[test]
fn cli_parses_plan_with_repeated_abi() {
    let cli = Cli::try_parse_from([
        "pkgsync",
        "plan",
        "--catalog",
        "catalog.toml",
        "--inventory",
        "inventory.toml",
        "--abi",
        "arm64-v8a",
        "--abi",
        "armeabi-v7a",
        "--config",
        "pkgsync.toml",
    ])
    .expect("plan args must parse");

    assert_eq!(
        cli.config.as_deref(),
        Some(std::path::Path::new("pkgsync.toml"))
    );
    match cli.command {
        Commands::Plan { abi, platform_level, .. } => {
            assert_eq!(abi, vec!["arm64-v8a".to_string(), "armeabi-v7a".to_string()]);
            assert_eq!(platform_level, None);
        }
        other => panic!("expected plan command, got {other:?}"),
    }
}
