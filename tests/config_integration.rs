//! ---
//! pwrmon_section: "15-testing"
//! pwrmon_subsection: "integration-tests"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Checks the shipped configuration and workspace manifests."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pwrmon_common::config::{AppConfig, SnapshotMode};

fn repo_path(path: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join(path)
}

fn read(path: &str) -> String {
    let full = repo_path(path);
    fs::read_to_string(&full)
        .unwrap_or_else(|err| panic!("failed to read {}: {}", full.display(), err))
}

#[test]
fn shipped_config_matches_builtin_dashboard() {
    let shipped: AppConfig = read("configs/pwrmon.toml").parse().unwrap();
    let builtin = AppConfig::default();

    assert_eq!(shipped.simulation.snapshot_mode, SnapshotMode::RandomWalk);
    assert_eq!(shipped.schedule.fast_tick, Duration::from_secs(2));
    assert_eq!(shipped.schedule.history_spacing, Duration::from_secs(600));
    assert_eq!(shipped.activation.batch_size, 15);
    assert_eq!(shipped.activation.animation, builtin.activation.animation);
    assert_eq!(shipped.activation.lazy_assets, builtin.activation.lazy_assets);

    let shipped_ids: Vec<&String> = shipped.channels.keys().collect();
    let builtin_ids: Vec<&String> = builtin.channels.keys().collect();
    assert_eq!(shipped_ids, builtin_ids);
    for (id, channel) in &shipped.channels {
        let reference = &builtin.channels[id];
        assert_eq!(channel.baseline, reference.baseline, "{id} baseline");
        assert_eq!(channel.jitter, reference.jitter, "{id} jitter");
        assert_eq!(channel.clamp, reference.clamp, "{id} clamp");
        assert_eq!(channel.phase, reference.phase, "{id} phase");
        assert_eq!(channel.trend_percent, reference.trend_percent, "{id} trend");
        assert_eq!(channel.pie, reference.pie, "{id} pie");
    }
}

#[test]
fn shipped_banner_asset_exists() {
    let config: AppConfig = read("configs/pwrmon.toml").parse().unwrap();
    let banner = config.ui.banner.expect("banner configured");
    assert!(!read(&banner.to_string_lossy()).trim().is_empty());
}

#[test]
fn explicit_config_path_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = AppConfig::load_with_source(&[&missing]).unwrap_err();
    assert!(err.to_string().contains("no configuration files found"));
}

#[test]
fn invalid_clamp_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(
        &path,
        r#"
        [channels.power_factor]
        label = "Cos φ"
        baseline = 0.88
        jitter = 0.1
        clamp = { min = 1.0, max = 0.7 }
        "#,
    )
    .unwrap();
    let err = AppConfig::load_with_source(&[&path]).unwrap_err();
    assert!(format!("{err:#}").contains("exceeds max"));
}

#[test]
fn unreachable_history_spacing_is_rejected_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("far.toml");
    fs::write(&path, "[schedule]\nhistory_spacing = 10000000000000\n").unwrap();
    let err = AppConfig::load_with_source(&[&path]).unwrap_err();
    assert!(format!("{err:#}").contains("reaches back more than 365 days"));
}

#[test]
fn manifests_carry_frontmatter() {
    for manifest in [
        "Cargo.toml",
        "crates/pwrmon-common/Cargo.toml",
        "crates/pwrmon-logging/Cargo.toml",
        "crates/pwrmon-sim/Cargo.toml",
        "crates/pwrmon-rt/Cargo.toml",
        "crates/pwrmon-core/Cargo.toml",
        "bin/pwrmon-ui/Cargo.toml",
        "tests/Cargo.toml",
        "configs/pwrmon.toml",
    ] {
        let content = read(manifest);
        assert!(
            content.starts_with("# ---"),
            "{manifest} must include frontmatter header"
        );
        assert!(
            content.contains("pwrmon_description"),
            "{manifest} frontmatter should describe the file"
        );
    }
}
