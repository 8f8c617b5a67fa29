//! Tests de bout en bout du binaire sur les fixtures de zonasi

use std::path::PathBuf;
use std::process::Command;

fn fixtures() -> Vec<PathBuf> {
    let pattern = concat!(env!("CARGO_MANIFEST_DIR"), "/../zonasi/tests/fixtures/*.geojson");
    glob::glob(pattern)
        .expect("valid glob pattern")
        .filter_map(|p| p.ok())
        .collect()
}

fn peta_zonasi() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_peta-zonasi"));
    cmd.env_remove("PETA_ZONASI_LOCALE").arg("-q");
    cmd
}

#[test]
fn test_legend_command() {
    let input = &fixtures()[0];
    let output = peta_zonasi()
        .args(["legend", "--locale", "en", "--cap", "3", "--input"])
        .arg(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Zoning Legend"));
    assert!(stdout.contains("... +2 more"));
    assert!(stdout.contains("Total zones: 5"));
}

#[test]
fn test_stats_command_on_directory() {
    let dir = fixtures()[0].parent().unwrap().to_path_buf();
    let output = peta_zonasi()
        .args(["stats", "--json", "--input"])
        .arg(&dir)
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let total = value["combined"]["total_area"].as_f64().unwrap();
    assert!((total - 10.25).abs() < 1e-9);
}

#[test]
fn test_render_command_exports_styled_geojson() {
    let input = &fixtures()[0];
    let out = std::env::temp_dir().join("peta_zonasi_cli_render.geojson");

    let output = peta_zonasi()
        .args(["render", "--input"])
        .arg(input)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rendered 5 features (1 skipped)"));
    assert!(stdout.contains("Legenda Zonasi"));

    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let features = exported["features"].as_array().unwrap();
    assert_eq!(features.len(), 5);
    assert_eq!(features[0]["properties"]["style"]["fillColor"], "#90EE90");

    std::fs::remove_file(out).ok();
}

#[test]
fn test_popup_command() {
    let input = &fixtures()[0];
    let output = peta_zonasi()
        .args(["popup", "--feature", "JP-004", "--input"])
        .arg(input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<h3>Taman Kota</h3>"));
    assert!(stdout.contains("<strong>Luas:</strong> 3.2 ha"));

    let missing = peta_zonasi()
        .args(["popup", "--feature", "nope", "--input"])
        .arg(input)
        .output()
        .unwrap();
    assert!(!missing.status.success());
}
