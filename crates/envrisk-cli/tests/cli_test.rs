//! Integration tests for the envrisk binary
//!
//! Each test writes a small manifest plus GeoJSON layers into a temporary
//! directory and runs the binary against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FIRE: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "id": "madrid",
      "properties": { "Término municipal": "Madrid", "Número de incendios": "1.234" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-3.75, 40.37], [-3.65, 40.37], [-3.65, 40.47], [-3.75, 40.47], [-3.75, 40.37]]]
      }
    },
    {
      "type": "Feature",
      "id": "coslada",
      "properties": { "Término municipal": "Coslada", "Número de incendios": "17" },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-3.60, 40.37], [-3.50, 40.37], [-3.50, 40.47], [-3.60, 40.47], [-3.60, 40.37]]]
      }
    }
  ]
}"#;

const DESERT: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "DESER_CLA": 3 },
      "geometry": {
        "type": "Polygon",
        "coordinates": [[[-3.80, 40.32], [-3.60, 40.32], [-3.60, 40.52], [-3.80, 40.52], [-3.80, 40.32]]]
      }
    }
  ]
}"#;

const MANIFEST: &str = r#"
radius_km = 50.0
jpeg_quality = 60

[[layers]]
id = "fire_1996_2005"
title = "Fire frequency 1996-2005"
path = "data/fire.geojson"
preset = "fire_frequency"

[[layers]]
id = "desert_mainland"
path = "data/desert.geojson"
preset = "desertification"

[[sections]]
name = "fire"
layers = ["fire_1996_2005"]

[[sections]]
name = "desertification"
layers = ["desert_mainland"]
"#;

fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/fire.geojson"), FIRE).unwrap();
    fs::write(dir.path().join("data/desert.geojson"), DESERT).unwrap();
    let manifest = dir.path().join("envrisk.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    (dir, manifest)
}

fn envrisk(manifest: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_envrisk"))
        .arg("--config")
        .arg(manifest)
        .args(args)
        .env("RUST_LOG", "warn")
        .env_remove("ENVRISK_RADIUS_KM")
        .env_remove("ENVRISK_PLANAR_CRS")
        .output()
        .expect("Failed to execute envrisk")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("Output should be valid JSON")
}

#[test]
fn test_query_json_report() {
    let (_dir, manifest) = workspace();
    let output = envrisk(&manifest, &["--json", "query", "--lat", "40.42", "--lon", "-3.70"]);
    let parsed = json_stdout(&output);

    assert_eq!(parsed["status"], "success");
    let data = &parsed["data"];
    assert_eq!(data["radius_km"], 50.0);

    let fire = &data["sections"][0];
    assert_eq!(fire["name"], "fire");
    assert_eq!(fire["membership"]["matched"], true);
    assert_eq!(fire["membership"]["match_key"], "Madrid");
    assert_eq!(fire["membership"]["intensity"], 1234.0);
    assert_eq!(fire["image"]["status"], "rendered");
    assert_eq!(fire["image"]["record_count"], 2);

    let desert = &data["sections"][1];
    assert_eq!(desert["membership"]["label"], "ALTO (High)");
}

#[test]
fn test_query_outside_all_layers() {
    let (_dir, manifest) = workspace();
    let output = envrisk(
        &manifest,
        &["--json", "query", "--lat", "43.0", "--lon", "-8.0", "--radius-km", "10"],
    );
    let data = &json_stdout(&output)["data"];

    assert_eq!(data["sections"][0]["membership"]["matched"], false);
    assert_eq!(data["sections"][0]["membership"]["label"], "No risk");
    assert_eq!(data["sections"][0]["image"]["status"], "empty");
    assert_eq!(data["sections"][1]["membership"]["label"], "No Data");
}

#[test]
fn test_query_writes_images() {
    let (dir, manifest) = workspace();
    let images = dir.path().join("out");
    let output = envrisk(
        &manifest,
        &[
            "query",
            "--lat",
            "40.42",
            "--lon",
            "-3.70",
            "--section",
            "desertification",
            "--images",
            images.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let jpeg = fs::read(images.join("desertification.jpg")).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert!(!images.join("fire.jpg").exists());
}

#[test]
fn test_invalid_latitude_fails() {
    let (_dir, manifest) = workspace();
    let output = envrisk(&manifest, &["query", "--lat", "95", "--lon", "-3.70"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid query"));
}

#[test]
fn test_unknown_section_fails() {
    let (_dir, manifest) = workspace();
    let output =
        envrisk(&manifest, &["query", "--lat", "40.42", "--lon", "-3.70", "--section", "seismic"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown report section 'seismic'"));
    assert!(stderr.contains("fire, desertification"));
}

#[test]
fn test_section_with_unloaded_layer_fails_at_startup() {
    let (_dir, manifest) = workspace();
    let broken = MANIFEST.replace(
        "layers = [\"desert_mainland\"]",
        "layers = [\"desert_mainland\", \"desert_canaria\"]",
    );
    fs::write(&manifest, broken).unwrap();

    // Fails even when only the intact section is requested
    let output =
        envrisk(&manifest, &["query", "--lat", "40.42", "--lon", "-3.70", "--section", "fire"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Report section refers to an unknown layer"));
    assert!(stderr.contains("section 'desertification' names layer 'desert_canaria'"));
}

#[test]
fn test_point_outside_projection_domain_fails() {
    let (_dir, manifest) = workspace();
    let output = envrisk(&manifest, &["query", "--lat", "40.4168", "--lon", "176.3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid query"));
    assert!(stderr.contains("outside the projection domain"));
}

#[test]
fn test_missing_manifest_fails() {
    let dir = TempDir::new().unwrap();
    let output = envrisk(&dir.path().join("absent.toml"), &["layers"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Layer manifest not found"));
}

#[test]
fn test_layers_json() {
    let (_dir, manifest) = workspace();
    let parsed = json_stdout(&envrisk(&manifest, &["--json", "layers"]));

    let layers = parsed["data"]["layers"].as_array().unwrap();
    assert_eq!(parsed["data"]["planar_crs"], 25830);
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0]["id"], "fire_1996_2005");
    assert_eq!(layers[0]["records"], 2);
    assert_eq!(layers[0]["source_crs"], 4326);
    assert_eq!(layers[1]["overlaps"].as_array().unwrap().len(), 0);
}

#[test]
fn test_config_reports_sources() {
    let (_dir, manifest) = workspace();
    let parsed = json_stdout(&envrisk(&manifest, &["--json", "--planar-crs", "25829", "config"]));

    let values = parsed["data"]["values"].as_array().unwrap();
    let find = |key: &str| values.iter().find(|v| v["key"] == key).unwrap().clone();

    assert_eq!(find("radius_km")["source"], "File");
    assert_eq!(find("jpeg_quality")["value"], "60");
    assert_eq!(find("planar_crs")["value"], "EPSG:25829");
    assert_eq!(find("planar_crs")["source"], "Cli");
    assert_eq!(find("image_width")["source"], "Default");
}
