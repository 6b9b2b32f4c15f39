use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{GrayImage, Luma};
use tempfile::tempdir;

const METADATA: &str = r#"{
    "tile": {
        "file": "/rasters/tile.tif",
        "bbox": {"lat_min": 0, "lat_max": 10, "lon_min": 0, "lon_max": 20},
        "transform": {
            "scale-factor-x": 1, "shear-y-component-x": 0, "x-translation-term": 0,
            "shear-x-component-y": 0, "scale-factor-y": -1, "y-translation-term": 10
        }
    }
}"#;

fn setup(root: &Path) {
    fs::create_dir_all(root.join("pdm")).unwrap();
    GrayImage::from_fn(20, 10, |x, y| Luma([(x * 10 + y) as u8]))
        .save(root.join("pdm").join("tile.png"))
        .unwrap();
    fs::write(root.join("metadata.json"), METADATA).unwrap();
}

fn outbreak() -> Command {
    assert_cmd::cargo::cargo_bin_cmd!("outbreak")
}

#[test]
fn animate_writes_a_gif_and_run_log() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let assert = outbreak()
        .current_dir(dir.path())
        .args([
            "--log-level=warn",
            "animate",
            "--country-code=XX",
            "--locality=Test",
            "--lat=5",
            "--lon=10",
            "--metadata=metadata.json",
            "--pdm-dir=pdm",
            "--out=out",
            "--width=10",
            "--duration=1",
            "--fps=3",
        ])
        .assert()
        .success();
    assert!(stdout(&assert).contains("zombie-outbreak-xx-test.gif"));

    let gif = dir.path().join("out/gif/zombie-outbreak-xx-test.gif");
    assert!(gif.exists());

    let log = fs::read_to_string(dir.path().join("out/runs.jsonl")).unwrap();
    let row: serde_json::Value = serde_json::from_str(log.trim()).unwrap();
    assert_eq!(row["status"], "generated");
    assert_eq!(row["frames"], 3);
    assert_eq!(row["grid_width"], 10);
    assert_eq!(row["grid_height"], 5);
}

#[test]
fn animate_outside_every_raster_fails() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    outbreak()
        .current_dir(dir.path())
        .args([
            "animate",
            "--country-code=xx",
            "--locality=far",
            "--lat=-45",
            "--lon=170",
            "--metadata=metadata.json",
            "--pdm-dir=pdm",
            "--out=out",
        ])
        .assert()
        .failure();
}

#[test]
fn batch_renders_png_frames() {
    let dir = tempdir().unwrap();
    setup(dir.path());
    fs::write(
        dir.path().join("localities.json"),
        r#"[
            {"country_code": "xx", "locality": "west", "lat": 5, "lon": 2},
            {"country_code": "xx", "locality": "east", "lat": 5, "lon": 18},
            {"country_code": "yy", "locality": "gone", "lat": 50, "lon": 2}
        ]"#,
    )
    .unwrap();

    let assert = outbreak()
        .current_dir(dir.path())
        .args([
            "batch",
            "--localities=localities.json",
            "--jobs=2",
            "--metadata=metadata.json",
            "--pdm-dir=pdm",
            "--out=out",
            "--width=10",
            "--duration=0.5",
            "--fps=4",
            "--format=frames",
            "--timestep=2",
        ])
        .assert()
        .success();
    assert!(stdout(&assert).contains("generated=2 skipped=0 failed=1"));

    for name in ["west", "east"] {
        let frames = dir.path().join(format!("out/frames/zombie-outbreak-xx-{name}"));
        assert!(frames.join("frame_00000.png").exists());
        assert!(frames.join("frame_00001.png").exists());
    }
    let log = fs::read_to_string(dir.path().join("out/runs.jsonl")).unwrap();
    assert_eq!(log.lines().count(), 3);
}

#[test]
fn match_prints_the_covering_entry() {
    let dir = tempdir().unwrap();
    setup(dir.path());

    let output = outbreak()
        .current_dir(dir.path())
        .args(["match", "--metadata=metadata.json", "--lat=2.5", "--lon=3"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let entry: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry["file"], "/rasters/tile.tif");
    assert_eq!(entry["transform"]["scale-factor-y"], -1.0);

    outbreak()
        .current_dir(dir.path())
        .args(["match", "--metadata=metadata.json", "--lat=-1", "--lon=3"])
        .assert()
        .failure();
}

fn stdout(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}
