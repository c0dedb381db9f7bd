mod common;

use std::path::PathBuf;

use clap::Parser;
use common::test_utils::scratch_dir;
use flycam_scene::{AppConfig, Cli};

#[test]
fn config_file_and_cli_combine() {
    let dir = scratch_dir("config");
    let path = dir.path().join("scene.json");
    std::fs::write(
        &path,
        r#"{
            "window": { "width": 800, "height": 600, "fullscreen": true },
            "assets": { "mesh": "suzanne.gltf" },
            "fly_camera": { "move_speed": 3.5 }
        }"#,
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "flycam-scene".to_string(),
        "--config".to_string(),
        path.display().to_string(),
        "--assets".to_string(),
        "media".to_string(),
    ])
    .unwrap();
    let config = AppConfig::from_cli(&cli).unwrap();

    assert_eq!((config.window.width, config.window.height), (800, 600));
    assert!(config.window.fullscreen);
    assert!(config.window.hide_cursor);
    assert_eq!(config.assets.mesh, "suzanne.gltf");
    assert_eq!(config.assets.texture, "monkey.jpg");
    assert_eq!(config.assets.root, PathBuf::from("media"));
    assert_eq!(config.fly_camera.move_speed, 3.5);
    assert_eq!(config.fly_camera.rotation_speed, 0.4);
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = scratch_dir("missing-config");
    let missing = dir.path().join("nope.json");
    let cli = Cli::try_parse_from(["flycam-scene".to_string(), "--config".to_string(), missing.display().to_string()]).unwrap();
    let err = AppConfig::from_cli(&cli).unwrap_err();
    assert!(format!("{err:#}").contains("nope.json"));
}

#[test]
fn no_arguments_means_defaults() {
    let cli = Cli::try_parse_from(["flycam-scene"]).unwrap();
    assert_eq!(cli, Cli::default());
    assert_eq!(AppConfig::from_cli(&cli).unwrap(), AppConfig::default());
}
