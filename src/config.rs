//! Application configuration and command line.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields the stock sample: a 1280x720 window showing the monkey mesh.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{
    data_structures::color::Color,
    fly_camera::{DEFAULT_MOVE_SPEED, DEFAULT_ROTATION_SPEED},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub hide_cursor: bool,
    pub grab_cursor: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Fly camera".to_owned(),
            width: 1280,
            height: 720,
            fullscreen: false,
            hide_cursor: true,
            grab_cursor: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory mesh and texture names are resolved against.
    pub root: PathBuf,
    pub mesh: String,
    pub texture: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            mesh: "monkey.obj".to_owned(),
            texture: "monkey.jpg".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyCameraConfig {
    pub move_speed: f32,
    pub rotation_speed: f32,
}

impl Default for FlyCameraConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            rotation_speed: DEFAULT_ROTATION_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Scales scene luminance before tonemapping.
    pub exposure: f32,
    pub ambient: Color,
    pub msaa: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            exposure: 0.1,
            ambient: Color::rgb(0.02, 0.02, 0.02),
            msaa: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub assets: AssetConfig,
    pub fly_camera: FlyCameraConfig,
    pub render: RenderConfig,
}

impl AppConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Invalid configuration")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Build the configuration described by the command line.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(root) = &cli.assets {
            config.assets.root = root.clone();
        }
        Ok(config)
    }
}

/// Command line of the sample program.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "flycam-scene")]
#[command(about = "Textured mesh lit by three point lights, explored with a fly camera")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Directory mesh and texture names are resolved against
    #[arg(long, short)]
    pub assets: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(!config.window.fullscreen);
        assert_eq!(config.fly_camera.move_speed, 10.0);
        assert_eq!(config.fly_camera.rotation_speed, 0.4);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_json(
            r#"{ "window": { "title": "demo" }, "render": { "ambient": { "r": 1, "g": 0, "b": 0, "a": 1 } } }"#,
        )
        .unwrap();
        assert_eq!(config.window.title, "demo");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.render.ambient, Color::RED);
        assert_eq!(config.render.msaa, 4);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AppConfig::from_json("{ window: 3 }").is_err());
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::try_parse_from(["flycam-scene", "--config", "scene.json", "--assets=data"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scene.json")));
        assert_eq!(cli.assets, Some(PathBuf::from("data")));

        let cli = Cli::try_parse_from(["flycam-scene", "-c=scene.json", "-a", "data"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("scene.json")));
        assert_eq!(cli.assets, Some(PathBuf::from("data")));

        assert!(Cli::try_parse_from(["flycam-scene", "--config"]).is_err());
        assert!(Cli::try_parse_from(["flycam-scene", "--frobnicate"]).is_err());
    }

    #[test]
    fn help_is_not_taken_as_a_value() {
        assert!(Cli::try_parse_from(["flycam-scene", "--config", "--help"]).is_err());

        let err = Cli::try_parse_from(["flycam-scene", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn cli_assets_override_config() {
        let cli = Cli::try_parse_from(["flycam-scene", "--assets", "elsewhere"]).unwrap();
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.assets.root, PathBuf::from("elsewhere"));
        assert_eq!(config.assets.mesh, "monkey.obj");
    }
}
