use clap::Parser;
use flycam_scene::{AppConfig, Cli, demo};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;
    flycam_scene::run(config, demo::setup_scene)
}
