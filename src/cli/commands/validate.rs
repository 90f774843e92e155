//! Validate configuration command.

use advisor_config::{to_toml, AppConfig};
use anyhow::Result;
use std::path::Path;

pub fn run(config_path: &Path, config: &AppConfig) -> Result<()> {
    println!("Configuration is valid: {}", config_path.display());
    println!();
    println!("{}", to_toml(config)?);
    Ok(())
}
