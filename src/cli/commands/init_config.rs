//! Init config command handler

use std::path::Path;

use crate::config::Config;

pub fn cmd_init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let shown = path.map_or_else(|| "config.toml".to_string(), |p| p.display().to_string());

    if Config::create_default_if_missing(path)? {
        println!("✓ Config file created at {shown}. Add your API keys and run again.");
    } else {
        println!("Config file {shown} already exists; leaving it untouched.");
    }

    Ok(())
}
