//! Config command handlers.

use anyhow::{Context, Result};
use shopdash_core::config::{self, paths};

pub fn path() {
    println!("{}", paths::config_path().display());
}

pub fn init() -> Result<()> {
    let config_path = paths::config_path();
    config::Config::init(&config_path)
        .with_context(|| format!("init config at {}", config_path.display()))?;
    println!("Created config at {}", config_path.display());
    Ok(())
}

pub fn show(config: &config::Config) -> Result<()> {
    let api_url = config.effective_api_url()?;
    println!("# file: {}", paths::config_path().display());
    println!("# effective api_url: {api_url}");
    print!("{}", config.to_toml()?);
    Ok(())
}
