use crate::config::Config;
use anyhow::Result;

pub fn run() -> Result<()> {
    Config::default().save()?;
    log::info!("Wrote default configuration");
    Ok(())
}
