use std::path::Path;

use anyhow::Result;

use super::render::render_json;
use super::util::load_config;

/// Print the effective configuration (file or defaults) as JSON.
pub fn config_command(path: Option<&Path>) -> Result<()> {
    let config = load_config(path)?;
    println!("{}", render_json(&config)?);
    Ok(())
}
