use std::path::Path;

use climbr_core::Protocol;

pub mod config;
pub mod plan;
pub mod run;
pub mod simulate;

/// Load a protocol file and apply `field=value` overrides in order.
pub fn load_protocol(
    file: &Path,
    overrides: &[String],
) -> Result<Protocol, Box<dyn std::error::Error>> {
    let mut protocol = Protocol::load(file)?;
    for item in overrides {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| format!("expected <field>=<value>, got '{item}'"))?;
        let value = value
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid value for '{key}': {e}"))?;
        protocol = protocol.with_override(key.trim(), value)?;
    }
    Ok(protocol)
}
