use std::path::Path;

use anyhow::Result;

use re_metrics_core::services::tools::detect_tools;

use crate::commands::util::load_config;

/// Probe the external tools and report availability.
pub fn tools_command(config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let statuses = detect_tools(&config.tools);

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    println!("Tools:");
    for status in &statuses {
        let kind = if status.essential { "essential" } else { "advanced" };
        let state = if status.available { "OK" } else { "MISSING" };
        println!("- {} ({kind}): {state}", status.name);
    }

    let missing: Vec<&str> = statuses
        .iter()
        .filter(|s| s.essential && !s.available)
        .map(|s| s.name.as_str())
        .collect();
    if !missing.is_empty() {
        println!();
        println!("Missing essential tools: {}", missing.join(", "));
        println!("Affected analysis phases will report empty metrics.");
    }
    Ok(())
}
