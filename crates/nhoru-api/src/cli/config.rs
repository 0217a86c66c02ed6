//! `nhoru config`: print the effective configuration.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Print the merged configuration (file values over defaults).
///
/// Text mode prints TOML that can be pasted into `config.toml`.
pub fn show_config(state: &AppState, json: bool) -> Result<()> {
    let path = state.config_path();
    let from_file = path.exists();

    if json {
        let out = serde_json::json!({
            "data_dir": state.data_dir.display().to_string(),
            "config_path": path.display().to_string(),
            "config_file_present": from_file,
            "config": &state.config,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Config:").bold(),
        style(path.display()).cyan()
    );
    if !from_file {
        println!("  {}", style("(no file found, showing defaults)").dim());
    }
    println!();
    for line in toml::to_string_pretty(&state.config)?.lines() {
        println!("  {line}");
    }
    println!();
    Ok(())
}
