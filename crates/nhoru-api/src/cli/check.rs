//! `nhoru check`: one-shot readiness report.

use anyhow::Result;
use console::style;

use nhoru_core::connectivity::ReachabilityProbe;

use crate::state::AppState;

/// Probe the endpoint host once and report whether an API key is set.
///
/// The key itself is never printed.
pub async fn check(state: &AppState, json: bool) -> Result<()> {
    let probe = state.probe();
    let reachable = probe.probe().await;
    let has_key = state.api_key().is_some();
    let key_var = &state.config.assistant.api_key_env;

    if json {
        let check = serde_json::json!({
            "endpoint": state.config.assistant.endpoint,
            "probe_target": probe.target(),
            "reachable": reachable,
            "api_key_env": key_var,
            "api_key_present": has_key,
            "ready": reachable && has_key,
        });
        println!("{}", serde_json::to_string_pretty(&check)?);
        return Ok(());
    }

    let check_mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!("  {}", style("Readiness check").bold());
    println!();
    println!(
        "  {} {} reachable",
        check_mark(reachable),
        style(probe.target()).cyan()
    );
    println!("  {} {} is set", check_mark(has_key), style(key_var).cyan());
    println!();
    Ok(())
}
