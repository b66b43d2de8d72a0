use console::style;
use serde_json::json;

use switchboard_config::SwitchboardConfig;
use switchboard_core::{AgentDefinition, InvalidPolicy, Result};
use switchboard_definitions::{Registry, discover};
use switchboard_router::load_options;

use super::load_router;

pub(super) async fn cmd_list(config: &SwitchboardConfig, json: bool) -> Result<()> {
    let router = load_router(config).await?;
    let registry = router.live().snapshot();

    if json {
        let items: Vec<_> = registry.all().iter().map(|d| summary_json(d)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No definitions found in:");
        for dir in &config.definitions.dirs {
            println!("  {}", dir.display());
        }
        return Ok(());
    }

    println!("{} ({}):\n", style("Definitions").bold(), registry.len());
    for def in registry.all() {
        println!(
            "  {} {} {}",
            style(def.id()).cyan().bold(),
            style(format!("[{}]", def.kind())).dim(),
            style(def.model_tier()).magenta()
        );
        println!("    {}", def.trigger_description());
        println!("    Tools: {}", def.allowed_tools());
        println!("    File: {}", def.origin());
        println!();
    }
    Ok(())
}

pub(super) async fn cmd_show(config: &SwitchboardConfig, id: &str, json: bool) -> Result<()> {
    let router = load_router(config).await?;
    let registry = router.live().snapshot();
    let def = registry.get(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&**def)?);
        return Ok(());
    }

    println!("{} {}", style(def.id()).bold(), style(format!("[{}]", def.kind())).dim());
    println!("  {}", def.trigger_description());
    println!("  Model tier: {}", def.model_tier());
    println!("  Tools: {}", def.allowed_tools());
    for (key, value) in def.metadata() {
        println!("  {key}: {value}");
    }
    println!("  File: {}", def.origin());

    println!("\n  {}", style("Instructions:").bold());
    for line in def.body().as_str().lines() {
        println!("    {line}");
    }
    Ok(())
}

/// Parse everything, report each invalid source, and fail if any was invalid.
pub(super) async fn cmd_validate(config: &SwitchboardConfig) -> Result<()> {
    let sources = discover(&config.definitions.dirs, config.definitions.concurrency).await?;
    let total = sources.len();

    // Collect every parse error instead of stopping at the first.
    let mut options = load_options(config);
    options.on_invalid = InvalidPolicy::Skip;

    let registry = match Registry::load_concurrent(sources, &options).await {
        Ok(registry) => registry,
        Err(e) => {
            println!("  {} {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    for def in registry.all() {
        println!("  {} {} ({})", style("✓").green(), def.id(), def.origin());
    }
    for skipped in registry.skipped() {
        println!("  {} {}: {}", style("✗").red(), skipped.origin, skipped.error);
    }

    let invalid = registry.skipped().len();
    println!();
    if invalid > 0 {
        return Err(anyhow::anyhow!("{invalid} of {total} definitions are invalid").into());
    }
    println!("{} {total} definitions are valid", style("✓").green());
    Ok(())
}

fn summary_json(def: &AgentDefinition) -> serde_json::Value {
    json!({
        "id": def.id(),
        "kind": def.kind(),
        "description": def.trigger_description(),
        "tools": def.allowed_tools(),
        "model_tier": def.model_tier(),
        "origin": def.origin(),
    })
}
