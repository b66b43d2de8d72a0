use console::style;
use serde_json::json;

use switchboard_config::SwitchboardConfig;
use switchboard_core::{MatchRequest, ModelTier, Result, ToolSet};
use switchboard_matcher::MatchOutcome;

use super::load_router;

pub(super) async fn cmd_resolve(
    config: &SwitchboardConfig,
    intent: String,
    tools: &[String],
    tier: Option<String>,
    explain: bool,
    json: bool,
) -> Result<()> {
    let tools = ToolSet::parse_tokens(tools).map_err(anyhow::Error::from)?;
    let mut request = MatchRequest::new(intent).with_required_tools(tools);
    if let Some(tier) = tier.and_then(ModelTier::new) {
        request = request.with_preferred_tier(tier);
    }

    let router = load_router(config).await?;
    let outcome = router.explain(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome_json(&outcome, explain))?);
        return Ok(());
    }

    println!(
        "{} {} (score {:.3})",
        style("→").green().bold(),
        style(outcome.winner_id()).cyan().bold(),
        outcome.score
    );
    println!("  {}", outcome.winner.trigger_description());
    println!("  File: {}", outcome.winner.origin());

    if explain {
        println!("\n  {}", style("Candidates:").bold());
        for (rank, candidate) in outcome.ranked.iter().enumerate() {
            println!(
                "  {:>3}. {:<28} {:.3}  (text {:.3} + tier {:.3})",
                rank + 1,
                candidate.id().as_str(),
                candidate.score,
                candidate.text_score,
                candidate.tier_bonus
            );
        }
    }
    Ok(())
}

pub(super) async fn cmd_authorize(config: &SwitchboardConfig, id: &str, tools: &[String]) -> Result<()> {
    let tools = ToolSet::parse_tokens(tools).map_err(anyhow::Error::from)?;
    let router = load_router(config).await?;
    router.authorize_id(id, &tools)?;
    println!("{} '{}' may use: {}", style("✓").green(), id, tools);
    Ok(())
}

fn outcome_json(outcome: &MatchOutcome, explain: bool) -> serde_json::Value {
    let mut value = json!({
        "definition": &*outcome.winner,
        "score": outcome.score,
    });
    if explain {
        value["ranked"] = outcome
            .ranked
            .iter()
            .map(|c| {
                json!({
                    "id": c.id(),
                    "score": c.score,
                    "text_score": c.text_score,
                    "tier_bonus": c.tier_bonus,
                })
            })
            .collect();
    }
    value
}
