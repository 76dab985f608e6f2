//! `mintbot idea` -- print one generated token idea.

use anyhow::Result;
use console::style;

use mintbot_types::config::IdeaConfig;

use crate::state::build_idea_generator;

pub async fn print_idea(config: &IdeaConfig, json: bool) -> Result<()> {
    let generator = build_idea_generator(config);
    tracing::debug!(strategy = ?generator.strategy(), "generating idea");
    let idea = generator.generate().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&idea)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {} ({})",
        style("💡").bold(),
        style(&idea.name).cyan().bold(),
        style(&idea.symbol).yellow()
    );
    println!("  {}", idea.description);
    println!();
    println!("  Start a token with {}", style("/create").green());
    println!();
    Ok(())
}
