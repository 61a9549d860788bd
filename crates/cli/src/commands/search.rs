//! Search command handler.
//!
//! Ingests the configured corpora and prints what the query router returns.
//! No model is involved, so no model credential is needed.

use clap::Args;
use ragchat_chat::build_router;
use ragchat_core::{config::AppConfig, AppError, AppResult};

/// Show what retrieval finds for a query, without calling the model
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let router = build_router(config).await?;
        let result = router.route(&self.query).await;

        if self.json {
            let output = serde_json::json!({
                "query": self.query,
                "sources": router.source_names(),
                "results": result.candidates,
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        if result.is_empty() {
            println!("No results for: {}", self.query);
            return Ok(());
        }

        for (i, candidate) in result.candidates.iter().enumerate() {
            println!(
                "{}. [{:.3}] {} ({})",
                i + 1,
                candidate.score,
                candidate.chunk.source_id,
                candidate.origin
            );
            println!("   {}", candidate.chunk.text.trim().replace('\n', " "));
        }

        Ok(())
    }
}
