//! Ask command handler.
//!
//! Runs a single turn in a fresh conversation.

use clap::Args;
use ragchat_chat::{resolve_role, ChatEngine, TurnReply};
use ragchat_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// System role: a preset key (see `ragchat roles`) or free text
    #[arg(short, long)]
    pub role: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;

        let engine = ChatEngine::from_config(config).await?;
        let mut session = engine.new_conversation();
        if let Some(ref role) = self.role {
            session.set_system_role(&resolve_role(role))?;
        }

        let reply = engine.respond(&mut session, &question).await;

        if self.json {
            let output = serde_json::json!({
                "reply": reply,
                "model": engine.settings().model,
                "provider": config.llm.provider,
                "sources": engine.router().source_names(),
            });
            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", reply.message());
            if let TurnReply::Answered(ref answer) = reply {
                for source in &answer.sources {
                    tracing::debug!(
                        "Source [{}] {} ({:.3})",
                        source.origin,
                        source.source,
                        source.score
                    );
                }
            }
        }

        match reply {
            TurnReply::Answered(_) => Ok(()),
            TurnReply::Rejected { message } => Err(AppError::Validation(message)),
            TurnReply::Failed { message } => Err(AppError::Other(message)),
        }
    }

    /// Get the question from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }
        match self.file {
            Some(ref path) => Ok(std::fs::read_to_string(path)?),
            None => Err(AppError::Validation("No question provided".to_string())),
        }
    }
}
