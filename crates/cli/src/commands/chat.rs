//! Chat command handler.
//!
//! Interactive loop over stdin. Lines starting with `/` are session
//! commands; everything else is a question.

use clap::Args;
use ragchat_chat::{resolve_role, ChatEngine, ConversationSession, TurnReply};
use ragchat_core::{config::AppConfig, AppResult};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::roles::print_presets;

const HELP: &str = "Commands:
  /role <preset|text>  set the system role (before the first question only)
  /new [preset|text]   start a new conversation
  /history             show this conversation
  /roles               list the predefined roles
  /quit                exit";

/// Interactive conversation
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// System role: a preset key (see `ragchat roles`) or free text
    #[arg(short, long)]
    pub role: Option<String>,
}

/// What the loop does after a line.
enum Flow {
    Continue,
    Quit,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let engine = ChatEngine::from_config(config).await?;
        let mut session = engine.new_conversation();
        if let Some(ref role) = self.role {
            session.set_system_role(&resolve_role(role))?;
        }

        println!(
            "ragchat ({}, sources: {:?}). Type /help for commands.",
            engine.settings().model,
            engine.router().source_names()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let flow = match line.strip_prefix('/') {
                Some(command) => self.handle_command(&engine, &mut session, command),
                None => {
                    let reply = engine.respond(&mut session, line).await;
                    print_reply(&reply);
                    Flow::Continue
                }
            };

            if let Flow::Quit = flow {
                break;
            }
        }

        tracing::info!(
            session = %session.id(),
            turns = session.turns().len(),
            "Chat ended"
        );
        Ok(())
    }

    fn handle_command(
        &self,
        engine: &ChatEngine,
        session: &mut ConversationSession,
        command: &str,
    ) -> Flow {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "role" => {
                if arg.is_empty() {
                    match session.system_role() {
                        Some(role) => println!("{}", role),
                        None => println!("(no system role)"),
                    }
                } else if let Err(e) = session.set_system_role(&resolve_role(arg)) {
                    println!("{}", e);
                } else {
                    println!("System role set.");
                }
            }
            "new" => {
                *session = engine.new_conversation();
                if !arg.is_empty() {
                    if let Err(e) = session.set_system_role(&resolve_role(arg)) {
                        println!("{}", e);
                    }
                }
                println!("New conversation started.");
            }
            "history" => print!("{}", session.history_text()),
            "roles" => print_presets(),
            "quit" | "exit" => return Flow::Quit,
            _ => println!("{}", HELP),
        }

        Flow::Continue
    }
}

fn print_reply(reply: &TurnReply) {
    match reply {
        TurnReply::Answered(answer) => {
            println!("{}", answer.text);
            for source in &answer.sources {
                tracing::debug!(
                    "Source [{}] {} ({:.3}): {}",
                    source.origin,
                    source.source,
                    source.score,
                    source.snippet
                );
            }
        }
        TurnReply::Rejected { message } | TurnReply::Failed { message } => {
            println!("{}", message);
        }
    }
}
