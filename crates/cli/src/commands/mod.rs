//! Command handlers for the ragchat CLI.

pub mod ask;
pub mod chat;
pub mod roles;
pub mod search;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use roles::RolesCommand;
pub use search::SearchCommand;
