//! Conversation layer for ragchat.
//!
//! A [`ChatEngine`] runs turns: it routes the question to the retrieval
//! sources, augments the prompt with the retrieved context and calls the
//! model. Conversation state lives in a [`ConversationSession`] owned by the
//! caller, with a system role that locks on the first turn and a
//! sliding-window [`ChatMemory`].

pub mod augmentor;
pub mod engine;
pub mod memory;
pub mod roles;
pub mod session;

pub use augmentor::RetrievalAugmentor;
pub use engine::{build_router, Answer, ChatEngine, EngineSettings, SourceRef, TurnReply};
pub use memory::ChatMemory;
pub use roles::{find_preset, resolve_role, RolePreset, ROLE_PRESETS};
pub use session::{ConversationSession, SessionState, Turn};
