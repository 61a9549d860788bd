//! Retrieval: sources and the router that merges them.

pub mod router;
pub mod sources;

pub use router::QueryRouter;
pub use sources::{LocalSource, RetrievalSource, WebSource};
