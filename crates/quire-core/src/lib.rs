//! Configuration, retrieval-augmented answering, agent tools, evaluation, and study helpers.

pub mod agent;
pub mod companion;
pub mod config;
pub mod eval;
pub mod history;
pub mod prompt;
pub mod rag;
pub mod study;
pub mod summarize;
pub mod tools;

pub use agent::Agent;
pub use config::Config;
pub use rag::{Answer, KnowledgeBase, LoadStatus, RagError};
