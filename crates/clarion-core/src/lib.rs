//! Core domain model for CLARION.
//!
//! This crate carries everything the orchestration layers share: the
//! data model (utterances, intents, contacts, responses, conversation
//! context), the activity transparency stream, the runtime
//! configuration, the fallback knowledge base, and the common error
//! type. It performs no I/O.

pub mod activity;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod model;

// Re-export the common error type
pub use error::ClarionError;
