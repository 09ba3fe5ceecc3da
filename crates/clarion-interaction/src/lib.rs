//! External collaborator clients and the extraction engine.
//!
//! Every collaborator is behind a trait so the application layer can
//! swap test doubles for the reqwest-backed production clients, and so
//! that an absent credential simply means an absent collaborator.

pub mod ai_backend;
pub mod collaborators;
pub mod extract;
pub mod fetch;
pub mod search;
pub mod verify;

pub use ai_backend::{AiBackend, CerebrasBackend, ExtractionHints, IntentGuess};
pub use collaborators::Collaborators;
pub use extract::{DocumentState, ExtractionEngine, ExtractionReport, SourceOutcome};
pub use fetch::{HttpPageFetcher, PageFetcher, UnreachableFetcher};
pub use search::{ExaSearchClient, SearchHit, SearchProvider};
pub use verify::{HazardVerifier, NwsHazardVerifier, Verification};
