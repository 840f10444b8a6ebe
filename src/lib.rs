// src/lib.rs
// Public library surface for integration tests and the sync binary.

pub mod config;
pub mod dates;
pub mod error;
pub mod event;
pub mod fetch;
pub mod orchestrator;
pub mod parser;
pub mod upload;

// ---- Re-exports for stable public API ----
pub use crate::error::ScrapeError;
pub use crate::event::{EconomicEvent, Impact};
pub use crate::orchestrator::{Orchestrator, RunSnapshot, Settings, Status};
pub use crate::parser::Period;
