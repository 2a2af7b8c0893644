//! # Synthesis Core (The Forge)
//!
//! The engine behind card fusion. This crate reads the static codex from
//! `card_rules`, decides what a set of input cards fuses into, delegates to a
//! generative assistant when no recipe applies, and turns committed results
//! into era progression.
//!
//! ## Core Components
//!
//! - **matcher**: Order-independent, count-sensitive recipe lookup
//! - **orchestrator**: One fusion attempt, from validation to preview or commit
//! - **progression**: Event resolution, reward unlocks and era advancement
//! - **adapter**: The generative assistant seam and its prompt/parse helpers
//! - **repository**: Per-player state storage with compare-and-consume commits
//! - **contract**: JSON request/response boundary for client collaborators
//!
//! ## Design Philosophy
//!
//! - **Injected Rules**: The codex is loaded once and passed in; nothing global
//! - **Side-Effect-Free Previews**: Only a commit ever touches player state
//! - **Degrade, Don't Fail**: An unavailable assistant yields a placeholder card

pub mod adapter;
pub mod config;
pub mod contract;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod progression;
pub mod repository;

pub use adapter::*;
pub use config::*;
pub use contract::*;
pub use error::*;
pub use matcher::*;
pub use orchestrator::*;
pub use progression::*;
pub use repository::*;
