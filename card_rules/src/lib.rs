//! # Card Rules
//!
//! The "Codex" crate - contains the card catalog, fusion recipes, era and
//! crisis event definitions, and the per-player state records.
//! This crate is static data plus pure functions and does not contain any AI logic.

pub mod cards;
pub mod codex;
pub mod eras;
pub mod player_state;
pub mod recipes;

pub use cards::*;
pub use codex::*;
pub use eras::*;
pub use player_state::*;
pub use recipes::*;
