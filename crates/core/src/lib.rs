//! Core types for the Pathfinder conversation & context lifecycle engine.
//!
//! This crate contains the domain types shared across the storage, LLM and
//! engine crates, plus the pure functions the engine's policies hinge on
//! (activity window, goal progress, quick-context rendering). No I/O here.

pub mod constants;
mod context;
mod conversation;
mod env_config;
mod error;
mod json_utils;
mod student;

pub use context::*;
pub use conversation::*;
pub use env_config::*;
pub use error::*;
pub use json_utils::*;
pub use student::*;
