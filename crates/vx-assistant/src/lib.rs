//! Voxa assistant — library crate for the voice command loop.
//!
//! Re-exports all modules so external crates (e.g. `vx-e2e-tests`) can
//! drive the loop with scripted collaborators.

pub mod assistant;
pub mod config;
pub mod dictation;
pub mod executor;
pub mod mock;
pub mod plan;
pub mod proposal;
pub mod speech;
pub mod writer;

pub use assistant::{Assistant, Collaborators, Tick};
pub use config::AssistantConfig;
