//! Gradly Engine - matchmaking and conversation lifecycle service for the
//! Gradly dating app.
//!
//! The engine pairs users through a three-tier candidate search (radius,
//! city, global), reserves both participants atomically, and walks the
//! match through its credit and conversation lifecycle: a pending credit
//! transaction opens with the match, is confirmed and debited on the first
//! chat message, and is cancelled whenever the match dies unconsumed.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{compatibility_score, haversine, SelectedCandidate, TieredSelector};
pub use crate::models::{
    CompatibilityAnswers, Conversation, CreditTransaction, Match, MatchTier, Profile,
};
