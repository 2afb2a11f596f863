// Core algorithm exports
pub mod geo;
pub mod scoring;
pub mod selector;

pub use geo::{haversine, is_within_radius, valid_coordinates};
pub use scoring::compatibility_score;
pub use selector::{SelectedCandidate, TieredSelector, DEFAULT_GLOBAL_TIER_CAP};
