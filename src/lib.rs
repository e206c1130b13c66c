pub mod config;
pub mod detection;
pub mod error;
pub mod fusion;
pub mod identity;
pub mod modality;
pub mod nms;
pub mod rect;
pub mod session;
pub mod tracker;

#[cfg(test)]
mod test_weight_tracker;

pub use config::SessionConfig;
pub use detection::Detection;
pub use error::HerdTrackError;
pub use fusion::{FusedEstimate, FusionEngine};
pub use identity::{IdentityMatcher, IdentityRegistry};
pub use modality::{Modality, WeightCandidate};
pub use rect::Rect;
pub use session::{Session, SessionReport};
pub use tracker::WeightTracker;
