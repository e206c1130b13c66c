pub mod assoc;
mod track;
mod weight_tracker;

pub use crate::rect::Rect;
pub use assoc::{greedy_assignment, iou_batch, AssignmentResult};
pub use track::{ConfirmedTrack, LiveWeight, Track, TrackId, TrackState, WeightSample};
pub use weight_tracker::{TrackBrief, TrackerSummary, WeightTracker};
