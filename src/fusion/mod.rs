mod calibration;
mod engine;
pub mod stats;

pub use calibration::{Calibrator, Interval, WeightClass, Z_95};
pub use engine::{Contribution, FusedEstimate, FusionEngine, FusionMethod};
