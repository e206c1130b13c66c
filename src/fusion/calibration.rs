use crate::config::MaeConfig;
use serde::{Deserialize, Serialize};

/// Two-sided 95% normal quantile.
pub const Z_95: f32 = 1.96;

/// Coarse weight range selecting a calibration constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightClass {
    /// below 30 kg
    Piglet,
    /// 30 to 80 kg
    Growing,
    /// 80 to 120 kg
    Finishing,
    /// 120 kg and above
    Adult,
}

impl WeightClass {
    pub const ALL: [WeightClass; 4] = [
        WeightClass::Piglet,
        WeightClass::Growing,
        WeightClass::Finishing,
        WeightClass::Adult,
    ];

    pub fn from_weight(weight_kg: f32) -> Self {
        if weight_kg < 30.0 {
            WeightClass::Piglet
        } else if weight_kg < 80.0 {
            WeightClass::Growing
        } else if weight_kg < 120.0 {
            WeightClass::Finishing
        } else {
            WeightClass::Adult
        }
    }
}

/// Symmetric confidence interval around an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub lower: f32,
    pub upper: f32,
    pub margin: f32,
}

impl Interval {
    pub fn around(center: f32, margin: f32) -> Self {
        Self {
            lower: center - margin,
            upper: center + margin,
            margin,
        }
    }
}

/// Maps a fused estimate to a margin from per-class MAE constants.
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    mae: MaeConfig,
}

impl Calibrator {
    pub fn new(mae: MaeConfig) -> Self {
        Self { mae }
    }

    /// `MAE_class · (2 − confidence)`; confidence is clamped to [0, 1].
    pub fn adjusted_mae(&self, weight_kg: f32, confidence: f32) -> f32 {
        let class = WeightClass::from_weight(weight_kg);
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.mae.for_class(class) * (2.0 - confidence)
    }

    pub fn interval(&self, weight_kg: f32, confidence: f32) -> Interval {
        let margin = self.adjusted_mae(weight_kg, confidence) * Z_95;
        Interval::around(weight_kg, margin)
    }
}
