use crate::error::HerdTrackError;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/*------------------------------------------------------------------------------
Modality enum
------------------------------------------------------------------------------*/

/// Independent weight-estimation signals produced upstream.
///
/// The declaration order is the fixed enumeration order used everywhere a
/// deterministic walk over modalities is needed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Geometric,
    Cnn,
    Transformer,
}

impl Modality {
    pub const ALL: [Modality; 3] =
        [Modality::Geometric, Modality::Cnn, Modality::Transformer];

    pub fn name(&self) -> &'static str {
        match self {
            Modality::Geometric => "geometric",
            Modality::Cnn => "cnn",
            Modality::Transformer => "transformer",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Modality {
    type Err = HerdTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| HerdTrackError::UnknownModality(s.to_string()))
    }
}

/*------------------------------------------------------------------------------
WeightCandidate struct
------------------------------------------------------------------------------*/

/// One weight estimate with the estimator's confidence in it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightCandidate {
    pub weight_kg: f32,
    pub confidence: f32,
}

impl WeightCandidate {
    pub fn new(weight_kg: f32, confidence: f32) -> Self {
        Self {
            weight_kg,
            confidence,
        }
    }
}

/// Same-frame candidates keyed by modality. Iteration follows `Modality::ALL`.
pub type ModalityCandidates = BTreeMap<Modality, WeightCandidate>;
