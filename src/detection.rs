use crate::{
    identity::Identification,
    modality::{ModalityCandidates, WeightCandidate},
    rect::Rect,
};
use serde::{Deserialize, Serialize};

/*------------------------------------------------------------------------------
Detection struct
------------------------------------------------------------------------------*/

/// One detector output for a single frame, plus whatever the upstream
/// collaborators attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub rect: Rect,
    pub confidence: f32,
    pub label: usize,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub candidates: Option<ModalityCandidates>,
    /// Weight candidate the tracker appends to the track history.
    #[serde(default)]
    pub weight: Option<WeightCandidate>,
    #[serde(default)]
    pub identity: Option<Identification>,
}

impl Detection {
    pub fn new(rect: Rect, confidence: f32, label: usize) -> Self {
        Self {
            rect,
            confidence,
            label,
            embedding: None,
            candidates: None,
            weight: None,
            identity: None,
        }
    }

    pub fn with_embedding(self, embedding: Vec<f32>) -> Self {
        Self {
            embedding: Some(embedding),
            ..self
        }
    }

    pub fn with_candidates(self, candidates: ModalityCandidates) -> Self {
        Self {
            candidates: Some(candidates),
            ..self
        }
    }

    pub fn with_weight(self, weight_kg: f32, confidence: f32) -> Self {
        Self {
            weight: Some(WeightCandidate::new(weight_kg, confidence)),
            ..self
        }
    }

    pub fn get_rect(&self) -> Rect {
        self.rect
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity
            .as_ref()
            .and_then(|identity| identity.identity_id.as_deref())
    }
}
