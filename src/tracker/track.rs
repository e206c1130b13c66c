use crate::{fusion::stats, rect::Rect};
use serde::{Deserialize, Serialize};

pub type TrackId = u64;

/*----------------------------------------------------------------------------
Track State enums
----------------------------------------------------------------------------*/

/// Lifecycle of a track. A track that missed recent frames is still
/// `Tentative` or `Confirmed` with `age > 0`; removed tracks are dropped from
/// the tracker, so `Removed` only ever shows up on a detached copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    Tentative,
    Confirmed,
    Removed,
}

/// One weight observation appended to a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSample {
    pub frame_index: usize,
    pub weight_kg: f32,
    pub confidence: f32,
}

/// Live estimate over a track's whole weight history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveWeight {
    /// Confidence-weighted mean, unweighted when all confidences are 0.
    pub weight_kg: f32,
    /// Sample standard deviation, 0 below two samples.
    pub weight_std: f32,
    pub samples: usize,
}

impl LiveWeight {
    pub fn from_history(history: &[WeightSample]) -> Option<Self> {
        let weights: Vec<f32> = history.iter().map(|s| s.weight_kg).collect();
        let confidences: Vec<f32> = history.iter().map(|s| s.confidence).collect();
        let weight_kg = stats::weighted_mean(&weights, &confidences)?;
        Some(Self {
            weight_kg,
            weight_std: stats::sample_std(&weights),
            samples: history.len(),
        })
    }
}

/*----------------------------------------------------------------------------
Track struct
----------------------------------------------------------------------------*/

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    track_id: TrackId,
    rect: Rect,
    age: usize,
    hits: usize,
    first_seen: usize,
    last_seen: usize,
    identity_id: Option<String>,
    weight_history: Vec<WeightSample>,
    state: TrackState,
}

impl Track {
    pub(crate) fn new(track_id: TrackId, rect: Rect, frame_index: usize) -> Self {
        Self {
            track_id,
            rect,
            age: 0,
            hits: 1,
            first_seen: frame_index,
            last_seen: frame_index,
            identity_id: None,
            weight_history: Vec::new(),
            state: TrackState::Tentative,
        }
    }

    pub fn get_track_id(&self) -> TrackId {
        self.track_id
    }

    pub fn get_rect(&self) -> Rect {
        self.rect
    }

    pub fn get_age(&self) -> usize {
        self.age
    }

    pub fn get_hits(&self) -> usize {
        self.hits
    }

    pub fn get_first_seen(&self) -> usize {
        self.first_seen
    }

    pub fn get_last_seen(&self) -> usize {
        self.last_seen
    }

    pub fn get_identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    pub fn get_weight_history(&self) -> &[WeightSample] {
        &self.weight_history
    }

    pub fn get_state(&self) -> TrackState {
        self.state
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    pub fn live_weight(&self) -> Option<LiveWeight> {
        LiveWeight::from_history(&self.weight_history)
    }

    pub(crate) fn update(&mut self, rect: Rect, frame_index: usize) {
        self.rect = rect;
        self.age = 0;
        self.hits += 1;
        self.last_seen = frame_index;
    }

    pub(crate) fn mark_missed(&mut self) {
        self.age += 1;
    }

    pub(crate) fn promote(&mut self, min_hits: usize) {
        if self.state == TrackState::Tentative && self.hits >= min_hits {
            self.state = TrackState::Confirmed;
        }
    }

    pub(crate) fn mark_as_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    pub(crate) fn assign_identity(&mut self, identity_id: &str) {
        if self.identity_id.as_deref() != Some(identity_id) {
            self.identity_id = Some(identity_id.to_string());
        }
    }

    pub(crate) fn push_weight(&mut self, sample: WeightSample) {
        self.weight_history.push(sample);
    }

    #[cfg(test)]
    pub(crate) fn dummy_track(track_id: TrackId) -> Self {
        Self::new(track_id, Rect::new(0, 0, 10, 10), 0)
    }
}

/*----------------------------------------------------------------------------
ConfirmedTrack
----------------------------------------------------------------------------*/

/// Per-frame output row for one confirmed track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmedTrack {
    pub track_id: TrackId,
    pub rect: Rect,
    pub age: usize,
    pub hits: usize,
    pub first_seen: usize,
    pub last_seen: usize,
    pub identity_id: Option<String>,
    pub weight_history: Vec<WeightSample>,
    pub live_weight: Option<LiveWeight>,
}

impl From<&Track> for ConfirmedTrack {
    fn from(track: &Track) -> Self {
        Self {
            track_id: track.track_id,
            rect: track.rect,
            age: track.age,
            hits: track.hits,
            first_seen: track.first_seen,
            last_seen: track.last_seen,
            identity_id: track.identity_id.clone(),
            weight_history: track.weight_history.clone(),
            live_weight: track.live_weight(),
        }
    }
}
