//! One tracking session (typically one video).
//!
//! A session owns its tracker, reads the shared identity registry, and
//! remembers every track it ever emitted as confirmed so the end-of-session
//! report still covers individuals that walked out of frame.

use crate::{
    config::SessionConfig,
    detection::Detection,
    error::HerdTrackError,
    fusion::{stats, FusionEngine},
    identity::{IdentityMatcher, IdentityRegistry, Metadata},
    nms::non_max_suppression,
    tracker::{ConfirmedTrack, TrackId, WeightSample, WeightTracker},
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};

/// Final per-track result of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAggregate {
    pub track_id: TrackId,
    pub identity_id: Option<String>,
    /// `code` from the identity metadata, `TRACK_{track_id}` otherwise.
    pub code: String,
    pub name: Option<String>,
    /// Confidence-weighted mean over the whole session.
    pub weight_kg: f32,
    pub weight_min: f32,
    pub weight_max: f32,
    /// Sample standard deviation, same rule as the live estimate.
    pub weight_std: f32,
    pub detections_count: usize,
    pub duration_seconds: f32,
    pub identified: bool,
}

/// Totals over the individuals of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HerdSummary {
    pub total_individuals: usize,
    pub total_weight_kg: f32,
    pub average_weight_kg: f32,
    pub min_weight_kg: f32,
    pub max_weight_kg: f32,
}

impl HerdSummary {
    pub fn from_aggregates(tracks: &[TrackAggregate]) -> Option<Self> {
        let weights: Vec<f32> = tracks.iter().map(|t| t.weight_kg).collect();
        let average_weight_kg = stats::mean(&weights)?;
        Some(Self {
            total_individuals: weights.len(),
            total_weight_kg: weights.iter().sum(),
            average_weight_kg,
            min_weight_kg: weights.iter().copied().fold(f32::INFINITY, f32::min),
            max_weight_kg: weights.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub frames_processed: usize,
    /// Tracks confirmed at least once during the session.
    pub total_tracks: usize,
    pub tracks: Vec<TrackAggregate>,
    pub summary: Option<HerdSummary>,
}

#[derive(Debug, Clone)]
struct TrackRecord {
    identity_id: Option<String>,
    first_seen: usize,
    last_seen: usize,
    weight_history: Vec<WeightSample>,
}

/*-----------------------------------------------------------------------------
Session
-----------------------------------------------------------------------------*/

#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    registry: Arc<IdentityRegistry>,
    matcher: IdentityMatcher,
    fusion: FusionEngine,
    tracker: WeightTracker,
    records: BTreeMap<TrackId, TrackRecord>,
}

impl Session {
    pub fn new(
        config: SessionConfig,
        registry: Arc<IdentityRegistry>,
    ) -> Result<Self, HerdTrackError> {
        config.validate()?;
        Ok(Self {
            matcher: IdentityMatcher::from_config(&config.identity),
            fusion: FusionEngine::from_config(&config.fusion),
            tracker: WeightTracker::from_config(&config.tracker),
            records: BTreeMap::new(),
            registry,
            config,
        })
    }

    pub fn tracker(&self) -> &WeightTracker {
        &self.tracker
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    pub fn matcher(&self) -> &IdentityMatcher {
        &self.matcher
    }

    pub fn registry(&self) -> &Arc<IdentityRegistry> {
        &self.registry
    }

    /// Run one frame through de-duplication, identification, fusion and
    /// tracking. Returns the confirmed tracks after this frame.
    pub fn process_frame(
        &mut self,
        frame_index: usize,
        detections: Vec<Detection>,
    ) -> Vec<ConfirmedTrack> {
        let detections = self.prepare_detections(detections);
        let confirmed = self.tracker.update(&detections, frame_index);
        for track in &confirmed {
            self.record(track);
        }
        confirmed
    }

    /// De-duplicate, identify and weigh the raw detections of one frame.
    ///
    /// Every surviving detection carries an `Identification`, unmatched ones
    /// included. `weight` is filled from the fused candidates unless the
    /// caller already set it.
    pub fn prepare_detections(&self, detections: Vec<Detection>) -> Vec<Detection> {
        let mut detections = non_max_suppression(detections, self.config.nms_iou_threshold);
        self.matcher.identify_batch(&self.registry, &mut detections);

        for detection in detections.iter_mut() {
            if detection.weight.is_some() {
                continue;
            }
            if let Some(candidates) = &detection.candidates {
                detection.weight = self.fusion.fuse(candidates).map(|f| f.as_candidate());
            }
        }
        detections
    }

    /// Close the session and aggregate every track that was ever confirmed.
    /// Tracks that never received a weight sample are left out.
    pub fn finish(self) -> SessionReport {
        let frame_rate = self.config.frame_rate;
        let tracks: Vec<TrackAggregate> = self
            .records
            .iter()
            .filter_map(|(track_id, record)| {
                let metadata = record
                    .identity_id
                    .as_deref()
                    .and_then(|id| self.registry.metadata(id))
                    .unwrap_or_default();
                aggregate(*track_id, record, &metadata, frame_rate)
            })
            .collect();
        log::debug!(
            "session finished after {} frames: {} tracks, {} weighed",
            self.tracker.frame_count(),
            self.records.len(),
            tracks.len()
        );
        SessionReport {
            frames_processed: self.tracker.frame_count(),
            total_tracks: self.records.len(),
            summary: HerdSummary::from_aggregates(&tracks),
            tracks,
        }
    }

    fn record(&mut self, track: &ConfirmedTrack) {
        let record = self
            .records
            .entry(track.track_id)
            .or_insert_with(|| TrackRecord {
                identity_id: None,
                first_seen: track.first_seen,
                last_seen: track.last_seen,
                weight_history: Vec::new(),
            });
        if track.identity_id.is_some() {
            record.identity_id = track.identity_id.clone();
        }
        record.last_seen = track.last_seen;
        // history is append-only, copy the new tail only
        if let Some(tail) = track.weight_history.get(record.weight_history.len()..) {
            record.weight_history.extend_from_slice(tail);
        }
    }
}

fn aggregate(
    track_id: TrackId,
    record: &TrackRecord,
    metadata: &Metadata,
    frame_rate: f32,
) -> Option<TrackAggregate> {
    let history = &record.weight_history;
    let weights: Vec<f32> = history.iter().map(|s| s.weight_kg).collect();
    let confidences: Vec<f32> = history.iter().map(|s| s.confidence).collect();
    let weight_kg = stats::weighted_mean(&weights, &confidences)?;

    let duration_seconds = if frame_rate > 0.0 {
        (record.last_seen - record.first_seen) as f32 / frame_rate
    } else {
        0.0
    };

    Some(TrackAggregate {
        track_id,
        identity_id: record.identity_id.clone(),
        code: metadata
            .get("code")
            .cloned()
            .unwrap_or_else(|| format!("TRACK_{}", track_id)),
        name: metadata.get("name").cloned(),
        weight_kg,
        weight_min: weights.iter().copied().fold(f32::INFINITY, f32::min),
        weight_max: weights.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        weight_std: stats::sample_std(&weights),
        detections_count: history.len(),
        duration_seconds,
        identified: record.identity_id.is_some(),
    })
}
