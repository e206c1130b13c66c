//! Multi-object tracker keeping per-individual weight history.

use super::{
    assoc::{greedy_assignment, iou_batch},
    track::{ConfirmedTrack, Track, TrackId, TrackState, WeightSample},
};
use crate::{config::TrackerConfig, detection::Detection, rect::Rect};
use serde::{Deserialize, Serialize};

/// Summary row for one live track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackBrief {
    pub track_id: TrackId,
    pub hits: usize,
    pub age: usize,
    pub duration_frames: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSummary {
    pub total_tracks: usize,
    pub confirmed_tracks: usize,
    pub tracks: Vec<TrackBrief>,
}

/*-----------------------------------------------------------------------------
WeightTracker
-----------------------------------------------------------------------------*/

/// Tracks individuals across the frames of one session.
///
/// One instance per video; state is never shared between sessions. Each
/// call to [`WeightTracker::update`] is one atomic step computed from the
/// track table as it stood when the call began.
#[derive(Debug)]
pub struct WeightTracker {
    min_hits: usize,
    max_age: usize,
    iou_threshold: f32,

    frame_count: usize,
    track_id_count: TrackId,
    tracks: Vec<Track>,
}

impl WeightTracker {
    /// Create a new tracker.
    ///
    /// # Arguments
    /// * `min_hits` - Matches needed before a track is confirmed
    /// * `max_age` - Consecutive missed frames tolerated before removal
    /// * `iou_threshold` - Minimum IoU to associate a detection with a track
    ///
    /// # Example
    /// ```
    /// use herdtrack_rs::tracker::WeightTracker;
    /// let tracker = WeightTracker::new(3, 30, 0.3);
    /// assert_eq!(tracker.track_count(), 0);
    /// ```
    pub fn new(min_hits: usize, max_age: usize, iou_threshold: f32) -> Self {
        Self {
            min_hits,
            max_age,
            iou_threshold,
            frame_count: 0,
            track_id_count: 0,
            tracks: Vec::new(),
        }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.min_hits, config.max_age, config.iou_threshold)
    }

    /// Update the tracker with the detections of frame `frame_index`.
    ///
    /// # Returns
    /// Every track with at least `min_hits` matches, in creation order, with
    /// its live weight estimate.
    pub fn update(
        &mut self,
        detections: &[Detection],
        frame_index: usize,
    ) -> Vec<ConfirmedTrack> {
        self.frame_count += 1;

        if detections.is_empty() {
            self.age_tracks(&(0..self.tracks.len()).collect::<Vec<_>>());
            return self.confirmed_tracks();
        }

        // Step 1: IoU matrix against the tracks as they are now
        let track_rects: Vec<Rect> = self.tracks.iter().map(|t| t.get_rect()).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.get_rect()).collect();
        let ious = iou_batch(&track_rects, &det_rects);

        // Step 2: greedy association
        let result = greedy_assignment(&ious, self.iou_threshold);
        log::trace!(
            "frame {}: {} matched, {} unmatched tracks, {} new detections",
            frame_index,
            result.matches.len(),
            result.unmatched_tracks.len(),
            result.unmatched_detections.len()
        );

        // Step 3: update matched tracks
        for &(trk_idx, det_idx) in &result.matches {
            let detection = &detections[det_idx];
            let track = &mut self.tracks[trk_idx];
            track.update(detection.get_rect(), frame_index);
            Self::absorb(track, detection, frame_index);
            track.promote(self.min_hits);
        }

        // Step 4: age unmatched tracks (indices still refer to the snapshot)
        self.age_tracks(&result.unmatched_tracks);

        // Step 5: new tracks for unmatched detections
        for &det_idx in &result.unmatched_detections {
            let detection = &detections[det_idx];
            self.track_id_count += 1;
            let mut track = Track::new(self.track_id_count, detection.get_rect(), frame_index);
            Self::absorb(&mut track, detection, frame_index);
            track.promote(self.min_hits);
            log::debug!(
                "frame {}: new track {} at {:?}",
                frame_index,
                track.get_track_id(),
                track.get_rect().get_xyxy()
            );
            self.tracks.push(track);
        }

        // Step 6: output
        self.confirmed_tracks()
    }

    /// Get number of processed frames.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Get number of live tracks, tentative ones included.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get_track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.get_track_id() == track_id)
    }

    pub fn summary(&self) -> TrackerSummary {
        let tracks: Vec<TrackBrief> = self
            .tracks
            .iter()
            .map(|t| TrackBrief {
                track_id: t.get_track_id(),
                hits: t.get_hits(),
                age: t.get_age(),
                duration_frames: t.get_last_seen() - t.get_first_seen() + 1,
            })
            .collect();
        TrackerSummary {
            total_tracks: tracks.len(),
            confirmed_tracks: self.tracks.iter().filter(|t| t.is_confirmed()).count(),
            tracks,
        }
    }

    // =========================================================================
    // Internal methods
    // =========================================================================

    fn confirmed_tracks(&self) -> Vec<ConfirmedTrack> {
        self.tracks
            .iter()
            .filter(|t| t.get_hits() >= self.min_hits)
            .map(ConfirmedTrack::from)
            .collect()
    }

    /// Carry a detection's identity and weight candidate onto a track.
    fn absorb(track: &mut Track, detection: &Detection, frame_index: usize) {
        if let Some(identity_id) = detection.identity_id() {
            track.assign_identity(identity_id);
        }
        if let Some(weight) = detection.weight {
            track.push_weight(WeightSample {
                frame_index,
                weight_kg: weight.weight_kg,
                confidence: weight.confidence,
            });
        }
    }

    /// Age the tracks at `indices` and drop those older than `max_age`.
    fn age_tracks(&mut self, indices: &[usize]) {
        for &idx in indices {
            let track = &mut self.tracks[idx];
            track.mark_missed();
            if track.get_age() > self.max_age {
                track.mark_as_removed();
                log::debug!(
                    "track {} removed after {} missed frames ({} weight samples discarded)",
                    track.get_track_id(),
                    track.get_age(),
                    track.get_weight_history().len()
                );
            }
        }
        self.tracks.retain(|t| t.get_state() != TrackState::Removed);
    }
}
