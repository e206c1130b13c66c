use crate::detection::Detection;
use crate::identity::Identification;
use crate::rect::Rect;
use crate::tracker::{Track, TrackState, WeightTracker};
use nearly_eq::assert_nearly_eq;
use quickcheck::{Arbitrary, Gen};
use rand::{self, Rng};

fn det(x1: i32, y1: i32, x2: i32, y2: i32) -> Detection {
    Detection::new(Rect::new(x1, y1, x2, y2), 0.9, 0)
}

fn weighed(x1: i32, y1: i32, x2: i32, y2: i32, weight_kg: f32, confidence: f32) -> Detection {
    det(x1, y1, x2, y2).with_weight(weight_kg, confidence)
}

#[test]
fn test_new_tracker() {
    let tracker = WeightTracker::new(3, 30, 0.3);
    assert_eq!(tracker.frame_count(), 0);
    assert_eq!(tracker.track_count(), 0);
    assert_eq!(tracker.summary().total_tracks, 0);
}

#[test]
fn test_single_detection_needs_min_hits() {
    let mut tracker = WeightTracker::new(2, 5, 0.3);
    let out = tracker.update(&[det(0, 0, 100, 100)], 0);
    assert!(out.is_empty());
    assert_eq!(tracker.track_count(), 1);
    assert_eq!(tracker.tracks()[0].get_state(), TrackState::Tentative);

    let out = tracker.update(&[det(2, 2, 102, 102)], 1);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].hits, 2);
    assert_eq!(out[0].rect, Rect::new(2, 2, 102, 102));
    assert_eq!(tracker.tracks()[0].get_state(), TrackState::Confirmed);
}

#[test]
fn test_min_hits_one_confirms_immediately() {
    let mut tracker = WeightTracker::new(1, 5, 0.3);
    let out = tracker.update(&[det(0, 0, 100, 100)], 0);
    assert_eq!(out.len(), 1);
    assert!(tracker.tracks()[0].is_confirmed());
}

#[test]
fn test_age_resets_and_increments() {
    let mut tracker = WeightTracker::new(1, 10, 0.3);
    tracker.update(&[det(0, 0, 100, 100)], 0);
    tracker.update(&[], 1);
    tracker.update(&[det(500, 500, 600, 600)], 2);
    let track = tracker.get_track(1).unwrap();
    assert_eq!(track.get_age(), 2);

    tracker.update(&[det(0, 0, 100, 100), det(500, 500, 600, 600)], 3);
    let track = tracker.get_track(1).unwrap();
    assert_eq!(track.get_age(), 0);
    assert_eq!(track.get_hits(), 2);
    assert_eq!(track.get_last_seen(), 3);
    assert_eq!(track.get_first_seen(), 0);
}

#[test]
fn test_removed_iff_age_exceeds_max_age() {
    let max_age = 3;
    let mut tracker = WeightTracker::new(1, max_age, 0.3);
    tracker.update(&[det(0, 0, 100, 100)], 0);

    for frame in 1..=max_age {
        tracker.update(&[], frame);
        assert_eq!(tracker.track_count(), 1, "still alive at age {}", frame);
    }
    tracker.update(&[], max_age + 1);
    assert_eq!(tracker.track_count(), 0);
}

#[test]
fn test_empty_frame_returns_confirmed_tracks() {
    let mut tracker = WeightTracker::new(1, 5, 0.3);
    tracker.update(&[weighed(0, 0, 100, 100, 50.0, 1.0)], 0);
    let out = tracker.update(&[], 1);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].age, 1);
    assert_eq!(out[0].weight_history.len(), 1);
    assert_eq!(out[0].live_weight.unwrap().weight_kg, 50.0);
}

#[test]
fn test_ids_never_reused_after_removal() {
    let mut tracker = WeightTracker::new(1, 0, 0.3);
    let first = tracker.update(&[det(0, 0, 100, 100)], 0);
    assert_eq!(first[0].track_id, 1);

    // max_age = 0: one missed frame removes the track
    tracker.update(&[det(500, 500, 600, 600)], 1);
    assert!(tracker.get_track(1).is_none());

    let out = tracker.update(&[det(0, 0, 100, 100)], 2);
    let ids: Vec<u64> = out.iter().map(|t| t.track_id).collect();
    assert!(!ids.contains(&1));
    assert!(ids.contains(&3));
}

#[test]
fn test_low_iou_detections_spawn_new_tracks() {
    let mut tracker = WeightTracker::new(1, 5, 0.5);
    tracker.update(&[det(0, 0, 100, 100)], 0);
    // IoU 1/3 against the existing track, below threshold
    tracker.update(&[det(50, 0, 150, 100), det(300, 300, 400, 400)], 1);
    assert_eq!(tracker.track_count(), 3);
    let track = tracker.get_track(1).unwrap();
    assert_eq!(track.get_age(), 1);
}

#[test]
fn test_one_detection_per_track() {
    let mut tracker = WeightTracker::new(1, 5, 0.3);
    tracker.update(&[det(0, 0, 100, 100)], 0);
    // both overlap the single track; only the better one may take it
    tracker.update(&[det(10, 0, 110, 100), det(2, 0, 102, 100)], 1);
    assert_eq!(tracker.track_count(), 2);
    assert_eq!(tracker.get_track(1).unwrap().get_rect(), Rect::new(2, 0, 102, 100));
    assert_eq!(tracker.get_track(2).unwrap().get_rect(), Rect::new(10, 0, 110, 100));
}

#[test]
fn test_malformed_detection_never_matches() {
    let mut tracker = WeightTracker::new(1, 5, 0.0);
    tracker.update(&[det(0, 0, 100, 100)], 0);
    tracker.update(&[det(50, 50, 50, 80)], 1);
    assert_eq!(tracker.track_count(), 2);
    assert_eq!(tracker.get_track(1).unwrap().get_age(), 1);
}

#[test]
fn test_weight_history_and_live_estimate() {
    let mut tracker = WeightTracker::new(2, 5, 0.3);
    tracker.update(&[weighed(0, 0, 100, 100, 80.0, 0.9)], 0);
    tracker.update(&[det(0, 0, 100, 100)], 1);
    let out = tracker.update(&[weighed(0, 0, 100, 100, 100.0, 0.1)], 2);

    assert_eq!(out.len(), 1);
    let history = &out[0].weight_history;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].frame_index, 0);
    assert_eq!(history[1].frame_index, 2);

    let live = out[0].live_weight.unwrap();
    assert_nearly_eq!(live.weight_kg, 82.0, 1e-4);
    assert_nearly_eq!(live.weight_std, 14.142136, 1e-4);
}

#[test]
fn test_identity_carried_onto_track() {
    let mut tracker = WeightTracker::new(1, 5, 0.3);
    let mut identified = det(0, 0, 100, 100);
    identified.identity = Some(Identification {
        identity_id: Some("P7".to_string()),
        similarity: 0.93,
        ..Default::default()
    });
    tracker.update(&[identified], 0);
    assert_eq!(tracker.get_track(1).unwrap().get_identity_id(), Some("P7"));

    // an unidentified detection does not clear it
    let out = tracker.update(&[det(0, 0, 100, 100)], 1);
    assert_eq!(out[0].identity_id.as_deref(), Some("P7"));
}

#[test]
fn test_summary() {
    let mut tracker = WeightTracker::new(2, 5, 0.3);
    tracker.update(&[det(0, 0, 100, 100), det(300, 300, 400, 400)], 10);
    tracker.update(&[det(0, 0, 100, 100)], 14);
    let summary = tracker.summary();
    assert_eq!(summary.total_tracks, 2);
    assert_eq!(summary.confirmed_tracks, 1);
    assert_eq!(summary.tracks[0].duration_frames, 5);
    assert_eq!(summary.tracks[1].duration_frames, 1);
    assert_eq!(summary.tracks[1].age, 1);
}

#[test]
fn test_dummy_tracks_compare_by_content() {
    assert_eq!(Track::dummy_track(4), Track::dummy_track(4));
    assert_ne!(Track::dummy_track(4), Track::dummy_track(5));
}

fn gen_frame(g: &mut Gen) -> Vec<Detection> {
    let n = usize::arbitrary(g) % 5;
    (0..n)
        .map(|_| {
            let x = (u16::arbitrary(g) % 8) as i32 * 60;
            let y = (u16::arbitrary(g) % 8) as i32 * 60;
            det(x, y, x + 50, y + 50)
        })
        .collect()
}

#[test]
fn test_quickcheck_track_invariants() {
    fn prop(_: usize) -> bool {
        let mut rng = rand::thread_rng();
        let min_hits = rng.gen_range(1..=4);
        let max_age = rng.gen_range(0..=4);
        let mut tracker = WeightTracker::new(min_hits, max_age, 0.3);
        let mut g = Gen::new(100);

        let mut seen_max = 0u64;
        let mut removed: Vec<u64> = Vec::new();
        let mut was_confirmed: Vec<u64> = Vec::new();

        for frame in 0..rng.gen_range(1..40) {
            let before: Vec<u64> = tracker.tracks().iter().map(|t| t.get_track_id()).collect();
            let out = tracker.update(&gen_frame(&mut g), frame);
            let after: Vec<u64> = tracker.tracks().iter().map(|t| t.get_track_id()).collect();

            // ids strictly increasing in creation order, never reused
            if after.windows(2).any(|w| w[0] >= w[1]) {
                return false;
            }
            for id in after.iter().filter(|id| !before.contains(id)) {
                if *id <= seen_max || removed.contains(id) {
                    return false;
                }
                seen_max = *id;
            }
            removed.extend(before.iter().filter(|id| !after.contains(id)));

            for track in tracker.tracks() {
                if track.get_age() > max_age {
                    return false;
                }
                if track.is_confirmed() != (track.get_hits() >= min_hits) {
                    return false;
                }
            }
            for id in &was_confirmed {
                if let Some(track) = tracker.get_track(*id) {
                    if !track.is_confirmed() {
                        return false;
                    }
                }
            }
            was_confirmed.extend(out.iter().map(|t| t.track_id));
            if out.iter().any(|t| t.hits < min_hits) {
                return false;
            }
        }
        true
    }
    quickcheck::quickcheck(prop as fn(usize) -> bool);
}
