//! Association between existing tracks and new detections.
//!
//! Association is a greedy repeated-argmax over the IoU matrix, not an
//! optimal assignment: the best remaining pair is committed first, and ties
//! go to the pair found first in row-major scan order.

use crate::rect::Rect;
use nalgebra::DMatrix;

/// IoU between every track box (rows) and detection box (columns).
pub fn iou_batch(tracks: &[Rect], detections: &[Rect]) -> DMatrix<f32> {
    let num_trks = tracks.len();
    let num_dets = detections.len();

    let mut iou = DMatrix::zeros(num_trks, num_dets);
    if num_trks == 0 || num_dets == 0 {
        return iou;
    }

    for (i, trk) in tracks.iter().enumerate() {
        for (j, det) in detections.iter().enumerate() {
            iou[(i, j)] = trk.calc_iou(det);
        }
    }
    iou
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentResult {
    /// (track_idx, detection_idx) in commit order.
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy one-to-one assignment on an IoU matrix.
///
/// Repeatedly commits the highest remaining IoU pair while it is at least
/// `iou_threshold`. Pairs without any overlap never match, whatever the
/// threshold. Each row and each column is used at most once.
pub fn greedy_assignment(iou: &DMatrix<f32>, iou_threshold: f32) -> AssignmentResult {
    let (num_trks, num_dets) = iou.shape();
    let mut row_used = vec![false; num_trks];
    let mut col_used = vec![false; num_dets];
    let mut matches = Vec::new();

    loop {
        let mut best: Option<(usize, usize, f32)> = None;
        for i in 0..num_trks {
            if row_used[i] {
                continue;
            }
            for j in 0..num_dets {
                if col_used[j] {
                    continue;
                }
                let v = iou[(i, j)];
                if v > 0.0 && v >= iou_threshold && best.map_or(true, |(_, _, b)| v > b) {
                    best = Some((i, j, v));
                }
            }
        }

        match best {
            Some((i, j, _)) => {
                row_used[i] = true;
                col_used[j] = true;
                matches.push((i, j));
            }
            None => break,
        }
    }

    AssignmentResult {
        matches,
        unmatched_tracks: (0..num_trks).filter(|&i| !row_used[i]).collect(),
        unmatched_detections: (0..num_dets).filter(|&j| !col_used[j]).collect(),
    }
}
