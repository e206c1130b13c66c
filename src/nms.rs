//! Detection de-duplication by non-maximum suppression.

use crate::detection::Detection;

/// Greedy NMS over detector outputs.
///
/// Detections are stable-sorted by confidence (descending, ties keep their
/// input order). The best remaining detection is kept and every remaining
/// detection that overlaps it with an IoU reaching `iou_threshold` is
/// dropped, until nothing remains. The returned detections are in selection
/// order.
pub fn non_max_suppression(
    mut detections: Vec<Detection>,
    iou_threshold: f32,
) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    let mut suppressed = vec![false; detections.len()];

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if suppressed[j] {
                continue;
            }
            // boxes that do not overlap never suppress each other
            let iou = detections[i].rect.calc_iou(&detections[j].rect);
            if iou > 0.0 && iou >= iou_threshold {
                suppressed[j] = true;
            }
        }
        kept.push(detections[i].clone());
    }

    log::trace!(
        "nms kept {} of {} detections (iou >= {})",
        kept.len(),
        detections.len(),
        iou_threshold
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rect::Rect;
    use quickcheck::{Arbitrary, Gen};
    use rand::{self, Rng};

    fn det(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32) -> Detection {
        Detection::new(Rect::new(x1, y1, x2, y2), confidence, 0)
    }

    #[test]
    fn test_empty_input() {
        assert!(non_max_suppression(vec![], 0.5).is_empty());
    }

    #[test]
    fn test_suppresses_overlapping_lower_confidence() {
        let dets = vec![
            det(0, 0, 100, 100, 0.6),
            det(5, 5, 105, 105, 0.9),
            det(300, 300, 400, 400, 0.7),
        ];
        let kept = non_max_suppression(dets, 0.5);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].confidence, 0.7);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // IoU exactly 1/3
        let dets = vec![det(0, 0, 100, 100, 0.9), det(50, 0, 150, 100, 0.8)];
        let iou = dets[0].rect.calc_iou(&dets[1].rect);
        assert_eq!(non_max_suppression(dets.clone(), iou).len(), 1);
        assert_eq!(non_max_suppression(dets, iou + 1e-3).len(), 2);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let dets = vec![
            det(0, 0, 10, 10, 0.5),
            det(100, 100, 110, 110, 0.5),
            det(200, 200, 210, 210, 0.5),
        ];
        let kept = non_max_suppression(dets.clone(), 0.5);
        assert_eq!(kept, dets);
    }

    #[test]
    fn test_tie_on_overlap_keeps_first() {
        let mut second = det(0, 0, 100, 100, 0.8);
        second.label = 7;
        let kept = non_max_suppression(vec![det(0, 0, 100, 100, 0.8), second], 0.5);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, 0);
    }

    #[test]
    fn test_malformed_boxes_never_suppress() {
        let dets = vec![det(0, 0, 0, 0, 0.9), det(0, 0, 0, 0, 0.8)];
        assert_eq!(non_max_suppression(dets, 0.0001).len(), 2);
    }

    #[test]
    fn test_zero_threshold_keeps_malformed_and_disjoint() {
        let dets = vec![
            det(0, 0, 100, 100, 0.9),
            det(50, 50, 50, 80, 0.8),
            det(500, 500, 600, 600, 0.7),
        ];
        let kept = non_max_suppression(dets.clone(), 0.0);
        assert_eq!(kept, dets);

        // any real overlap still suppresses at threshold 0
        let overlapping = vec![det(0, 0, 100, 100, 0.9), det(99, 99, 200, 200, 0.8)];
        assert_eq!(non_max_suppression(overlapping, 0.0).len(), 1);
    }

    fn gen_detections(n: usize, g: &mut Gen) -> Vec<Detection> {
        (0..n)
            .map(|_| {
                let x1 = (u16::arbitrary(g) % 500) as i32;
                let y1 = (u16::arbitrary(g) % 500) as i32;
                let w = (u16::arbitrary(g) % 150) as i32 + 1;
                let h = (u16::arbitrary(g) % 150) as i32 + 1;
                let confidence = (u16::arbitrary(g) % 1000) as f32 / 1000.0;
                det(x1, y1, x1 + w, y1 + h, confidence)
            })
            .collect()
    }

    #[test]
    fn test_quickcheck_nms_invariants() {
        fn prop(_: usize) -> bool {
            let mut rng = rand::thread_rng();
            let n = rng.gen_range(0..=40);
            let threshold = rng.gen_range(0.05f32..0.95);
            let dets = gen_detections(n, &mut Gen::new(100));
            let kept = non_max_suppression(dets.clone(), threshold);

            if kept.len() > dets.len() {
                return false;
            }
            for i in 0..kept.len() {
                for j in (i + 1)..kept.len() {
                    if kept[i].rect.calc_iou(&kept[j].rect) >= threshold {
                        return false;
                    }
                }
            }
            // every input that overlaps nothing above threshold survives
            dets.iter().enumerate().all(|(i, d)| {
                let isolated = dets.iter().enumerate().all(|(j, o)| {
                    i == j || d.rect.calc_iou(&o.rect) < threshold
                });
                !isolated || kept.contains(d)
            })
        }
        quickcheck::quickcheck(prop as fn(usize) -> bool);
    }
}
