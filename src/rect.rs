use nalgebra::Matrix1x4;
use serde::{Deserialize, Serialize};

/* ------------------------------------------------------------------------------
 * Type aliases
 * ------------------------------------------------------------------------------ */
pub type Xyxy = Matrix1x4<i32>;

/* ------------------------------------------------------------------------------
 * Rect struct
 * ------------------------------------------------------------------------------ */

/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Corners are stored as `[x1, y1, x2, y2]`. A box with `x2 <= x1` or
/// `y2 <= y1` is malformed; it is kept as-is and simply never overlaps
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    xyxy: Xyxy,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            xyxy: Matrix1x4::new(x1, y1, x2, y2),
        }
    }

    /// Create Rect from top-left corner, width and height
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    #[inline(always)]
    pub fn x1(&self) -> i32 {
        self.xyxy[(0, 0)]
    }

    #[inline(always)]
    pub fn y1(&self) -> i32 {
        self.xyxy[(0, 1)]
    }

    #[inline(always)]
    pub fn x2(&self) -> i32 {
        self.xyxy[(0, 2)]
    }

    #[inline(always)]
    pub fn y2(&self) -> i32 {
        self.xyxy[(0, 3)]
    }

    #[inline(always)]
    pub fn width(&self) -> i64 {
        self.x2() as i64 - self.x1() as i64
    }

    #[inline(always)]
    pub fn height(&self) -> i64 {
        self.y2() as i64 - self.y1() as i64
    }

    /// Area in square pixels, 0 for a malformed box. Saturates at `i64::MAX`.
    pub fn area(&self) -> i64 {
        if !self.is_valid() {
            return 0;
        }
        self.width().saturating_mul(self.height())
    }

    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// Get bounding box as [x1, y1, x2, y2] format
    pub fn get_xyxy(&self) -> [i32; 4] {
        [self.x1(), self.y1(), self.x2(), self.y2()]
    }

    /// Intersection over union. Malformed boxes yield 0.0 against everything.
    pub fn calc_iou(&self, other: &Rect) -> f32 {
        if !self.is_valid() || !other.is_valid() {
            return 0.0;
        }

        let iw = self.x2().min(other.x2()) as i64 - self.x1().max(other.x1()) as i64;
        let ih = self.y2().min(other.y2()) as i64 - self.y1().max(other.y1()) as i64;
        if iw <= 0 || ih <= 0 {
            return 0.0;
        }

        let inter = iw as f64 * ih as f64;
        let union = self.width() as f64 * self.height() as f64
            + other.width() as f64 * other.height() as f64
            - inter;
        if union <= 0.0 {
            return 0.0;
        }
        (inter / union) as f32
    }
}

impl From<[i32; 4]> for Rect {
    fn from(xyxy: [i32; 4]) -> Self {
        Self::new(xyxy[0], xyxy[1], xyxy[2], xyxy[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(rect: Rect) -> Self {
        rect.get_xyxy()
    }
}
