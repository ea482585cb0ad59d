//! Annotation drawing geometry
//!
//! Pure translation from byte annotations to screen-space drawing
//! primitives. No rendering engine is involved; the UI layer takes the
//! primitives and draws them with whatever chart widget it embeds, which
//! keeps this step testable without a graphics context.
//!
//! Degenerate view states (zero-width zoom, empty axis) produce non-finite
//! screen coordinates; [`annotation_primitives`] detects those and skips
//! the affected annotation instead of handing garbage to the renderer.

use crate::pipeline::builder::ByteAnnotation;
use crate::types::Direction;

/// Linear mapping from waveform data space to screen space.
///
/// Data x is the sample index, data y the logic level. Screen y grows
/// downward, so larger levels map to smaller screen y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    data_min: [f64; 2],
    data_max: [f64; 2],
    screen_min: [f64; 2],
    screen_max: [f64; 2],
}

impl ViewTransform {
    /// Create a transform from a data-space window to a screen rectangle
    pub fn new(
        data_min: [f64; 2],
        data_max: [f64; 2],
        screen_min: [f64; 2],
        screen_max: [f64; 2],
    ) -> Self {
        Self {
            data_min,
            data_max,
            screen_min,
            screen_max,
        }
    }

    /// Map a data-space x (sample index) to screen x
    pub fn map_x(&self, x: f64) -> f64 {
        let t = (x - self.data_min[0]) / (self.data_max[0] - self.data_min[0]);
        self.screen_min[0] + t * (self.screen_max[0] - self.screen_min[0])
    }

    /// Map a data-space y (logic level) to screen y, inverted
    pub fn map_y(&self, y: f64) -> f64 {
        let t = (y - self.data_min[1]) / (self.data_max[1] - self.data_min[1]);
        self.screen_max[1] - t * (self.screen_max[1] - self.screen_min[1])
    }

    /// Map a data-space point to a screen point
    pub fn map_point(&self, point: [f64; 2]) -> [f64; 2] {
        [self.map_x(point[0]), self.map_y(point[1])]
    }
}

/// One renderer-agnostic drawing instruction, in screen coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    /// Axis-aligned rectangle outline, `min` is the top-left corner
    Rect { min: [f64; 2], max: [f64; 2] },
    /// Straight line segment
    Line { from: [f64; 2], to: [f64; 2] },
    /// Text anchored at a point
    Text { pos: [f64; 2], text: String },
}

/// Height of the label anchor above the lane base, in level units
const LABEL_LEVEL_OFFSET: f64 = 1.25;

/// Marks for the level axis: the vertical midpoint and name of each lane
pub fn lane_axis_marks() -> [(f64, &'static str); 2] {
    [
        (Direction::Tx.lane_base() + 0.5, Direction::Tx.display_name()),
        (Direction::Rx.lane_base() + 0.5, Direction::Rx.display_name()),
    ]
}

/// Primitives for one byte annotation: a frame rectangle around its
/// samples, a mid-frame tick, and the label text above the lane.
///
/// Returns an empty list when the transform produces any non-finite
/// coordinate, so a single bad annotation never propagates a rendering
/// fault.
pub fn annotation_primitives(
    annotation: &ByteAnnotation,
    transform: &ViewTransform,
) -> Vec<DrawPrimitive> {
    let base = annotation.channel.lane_base();
    let mid_x = annotation.mid as f64;

    let corner_a = transform.map_point([annotation.start as f64, base]);
    let corner_b = transform.map_point([annotation.end as f64, base + 1.0]);
    let tick_from = transform.map_point([mid_x, base]);
    let tick_to = transform.map_point([mid_x, base + 1.0]);
    let label_pos = transform.map_point([mid_x, base + LABEL_LEVEL_OFFSET]);

    let coords = [
        corner_a[0],
        corner_a[1],
        corner_b[0],
        corner_b[1],
        tick_from[1],
        tick_to[1],
        label_pos[0],
        label_pos[1],
    ];
    if !coords.iter().all(|c| c.is_finite()) {
        return Vec::new();
    }

    let rect_min = [corner_a[0].min(corner_b[0]), corner_a[1].min(corner_b[1])];
    let rect_max = [corner_a[0].max(corner_b[0]), corner_a[1].max(corner_b[1])];

    vec![
        DrawPrimitive::Rect {
            min: rect_min,
            max: rect_max,
        },
        DrawPrimitive::Line {
            from: tick_from,
            to: tick_to,
        },
        DrawPrimitive::Text {
            pos: label_pos,
            text: annotation.label.clone(),
        },
    ]
}
