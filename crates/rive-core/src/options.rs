use serde::{Deserialize, Serialize};

/// Tuning knobs for contour flattening and stroke extrusion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeOptions {
    /// Miter length over half the stroke width above which miter joins are beveled.
    pub miter_limit: f32,
    /// Largest distance, in local units, a round join or cap may deviate from a true arc.
    pub round_tolerance: f32,
    /// Flatness threshold used when subdividing cubic segments into contours.
    pub contour_threshold: f32,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            miter_limit: 4.0,
            round_tolerance: 0.25,
            contour_threshold: 1.0,
        }
    }
}
