use crate::options::StrokeOptions;
use glam::{Affine2, Vec2};
use rive_data::model::{StrokeCapData, StrokeJoinData};
use std::f32::consts::{FRAC_PI_2, PI};
use std::ops::Range;
use tracing::debug;

/// Consecutive points closer than this (squared) are merged.
const COINCIDENT_EPSILON_SQ: f32 = 1e-10;
/// Joins whose turn has a smaller sine are treated as straight.
const COLLINEAR_EPSILON: f32 = 1e-4;
const MIN_ROUND_STEP: f32 = PI / 64.0;

/// A source of flattened sub-paths that can be stroked.
pub trait PathSource {
    fn sub_path_count(&self) -> usize;
    fn sub_path_points(&self, index: usize) -> &[Vec2];
    fn is_sub_path_closed(&self, index: usize) -> bool;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StrokeCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl From<StrokeJoinData> for StrokeJoin {
    fn from(join: StrokeJoinData) -> Self {
        match join {
            StrokeJoinData::Miter => StrokeJoin::Miter,
            StrokeJoinData::Round => StrokeJoin::Round,
            StrokeJoinData::Bevel => StrokeJoin::Bevel,
        }
    }
}

impl From<StrokeCapData> for StrokeCap {
    fn from(cap: StrokeCapData) -> Self {
        match cap {
            StrokeCapData::Butt => StrokeCap::Butt,
            StrokeCapData::Round => StrokeCap::Round,
            StrokeCapData::Square => StrokeCap::Square,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtrudeState {
    #[default]
    Idle,
    Accumulating,
}

/// Builds a triangle strip vertex buffer from stroked sub-paths.
///
/// Every call to [`extrude`](ContourStroke::extrude) appends one run per
/// stroked sub-path and records where the run starts. Runs never share
/// connective triangles, so each one is drawn with its own call; use
/// [`next_render_offset`](ContourStroke::next_render_offset) to walk them.
#[derive(Clone, Debug, Default)]
pub struct ContourStroke {
    triangle_strip: Vec<Vec2>,
    offsets: Vec<usize>,
    render_offset: usize,
    state: ExtrudeState,
    options: StrokeOptions,
    scratch: Vec<Vec2>,
}

impl ContourStroke {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: StrokeOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &StrokeOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: StrokeOptions) {
        self.options = options;
    }

    pub fn triangle_strip(&self) -> &[Vec2] {
        &self.triangle_strip
    }

    /// Start index of every run in the strip, in append order.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn state(&self) -> ExtrudeState {
        self.state
    }

    /// Clears all geometry and the read cursor.
    pub fn reset(&mut self) {
        self.triangle_strip.clear();
        self.offsets.clear();
        self.render_offset = 0;
        self.state = ExtrudeState::Idle;
    }

    pub fn reset_render_offset(&mut self) {
        self.render_offset = 0;
    }

    /// Returns the next run's vertex range and advances the read cursor.
    pub fn next_render_offset(&mut self) -> Option<Range<usize>> {
        let range = self.run_range(self.render_offset)?;
        self.render_offset += 1;
        Some(range)
    }

    /// All run ranges, without touching the read cursor.
    pub fn render_ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        (0..self.offsets.len()).filter_map(move |i| self.run_range(i))
    }

    fn run_range(&self, run: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(run)?;
        let end = self
            .offsets
            .get(run + 1)
            .copied()
            .unwrap_or(self.triangle_strip.len());
        Some(start..end)
    }

    /// Strokes every sub-path of `path` and appends the result.
    ///
    /// A sub-path is stroked closed only when both `is_closed` and the
    /// sub-path itself say so. A closed sub-path stroked open keeps its
    /// closing edge and gets caps at the seam. Geometry is built in path space and each
    /// vertex is mapped through `transform` as it is emitted. A width that
    /// is not strictly positive produces nothing.
    pub fn extrude<P: PathSource + ?Sized>(
        &mut self,
        path: &P,
        is_closed: bool,
        join: StrokeJoin,
        cap: StrokeCap,
        stroke_width: f32,
        transform: Affine2,
    ) {
        self.state = ExtrudeState::Accumulating;
        if !(stroke_width > 0.0 && stroke_width.is_finite()) {
            debug!(stroke_width, "skipping extrusion for non-positive stroke width");
            return;
        }

        let mut points = std::mem::take(&mut self.scratch);
        for i in 0..path.sub_path_count() {
            let sub_path_closed = path.is_sub_path_closed(i);
            let closed = is_closed && sub_path_closed;
            collect_distinct(path.sub_path_points(i), closed, &mut points);
            if points.len() < 2 {
                continue;
            }
            // Stroked open, a closed outline still runs back to its first point.
            if sub_path_closed && !closed {
                let first = points[0];
                if points[points.len() - 1].distance_squared(first) > COINCIDENT_EPSILON_SQ {
                    points.push(first);
                }
            }

            let start = self.triangle_strip.len();
            let mut run = RunBuilder {
                out: &mut self.triangle_strip,
                transform,
                half_width: stroke_width * 0.5,
                options: self.options,
            };
            if closed && points.len() >= 3 {
                run.closed(&points, join);
            } else {
                run.open(&points, join, cap);
            }
            self.offsets.push(start);
        }
        self.scratch = points;
    }
}

fn collect_distinct(points: &[Vec2], closed: bool, out: &mut Vec<Vec2>) {
    out.clear();
    for &p in points.iter().filter(|p| p.is_finite()) {
        if out
            .last()
            .map_or(true, |&last| last.distance_squared(p) > COINCIDENT_EPSILON_SQ)
        {
            out.push(p);
        }
    }
    if closed {
        while out.len() > 1 && out[0].distance_squared(out[out.len() - 1]) <= COINCIDENT_EPSILON_SQ
        {
            out.pop();
        }
    }
}

struct Segment {
    dir: Vec2,
    len: f32,
}

impl Segment {
    fn between(from: Vec2, to: Vec2) -> Self {
        let diff = to - from;
        let len = diff.length();
        Segment {
            dir: diff / len,
            len,
        }
    }
}

/// Emits one run. Vertices come in (left, right) pairs offset along the
/// normal, except for the single tip vertex of a round cap.
struct RunBuilder<'s> {
    out: &'s mut Vec<Vec2>,
    transform: Affine2,
    half_width: f32,
    options: StrokeOptions,
}

impl RunBuilder<'_> {
    fn push(&mut self, point: Vec2) {
        self.out.push(self.transform.transform_point2(point));
    }

    fn push_pair(&mut self, center: Vec2, offset: Vec2) {
        self.push(center + offset);
        self.push(center - offset);
    }

    fn open(&mut self, points: &[Vec2], join: StrokeJoin, cap: StrokeCap) {
        let n = points.len();
        let mut incoming = Segment::between(points[0], points[1]);
        self.start_cap(points[0], incoming.dir, cap);
        for i in 1..n - 1 {
            let outgoing = Segment::between(points[i], points[i + 1]);
            self.join(points[i], &incoming, &outgoing, join);
            incoming = outgoing;
        }
        self.end_cap(points[n - 1], incoming.dir, cap);
    }

    fn closed(&mut self, points: &[Vec2], join: StrokeJoin) {
        let n = points.len();
        let start = self.out.len();
        let mut incoming = Segment::between(points[n - 1], points[0]);
        for i in 0..n {
            let outgoing = Segment::between(points[i], points[(i + 1) % n]);
            self.join(points[i], &incoming, &outgoing, join);
            incoming = outgoing;
        }
        // Wrap back onto the first pair to close the last segment.
        let (a, b) = (self.out[start], self.out[start + 1]);
        self.out.push(a);
        self.out.push(b);
    }

    fn start_cap(&mut self, point: Vec2, dir: Vec2, cap: StrokeCap) {
        let normal = dir.perp() * self.half_width;
        match cap {
            StrokeCap::Butt => self.push_pair(point, normal),
            StrokeCap::Square => self.push_pair(point - dir * self.half_width, normal),
            StrokeCap::Round => {
                let steps = self.arc_steps(FRAC_PI_2);
                self.push(point - dir * self.half_width);
                for k in 1..=steps {
                    let (sin, cos) = (FRAC_PI_2 * k as f32 / steps as f32).sin_cos();
                    self.push_pair(point - dir * (cos * self.half_width), normal * sin);
                }
            }
        }
    }

    fn end_cap(&mut self, point: Vec2, dir: Vec2, cap: StrokeCap) {
        let normal = dir.perp() * self.half_width;
        match cap {
            StrokeCap::Butt => self.push_pair(point, normal),
            StrokeCap::Square => self.push_pair(point + dir * self.half_width, normal),
            StrokeCap::Round => {
                let steps = self.arc_steps(FRAC_PI_2);
                for k in (1..=steps).rev() {
                    let (sin, cos) = (FRAC_PI_2 * k as f32 / steps as f32).sin_cos();
                    self.push_pair(point + dir * (cos * self.half_width), normal * sin);
                }
                self.push(point + dir * self.half_width);
            }
        }
    }

    fn join(&mut self, point: Vec2, incoming: &Segment, outgoing: &Segment, join: StrokeJoin) {
        let n0 = incoming.dir.perp();
        let n1 = outgoing.dir.perp();
        let sin = incoming.dir.perp_dot(outgoing.dir);
        let cos = incoming.dir.dot(outgoing.dir);

        if sin.abs() <= COLLINEAR_EPSILON {
            if cos > 0.0 {
                self.push_pair(point, n1 * self.half_width);
                return;
            }
            // Doubling back: turn through the tangent so no two pairs coincide.
            let steps = match join {
                StrokeJoin::Round => self.arc_steps(PI),
                _ => 2,
            };
            self.rotate(point, n0, PI, steps);
            return;
        }

        let angle = sin.atan2(cos);
        match join {
            StrokeJoin::Miter => {
                match self.miter_offset(n0, n1, incoming.len.min(outgoing.len)) {
                    Some(offset) => self.push_pair(point, offset),
                    None => self.rotate(point, n0, angle, 1),
                }
            }
            StrokeJoin::Bevel => self.rotate(point, n0, angle, 1),
            StrokeJoin::Round => {
                let steps = self.arc_steps(angle);
                self.rotate(point, n0, angle, steps);
            }
        }
    }

    /// Offset from the join point to the outer miter corner, or `None` when
    /// the join has to be beveled.
    fn miter_offset(&self, n0: Vec2, n1: Vec2, reach: f32) -> Option<Vec2> {
        let bisector = (n0 + n1).normalize_or_zero();
        let cos_half = bisector.dot(n0);
        if cos_half <= f32::EPSILON {
            return None;
        }
        let ratio = 1.0 / cos_half;
        if ratio > self.options.miter_limit {
            return None;
        }
        // The inner corner sits half_width * tan(theta / 2) back along both segments.
        let tan_half = (1.0 - cos_half * cos_half).max(0.0).sqrt() / cos_half;
        if self.half_width * tan_half > reach {
            return None;
        }
        Some(bisector * (self.half_width * ratio))
    }

    /// Emits `steps + 1` pairs whose normal turns from `from` by `angle`.
    fn rotate(&mut self, point: Vec2, from: Vec2, angle: f32, steps: usize) {
        for k in 0..=steps {
            let normal = Vec2::from_angle(angle * k as f32 / steps as f32).rotate(from);
            self.push_pair(point, normal * self.half_width);
        }
    }

    fn arc_steps(&self, angle: f32) -> usize {
        let ratio = (self.options.round_tolerance / self.half_width).clamp(0.0, 1.0);
        let step = (2.0 * (1.0 - ratio).acos()).clamp(MIN_ROUND_STEP, FRAC_PI_2);
        ((angle.abs() / step).ceil() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contour::Contour;

    fn polyline(points: &[(f32, f32)], closed: bool) -> Contour {
        Contour {
            points: points.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            closed,
        }
    }

    fn approx(a: Vec2, b: Vec2) -> bool {
        a.distance(b) < 1e-4
    }

    #[test]
    fn test_single_segment_butt() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 4.0, Affine2::IDENTITY);

        let strip = stroke.triangle_strip();
        assert_eq!(strip.len(), 4);
        assert_eq!(stroke.offsets(), &[0]);
        assert!(approx(strip[0], Vec2::new(0.0, 2.0)));
        assert!(approx(strip[1], Vec2::new(0.0, -2.0)));
        assert!(approx(strip[2], Vec2::new(10.0, 2.0)));
        assert!(approx(strip[3], Vec2::new(10.0, -2.0)));
    }

    #[test]
    fn test_square_cap_extends_by_half_width() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Square, 4.0, Affine2::IDENTITY);

        let strip = stroke.triangle_strip();
        assert_eq!(strip.len(), 4);
        assert!(approx(strip[0], Vec2::new(-2.0, 2.0)));
        assert!(approx(strip[3], Vec2::new(12.0, -2.0)));
    }

    #[test]
    fn test_round_cap_adds_tips() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Round, 4.0, Affine2::IDENTITY);

        let strip = stroke.triangle_strip();
        assert!(strip.len() > 4);
        assert!(approx(strip[0], Vec2::new(-2.0, 0.0)));
        assert!(approx(*strip.last().unwrap(), Vec2::new(12.0, 0.0)));
        // Every emitted point lies within the stroke radius of an endpoint or the segment.
        for p in strip {
            let closest_x = p.x.clamp(0.0, 10.0);
            assert!(p.distance(Vec2::new(closest_x, 0.0)) <= 2.0 + 1e-4);
        }
    }

    #[test]
    fn test_miter_join_right_angle() {
        let corner = polyline(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&corner, false, StrokeJoin::Miter, StrokeCap::Butt, 2.0, Affine2::IDENTITY);

        let strip = stroke.triangle_strip();
        assert_eq!(strip.len(), 6);
        // Left turn: outer corner on the right side.
        assert!(approx(strip[2], Vec2::new(9.0, 1.0)));
        assert!(approx(strip[3], Vec2::new(11.0, -1.0)));
    }

    #[test]
    fn test_miter_limit_falls_back_to_bevel() {
        // A very sharp turn has a miter ratio far above the limit.
        let spike = polyline(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.5)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&spike, false, StrokeJoin::Miter, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        assert_eq!(stroke.triangle_strip().len(), 8);

        let mut bevel = ContourStroke::new();
        bevel.extrude(&spike, false, StrokeJoin::Bevel, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        assert_eq!(stroke.triangle_strip(), bevel.triangle_strip());
    }

    #[test]
    fn test_collinear_points_emit_single_pair() {
        let line = polyline(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Round, StrokeCap::Butt, 2.0, Affine2::IDENTITY);
        assert_eq!(stroke.triangle_strip().len(), 6);
    }

    #[test]
    fn test_doubling_back_never_repeats_a_pair() {
        let back = polyline(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&back, false, StrokeJoin::Bevel, StrokeCap::Butt, 2.0, Affine2::IDENTITY);

        let strip = stroke.triangle_strip();
        // Start pair, three turning pairs, end pair.
        assert_eq!(strip.len(), 10);
        for w in strip.windows(3) {
            let area = (w[1] - w[0]).perp_dot(w[2] - w[0]).abs();
            assert!(area > 1e-6);
        }
    }

    #[test]
    fn test_transform_applied_to_vertices() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        let transform = Affine2::from_translation(Vec2::new(100.0, 50.0));
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 4.0, transform);
        assert!(approx(stroke.triangle_strip()[0], Vec2::new(100.0, 52.0)));
    }

    #[test]
    fn test_non_positive_width_produces_nothing() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 0.0, Affine2::IDENTITY);
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, -1.0, Affine2::IDENTITY);
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, f32::NAN, Affine2::IDENTITY);
        assert!(stroke.triangle_strip().is_empty());
        assert!(stroke.offsets().is_empty());
        assert_eq!(stroke.next_render_offset(), None);
    }

    #[test]
    fn test_state_and_reset() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        assert_eq!(stroke.state(), ExtrudeState::Idle);

        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        assert_eq!(stroke.state(), ExtrudeState::Accumulating);
        assert_eq!(stroke.offsets(), &[0, 4]);

        stroke.reset();
        assert_eq!(stroke.state(), ExtrudeState::Idle);
        assert!(stroke.triangle_strip().is_empty());
        assert!(stroke.offsets().is_empty());
    }

    #[test]
    fn test_render_offset_cursor() {
        let line = polyline(&[(0.0, 0.0), (10.0, 0.0)], false);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        stroke.extrude(&line, false, StrokeJoin::Miter, StrokeCap::Square, 1.0, Affine2::IDENTITY);

        assert_eq!(stroke.next_render_offset(), Some(0..4));
        assert_eq!(stroke.next_render_offset(), Some(4..8));
        assert_eq!(stroke.next_render_offset(), None);

        stroke.reset_render_offset();
        assert_eq!(stroke.next_render_offset(), Some(0..4));
        assert_eq!(stroke.render_ranges().collect::<Vec<_>>(), vec![0..4, 4..8]);
    }

    #[test]
    fn test_closed_flag_can_force_open() {
        let triangle = polyline(&[(0.0, 0.0), (10.0, 0.0), (5.0, 8.0)], true);
        let mut closed = ContourStroke::new();
        closed.extrude(&triangle, true, StrokeJoin::Bevel, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        let mut open = ContourStroke::new();
        open.extrude(&triangle, false, StrokeJoin::Bevel, StrokeCap::Butt, 1.0, Affine2::IDENTITY);

        // Open: start pair, two bevel joins (two pairs each), end pair back at the start.
        assert_eq!(open.triangle_strip().len(), 12);
        assert_eq!(closed.triangle_strip().len(), 14);

        let strip = open.triangle_strip();
        assert!(approx((strip[10] + strip[11]) * 0.5, Vec2::ZERO));
        assert!(strip_covers(strip, Vec2::new(2.5, 4.0)));
    }

    fn strip_covers(strip: &[Vec2], p: Vec2) -> bool {
        strip.windows(3).any(|t| {
            let d1 = (t[1] - t[0]).perp_dot(p - t[0]);
            let d2 = (t[2] - t[1]).perp_dot(p - t[1]);
            let d3 = (t[0] - t[2]).perp_dot(p - t[2]);
            let eps = 1e-4;
            (d1 >= -eps && d2 >= -eps && d3 >= -eps) || (d1 <= eps && d2 <= eps && d3 <= eps)
        })
    }

    #[test]
    fn test_two_point_closed_path_is_stroked_open() {
        let pair = polyline(&[(0.0, 0.0), (10.0, 0.0)], true);
        let mut stroke = ContourStroke::new();
        stroke.extrude(&pair, true, StrokeJoin::Miter, StrokeCap::Butt, 1.0, Affine2::IDENTITY);
        assert_eq!(stroke.triangle_strip().len(), 4);
    }

    #[test]
    fn test_arc_steps_follow_tolerance() {
        let mut out = Vec::new();
        let coarse = RunBuilder {
            out: &mut out,
            transform: Affine2::IDENTITY,
            half_width: 1.0,
            options: StrokeOptions {
                round_tolerance: 10.0,
                ..StrokeOptions::default()
            },
        };
        assert_eq!(coarse.arc_steps(FRAC_PI_2), 1);

        let fine = RunBuilder {
            out: &mut out,
            transform: Affine2::IDENTITY,
            half_width: 100.0,
            options: StrokeOptions::default(),
        };
        assert!(fine.arc_steps(PI) > 8);
    }
}
