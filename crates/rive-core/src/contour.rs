use crate::stroke::PathSource;
use glam::Vec2;
use kurbo::{BezPath, CubicBez, ParamCurve, PathEl, Point, Rect};

const MAX_SUBDIVISION_DEPTH: u32 = 16;
const MIN_THRESHOLD: f64 = 0.01;

/// One flattened sub-path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Contour {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl PathSource for Contour {
    fn sub_path_count(&self) -> usize {
        1
    }

    fn sub_path_points(&self, _index: usize) -> &[Vec2] {
        &self.points
    }

    fn is_sub_path_closed(&self, _index: usize) -> bool {
        self.closed
    }
}

impl PathSource for [Contour] {
    fn sub_path_count(&self) -> usize {
        self.len()
    }

    fn sub_path_points(&self, index: usize) -> &[Vec2] {
        &self[index].points
    }

    fn is_sub_path_closed(&self, index: usize) -> bool {
        self[index].closed
    }
}

impl PathSource for Vec<Contour> {
    fn sub_path_count(&self) -> usize {
        self.len()
    }

    fn sub_path_points(&self, index: usize) -> &[Vec2] {
        &self[index].points
    }

    fn is_sub_path_closed(&self, index: usize) -> bool {
        self[index].closed
    }
}

/// A path flattened into line contours, one per sub-path.
#[derive(Clone, Debug, Default)]
pub struct ContourPath {
    contours: Vec<Contour>,
    bounds: Option<Rect>,
}

impl ContourPath {
    /// Flattens `path`. Cubics are split in half until both control points
    /// lie within `threshold` of the chord's third points.
    pub fn from_bez_path(path: &BezPath, threshold: f32) -> Self {
        let mut segmenter = Segmenter::new((threshold as f64).max(MIN_THRESHOLD));
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => segmenter.move_to(p),
                PathEl::LineTo(p) => segmenter.line_to(p),
                PathEl::QuadTo(p1, p2) => {
                    let quad = kurbo::QuadBez::new(segmenter.pen, p1, p2);
                    segmenter.cubic_to(quad.raise());
                }
                PathEl::CurveTo(p1, p2, p3) => {
                    segmenter.cubic_to(CubicBez::new(segmenter.pen, p1, p2, p3));
                }
                PathEl::ClosePath => segmenter.close(),
            }
        }
        segmenter.finish()
    }

    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Axis-aligned bounds of every flattened point.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

impl PathSource for ContourPath {
    fn sub_path_count(&self) -> usize {
        self.contours.len()
    }

    fn sub_path_points(&self, index: usize) -> &[Vec2] {
        &self.contours[index].points
    }

    fn is_sub_path_closed(&self, index: usize) -> bool {
        self.contours[index].closed
    }
}

struct Segmenter {
    contours: Vec<Contour>,
    current: Option<Contour>,
    pen: Point,
    pen_down: Point,
    bounds: Option<Rect>,
    threshold: f64,
    threshold_sq: f64,
}

impl Segmenter {
    fn new(threshold: f64) -> Self {
        Self {
            contours: Vec::new(),
            current: None,
            pen: Point::ZERO,
            pen_down: Point::ZERO,
            bounds: None,
            threshold,
            threshold_sq: threshold * threshold,
        }
    }

    fn add_vertex(&mut self, p: Point) {
        self.bounds = Some(match self.bounds {
            Some(b) => b.union_pt(p),
            None => Rect::from_points(p, p),
        });
        if let Some(contour) = self.current.as_mut() {
            contour.points.push(Vec2::new(p.x as f32, p.y as f32));
        }
    }

    fn start_contour(&mut self) {
        if self.current.is_none() {
            self.current = Some(Contour::default());
            self.pen_down = self.pen;
            self.add_vertex(self.pen);
        }
    }

    fn finish_contour(&mut self) {
        if let Some(contour) = self.current.take() {
            self.contours.push(contour);
        }
    }

    fn move_to(&mut self, p: Point) {
        self.finish_contour();
        self.pen = p;
    }

    fn line_to(&mut self, p: Point) {
        self.start_contour();
        self.add_vertex(p);
        self.pen = p;
    }

    fn cubic_to(&mut self, cubic: CubicBez) {
        self.start_contour();
        self.segment_cubic(cubic, 0, true);
        self.pen = cubic.p3;
    }

    fn close(&mut self) {
        if let Some(contour) = self.current.as_mut() {
            contour.closed = true;
        }
        self.finish_contour();
        self.pen = self.pen_down;
    }

    fn finish(mut self) -> ContourPath {
        self.finish_contour();
        ContourPath {
            contours: self.contours,
            bounds: self.bounds,
        }
    }

    fn should_split(&self, c: &CubicBez) -> bool {
        let one_third = c.p0.lerp(c.p3, 1.0 / 3.0);
        let two_thirds = c.p0.lerp(c.p3, 2.0 / 3.0);
        let d1 = (one_third - c.p1).hypot2();
        let d2 = (two_thirds - c.p2).hypot2();
        d1.max(d2) > self.threshold_sq
    }

    fn segment_cubic(&mut self, cubic: CubicBez, depth: u32, is_last: bool) {
        if depth < MAX_SUBDIVISION_DEPTH && self.should_split(&cubic) {
            let (first, second) = cubic.subdivide();
            self.segment_cubic(first, depth + 1, false);
            self.segment_cubic(second, depth + 1, is_last);
        } else if is_last || (cubic.p3 - cubic.p0).hypot2() > self.threshold_sq {
            self.add_vertex(cubic.p3);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_close() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.line_to((10.0, 10.0));
        path.close_path();

        let contour = ContourPath::from_bez_path(&path, 1.0);
        assert_eq!(contour.sub_path_count(), 1);
        assert!(contour.is_sub_path_closed(0));
        assert_eq!(
            contour.sub_path_points(0),
            &[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)]
        );
        let bounds = contour.bounds().unwrap();
        assert_eq!(bounds, Rect::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_move_to_starts_new_sub_path() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.move_to((0.0, 5.0));
        path.line_to((10.0, 5.0));

        let contour = ContourPath::from_bez_path(&path, 1.0);
        assert_eq!(contour.sub_path_count(), 2);
        assert!(!contour.is_sub_path_closed(1));
        assert_eq!(contour.sub_path_points(1)[0], Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_lone_move_to_produces_nothing() {
        let mut path = BezPath::new();
        path.move_to((3.0, 3.0));
        let contour = ContourPath::from_bez_path(&path, 1.0);
        assert!(contour.is_empty());
        assert!(contour.bounds().is_none());
    }

    #[test]
    fn test_cubic_is_flattened_within_threshold() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((0.0, 50.0), (100.0, 50.0), (100.0, 0.0));

        let coarse = ContourPath::from_bez_path(&path, 5.0);
        let fine = ContourPath::from_bez_path(&path, 0.25);
        let coarse_points = coarse.sub_path_points(0);
        let fine_points = fine.sub_path_points(0);

        assert!(coarse_points.len() > 2);
        assert!(fine_points.len() > coarse_points.len());
        assert_eq!(*fine_points.last().unwrap(), Vec2::new(100.0, 0.0));

        // Apex of the symmetric curve is at y = 37.5
        let max_y = fine_points.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_y - 37.5).abs() < 0.5, "apex should be ~37.5, got {}", max_y);
    }

    #[test]
    fn test_quad_is_raised() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.quad_to((50.0, 100.0), (100.0, 0.0));
        let contour = ContourPath::from_bez_path(&path, 0.5);
        assert!(contour.sub_path_points(0).len() > 3);
        assert_eq!(*contour.sub_path_points(0).last().unwrap(), Vec2::new(100.0, 0.0));
    }
}
