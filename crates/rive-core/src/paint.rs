use crate::artboard::StrokeStyle;
use crate::options::StrokeOptions;
use crate::stroke::{ContourStroke, PathSource, StrokeCap, StrokeJoin};
use glam::Affine2;
use std::ops::Range;
use tracing::trace;

/// A stroke paint that caches its extruded geometry.
///
/// Changing any style property marks the cached strip dirty; the next
/// [`update`](StrokePaint::update) rebuilds it from scratch.
#[derive(Clone, Debug)]
pub struct StrokePaint {
    thickness: f32,
    join: StrokeJoin,
    cap: StrokeCap,
    stroke: ContourStroke,
    dirty: bool,
}

impl StrokePaint {
    pub fn new(thickness: f32, join: StrokeJoin, cap: StrokeCap) -> Self {
        Self::with_options(thickness, join, cap, StrokeOptions::default())
    }

    pub fn with_options(thickness: f32, join: StrokeJoin, cap: StrokeCap, options: StrokeOptions) -> Self {
        Self {
            thickness,
            join,
            cap,
            stroke: ContourStroke::with_options(options),
            dirty: true,
        }
    }

    pub fn from_style(style: &StrokeStyle, options: StrokeOptions) -> Self {
        Self::with_options(style.thickness, style.join, style.cap, options)
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    pub fn join(&self) -> StrokeJoin {
        self.join
    }

    pub fn cap(&self) -> StrokeCap {
        self.cap
    }

    pub fn set_thickness(&mut self, thickness: f32) {
        if self.thickness != thickness {
            self.thickness = thickness;
            self.invalidate();
        }
    }

    pub fn set_join(&mut self, join: StrokeJoin) {
        if self.join != join {
            self.join = join;
            self.invalidate();
        }
    }

    pub fn set_cap(&mut self, cap: StrokeCap) {
        if self.cap != cap {
            self.cap = cap;
            self.invalidate();
        }
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-extrudes `paths` if the paint is dirty. Each item pairs a path
    /// with whether its owning shape is closed. Returns true when the strip
    /// was rebuilt.
    pub fn update<'p, P, I>(&mut self, paths: I) -> bool
    where
        P: PathSource + ?Sized + 'p,
        I: IntoIterator<Item = (&'p P, bool)>,
    {
        if !self.dirty {
            return false;
        }
        self.stroke.reset();
        for (path, is_closed) in paths {
            self.stroke.extrude(
                path,
                is_closed,
                self.join,
                self.cap,
                self.thickness,
                Affine2::IDENTITY,
            );
        }
        self.dirty = false;
        trace!(
            vertices = self.stroke.triangle_strip().len(),
            runs = self.stroke.offsets().len(),
            "stroke rebuilt"
        );
        true
    }

    /// One draw range per run, starting from the first.
    pub fn draw_calls(&mut self) -> DrawCalls<'_> {
        self.stroke.reset_render_offset();
        DrawCalls { stroke: &mut self.stroke }
    }

    pub fn stroke(&self) -> &ContourStroke {
        &self.stroke
    }
}

pub struct DrawCalls<'a> {
    stroke: &'a mut ContourStroke,
}

impl Iterator for DrawCalls<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stroke.next_render_offset()
    }
}
