use crate::bones::BonePayload;
use crate::errors::RiveError;
use crate::stroke::{StrokeCap, StrokeJoin};
use glam::{Affine2, Vec2};
use kurbo::{BezPath, Point};
use rive_data::model::{ArtboardData, ObjectData, PathVertex, RiveDocument, TransformData};
use std::cell::Cell;
use tracing::instrument;

pub type ComponentId = usize;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BonePose {
    pub translation: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
    pub length: f32,
}

/// A skeletal bone on an artboard.
///
/// The pose sits in a `Cell` so animation can update it while a bone
/// hierarchy holds shared references to the bone.
#[derive(Debug)]
pub struct Bone {
    index: usize,
    parent_bone: Option<usize>,
    component: ComponentId,
    name: String,
    pose: Cell<BonePose>,
}

impl Bone {
    pub fn component(&self) -> ComponentId {
        self.component
    }

    pub fn pose(&self) -> BonePose {
        self.pose.get()
    }

    pub fn set_pose(&self, pose: BonePose) {
        self.pose.set(pose);
    }
}

impl BonePayload for Bone {
    fn index(&self) -> usize {
        self.index
    }

    fn parent_index(&self) -> Option<usize> {
        self.parent_bone
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn translation(&self) -> Vec2 {
        self.pose.get().translation
    }

    fn scale(&self) -> Vec2 {
        self.pose.get().scale
    }

    fn rotation(&self) -> f32 {
        self.pose.get().rotation
    }

    fn length(&self) -> f32 {
        self.pose.get().length
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathGeometry {
    pub closed: bool,
    pub vertices: Vec<PathVertex>,
}

impl PathGeometry {
    /// Converts the vertex list into a cubic path. Edges whose tangents are
    /// both zero become straight lines.
    pub fn to_bez_path(&self) -> BezPath {
        let mut bp = BezPath::new();
        let n = self.vertices.len();
        if n == 0 {
            return bp;
        }
        bp.move_to(to_point(self.vertices[0].point));
        for i in 0..n {
            let next = (i + 1) % n;
            if next == 0 && !self.closed {
                break;
            }
            let from = &self.vertices[i];
            let to = &self.vertices[next];
            if from.out_tangent == [0.0, 0.0] && to.in_tangent == [0.0, 0.0] {
                bp.line_to(to_point(to.point));
            } else {
                bp.curve_to(
                    to_point(add(from.point, from.out_tangent)),
                    to_point(add(to.point, to.in_tangent)),
                    to_point(to.point),
                );
            }
        }
        if self.closed {
            bp.close_path();
        }
        bp
    }
}

fn add(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

fn to_point(p: [f32; 2]) -> Point {
    Point::new(p[0] as f64, p[1] as f64)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub thickness: f32,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
}

#[derive(Debug)]
pub enum ComponentKind {
    Node,
    Shape,
    Bone(Bone),
    Path(PathGeometry),
    Stroke(StrokeStyle),
}

#[derive(Debug)]
pub struct Component {
    pub name: String,
    pub parent: Option<ComponentId>,
    pub kind: ComponentKind,
    transform: Affine2,
}

impl Component {
    /// Local transform. Bones read their current pose.
    pub fn local_transform(&self) -> Affine2 {
        match &self.kind {
            ComponentKind::Bone(bone) => {
                let pose = bone.pose();
                Affine2::from_scale_angle_translation(pose.scale, pose.rotation, pose.translation)
            }
            _ => self.transform,
        }
    }
}

/// A stroke paint together with the paths it applies to.
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeBinding {
    pub stroke: ComponentId,
    pub shape: Option<ComponentId>,
    pub style: StrokeStyle,
    pub paths: Vec<ComponentId>,
}

/// Validated component graph of one artboard.
#[derive(Debug)]
pub struct Artboard {
    pub name: String,
    pub width: f32,
    pub height: f32,
    components: Vec<Component>,
    bones: Vec<ComponentId>,
}

impl Artboard {
    pub fn from_document(doc: &RiveDocument, name: Option<&str>) -> Result<Self, RiveError> {
        let data = doc.artboard(name).ok_or_else(|| {
            RiveError::ArtboardNotFound(name.unwrap_or("<first>").to_string())
        })?;
        Self::from_data(data)
    }

    #[instrument(level = "debug", skip(data), fields(name = %data.name, objects = data.objects.len()))]
    pub fn from_data(data: &ArtboardData) -> Result<Self, RiveError> {
        let count = data.objects.len();
        let mut parents = Vec::with_capacity(count);
        for (i, object) in data.objects.iter().enumerate() {
            let parent = match object.parent() {
                Some(p) if (p as usize) < count => Some(p as usize),
                Some(p) => return Err(RiveError::InvalidParent { object: i, parent: p }),
                None => None,
            };
            parents.push(parent);
        }

        for start in 0..count {
            let mut steps = 0;
            let mut cur = parents[start];
            while let Some(p) = cur {
                steps += 1;
                if p == start || steps > count {
                    return Err(RiveError::ParentCycle(start));
                }
                cur = parents[p];
            }
        }

        let mut bone_index = vec![None; count];
        let mut next_bone = 0;
        for (i, object) in data.objects.iter().enumerate() {
            if matches!(object, ObjectData::Bone(_)) {
                bone_index[i] = Some(next_bone);
                next_bone += 1;
            }
        }

        let mut components = Vec::with_capacity(count);
        let mut bones = Vec::with_capacity(next_bone);
        for (i, object) in data.objects.iter().enumerate() {
            let transform = object
                .transform()
                .map(local_transform)
                .unwrap_or(Affine2::IDENTITY);
            let kind = match object {
                ObjectData::Node(_) => ComponentKind::Node,
                ObjectData::Shape(_) => ComponentKind::Shape,
                ObjectData::Bone(b) => {
                    // Nearest bone ancestor; plain nodes between bones are skipped.
                    let mut parent_bone = None;
                    let mut cur = parents[i];
                    while let Some(p) = cur {
                        if let Some(index) = bone_index[p] {
                            parent_bone = Some(index);
                            break;
                        }
                        cur = parents[p];
                    }
                    bones.push(i);
                    ComponentKind::Bone(Bone {
                        index: bone_index[i].unwrap_or_default(),
                        parent_bone,
                        component: i,
                        name: b.name.clone(),
                        pose: Cell::new(BonePose {
                            translation: Vec2::new(b.transform.x, b.transform.y),
                            scale: Vec2::new(b.transform.scale_x, b.transform.scale_y),
                            rotation: b.transform.rotation,
                            length: b.length,
                        }),
                    })
                }
                ObjectData::Path(p) => ComponentKind::Path(PathGeometry {
                    closed: p.closed,
                    vertices: p.vertices.clone(),
                }),
                ObjectData::Stroke(s) => ComponentKind::Stroke(StrokeStyle {
                    thickness: s.thickness,
                    cap: s.cap.into(),
                    join: s.join.into(),
                }),
            };
            components.push(Component {
                name: object.name().to_string(),
                parent: parents[i],
                kind,
                transform,
            });
        }

        Ok(Artboard {
            name: data.name.clone(),
            width: data.width,
            height: data.height,
            components,
            bones,
        })
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Every bone in component order.
    pub fn bones(&self) -> Vec<&Bone> {
        self.bones
            .iter()
            .filter_map(|&id| match &self.components[id].kind {
                ComponentKind::Bone(bone) => Some(bone),
                _ => None,
            })
            .collect()
    }

    pub fn path(&self, id: ComponentId) -> Option<&PathGeometry> {
        match &self.components.get(id)?.kind {
            ComponentKind::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Product of the local transforms from the root down to `id`, or `None`
    /// when `id` is not a component of this artboard.
    pub fn world_transform(&self, id: ComponentId) -> Option<Affine2> {
        let mut world = Affine2::IDENTITY;
        let mut cur = Some(id);
        while let Some(c) = cur {
            let component = self.components.get(c)?;
            world = component.local_transform() * world;
            cur = component.parent;
        }
        Some(world)
    }

    /// Each stroke paint with the paths of the shape that owns it.
    pub fn strokes(&self) -> Vec<StrokeBinding> {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(id, component)| match component.kind {
                ComponentKind::Stroke(style) => Some(StrokeBinding {
                    stroke: id,
                    shape: component.parent,
                    style,
                    paths: component
                        .parent
                        .map(|shape| self.paths_of(shape))
                        .unwrap_or_default(),
                }),
                _ => None,
            })
            .collect()
    }

    fn paths_of(&self, shape: ComponentId) -> Vec<ComponentId> {
        self.components
            .iter()
            .enumerate()
            .filter(|(_, c)| c.parent == Some(shape) && matches!(c.kind, ComponentKind::Path(_)))
            .map(|(id, _)| id)
            .collect()
    }
}

fn local_transform(t: &TransformData) -> Affine2 {
    Affine2::from_scale_angle_translation(
        Vec2::new(t.scale_x, t.scale_y),
        t.rotation,
        Vec2::new(t.x, t.y),
    )
}
