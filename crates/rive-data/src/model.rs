use serde::{Deserialize, Serialize};

pub type Vec2 = [f32; 2];

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RiveDocument {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub artboards: Vec<ArtboardData>,
}

impl RiveDocument {
    /// Looks up an artboard by name, or returns the first artboard when `name` is `None`.
    pub fn artboard(&self, name: Option<&str>) -> Option<&ArtboardData> {
        match name {
            Some(name) => self.artboards.iter().find(|a| a.name == name),
            None => self.artboards.first(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ArtboardData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    // Flat component list; `parent` fields index into this list.
    #[serde(default)]
    pub objects: Vec<ObjectData>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectData {
    Node(NodeData),
    Shape(NodeData),
    Bone(BoneData),
    Path(PathData),
    Stroke(StrokeData),
}

impl ObjectData {
    pub fn name(&self) -> &str {
        match self {
            ObjectData::Node(n) | ObjectData::Shape(n) => &n.name,
            ObjectData::Bone(b) => &b.name,
            ObjectData::Path(p) => &p.name,
            ObjectData::Stroke(s) => &s.name,
        }
    }

    pub fn parent(&self) -> Option<u32> {
        match self {
            ObjectData::Node(n) | ObjectData::Shape(n) => n.parent,
            ObjectData::Bone(b) => b.parent,
            ObjectData::Path(p) => p.parent,
            ObjectData::Stroke(s) => s.parent,
        }
    }

    /// Local transform, for the object kinds that carry one.
    pub fn transform(&self) -> Option<&TransformData> {
        match self {
            ObjectData::Node(n) | ObjectData::Shape(n) => Some(&n.transform),
            ObjectData::Bone(b) => Some(&b.transform),
            ObjectData::Path(p) => Some(&p.transform),
            ObjectData::Stroke(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransformData {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub rotation: f32, // Radians
    #[serde(default = "default_one")]
    pub scale_x: f32,
    #[serde(default = "default_one")]
    pub scale_y: f32,
}

impl Default for TransformData {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

fn default_one() -> f32 {
    1.0
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NodeData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(flatten)]
    pub transform: TransformData,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct BoneData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(flatten)]
    pub transform: TransformData,
    #[serde(default)]
    pub length: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PathData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(flatten)]
    pub transform: TransformData,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub vertices: Vec<PathVertex>,
}

/// A path vertex. Tangents are offsets relative to `point`; a vertex with
/// no tangents is a straight corner.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PathVertex {
    pub point: Vec2,
    #[serde(default)]
    pub in_tangent: Vec2,
    #[serde(default)]
    pub out_tangent: Vec2,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default = "default_one")]
    pub thickness: f32,
    #[serde(default)]
    pub cap: StrokeCapData,
    #[serde(default)]
    pub join: StrokeJoinData,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrokeCapData {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrokeJoinData {
    #[default]
    Miter,
    Round,
    Bevel,
}
