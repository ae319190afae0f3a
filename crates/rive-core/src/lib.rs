//! # Rive Core
//!
//! Runtime pieces that sit between a parsed Rive document and a renderer.
//!
//! ## Core Features
//!
//! *   **Artboards**: Validated component graphs with world transforms and stroke bindings.
//! *   **Bone Hierarchies**: An arena forest of skeletal bones with name validation and debug dumps.
//! *   **Contours**: Flattening of cubic paths into polylines.
//! *   **Stroke Extrusion**: Triangle strip generation with miter, round and bevel joins plus butt, round and square caps.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rive_core::{Artboard, BoneHierarchy};
//! use rive_data::model::RiveDocument;
//!
//! let doc: RiveDocument = serde_json::from_str("{}").unwrap();
//! let artboard = Artboard::from_document(&doc, None).unwrap();
//! let hierarchy = BoneHierarchy::from_artboard(&artboard);
//! hierarchy.debug_print();
//! ```

/// Artboard component graph.
pub mod artboard;
/// Bone hierarchy construction and inspection.
pub mod bones;
pub mod contour;
pub mod errors;
pub mod options;
/// Cached stroke paints.
pub mod paint;
/// Stroke extrusion into triangle strips.
pub mod stroke;

pub use artboard::{Artboard, Bone, BonePose, Component, ComponentId, ComponentKind, StrokeBinding, StrokeStyle};
pub use bones::{BoneHierarchy, BoneNode, BonePayload, NameHash, NameValidation, NodeId};
pub use contour::{Contour, ContourPath};
pub use errors::RiveError;
pub use options::StrokeOptions;
pub use paint::StrokePaint;
pub use stroke::{ContourStroke, ExtrudeState, PathSource, StrokeCap, StrokeJoin};
