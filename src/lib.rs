//! # rive-tess
//!
//! Bone hierarchy construction and stroke tessellation for Rive artboards.
//!
//! This crate re-exports [`rive_core`] and the [`rive_data`] document model so
//! hosts only need one dependency. Geometry types come from [`glam`] and path
//! input from [`kurbo`], both re-exported as well.

pub use rive_core::*;
pub use rive_data as data;

pub use glam;
pub use kurbo;

use rive_data::model::RiveDocument;
use std::path::Path;

/// Parses a JSON document and builds the named artboard (or the first one).
pub fn load_artboard(json: &str, name: Option<&str>) -> Result<Artboard, RiveError> {
    let doc: RiveDocument = serde_json::from_str(json)?;
    Artboard::from_document(&doc, name)
}

/// Reads a JSON document from disk and builds the named artboard.
pub fn load_artboard_file(path: impl AsRef<Path>, name: Option<&str>) -> Result<Artboard, RiveError> {
    let json = std::fs::read_to_string(path)?;
    load_artboard(&json, name)
}
