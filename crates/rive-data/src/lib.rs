// rive-data: Serde structs for Rive artboard documents
pub mod model;
