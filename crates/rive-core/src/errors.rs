use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiveError {
    #[error("Artboard not found: {0}")]
    ArtboardNotFound(String),
    #[error("Object {object} references missing parent {parent}")]
    InvalidParent { object: usize, parent: u32 },
    #[error("Object {0} is its own ancestor")]
    ParentCycle(usize),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
