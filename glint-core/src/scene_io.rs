//! Scene persistence
//!
//! Serializes a [`SceneGraph`] to and from JSON. Loading gates on the
//! format version and re-checks the graph invariants, so a hand-edited or
//! truncated file cannot smuggle a corrupt tree into the editor.

use crate::scene::{SceneGraph, SceneError, SCENE_FORMAT_VERSION};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or saving a scene file
#[derive(Debug, Error)]
pub enum SceneFileError {
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scene format version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Invalid(#[from] SceneError),
}

/// Serialize a scene graph to pretty-printed JSON
pub fn scene_to_json(scene: &SceneGraph) -> Result<String, SceneFileError> {
    Ok(serde_json::to_string_pretty(scene)?)
}

/// Materialize a scene graph from JSON
pub fn scene_from_json(json: &str) -> Result<SceneGraph, SceneFileError> {
    let scene: SceneGraph = serde_json::from_str(json)?;
    if scene.format_version > SCENE_FORMAT_VERSION {
        return Err(SceneFileError::UnsupportedVersion {
            found: scene.format_version,
            supported: SCENE_FORMAT_VERSION,
        });
    }
    scene.validate()?;
    Ok(scene)
}

/// Save a scene graph to disk
pub fn save_scene(path: impl AsRef<Path>, scene: &SceneGraph) -> Result<(), SceneFileError> {
    let json = scene_to_json(scene)?;
    fs::write(path.as_ref(), json)?;
    log::debug!("saved scene to {}", path.as_ref().display());
    Ok(())
}

/// Load a scene graph from disk
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneGraph, SceneFileError> {
    let json = fs::read_to_string(path.as_ref())?;
    scene_from_json(&json)
}
