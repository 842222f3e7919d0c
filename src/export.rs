//! Export collaborator interface.
//!
//! The core never encodes images itself. A host that wants a PNG, SVG or
//! print layout implements [`SceneExporter`] and hands it to
//! [`crate::board::Board::export`], which passes a detached copy of the
//! current scene.

use crate::render::RenderStyle;
use crate::scene::Scene;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("export backend failed: {0}")]
    Backend(String),
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Turns a scene snapshot into an output artifact.
pub trait SceneExporter {
    type Output;

    /// # Errors
    ///
    /// Implementations report backend failures as [`ExportError`].
    fn export(&self, scene: Scene, style: &RenderStyle) -> Result<Self::Output, ExportError>;
}
