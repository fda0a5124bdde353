use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// The value was rejected before any state change; the previous value is
    /// kept and nothing is redrawn.
    #[error("invalid parameter {name:?}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// No device could be constructed for the requested library name.
    #[error("backend initialization failed: {0}")]
    BackendInit(String),

    #[error("failed to load geometry from {path:?}")]
    GeometryLoad {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    /// The device reported an error while refilling the frame buffer.
    #[error("redraw failed")]
    Render(#[source] anyhow::Error),

    /// The view sink could not be notified of a fresh frame.
    #[error("view notification failed")]
    View(#[source] anyhow::Error),

    #[error("refresh loop stopped after {consecutive} consecutive redraw failures")]
    RefreshLoopFailed {
        consecutive: u32,
        #[source]
        source: Box<ViewerError>,
    },
}
