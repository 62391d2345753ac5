// error.rs — viewer failure taxonomy

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong inside the viewer. None of these abort the
/// application; the worst case is an error panel instead of a panorama.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to load panorama {path:?}: {source}")]
    TextureLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read tour file {path:?}: {source}")]
    TourRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse tour file {path:?}: {source}")]
    TourParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fullscreen request was not honored by the runtime")]
    FullscreenDenied,
}
