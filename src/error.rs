use std::io;

use thiserror::Error;

/// Errors surfaced by the ray tracer outside of the rendering hot path.
///
/// Geometric misses are never errors; they are empty `Intersections`.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed PPM: {0}")]
    Ppm(String),

    #[error("malformed OBJ at line {line}: {message}")]
    Obj { line: usize, message: String },

    #[error("invalid scene: {0}")]
    Scene(String),

    #[error("render cancelled")]
    Cancelled,

    #[error("render worker {0} panicked")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
