//! Error types for scene preparation and rendering.

use thiserror::Error;

/// Scene authoring defects detected while building a BVH.
///
/// Nothing is built when one of these is returned, so a malformed scene can
/// never be traversed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    #[error("cannot build a BVH node from an empty primitive range")]
    Empty,

    #[error("primitive #{index} has no bounding box and cannot be placed in a BVH")]
    Unbounded { index: usize },
}

/// Errors that can occur while setting up or running render passes.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Bvh(#[from] BvhError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to allocate {bytes} bytes for a {width}x{height} frame")]
    Allocation { width: u32, height: u32, bytes: usize },

    #[error("invalid resolution {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("worker pool has been shut down")]
    PoolShutDown,

    #[error("render tasks do not form disjoint row bands: {0}")]
    TaskLayout(String),

    #[error("frame size mismatch: expected {expected:?}, got {actual:?}")]
    FrameMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
