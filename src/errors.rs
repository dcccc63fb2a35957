//! Error handling for the tile pipeline.
//!
//! Every stage returns [`TileResult`]. Failures that belong to a single matching
//! (a degenerate curve, a bad union, a failed triangulation, a non-manifold solid)
//! are isolated by the batch driver; only a broken enumeration is fatal.

use crate::float_types::Real;
use crate::matching::Pair;
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type TileResult<T> = Result<T, TileError>;

/// All the ways building a tile can fail.
#[derive(Error, Debug)]
pub enum TileError {
    /// The enumerated matchings are not the 105 distinct perfect matchings of 8 labels.
    #[error("combinatorics invariant violated: {message}")]
    CombinatoricsInvariant { message: String },

    /// A path is too short to be buffered by the channel radius.
    #[error("swirl curve for pair {pair} is too short to offset: length {length:.4} < {minimum:.4}")]
    DegenerateCurve {
        pair: Pair,
        length: Real,
        minimum: Real,
    },

    /// Outline construction or union could not produce simple, non-overlapping polygons.
    #[error("geometry merge failed: {message}")]
    GeometryMerge { message: String },

    /// The selected triangulation engine failed or dropped area.
    #[error("triangulation with {engine} failed: {message}")]
    Triangulation {
        engine: &'static str,
        message: String,
    },

    /// The carved solid is not a closed, consistently oriented manifold.
    #[error("carved solid is not manifold: {message}")]
    NonManifoldResult { message: String },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The category of a [`TileError`], used for summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CombinatoricsInvariant,
    DegenerateCurve,
    GeometryMerge,
    Triangulation,
    NonManifoldResult,
    InvalidConfig,
    Io,
    Json,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorKind::*;

        let name = match self {
            CombinatoricsInvariant => "combinatorics-invariant",
            DegenerateCurve => "degenerate-curve",
            GeometryMerge => "geometry-merge",
            Triangulation => "triangulation",
            NonManifoldResult => "non-manifold",
            InvalidConfig => "invalid-config",
            Io => "io",
            Json => "json",
        };
        f.write_str(name)
    }
}

impl TileError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::CombinatoricsInvariant {
            message: message.into(),
        }
    }

    pub fn geometry(message: impl Into<String>) -> Self {
        Self::GeometryMerge {
            message: message.into(),
        }
    }

    pub fn triangulation(engine: &'static str, message: impl Into<String>) -> Self {
        Self::Triangulation {
            engine,
            message: message.into(),
        }
    }

    pub fn non_manifold(message: impl Into<String>) -> Self {
        Self::NonManifoldResult {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CombinatoricsInvariant { .. } => ErrorKind::CombinatoricsInvariant,
            Self::DegenerateCurve { .. } => ErrorKind::DegenerateCurve,
            Self::GeometryMerge { .. } => ErrorKind::GeometryMerge,
            Self::Triangulation { .. } => ErrorKind::Triangulation,
            Self::NonManifoldResult { .. } => ErrorKind::NonManifoldResult,
            Self::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
        }
    }

    /// Fatal errors halt the whole batch instead of skipping one tile.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::CombinatoricsInvariant { .. })
    }
}
