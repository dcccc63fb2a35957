//! Path Tiles: every way to pair up 8 points on the edge of a square tile, carved
//! as swirling grooves into a printable slab.
//!
//! The pipeline runs one matching at a time:
//!
//! 1. [`matching::enumerate`] lists the 105 perfect matchings of the 8 endpoints.
//! 2. [`curve::SwirlBuilder`] joins each pair with a swirl curve.
//! 3. [`outline::offset`] and [`outline::dot`] turn curves and endpoints into channel outlines.
//! 4. [`merge::merge`] unions the outlines into one non-overlapping region.
//! 5. [`extrude::extrude`] carves that region into the slab, giving a closed manifold [`TileSolid`].
//!
//! [`TilePipeline`] wires the stages together and runs batches.
//!
//! ```no_run
//! use pathtiles::{TileConfig, TilePipeline};
//!
//! let pipeline = TilePipeline::new(TileConfig::default())?;
//! let solid = pipeline.build_tile(0)?;
//! assert!(solid.is_manifold());
//! # Ok::<(), pathtiles::TileError>(())
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod curve;
pub mod endpoint;
pub mod errors;
pub mod extrude;
pub mod float_types;
pub mod matching;
pub mod merge;
pub mod mesh;
pub mod outline;
pub mod pipeline;
pub mod polygon;
pub mod triangulate;

#[cfg(test)]
mod tests;

pub use config::{BatchConfig, TileConfig};
pub use errors::{ErrorKind, TileError, TileResult};
pub use matching::{Matching, Pair};
pub use merge::MergedRegion;
pub use mesh::TileSolid;
pub use pipeline::{sample_indices, BatchSummary, BuiltTile, TileFailure, TilePipeline};
pub use triangulate::{Triangulator, TriangulationEngine};
