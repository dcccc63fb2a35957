//! Drives the geometry stages for one matching at a time, and batches of them.

use crate::config::TileConfig;
use crate::curve::SwirlBuilder;
use crate::endpoint::EndpointTable;
use crate::errors::{TileError, TileResult};
use crate::extrude::extrude;
use crate::matching::{self, Matching};
use crate::merge::{merge, MergedRegion};
use crate::mesh::TileSolid;
use crate::outline::{dot, offset, ChannelOutline};
use crate::triangulate::Triangulator;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Pick `count` distinct indices out of `0..total`, reproducibly for a given seed.
///
/// `None`, or a count equal to `total`, selects everything in enumeration order.
pub fn sample_indices(total: usize, count: Option<usize>, seed: u64) -> TileResult<Vec<usize>> {
    match count {
        None => Ok((0..total).collect()),
        Some(n) if n == total => Ok((0..total).collect()),
        Some(n) if n > total => Err(TileError::invalid_config(format!(
            "cannot sample {n} tiles out of {total}"
        ))),
        Some(n) => {
            let mut rng = StdRng::seed_from_u64(seed);
            Ok(rand::seq::index::sample(&mut rng, total, n).into_vec())
        }
    }
}

/// A finished tile handed to the batch sink.
#[derive(Debug, Clone)]
pub struct BuiltTile {
    /// 1-based position in the batch; used for file numbering.
    pub ordinal: usize,
    /// Index into the enumeration.
    pub index: usize,
    pub matching: Matching,
    pub solid: TileSolid,
}

#[derive(Debug)]
pub struct TileFailure {
    pub index: usize,
    pub error: TileError,
}

/// Outcome of [`TilePipeline::run`].
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<usize>,
    pub failed: Vec<TileFailure>,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failed {
            writeln!(
                f,
                "tile #{} failed [{}]: {}",
                failure.index,
                failure.error.kind(),
                failure.error
            )?;
        }
        write!(
            f,
            "{} of {} tiles built, {} failed",
            self.succeeded.len(),
            self.total(),
            self.failed.len()
        )
    }
}

/// The full geometry pipeline with its fixed, validated inputs.
#[derive(Debug, Clone)]
pub struct TilePipeline {
    config: TileConfig,
    endpoints: EndpointTable,
    matchings: Vec<Matching>,
    swirl: SwirlBuilder,
}

impl TilePipeline {
    /// Validate `config` and enumerate the matchings.
    ///
    /// Fails with [`TileError::CombinatoricsInvariant`] if the enumeration is not the
    /// expected set; nothing can be built in that case.
    pub fn new(config: TileConfig) -> TileResult<Self> {
        config.validate()?;
        let endpoints = EndpointTable::new(config.tile_size)?;
        let matchings = matching::enumerate();
        matching::verify(&matchings)?;
        let swirl = SwirlBuilder::from_config(&config);
        log::debug!(
            "pipeline ready: {} matchings, {} engine",
            matchings.len(),
            config.engine
        );
        Ok(TilePipeline {
            config,
            endpoints,
            matchings,
            swirl,
        })
    }

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &EndpointTable {
        &self.endpoints
    }

    pub fn matchings(&self) -> &[Matching] {
        &self.matchings
    }

    pub fn matching(&self, index: usize) -> TileResult<&Matching> {
        self.matchings.get(index).ok_or_else(|| {
            TileError::invalid_config(format!(
                "tile index {index} is outside 0..{}",
                self.matchings.len()
            ))
        })
    }

    /// The eight dots plus one tube per pair.
    pub fn outlines(&self, matching: &Matching) -> TileResult<Vec<ChannelOutline>> {
        let config = &self.config;
        let mut outlines = Vec::new();
        for &pair in matching.pairs() {
            let curve = self.swirl.build(pair, &self.endpoints, config.path_radius)?;
            outlines.push(offset(&curve, config.path_radius, config.arc_segments)?);
        }
        for endpoint in self.endpoints.iter() {
            outlines.push(dot(endpoint, config.dot_radius(), config.arc_segments)?);
        }
        Ok(outlines)
    }

    pub fn region(&self, matching: &Matching) -> TileResult<MergedRegion> {
        merge(&self.outlines(matching)?, self.config.tolerance)
    }

    pub fn build_tile(&self, index: usize) -> TileResult<TileSolid> {
        let matching = *self.matching(index)?;
        self.build_matching(&matching)
    }

    /// Build the solid for one matching, retrying triangulation once with the
    /// fallback engine.
    pub fn build_matching(&self, matching: &Matching) -> TileResult<TileSolid> {
        let fallback = self.config.retry_engine().map(|e| e.triangulator());
        self.build_with(matching, self.config.engine.triangulator(), fallback)
    }

    /// Build one matching with explicit engines. Only a [`TileError::Triangulation`]
    /// from `primary` triggers the single retry with `fallback`.
    pub fn build_with(
        &self,
        matching: &Matching,
        primary: &dyn Triangulator,
        fallback: Option<&dyn Triangulator>,
    ) -> TileResult<TileSolid> {
        let region = self.region(matching)?;
        match extrude(&region, &self.config, primary) {
            Err(err @ TileError::Triangulation { .. }) => match fallback {
                Some(fallback) => {
                    log::warn!("{matching}: {err}; retrying with {}", fallback.name());
                    extrude(&region, &self.config, fallback)
                }
                None => Err(err),
            },
            other => other,
        }
    }

    /// Build every tile in `indices`, passing each success to `sink` in input order.
    ///
    /// A failing tile, including a failing sink call, is recorded and skipped.
    pub fn run<F>(&self, indices: &[usize], mut sink: F) -> BatchSummary
    where
        F: FnMut(&BuiltTile) -> TileResult<()>,
    {
        #[cfg(feature = "parallel")]
        let results: Vec<TileResult<TileSolid>> =
            indices.par_iter().map(|&i| self.build_tile(i)).collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<TileResult<TileSolid>> =
            indices.iter().map(|&i| self.build_tile(i)).collect();

        let mut summary = BatchSummary::default();
        for (position, (&index, result)) in indices.iter().zip(results).enumerate() {
            let outcome = result.and_then(|solid| {
                let tile = BuiltTile {
                    ordinal: position + 1,
                    index,
                    matching: *self.matching(index)?,
                    solid,
                };
                sink(&tile)
            });
            match outcome {
                Ok(()) => summary.succeeded.push(index),
                Err(error) => {
                    log::warn!("skipping tile #{index}: {error}");
                    summary.failed.push(TileFailure { index, error });
                }
            }
        }
        log::info!("{} of {} tiles built", summary.succeeded.len(), summary.total());
        summary
    }
}
