//! Externally supplied tile and batch settings.
//!
//! Every field has a default matching the classic 100 mm Path Tiles print, and
//! JSON files may override any subset of them.

use crate::errors::{TileError, TileResult};
use crate::float_types::{Real, MM};
use crate::triangulate::TriangulationEngine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Geometry parameters for a single tile. All lengths are millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    pub tile_size: Real,
    pub tile_thickness: Real,
    pub channel_depth: Real,
    pub path_radius: Real,
    /// Endpoint dot radius; `None` means three times the path radius.
    pub dot_radius: Option<Real>,
    /// Number of points sampled along each swirl curve.
    pub curve_samples: usize,
    /// Segments used to approximate a full circle in tube caps and dots.
    pub arc_segments: usize,
    /// Bézier handle length as a fraction of the endpoint distance.
    pub swirl_tension: Real,
    /// Rotation (radians) applied at the tile center, fading to zero at the inscribed circle.
    pub swirl_twist: Real,
    pub engine: TriangulationEngine,
    /// Engine retried once when `engine` fails; ignored when equal to `engine`.
    pub fallback_engine: Option<TriangulationEngine>,
    /// Distance under which two points are considered coincident.
    pub tolerance: Real,
}

impl Default for TileConfig {
    fn default() -> Self {
        let engine = TriangulationEngine::default();
        TileConfig {
            tile_size: 100.0 * MM,
            tile_thickness: 5.0 * MM,
            channel_depth: 3.0 * MM,
            path_radius: 2.0 * MM,
            dot_radius: None,
            curve_samples: 64,
            arc_segments: 32,
            swirl_tension: 0.5,
            swirl_twist: 0.6,
            engine,
            fallback_engine: Some(engine.alternate()),
            tolerance: 1e-5 * MM,
        }
    }
}

impl TileConfig {
    pub fn dot_radius(&self) -> Real {
        self.dot_radius.unwrap_or(3.0 * self.path_radius)
    }

    /// The engine to retry with, if any differs from the primary one.
    pub fn retry_engine(&self) -> Option<TriangulationEngine> {
        self.fallback_engine.filter(|e| *e != self.engine)
    }

    /// Reject values the geometry pipeline cannot work with.
    pub fn validate(&self) -> TileResult<()> {
        let lengths = [
            ("tile_size", self.tile_size),
            ("tile_thickness", self.tile_thickness),
            ("channel_depth", self.channel_depth),
            ("path_radius", self.path_radius),
            ("dot_radius", self.dot_radius()),
            ("tolerance", self.tolerance),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(TileError::invalid_config(format!(
                    "{name} must be a positive finite length, got {value}"
                )));
            }
        }
        if self.channel_depth >= self.tile_thickness {
            return Err(TileError::invalid_config(format!(
                "channel_depth {} must be smaller than tile_thickness {}",
                self.channel_depth, self.tile_thickness
            )));
        }
        // endpoints sit a quarter tile apart, so dots wider than that would swallow neighbours
        let quarter = self.tile_size / 4.0;
        if self.dot_radius() >= quarter / 2.0 || self.path_radius >= quarter / 2.0 {
            return Err(TileError::invalid_config(format!(
                "path radius {} and dot radius {} must stay below {}",
                self.path_radius,
                self.dot_radius(),
                quarter / 2.0
            )));
        }
        if self.curve_samples < 2 {
            return Err(TileError::invalid_config("curve_samples must be at least 2"));
        }
        if self.arc_segments < 8 {
            return Err(TileError::invalid_config("arc_segments must be at least 8"));
        }
        if !self.swirl_tension.is_finite() || !(0.0..=1.0).contains(&self.swirl_tension) {
            return Err(TileError::invalid_config(format!(
                "swirl_tension must lie in [0, 1], got {}",
                self.swirl_tension
            )));
        }
        if !self.swirl_twist.is_finite() {
            return Err(TileError::invalid_config("swirl_twist must be finite"));
        }
        if self.tolerance * 1000.0 >= self.path_radius {
            return Err(TileError::invalid_config(format!(
                "tolerance {} is too coarse for path radius {}",
                self.tolerance, self.path_radius
            )));
        }
        Ok(())
    }
}

/// Settings for a full export run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub tile: TileConfig,
    /// Number of random tiles to export; `None` exports all of them in order.
    pub sample_count: Option<usize>,
    pub seed: u64,
    pub output_dir: PathBuf,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            tile: TileConfig::default(),
            sample_count: Some(36),
            seed: 0,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl BatchConfig {
    pub fn from_json_str(json: &str) -> TileResult<Self> {
        let config: BatchConfig = serde_json::from_str(json)?;
        config.tile.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> TileResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }
}
