//! Pluggable 2D triangulation.
//!
//! Every face of a tile passes through one of these engines. Engines only have to
//! produce triangles; the area check in [`Triangulator::triangulate`] makes sure
//! no part of a face is dropped silently.

use crate::errors::{TileError, TileResult};
use crate::float_types::{Real, AREA_RELATIVE_TOLERANCE, EPSILON};
use geo::algorithm::triangulate_spade::SpadeTriangulationConfig;
use geo::{Area, Coord, LineString, Polygon, TriangulateEarcut, TriangulateSpade};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A triangulation backend for simple polygons with holes.
pub trait Triangulator: Send + Sync {
    /// Short identifier used in errors and logs.
    fn name(&self) -> &'static str;

    /// Triangulate `polygon` without checking the result.
    fn raw_triangles(&self, polygon: &Polygon<Real>) -> Result<Vec<[Coord<Real>; 3]>, String>;

    /// Triangulate `polygon` and check that the triangles cover its whole area.
    fn triangulate(&self, polygon: &Polygon<Real>) -> TileResult<Vec<[Coord<Real>; 3]>> {
        let triangles = self
            .raw_triangles(polygon)
            .map_err(|e| TileError::triangulation(self.name(), e))?;

        let expected = polygon.unsigned_area();
        let covered: Real = triangles.iter().map(triangle_area).sum();
        let allowed = AREA_RELATIVE_TOLERANCE * expected.max(EPSILON);
        if (covered - expected).abs() > allowed {
            return Err(TileError::triangulation(
                self.name(),
                format!(
                    "triangles cover {covered:.6} of a polygon with area {expected:.6} ({} triangles)",
                    triangles.len()
                ),
            ));
        }
        Ok(triangles)
    }
}

fn triangle_area(t: &[Coord<Real>; 3]) -> Real {
    let [a, b, c] = t;
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs()
}

/// Ear clipping via `earcutr`. Fast and tolerant of touching holes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Earcut;

impl Triangulator for Earcut {
    fn name(&self) -> &'static str {
        "earcut"
    }

    fn raw_triangles(&self, polygon: &Polygon<Real>) -> Result<Vec<[Coord<Real>; 3]>, String> {
        let triangulation = polygon.earcut_triangles_raw();
        let vertices = triangulation.vertices;
        let corner = |idx: usize| -> Result<Coord<Real>, String> {
            let base = idx * 2;
            match (vertices.get(base), vertices.get(base + 1)) {
                (Some(&x), Some(&y)) => Ok(Coord { x, y }),
                _ => Err(format!("earcut returned out-of-range vertex index {idx}")),
            }
        };

        let mut triangles = Vec::with_capacity(triangulation.triangle_indices.len() / 3);
        for tri in triangulation.triangle_indices.chunks_exact(3) {
            triangles.push([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?]);
        }
        Ok(triangles)
    }
}

/// Constrained Delaunay triangulation via `spade`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delaunay;

// spade refuses coordinates this close to zero without being zero
const MIN_ALLOWED_VALUE: Real = 1.793662034335766e-43; // 1.0 * 2^-142

const SNAP_RADIUS: Real = 1e-9;

impl Triangulator for Delaunay {
    fn name(&self) -> &'static str {
        "delaunay"
    }

    fn raw_triangles(&self, polygon: &Polygon<Real>) -> Result<Vec<[Coord<Real>; 3]>, String> {
        let clamp = |ring: &LineString<Real>| {
            LineString::new(
                ring.coords()
                    .map(|c| Coord {
                        x: if c.x.abs() < MIN_ALLOWED_VALUE { 0.0 } else { c.x },
                        y: if c.y.abs() < MIN_ALLOWED_VALUE { 0.0 } else { c.y },
                    })
                    .collect(),
            )
        };
        let clamped = Polygon::new(
            clamp(polygon.exterior()),
            polygon.interiors().iter().map(clamp).collect(),
        );

        let config = SpadeTriangulationConfig {
            snap_radius: SNAP_RADIUS,
        };
        let triangles = clamped
            .constrained_triangulation(config)
            .map_err(|e| format!("{e:?}"))?;
        Ok(triangles.into_iter().map(|t| t.to_array()).collect())
    }
}

/// The engine choices exposed through configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriangulationEngine {
    #[default]
    Earcut,
    #[serde(alias = "triangle")]
    Delaunay,
}

static EARCUT: Earcut = Earcut;
static DELAUNAY: Delaunay = Delaunay;

impl TriangulationEngine {
    pub fn triangulator(self) -> &'static dyn Triangulator {
        match self {
            TriangulationEngine::Earcut => &EARCUT,
            TriangulationEngine::Delaunay => &DELAUNAY,
        }
    }

    /// The other engine.
    pub fn alternate(self) -> Self {
        match self {
            TriangulationEngine::Earcut => TriangulationEngine::Delaunay,
            TriangulationEngine::Delaunay => TriangulationEngine::Earcut,
        }
    }

    pub fn name(self) -> &'static str {
        self.triangulator().name()
    }
}

impl fmt::Display for TriangulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TriangulationEngine {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earcut" => Ok(TriangulationEngine::Earcut),
            "delaunay" | "triangle" => Ok(TriangulationEngine::Delaunay),
            other => Err(TileError::invalid_config(format!(
                "unknown triangulation engine '{other}', expected earcut or delaunay"
            ))),
        }
    }
}
