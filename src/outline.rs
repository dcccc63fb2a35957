//! Channel footprints: tubes around swirl curves plus endpoint dots.
//!
//! A tube is the round-cap, round-join buffer of the curve polyline, built as the
//! union of one stadium per segment. Arc vertices are placed on a fixed global
//! angle grid so that neighbouring stadiums, which share a cap center, also share
//! their arc vertices bit for bit.

use crate::curve::PathCurve;
use crate::endpoint::Endpoint;
use crate::errors::{TileError, TileResult};
use crate::float_types::{Real, EPSILON, FRAC_PI_2, PI, TAU};
use crate::matching::Pair;
use crate::merge::{union_all, validate_region};
use geo::{Area, Coord, LineString, MultiPolygon, Polygon};
use nalgebra::Point2;

/// What an outline was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutlineKind {
    Path(Pair),
    Dot(u8),
}

/// The 2D footprint of one groove. Outlines of the same tile may overlap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutline {
    pub kind: OutlineKind,
    pub shape: MultiPolygon<Real>,
}

impl ChannelOutline {
    pub fn area(&self) -> Real {
        self.shape.unsigned_area()
    }
}

/// Buffer `curve` by `radius`, returning the tube it sweeps out.
pub fn offset(curve: &PathCurve, radius: Real, arc_segments: usize) -> TileResult<ChannelOutline> {
    check_radius(radius, arc_segments)?;
    let Some(first) = curve.start() else {
        return Err(TileError::geometry(format!(
            "path {} has no points to offset",
            curve.pair
        )));
    };

    let mut parts: Vec<MultiPolygon<Real>> = curve
        .segments()
        .map(|(a, b)| MultiPolygon::new(vec![stadium(a, b, radius, arc_segments)]))
        .collect();
    if parts.is_empty() {
        parts.push(MultiPolygon::new(vec![disk(&first, radius, arc_segments)]));
    }

    let shape = union_all(parts);
    validate_region(&shape)
        .map_err(|e| TileError::geometry(format!("outline of path {}: {e}", curve.pair)))?;

    Ok(ChannelOutline {
        kind: OutlineKind::Path(curve.pair),
        shape,
    })
}

/// A round dot marking where a path enters the tile.
pub fn dot(endpoint: &Endpoint, radius: Real, arc_segments: usize) -> TileResult<ChannelOutline> {
    check_radius(radius, arc_segments)?;
    let shape = MultiPolygon::new(vec![disk(&endpoint.position, radius, arc_segments)]);
    validate_region(&shape)
        .map_err(|e| TileError::geometry(format!("dot at endpoint {}: {e}", endpoint.label)))?;
    Ok(ChannelOutline {
        kind: OutlineKind::Dot(endpoint.label),
        shape,
    })
}

fn check_radius(radius: Real, arc_segments: usize) -> TileResult<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(TileError::geometry(format!(
            "offset radius must be positive, got {radius}"
        )));
    }
    if arc_segments < 3 {
        return Err(TileError::geometry(format!(
            "an arc needs at least 3 segments, got {arc_segments}"
        )));
    }
    Ok(())
}

/// Closed polygonal approximation of a circle, vertices on the angle grid.
fn disk(center: &Point2<Real>, radius: Real, segments: usize) -> Polygon<Real> {
    let step = TAU / segments as Real;
    let coords: Vec<Coord<Real>> = (0..segments)
        .map(|k| on_circle(center, radius, k as Real * step))
        .collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Convex hull of the disks at `a` and `b`, counter-clockwise.
fn stadium(a: &Point2<Real>, b: &Point2<Real>, radius: Real, segments: usize) -> Polygon<Real> {
    let d = b - a;
    if d.norm() < EPSILON {
        return disk(a, radius, segments);
    }
    let heading = d.y.atan2(d.x);

    let mut coords = Vec::with_capacity(segments + 4);
    // front cap around b, right side to left side
    push_arc(&mut coords, b, radius, heading - FRAC_PI_2, heading + FRAC_PI_2, segments);
    // back cap around a, left side to right side
    push_arc(&mut coords, a, radius, heading + FRAC_PI_2, heading + PI + FRAC_PI_2, segments);
    Polygon::new(LineString::new(coords), vec![])
}

/// Append the CCW arc from angle `from` to `to` (inclusive), with any grid angles
/// strictly between them. Grid angles are reduced to `[0, TAU)` before evaluation
/// so the same grid vertex always gets the same coordinates.
fn push_arc(
    out: &mut Vec<Coord<Real>>,
    center: &Point2<Real>,
    radius: Real,
    from: Real,
    to: Real,
    segments: usize,
) {
    let step = TAU / segments as Real;
    let slack = step * 1e-3;
    out.push(on_circle(center, radius, from));
    let mut k = (from / step).floor() as i64 + 1;
    loop {
        let angle = k as Real * step;
        if angle >= to - slack {
            break;
        }
        if angle > from + slack {
            let wrapped = k.rem_euclid(segments as i64) as Real * step;
            out.push(on_circle(center, radius, wrapped));
        }
        k += 1;
    }
    out.push(on_circle(center, radius, to));
}

fn on_circle(center: &Point2<Real>, radius: Real, angle: Real) -> Coord<Real> {
    let (sin, cos) = angle.sin_cos();
    Coord {
        x: center.x + radius * cos,
        y: center.y + radius * sin,
    }
}
