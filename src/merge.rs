//! Union of all channel outlines of one tile.
//!
//! The merged region is the only 2D shape the extruder accepts: oriented, free of
//! self-intersections, with no two polygons overlapping. Slivers left behind by
//! near-coincident boundaries are dropped here rather than downstream.

use crate::errors::{TileError, TileResult};
use crate::float_types::{Real, SLIVER_AREA_FACTOR};
use crate::outline::ChannelOutline;
use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, Contains, Coord, InteriorPoint, LineString, MultiPolygon, Polygon};
use robust::orient2d;

/// Non-overlapping union of a tile's channel outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRegion {
    polygons: MultiPolygon<Real>,
}

impl MergedRegion {
    /// Wrap an already valid region, checking it first.
    pub fn from_polygons(polygons: MultiPolygon<Real>) -> TileResult<Self> {
        let polygons = polygons.orient(Direction::Default);
        validate_region(&polygons).map_err(TileError::geometry)?;
        Ok(MergedRegion { polygons })
    }

    pub fn polygons(&self) -> &MultiPolygon<Real> {
        &self.polygons
    }

    pub fn into_inner(self) -> MultiPolygon<Real> {
        self.polygons
    }

    pub fn area(&self) -> Real {
        self.polygons.unsigned_area()
    }

    /// Number of disjoint polygons.
    pub fn len(&self) -> usize {
        self.polygons.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.0.is_empty()
    }

    pub fn hole_count(&self) -> usize {
        self.polygons.iter().map(|p| p.interiors().len()).sum()
    }

    /// Area of the symmetric difference; zero for equal regions.
    pub fn symmetric_difference_area(&self, other: &MergedRegion) -> Real {
        self.polygons.xor(&other.polygons).unsigned_area()
    }
}

/// Union `outlines` into one region, merging coincident boundaries and dropping slivers
/// whose area is below `tolerance² * SLIVER_AREA_FACTOR`.
pub fn merge(outlines: &[ChannelOutline], tolerance: Real) -> TileResult<MergedRegion> {
    if outlines.is_empty() {
        return Err(TileError::geometry("no outlines to merge"));
    }
    let union = union_all(outlines.iter().map(|o| o.shape.clone()).collect());
    let cleaned = clean(&union, tolerance);
    if cleaned.0.is_empty() {
        return Err(TileError::geometry(format!(
            "union of {} outlines is empty",
            outlines.len()
        )));
    }
    validate_region(&cleaned).map_err(TileError::geometry)?;
    log::debug!(
        "merged {} outlines into {} polygon(s), area {:.3}",
        outlines.len(),
        cleaned.0.len(),
        cleaned.unsigned_area()
    );
    Ok(MergedRegion { polygons: cleaned })
}

/// Perform a 2D union of a whole list of regions.
/// Neighbours are unioned pairwise, level by level, so every boolean op works on
/// inputs of similar size.
pub(crate) fn union_all(mut parts: Vec<MultiPolygon<Real>>) -> MultiPolygon<Real> {
    while parts.len() > 1 {
        parts = parts
            .chunks(2)
            .map(|chunk| match chunk {
                [a, b] => a.union(b),
                [a] => a.clone(),
                _ => MultiPolygon::new(Vec::new()),
            })
            .collect();
    }
    parts.pop().unwrap_or_else(|| MultiPolygon::new(Vec::new()))
}

/// Remove near-duplicate vertices, degenerate rings and sliver polygons or holes.
pub fn clean(region: &MultiPolygon<Real>, tolerance: Real) -> MultiPolygon<Real> {
    let min_area = tolerance * tolerance * SLIVER_AREA_FACTOR;
    let polygons = region
        .iter()
        .filter_map(|poly| {
            let exterior = clean_ring(poly.exterior(), tolerance)?;
            if ring_area(&exterior).abs() < min_area {
                return None;
            }
            let holes = poly
                .interiors()
                .iter()
                .filter_map(|ring| clean_ring(ring, tolerance))
                .filter(|ring| ring_area(ring).abs() >= min_area)
                .collect();
            Some(Polygon::new(exterior, holes))
        })
        .collect();
    MultiPolygon::new(polygons).orient(Direction::Default)
}

fn clean_ring(ring: &LineString<Real>, tolerance: Real) -> Option<LineString<Real>> {
    let mut pts: Vec<Coord<Real>> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if pts.last().map_or(true, |last| distance(last, c) > tolerance) {
            pts.push(*c);
        }
    }
    while pts.len() > 1 && distance(&pts[0], &pts[pts.len() - 1]) <= tolerance {
        pts.pop();
    }
    if pts.len() < 3 {
        return None;
    }
    Some(LineString::new(pts))
}

fn distance(a: &Coord<Real>, b: &Coord<Real>) -> Real {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Signed area of a ring via the shoelace formula; positive if CCW.
pub(crate) fn ring_area(ring: &LineString<Real>) -> Real {
    let c = &ring.0;
    let n = c.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += c[i].x * c[j].y - c[i].y * c[j].x;
    }
    0.5 * area
}

/// Check that a region is a set of simple, non-overlapping polygons.
pub fn validate_region(region: &MultiPolygon<Real>) -> Result<(), String> {
    for (pi, poly) in region.iter().enumerate() {
        for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
            if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(format!("polygon #{pi} has a non-finite coordinate"));
            }
            // closed rings repeat their first point
            if ring.0.len() < 4 {
                return Err(format!("polygon #{pi} has a ring with fewer than 3 vertices"));
            }
        }
    }

    if let Some(at) = find_crossing(region) {
        return Err(format!(
            "boundary segments cross near ({:.4}, {:.4})",
            at.x, at.y
        ));
    }

    let inner_points: Vec<_> = region.iter().map(|p| p.interior_point()).collect();
    for (i, outer) in region.iter().enumerate() {
        for (j, inner) in inner_points.iter().enumerate() {
            if i == j {
                continue;
            }
            if let Some(pt) = inner {
                if outer.contains(pt) {
                    return Err(format!("polygon #{j} lies inside polygon #{i}"));
                }
            }
        }
    }
    Ok(())
}

struct Segment {
    ring: usize,
    index: usize,
    ring_len: usize,
    a: Coord<Real>,
    b: Coord<Real>,
    min_x: Real,
    max_x: Real,
    min_y: Real,
    max_y: Real,
}

/// Find two ring segments that properly cross or overlap collinearly.
///
/// Segments sharing only an endpoint (touching rings) are allowed. Returns a point
/// near the first offending pair.
pub fn find_crossing(region: &MultiPolygon<Real>) -> Option<Coord<Real>> {
    let mut segments = Vec::new();
    let rings = region
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()));
    for (ring, line) in rings.enumerate() {
        let ring_len = line.0.len().saturating_sub(1);
        for (index, w) in line.0.windows(2).enumerate() {
            let (a, b) = (w[0], w[1]);
            segments.push(Segment {
                ring,
                index,
                ring_len,
                a,
                b,
                min_x: a.x.min(b.x),
                max_x: a.x.max(b.x),
                min_y: a.y.min(b.y),
                max_y: a.y.max(b.y),
            });
        }
    }
    segments.sort_by(|s, t| s.min_x.total_cmp(&t.min_x));

    for i in 0..segments.len() {
        let s = &segments[i];
        for t in &segments[i + 1..] {
            if t.min_x > s.max_x {
                break;
            }
            if t.min_y > s.max_y || t.max_y < s.min_y {
                continue;
            }
            if s.ring == t.ring {
                let gap = s.index.abs_diff(t.index);
                if gap == 1 || gap + 1 == s.ring_len {
                    continue;
                }
            }
            if segments_conflict(&s.a, &s.b, &t.a, &t.b) {
                return Some(s.a);
            }
        }
    }
    None
}

fn orient(a: &Coord<Real>, b: &Coord<Real>, c: &Coord<Real>) -> Real {
    orient2d(
        robust::Coord { x: a.x, y: a.y },
        robust::Coord { x: b.x, y: b.y },
        robust::Coord { x: c.x, y: c.y },
    )
}

fn segments_conflict(a: &Coord<Real>, b: &Coord<Real>, c: &Coord<Real>, d: &Coord<Real>) -> bool {
    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    let straddles = |p: Real, q: Real| (p > 0.0 && q < 0.0) || (p < 0.0 && q > 0.0);
    if straddles(o1, o2) && straddles(o3, o4) {
        return true;
    }
    if o1 == 0.0 && o2 == 0.0 {
        // collinear: compare extents along the dominant axis
        let along_x = (b.x - a.x).abs() >= (b.y - a.y).abs();
        let key = |p: &Coord<Real>| if along_x { p.x } else { p.y };
        let (s0, s1) = (key(a).min(key(b)), key(a).max(key(b)));
        let (t0, t1) = (key(c).min(key(d)), key(c).max(key(d)));
        return s1.min(t1) - s0.max(t0) > 0.0;
    }
    false
}
