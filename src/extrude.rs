//! Carving the merged channel region into the tile slab.
//!
//! Both the slab and the channel are vertical prisms, so their difference is
//! assembled face by face instead of through a general mesh boolean:
//!
//! - bottom: the slab footprint, facing down
//! - land: the footprint minus the channel, at the slab top
//! - floor: the channel clipped to the footprint, at the channel bottom
//! - channel walls: one rectangle per floor edge inside the footprint
//! - sides: one face per footprint edge, notched where the floor reaches it
//!
//! The faces are triangulated, welded, repaired and checked for manifoldness.

use crate::config::TileConfig;
use crate::errors::{TileError, TileResult};
use crate::float_types::Real;
use crate::merge::{clean, MergedRegion};
use crate::mesh::TileSolid;
use crate::polygon::Face;
use crate::triangulate::Triangulator;
use geo::algorithm::orient::{Direction, Orient};
use geo::{Area, BooleanOps, Coord, LineString, MultiPolygon, Polygon, Rect};
use nalgebra::{Point2, Vector2, Vector3};

/// A 2D footprint extruded over `[z_min, z_max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    pub footprint: MultiPolygon<Real>,
    pub z_min: Real,
    pub z_max: Real,
}

impl Prism {
    /// The blank tile: `[0, size]² × [0, thickness]`.
    pub fn slab(size: Real, thickness: Real) -> Self {
        let square = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: size, y: size }).to_polygon();
        Prism {
            footprint: MultiPolygon::new(vec![square]).orient(Direction::Default),
            z_min: 0.0,
            z_max: thickness,
        }
    }

    pub fn extrude(region: &MultiPolygon<Real>, z_min: Real, height: Real) -> Self {
        Prism {
            footprint: region.clone(),
            z_min,
            z_max: z_min + height,
        }
    }

    pub fn height(&self) -> Real {
        self.z_max - self.z_min
    }

    pub fn volume(&self) -> Real {
        self.footprint.unsigned_area() * self.height()
    }

    /// Mesh this prism on its own.
    pub fn to_solid(&self, engine: &dyn Triangulator, tolerance: Real) -> TileResult<TileSolid> {
        let mut faces = Vec::new();
        for poly in &self.footprint {
            faces.push(Face::horizontal(poly.clone(), self.z_min, false));
            faces.push(Face::horizontal(poly.clone(), self.z_max, true));
        }
        for (a, b) in ring_edges(&self.footprint) {
            if let Some(face) = wall(a, b, self.z_min, self.z_max, Side::Right) {
                faces.push(face);
            }
        }
        assemble(&faces, engine, tolerance)
    }

    /// Cut `tool` out of this prism. The tool must reach down from the top face:
    /// `tool.z_max >= self.z_max` and `self.z_min < tool.z_min < self.z_max`.
    pub fn subtract(
        &self,
        tool: &Prism,
        engine: &dyn Triangulator,
        tolerance: Real,
    ) -> TileResult<TileSolid> {
        if tool.z_max < self.z_max - tolerance
            || tool.z_min <= self.z_min
            || tool.z_min >= self.z_max
        {
            return Err(TileError::geometry(format!(
                "tool prism [{}, {}] does not cut down from the top of [{}, {}]",
                tool.z_min, tool.z_max, self.z_min, self.z_max
            )));
        }

        let outer = ring_edges(&self.footprint);
        let clipped = clean(&self.footprint.intersection(&tool.footprint), tolerance);
        let floor_region = clean(&snap_to_outline(&clipped, &outer, tolerance), tolerance);
        if floor_region.0.is_empty() {
            return self.to_solid(engine, tolerance);
        }
        let land = clean(&self.footprint.difference(&floor_region), tolerance);
        let land = clean(&snap_to_outline(&land, &outer, tolerance), tolerance);

        let top = self.z_max;
        let floor = tool.z_min;
        let floor_edges = ring_edges(&floor_region);

        let mut faces = Vec::new();
        for poly in &self.footprint {
            faces.push(Face::horizontal(poly.clone(), self.z_min, false));
        }
        for poly in &land {
            faces.push(Face::horizontal(poly.clone(), top, true));
        }
        for poly in &floor_region {
            faces.push(Face::horizontal(poly.clone(), floor, true));
        }

        for &(p, q) in &floor_edges {
            let on_boundary = outer
                .iter()
                .any(|&(a, b)| Edge::new(a, b).contains_segment(p, q, tolerance));
            if on_boundary {
                continue;
            }
            // the channel lies to the left of each floor edge
            if let Some(face) = wall(p, q, floor, top, Side::Left) {
                faces.push(face);
            }
        }

        let land_edges = ring_edges(&land);
        for &(a, b) in &outer {
            let side = SideProfile {
                edge: Edge::new(a, b),
                base: self.z_min,
                top,
                floor,
                tolerance,
            };
            if let Some(face) = side.face(&land_edges, &floor_edges) {
                faces.push(face);
            }
        }

        log::debug!(
            "carving {} floor polygon(s) from {} land polygon(s) with {} faces",
            floor_region.0.len(),
            land.0.len(),
            faces.len()
        );
        assemble(&faces, engine, tolerance)
    }
}

/// Carve the merged channel region into a blank tile at the configured depth.
pub fn extrude(
    region: &MergedRegion,
    config: &TileConfig,
    engine: &dyn Triangulator,
) -> TileResult<TileSolid> {
    let slab = Prism::slab(config.tile_size, config.tile_thickness);
    let tool = Prism::extrude(
        region.polygons(),
        config.tile_thickness - config.channel_depth,
        config.channel_depth,
    );
    let solid = slab.subtract(&tool, engine, config.tolerance)?;

    let volume = solid.volume();
    let full = slab.volume();
    if !(volume > 0.0 && volume < full) {
        return Err(TileError::non_manifold(format!(
            "carved volume {volume:.4} is outside (0, {full:.4})"
        )));
    }
    log::debug!(
        "tile solid: {} vertices, {} triangles, volume {:.3}",
        solid.vertices.len(),
        solid.triangles.len(),
        volume
    );
    Ok(solid)
}

fn assemble(faces: &[Face], engine: &dyn Triangulator, tolerance: Real) -> TileResult<TileSolid> {
    let mut soup = Vec::new();
    for face in faces {
        soup.extend(face.tessellate(engine)?);
    }
    let mut solid = TileSolid::from_soup(&soup, tolerance);
    let splits = solid.repair_t_junctions(tolerance * 4.0);
    if splits > 0 {
        log::debug!("split {splits} triangle(s) at T-junctions");
    }
    solid.check_manifold().map_err(TileError::non_manifold)?;
    Ok(solid)
}

/// All ring edges of a region, closing edge included.
fn ring_edges(region: &MultiPolygon<Real>) -> Vec<(Point2<Real>, Point2<Real>)> {
    region
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.lines())
        .map(|l| (Point2::new(l.start.x, l.start.y), Point2::new(l.end.x, l.end.y)))
        .collect()
}

/// Move ring vertices within `tolerance` of an outline edge onto that edge, then
/// drop vertices whose neighbours both sit on the same edge as they do.
fn snap_to_outline(
    region: &MultiPolygon<Real>,
    outline: &[(Point2<Real>, Point2<Real>)],
    tolerance: Real,
) -> MultiPolygon<Real> {
    let edges: Vec<Edge> = outline
        .iter()
        .map(|&(a, b)| Edge::new(a, b))
        .filter(|e| e.length > 0.0)
        .collect();

    let snap_ring = |ring: &LineString<Real>| -> LineString<Real> {
        let open = &ring.0[..ring.0.len().saturating_sub(1)];
        let mut points: Vec<(Coord<Real>, Option<usize>)> = open
            .iter()
            .map(|&c| {
                let p = Point2::new(c.x, c.y);
                edges
                    .iter()
                    .enumerate()
                    .find_map(|(i, e)| e.param(p, tolerance).map(|t| (e.at(t), i)))
                    .map_or((c, None), |(q, i)| (Coord { x: q.x, y: q.y }, Some(i)))
            })
            .collect();

        let mut i = 0;
        while points.len() > 3 && i < points.len() {
            let n = points.len();
            let prev = points[(i + n - 1) % n].1;
            let next = points[(i + 1) % n].1;
            match points[i].1 {
                Some(e) if prev == Some(e) && next == Some(e) => {
                    points.remove(i);
                    i = i.saturating_sub(1);
                }
                _ => i += 1,
            }
        }
        // LineString::new does not close the ring; Polygon::new does.
        LineString::new(points.into_iter().map(|(c, _)| c).collect())
    };

    MultiPolygon::new(
        region
            .iter()
            .map(|poly| {
                Polygon::new(
                    snap_ring(poly.exterior()),
                    poly.interiors().iter().map(snap_ring).collect(),
                )
            })
            .collect(),
    )
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

/// A vertical rectangle over `a..b`, facing the given side of the direction `a -> b`.
fn wall(a: Point2<Real>, b: Point2<Real>, z0: Real, z1: Real, side: Side) -> Option<Face> {
    let d = b - a;
    let len = d.norm();
    if len <= 0.0 {
        return None;
    }
    let normal = match side {
        Side::Left => Vector3::new(-d.y, d.x, 0.0) / len,
        Side::Right => Vector3::new(d.y, -d.x, 0.0) / len,
    };
    Some(Face::wall(a, b, z0, z1, normal))
}

/// A footprint edge, parametrised by distance from its start.
struct Edge {
    start: Point2<Real>,
    direction: Vector2<Real>,
    length: Real,
}

impl Edge {
    fn new(a: Point2<Real>, b: Point2<Real>) -> Self {
        let d = b - a;
        let length = d.norm();
        let direction = if length > 0.0 { d / length } else { Vector2::zeros() };
        Edge {
            start: a,
            direction,
            length,
        }
    }

    fn at(&self, t: Real) -> Point2<Real> {
        self.start + self.direction * t
    }

    /// Distance of `p` along the edge, if `p` lies on it.
    fn param(&self, p: Point2<Real>, tolerance: Real) -> Option<Real> {
        let r = p - self.start;
        let off = self.direction.perp(&r).abs();
        let t = self.direction.dot(&r);
        (off <= tolerance && t >= -tolerance && t <= self.length + tolerance)
            .then(|| t.clamp(0.0, self.length))
    }

    fn contains_segment(&self, p: Point2<Real>, q: Point2<Real>, tolerance: Real) -> bool {
        self.length > 0.0
            && self.param(p, tolerance).is_some()
            && self.param(q, tolerance).is_some()
    }
}

/// The side face over one footprint edge: full height on land, down to the
/// channel floor wherever the floor region runs along the edge.
struct SideProfile {
    edge: Edge,
    base: Real,
    top: Real,
    floor: Real,
    tolerance: Real,
}

impl SideProfile {
    fn face(
        &self,
        land_edges: &[(Point2<Real>, Point2<Real>)],
        floor_edges: &[(Point2<Real>, Point2<Real>)],
    ) -> Option<Face> {
        let len = self.edge.length;
        let tol = self.tolerance;
        if len <= tol {
            return None;
        }

        let notches = self.notches(floor_edges);
        let land_breaks = self.breakpoints(land_edges);
        let floor_breaks = self.breakpoints(floor_edges);

        let high = self.top - self.base;
        let low = self.floor - self.base;
        let mut ring: Vec<Coord<Real>> = Vec::new();
        let mut push = |t: Real, z: Real| {
            let c = Coord { x: t, y: z };
            let repeat = ring
                .last()
                .is_some_and(|last: &Coord<Real>| (last.x - t).abs() <= tol && (last.y - z).abs() <= tol);
            if !repeat {
                ring.push(c);
            }
        };

        push(0.0, 0.0);
        push(len, 0.0);

        // walk the top profile from the far end back to the start
        let mut cursor = len;
        for &(s0, s1) in notches.iter().rev() {
            if s1 < len - tol {
                push(cursor, high);
                for &t in land_breaks.iter().rev().filter(|&&t| t < cursor && t > s1) {
                    push(t, high);
                }
                push(s1, high);
            }
            push(s1, low);
            for &t in floor_breaks.iter().rev().filter(|&&t| t < s1 && t > s0) {
                push(t, low);
            }
            push(s0, low);
            if s0 > tol {
                push(s0, high);
            }
            cursor = s0;
        }
        if cursor > tol {
            push(cursor, high);
            for &t in land_breaks.iter().rev().filter(|&&t| t < cursor && t > 0.0) {
                push(t, high);
            }
            push(0.0, high);
        }

        if ring.len() < 3 {
            return None;
        }
        let edge = &self.edge;
        let outward = Vector3::new(edge.direction.y, -edge.direction.x, 0.0);
        Some(Face::vertical(
            edge.start,
            edge.direction,
            self.base,
            Polygon::new(LineString::new(ring), vec![]),
            outward,
        ))
    }

    /// Parameter intervals where floor edges run along this edge, merged and sorted.
    fn notches(&self, floor_edges: &[(Point2<Real>, Point2<Real>)]) -> Vec<(Real, Real)> {
        let tol = self.tolerance;
        let mut spans: Vec<(Real, Real)> = floor_edges
            .iter()
            .filter_map(|&(p, q)| {
                let tp = self.edge.param(p, tol)?;
                let tq = self.edge.param(q, tol)?;
                let span = (tp.min(tq), tp.max(tq));
                (span.1 - span.0 > tol).then_some(span)
            })
            .collect();
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut merged: Vec<(Real, Real)> = Vec::with_capacity(spans.len());
        for (s0, s1) in spans {
            match merged.last_mut() {
                Some(last) if s0 <= last.1 + tol => last.1 = last.1.max(s1),
                _ => merged.push((s0, s1)),
            }
        }
        merged
    }

    /// Parameters of ring vertices lying on this edge, ascending.
    fn breakpoints(&self, edges: &[(Point2<Real>, Point2<Real>)]) -> Vec<Real> {
        let mut ts: Vec<Real> = edges
            .iter()
            .filter_map(|&(p, _)| self.edge.param(p, self.tolerance))
            .collect();
        ts.sort_by(|a, b| a.total_cmp(b));
        ts.dedup_by(|a, b| (*a - *b).abs() <= self.tolerance);
        ts
    }
}
