//! The indexed triangle mesh of a finished tile.

use crate::float_types::{Real, EPSILON};
use hashbrown::{HashMap, HashSet};
use nalgebra::{Point3, Vector3};

#[cfg(feature = "stl-io")]
use std::io::Cursor;

/// Passes of the T-junction repair before giving up.
const MAX_REPAIR_PASSES: usize = 64;

/// A welded triangle mesh. Triangles are wound counter-clockwise seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileSolid {
    pub vertices: Vec<Point3<Real>>,
    pub triangles: Vec<[usize; 3]>,
}

type CellKey = (i64, i64, i64);

/// Spatial hash for merging points closer than `tolerance`.
struct Welder {
    tolerance: Real,
    cells: HashMap<CellKey, Vec<usize>>,
    vertices: Vec<Point3<Real>>,
}

impl Welder {
    fn new(tolerance: Real) -> Self {
        Welder {
            tolerance: tolerance.max(EPSILON),
            cells: HashMap::new(),
            vertices: Vec::new(),
        }
    }

    fn cell(&self, p: &Point3<Real>) -> CellKey {
        let s = self.tolerance;
        (
            (p.x / s).floor() as i64,
            (p.y / s).floor() as i64,
            (p.z / s).floor() as i64,
        )
    }

    fn insert(&mut self, p: Point3<Real>) -> usize {
        let (cx, cy, cz) = self.cell(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &idx in bucket {
                            if (self.vertices[idx] - p).norm() <= self.tolerance {
                                return idx;
                            }
                        }
                    }
                }
            }
        }
        let idx = self.vertices.len();
        self.vertices.push(p);
        self.cells.entry((cx, cy, cz)).or_default().push(idx);
        idx
    }
}

impl TileSolid {
    /// Weld a triangle soup, merging vertices within `tolerance` of each other.
    /// Triangles that collapse onto fewer than three vertices are dropped.
    pub fn from_soup(soup: &[[Point3<Real>; 3]], tolerance: Real) -> Self {
        let mut welder = Welder::new(tolerance);
        let mut triangles = Vec::with_capacity(soup.len());
        for tri in soup {
            let [a, b, c] = tri.map(|p| welder.insert(p));
            if a != b && b != c && c != a {
                triangles.push([a, b, c]);
            }
        }
        TileSolid {
            vertices: welder.vertices,
            triangles,
        }
    }

    /// Directed edges with no reversed twin, as `(triangle, corner)` pairs; the edge
    /// runs from corner `k` to corner `k + 1`.
    fn open_edges(&self) -> Vec<(usize, usize)> {
        let directed: HashSet<(usize, usize)> = self
            .triangles
            .iter()
            .flat_map(|t| [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])])
            .collect();
        let mut open = Vec::new();
        for (ti, t) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                let (a, b) = (t[k], t[(k + 1) % 3]);
                if !directed.contains(&(b, a)) {
                    open.push((ti, k));
                }
            }
        }
        open
    }

    pub fn open_edge_count(&self) -> usize {
        self.open_edges().len()
    }

    /// Split triangles whose open edges pass through a vertex of another open edge.
    ///
    /// Each pass splits every affected triangle once, at the vertex nearest the
    /// start of its edge; passes repeat until the mesh stops changing. Returns the
    /// number of splits made.
    pub fn repair_t_junctions(&mut self, tolerance: Real) -> usize {
        let tolerance = tolerance.max(EPSILON);
        let mut splits = 0;
        for _ in 0..MAX_REPAIR_PASSES {
            let open = self.open_edges();
            if open.is_empty() {
                break;
            }
            let mut candidates: Vec<usize> = open
                .iter()
                .flat_map(|&(ti, k)| {
                    let t = self.triangles[ti];
                    [t[k], t[(k + 1) % 3]]
                })
                .collect();
            candidates.sort_unstable();
            candidates.dedup();

            let mut touched: HashSet<usize> = HashSet::new();
            let mut added = Vec::new();
            for &(ti, k) in &open {
                if touched.contains(&ti) {
                    continue;
                }
                let t = self.triangles[ti];
                let (a, b, c) = (t[k], t[(k + 1) % 3], t[(k + 2) % 3]);
                if let Some(v) = self.split_vertex((a, b), c, &candidates, tolerance) {
                    touched.insert(ti);
                    let mut first = [0; 3];
                    first[k] = a;
                    first[(k + 1) % 3] = v;
                    first[(k + 2) % 3] = c;
                    let mut second = [0; 3];
                    second[k] = v;
                    second[(k + 1) % 3] = b;
                    second[(k + 2) % 3] = c;
                    self.triangles[ti] = first;
                    added.push(second);
                }
            }
            if added.is_empty() {
                break;
            }
            splits += added.len();
            self.triangles.extend(added);
        }
        splits
    }

    /// The candidate vertex lying strictly inside segment `a..b`, closest to `a`.
    /// Never the triangle's `opposite` corner.
    fn split_vertex(
        &self,
        (a, b): (usize, usize),
        opposite: usize,
        candidates: &[usize],
        tolerance: Real,
    ) -> Option<usize> {
        let pa = self.vertices[a];
        let pb = self.vertices[b];
        let d = pb - pa;
        let len_sq = d.norm_squared();
        if len_sq <= tolerance * tolerance {
            return None;
        }
        let len = len_sq.sqrt();
        let mut best: Option<(Real, usize)> = None;
        for &v in candidates {
            if v == a || v == b || v == opposite {
                continue;
            }
            let p = self.vertices[v];
            let s = (p - pa).dot(&d) / len_sq;
            if s * len <= tolerance || (1.0 - s) * len <= tolerance {
                continue;
            }
            let off = (p - (pa + d * s)).norm();
            if off <= tolerance && best.map_or(true, |(bs, _)| s < bs) {
                best = Some((s, v));
            }
        }
        best.map(|(_, v)| v)
    }

    /// Check that the mesh is closed, edge-manifold and consistently oriented:
    /// every directed edge appears exactly once and so does its reverse.
    pub fn check_manifold(&self) -> Result<(), String> {
        if self.triangles.is_empty() {
            return Err("mesh has no triangles".into());
        }
        let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
        for (ti, t) in self.triangles.iter().enumerate() {
            if t.iter().any(|&i| i >= self.vertices.len()) {
                return Err(format!("triangle {ti} references a missing vertex"));
            }
            if t[0] == t[1] || t[1] == t[2] || t[2] == t[0] {
                return Err(format!("triangle {ti} is degenerate"));
            }
            for k in 0..3 {
                *counts.entry((t[k], t[(k + 1) % 3])).or_insert(0) += 1;
            }
        }
        for (&(a, b), &n) in &counts {
            if n > 1 {
                return Err(format!("edge {a}->{b} is used by {n} triangles with the same winding"));
            }
            if !counts.contains_key(&(b, a)) {
                let (pa, pb) = (self.vertices[a], self.vertices[b]);
                return Err(format!(
                    "open edge ({:.4}, {:.4}, {:.4}) -> ({:.4}, {:.4}, {:.4})",
                    pa.x, pa.y, pa.z, pb.x, pb.y, pb.z
                ));
            }
        }
        Ok(())
    }

    pub fn is_manifold(&self) -> bool {
        self.check_manifold().is_ok()
    }

    fn corners(&self, t: &[usize; 3]) -> [Point3<Real>; 3] {
        t.map(|i| self.vertices[i])
    }

    /// Unit normal of triangle `index`, zero for a degenerate triangle.
    pub fn triangle_normal(&self, index: usize) -> Vector3<Real> {
        let [a, b, c] = self.corners(&self.triangles[index]);
        (b - a).cross(&(c - a)).try_normalize(EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Signed volume by the divergence theorem; positive for outward winding.
    pub fn volume(&self) -> Real {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = self.corners(t);
                a.coords.dot(&b.coords.cross(&c.coords))
            })
            .sum::<Real>()
            / 6.0
    }

    pub fn surface_area(&self) -> Real {
        self.triangles
            .iter()
            .map(|t| {
                let [a, b, c] = self.corners(t);
                0.5 * (b - a).cross(&(c - a)).norm()
            })
            .sum()
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        let first = *self.vertices.first()?;
        let (mut lo, mut hi) = (first, first);
        for p in &self.vertices {
            lo = lo.inf(p);
            hi = hi.sup(p);
        }
        Some((lo, hi))
    }

    /// Export to ASCII STL
    pub fn to_stl_ascii(&self, name: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("solid {}\n", name));
        for (ti, t) in self.triangles.iter().enumerate() {
            let normal = self.triangle_normal(ti);
            out.push_str(&format!(
                "  facet normal {:.6} {:.6} {:.6}\n",
                normal.x, normal.y, normal.z
            ));
            out.push_str("    outer loop\n");
            for p in self.corners(t) {
                out.push_str(&format!("      vertex {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
            }
            out.push_str("    endloop\n");
            out.push_str("  endfacet\n");
        }
        out.push_str(&format!("endsolid {}\n", name));
        out
    }

    /// Export to binary STL
    #[cfg(feature = "stl-io")]
    pub fn to_stl_binary(&self) -> std::io::Result<Vec<u8>> {
        let vertex = |p: Point3<Real>| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32]);
        let triangles: Vec<stl_io::Triangle> = self
            .triangles
            .iter()
            .enumerate()
            .map(|(ti, t)| {
                let n = self.triangle_normal(ti);
                let [a, b, c] = self.corners(t);
                stl_io::Triangle {
                    normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: [vertex(a), vertex(b), vertex(c)],
                }
            })
            .collect();

        let mut cursor = Cursor::new(Vec::new());
        stl_io::write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }
}
