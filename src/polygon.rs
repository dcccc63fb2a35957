use crate::errors::TileResult;
use crate::float_types::{Real, EPSILON};
use crate::triangulate::Triangulator;
use geo::{Area, Coord, LineString, Polygon};
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// A planar polygon (with holes) embedded in 3D.
///
/// The outline lives in local `(s, t)` coordinates; a point maps to
/// `origin + s * u + t * v`. `normal` is the side of the plane facing out of the solid.
#[derive(Debug, Clone)]
pub struct Face {
    pub origin: Point3<Real>,
    pub u: Vector3<Real>,
    pub v: Vector3<Real>,
    pub normal: Vector3<Real>,
    pub outline: Polygon<Real>,
}

impl Face {
    /// A face in the plane `z = const`, using world x/y as local coordinates so that
    /// vertices land on exactly the same coordinates as the 2D input.
    pub fn horizontal(outline: Polygon<Real>, z: Real, facing_up: bool) -> Self {
        Face {
            origin: Point3::new(0.0, 0.0, z),
            u: Vector3::x(),
            v: Vector3::y(),
            normal: if facing_up { Vector3::z() } else { -Vector3::z() },
            outline,
        }
    }

    /// A vertical face standing on the line through `base` with unit `direction`.
    /// Local `s` runs along the line, local `t` is height above `z_base`.
    pub fn vertical(
        base: Point2<Real>,
        direction: Vector2<Real>,
        z_base: Real,
        outline: Polygon<Real>,
        normal: Vector3<Real>,
    ) -> Self {
        Face {
            origin: Point3::new(base.x, base.y, z_base),
            u: Vector3::new(direction.x, direction.y, 0.0),
            v: Vector3::z(),
            normal,
            outline,
        }
    }

    /// A vertical rectangle spanning `a..b` in plan and `z0..z1` in height.
    pub fn wall(a: Point2<Real>, b: Point2<Real>, z0: Real, z1: Real, normal: Vector3<Real>) -> Self {
        let d = b - a;
        let len = d.norm();
        let ring = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: len, y: 0.0 },
            Coord { x: len, y: z1 - z0 },
            Coord { x: 0.0, y: z1 - z0 },
        ];
        Face::vertical(a, d / len, z0, Polygon::new(LineString::new(ring), vec![]), normal)
    }

    pub fn to_world(&self, c: &Coord<Real>) -> Point3<Real> {
        self.origin + self.u * c.x + self.v * c.y
    }

    pub fn area(&self) -> Real {
        self.outline.unsigned_area()
    }

    /// Triangulate this face into 3D triangles wound counter-clockwise when seen
    /// from the `normal` side. Zero-area triangles are dropped.
    pub fn tessellate(&self, engine: &dyn Triangulator) -> TileResult<Vec<[Point3<Real>; 3]>> {
        let flat = engine.triangulate(&self.outline)?;
        let mut triangles = Vec::with_capacity(flat.len());
        for [a, b, c] in &flat {
            let (pa, pb, pc) = (self.to_world(a), self.to_world(b), self.to_world(c));
            let cross = (pb - pa).cross(&(pc - pa));
            let longest = (pb - pa)
                .norm_squared()
                .max((pc - pb).norm_squared())
                .max((pa - pc).norm_squared());
            // needle: its neighbours get split later by the T-junction repair
            if cross.norm() <= EPSILON * longest {
                continue;
            }
            if cross.dot(&self.normal) > 0.0 {
                triangles.push([pa, pb, pc]);
            } else {
                triangles.push([pa, pc, pb]);
            }
        }
        Ok(triangles)
    }
}
