//! Swirl curves joining the two endpoints of a pair.
//!
//! The base shape is a cubic Bézier whose handles run along each endpoint's
//! inward normal, so every path leaves the boundary at a right angle. The swirl
//! is a twist about the tile center that fades out at the inscribed circle; the
//! endpoints lie outside that circle and are never moved.

use crate::config::TileConfig;
use crate::endpoint::EndpointTable;
use crate::errors::{TileError, TileResult};
use crate::float_types::{Real, EPSILON};
use crate::matching::Pair;
use nalgebra::{Point2, Rotation2, Vector2};

/// An ordered sample of points along one path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathCurve {
    pub pair: Pair,
    pub points: Vec<Point2<Real>>,
}

impl PathCurve {
    /// Wrap an explicit polyline, e.g. for hand-built channels.
    pub fn from_points(pair: Pair, points: Vec<Point2<Real>>) -> Self {
        PathCurve { pair, points }
    }

    pub fn start(&self) -> Option<Point2<Real>> {
        self.points.first().copied()
    }

    pub fn end(&self) -> Option<Point2<Real>> {
        self.points.last().copied()
    }

    /// Polyline length.
    pub fn length(&self) -> Real {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Return an iterator over consecutive point pairs
    pub fn segments(&self) -> impl Iterator<Item = (&Point2<Real>, &Point2<Real>)> {
        self.points.iter().zip(self.points.iter().skip(1))
    }
}

/// Parameters of the swirl construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwirlBuilder {
    pub samples: usize,
    pub tension: Real,
    pub twist: Real,
}

impl SwirlBuilder {
    pub fn from_config(config: &TileConfig) -> Self {
        SwirlBuilder {
            samples: config.curve_samples,
            tension: config.swirl_tension,
            twist: config.swirl_twist,
        }
    }

    /// Build the swirl for `pair`.
    ///
    /// Fails with [`TileError::DegenerateCurve`] when the path is shorter than
    /// twice `path_radius`, which is too short to carry a round-capped channel.
    pub fn build(
        &self,
        pair: Pair,
        endpoints: &EndpointTable,
        path_radius: Real,
    ) -> TileResult<PathCurve> {
        let (e0, e1) = endpoints.pair(pair);
        let p0 = e0.position;
        let p1 = e1.position;
        let size = endpoints.tile_size();

        let handle = (self.tension * (p1 - p0).norm()).min(size / 2.0);
        let c0 = p0 + e0.normal * handle;
        let c1 = p1 + e1.normal * handle;

        let center = endpoints.center();
        let fade_radius = size / 2.0;
        let n = self.samples.max(2);

        let mut points = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as Real / (n - 1) as Real;
            let base = cubic_bezier(&p0, &c0, &c1, &p1, t);
            points.push(swirl(&base, &center, fade_radius, self.twist));
        }
        // pin the ends exactly; the twist leaves them alone but sampling may not land on t=1
        points[0] = p0;
        points[n - 1] = p1;

        let curve = PathCurve { pair, points };
        let length = curve.length();
        let minimum = 2.0 * path_radius;
        if length.is_nan() || length <= minimum {
            return Err(TileError::DegenerateCurve {
                pair,
                length,
                minimum,
            });
        }
        Ok(curve)
    }
}

fn cubic_bezier(
    p0: &Point2<Real>,
    c0: &Point2<Real>,
    c1: &Point2<Real>,
    p1: &Point2<Real>,
    t: Real,
) -> Point2<Real> {
    let s = 1.0 - t;
    let w0 = s * s * s;
    let w1 = 3.0 * s * s * t;
    let w2 = 3.0 * s * t * t;
    let w3 = t * t * t;
    Point2::from(p0.coords * w0 + c0.coords * w1 + c1.coords * w2 + p1.coords * w3)
}

/// Rotate `p` about `center` by `twist * (1 - rho/fade)^2`, where rho is its distance
/// from the center. Points at or beyond `fade` are returned unchanged.
fn swirl(p: &Point2<Real>, center: &Point2<Real>, fade: Real, twist: Real) -> Point2<Real> {
    let offset: Vector2<Real> = p - center;
    let rho = offset.norm();
    if rho >= fade || twist.abs() < EPSILON {
        return *p;
    }
    let falloff = 1.0 - rho / fade;
    let angle = twist * falloff * falloff;
    center + Rotation2::new(angle) * offset
}
