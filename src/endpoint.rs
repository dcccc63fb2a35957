use crate::errors::{TileError, TileResult};
use crate::float_types::Real;
use crate::matching::{Pair, ENDPOINT_COUNT};
use nalgebra::{Point2, Vector2};

/// One of the 8 fixed entry points on the tile boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoint {
    pub label: u8,
    pub position: Point2<Real>,
    /// Unit vector pointing from the boundary into the tile.
    pub normal: Vector2<Real>,
}

/// The read-only endpoint layout for a tile of a given size.
///
/// Two endpoints per side, at one and three quarters along it, labelled clockwise
/// from the top-left one.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointTable {
    tile_size: Real,
    endpoints: [Endpoint; ENDPOINT_COUNT],
}

impl EndpointTable {
    pub fn new(tile_size: Real) -> TileResult<Self> {
        if !tile_size.is_finite() || tile_size <= 0.0 {
            return Err(TileError::invalid_config(format!(
                "tile size must be positive, got {tile_size}"
            )));
        }
        let l = tile_size;
        let q = tile_size / 4.0;
        let down = Vector2::new(0.0, -1.0);
        let up = Vector2::new(0.0, 1.0);
        let left = Vector2::new(-1.0, 0.0);
        let right = Vector2::new(1.0, 0.0);

        let layout = [
            (Point2::new(q, l), down),
            (Point2::new(3.0 * q, l), down),
            (Point2::new(l, 3.0 * q), left),
            (Point2::new(l, q), left),
            (Point2::new(3.0 * q, 0.0), up),
            (Point2::new(q, 0.0), up),
            (Point2::new(0.0, q), right),
            (Point2::new(0.0, 3.0 * q), right),
        ];
        let endpoints = std::array::from_fn(|i| Endpoint {
            label: i as u8,
            position: layout[i].0,
            normal: layout[i].1,
        });

        Ok(EndpointTable {
            tile_size,
            endpoints,
        })
    }

    pub fn tile_size(&self) -> Real {
        self.tile_size
    }

    pub fn center(&self) -> Point2<Real> {
        Point2::new(self.tile_size / 2.0, self.tile_size / 2.0)
    }

    /// `None` for a label outside `0..8`.
    pub fn get(&self, label: u8) -> Option<&Endpoint> {
        self.endpoints.get(label as usize)
    }

    pub fn pair(&self, pair: Pair) -> (&Endpoint, &Endpoint) {
        // Pair labels are always below ENDPOINT_COUNT.
        (
            &self.endpoints[pair.first() as usize],
            &self.endpoints[pair.second() as usize],
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}
