// tests

use crate::config::{BatchConfig, TileConfig};
use crate::curve::{PathCurve, SwirlBuilder};
use crate::endpoint::EndpointTable;
use crate::errors::{ErrorKind, TileError};
use crate::extrude::Prism;
use crate::float_types::{Real, PI};
use crate::matching::{
    double_factorial, enumerate, enumerate_pairings, verify, Matching, Pair, MATCHING_COUNT,
};
use crate::merge::{find_crossing, merge, validate_region, MergedRegion};
use crate::mesh::TileSolid;
use crate::outline::{dot, offset, ChannelOutline, OutlineKind};
use crate::pipeline::{sample_indices, TilePipeline};
use crate::triangulate::{Delaunay, Earcut, TriangulationEngine, Triangulator};
use approx::{assert_abs_diff_eq, assert_relative_eq};
use geo::{Area, Coord, LineString, MultiPolygon, Polygon, Rect};
use hashbrown::HashSet;
use nalgebra::Point2;
use nalgebra::Point3;

// --------------------------------------------------------
//   Helpers
// --------------------------------------------------------

fn pair(a: u8, b: u8) -> Pair {
    Pair::new(a, b).unwrap()
}

fn rect(x0: Real, y0: Real, x1: Real, y1: Real) -> Polygon<Real> {
    Rect::new(Coord { x: x0, y: y0 }, Coord { x: x1, y: y1 }).to_polygon()
}

fn all_pairs() -> Vec<Pair> {
    let mut out = Vec::new();
    for a in 0..8u8 {
        for b in (a + 1)..8u8 {
            out.push(pair(a, b));
        }
    }
    out
}

fn as_outline(region: MergedRegion) -> ChannelOutline {
    ChannelOutline {
        kind: OutlineKind::Dot(0),
        shape: region.into_inner(),
    }
}

fn dot_at(x: Real, y: Real, radius: Real) -> ChannelOutline {
    let table = EndpointTable::new(100.0).unwrap();
    let mut endpoint = *table.get(0).unwrap();
    endpoint.position = Point2::new(x, y);
    dot(&endpoint, radius, 32).unwrap()
}

fn default_pipeline() -> TilePipeline {
    TilePipeline::new(TileConfig::default()).unwrap()
}

// --------------------------------------------------------
//   Matchings
// --------------------------------------------------------

#[test]
fn test_enumerate_count_and_order() {
    let matchings = enumerate();
    assert_eq!(matchings.len(), MATCHING_COUNT);
    assert_eq!(matchings[0].to_string(), "[(0, 1), (2, 3), (4, 5), (6, 7)]");
    assert_eq!(matchings[104].to_string(), "[(0, 7), (1, 6), (2, 5), (3, 4)]");
    verify(&matchings).unwrap();
}

#[test]
fn test_enumerate_covers_every_label() {
    for m in enumerate() {
        for label in 0..8u8 {
            let partner = m.partner(label).unwrap();
            assert_ne!(partner, label);
            assert_eq!(m.partner(partner), Some(label));
        }
    }
}

#[test]
fn test_enumerate_distinct_and_deterministic() {
    let first = enumerate();
    let second = enumerate();
    assert_eq!(first, second);
    let unique: HashSet<Matching> = first.iter().copied().collect();
    assert_eq!(unique.len(), MATCHING_COUNT);
}

#[test]
fn test_pairing_counts_follow_double_factorial() {
    for n in 0..=5usize {
        let labels: Vec<u8> = (0..(2 * n) as u8).collect();
        let expected = double_factorial(2 * n as i64 - 1) as usize;
        assert_eq!(enumerate_pairings(&labels).len(), expected, "n = {n}");
    }
    assert_eq!(double_factorial(7), 105);
    assert!(enumerate_pairings(&[0, 1, 2]).is_empty());
}

#[test]
fn test_verify_rejects_truncated_and_duplicated_lists() {
    let mut matchings = enumerate();
    matchings.pop();
    let err = verify(&matchings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CombinatoricsInvariant);
    assert!(err.is_fatal());

    let mut matchings = enumerate();
    matchings[104] = matchings[0];
    let err = verify(&matchings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CombinatoricsInvariant);
}

#[test]
fn test_pair_and_matching_construction() {
    assert!(Pair::new(3, 3).is_err());
    assert!(Pair::new(2, 8).is_err());
    let p = pair(5, 2);
    assert_eq!((p.first(), p.second()), (2, 5));
    assert!(pair(0, 7).is_adjacent());
    assert!(!pair(0, 2).is_adjacent());

    let m = Matching::from_pairs(&[pair(7, 6), pair(1, 0), pair(3, 2), pair(5, 4)]).unwrap();
    assert_eq!(m, enumerate()[0]);
    assert!(Matching::from_pairs(&[pair(0, 1), pair(0, 2), pair(3, 4), pair(5, 6)]).is_err());
    assert!(Matching::from_pairs(&[pair(0, 1)]).is_err());
}

// --------------------------------------------------------
//   Curves
// --------------------------------------------------------

#[test]
fn test_swirl_curves_meet_endpoints_and_stay_inside() {
    let config = TileConfig::default();
    let table = EndpointTable::new(config.tile_size).unwrap();
    let builder = SwirlBuilder::from_config(&config);

    for p in all_pairs() {
        let curve = builder.build(p, &table, config.path_radius).unwrap();
        let (e0, e1) = table.pair(p);
        assert_eq!(curve.points.len(), config.curve_samples);
        assert_abs_diff_eq!(curve.start().unwrap(), e0.position, epsilon = 1e-9);
        assert_abs_diff_eq!(curve.end().unwrap(), e1.position, epsilon = 1e-9);
        assert!(curve.length() > 2.0 * config.path_radius);

        for q in &curve.points {
            assert!(q.x >= -1e-9 && q.x <= config.tile_size + 1e-9, "{p}: {q}");
            assert!(q.y >= -1e-9 && q.y <= config.tile_size + 1e-9, "{p}: {q}");
        }

        let n = curve.points.len();
        let leave = (curve.points[1] - curve.points[0]).normalize();
        let arrive = (curve.points[n - 2] - curve.points[n - 1]).normalize();
        assert!(leave.dot(&e0.normal) > 0.95, "{p} leaves at {leave}");
        assert!(arrive.dot(&e1.normal) > 0.95, "{p} arrives at {arrive}");
    }
}

#[test]
fn test_short_curve_is_degenerate() {
    let config = TileConfig::default();
    let table = EndpointTable::new(config.tile_size).unwrap();
    let builder = SwirlBuilder::from_config(&config);
    let err = builder.build(pair(1, 2), &table, 100.0).unwrap_err();
    assert!(matches!(err, TileError::DegenerateCurve { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_endpoint_lookup_rejects_unknown_labels() {
    let table = EndpointTable::new(100.0).unwrap();
    assert_eq!(table.get(3).unwrap().label, 3);
    assert_eq!(table.get(7).unwrap().position, Point2::new(0.0, 75.0));
    assert!(table.get(8).is_none());
    assert!(table.get(u8::MAX).is_none());
}

// --------------------------------------------------------
//   Outlines
// --------------------------------------------------------

#[test]
fn test_capsule_area() {
    let (r, len) = (2.0, 50.0);
    let points = (0..=10)
        .map(|i| Point2::new(10.0 + len * i as Real / 10.0, 50.0))
        .collect();
    let curve = PathCurve::from_points(pair(0, 1), points);
    let outline = offset(&curve, r, 64).unwrap();
    assert_eq!(outline.shape.0.len(), 1);
    assert_relative_eq!(outline.area(), 2.0 * r * len + PI * r * r, max_relative = 5e-3);
}

#[test]
fn test_dot_area() {
    let outline = dot_at(30.0, 30.0, 6.0);
    assert_eq!(outline.kind, OutlineKind::Dot(0));
    assert_relative_eq!(outline.area(), PI * 36.0, max_relative = 1e-2);
}

#[test]
fn test_tight_swirl_outline_is_simple() {
    let config = TileConfig::default();
    let table = EndpointTable::new(config.tile_size).unwrap();
    let builder = SwirlBuilder {
        samples: 128,
        tension: 1.0,
        twist: 2.0,
    };
    for p in [pair(0, 4), pair(2, 6), pair(1, 5), pair(0, 1)] {
        let curve = builder.build(p, &table, config.path_radius).unwrap();
        let outline = offset(&curve, config.path_radius, config.arc_segments).unwrap();
        assert!(find_crossing(&outline.shape).is_none(), "{p}");
        assert!(outline.area() > 0.0);
    }
}

#[test]
fn test_offset_rejects_bad_radius() {
    let curve = PathCurve::from_points(pair(0, 1), vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
    let err = offset(&curve, 0.0, 32).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeometryMerge);
}

// --------------------------------------------------------
//   Merging
// --------------------------------------------------------

#[test]
fn test_merge_is_idempotent() {
    let a = dot_at(40.0, 50.0, 6.0);
    let once = merge(&[a.clone()], 1e-5).unwrap();
    let twice = merge(&[a.clone(), a], 1e-5).unwrap();
    assert!(once.symmetric_difference_area(&twice) < 1e-6);
}

#[test]
fn test_merge_is_commutative_and_associative() {
    let a = dot_at(40.0, 50.0, 6.0);
    let b = dot_at(48.0, 50.0, 6.0);
    let c = dot_at(44.0, 56.0, 6.0);

    let ab = merge(&[a.clone(), b.clone()], 1e-5).unwrap();
    let ba = merge(&[b.clone(), a.clone()], 1e-5).unwrap();
    assert!(ab.symmetric_difference_area(&ba) < 1e-6);

    let left = merge(&[as_outline(ab), c.clone()], 1e-5).unwrap();
    let bc = merge(&[b, c], 1e-5).unwrap();
    let right = merge(&[a, as_outline(bc)], 1e-5).unwrap();
    assert!(left.symmetric_difference_area(&right) < 1e-6);
    assert_eq!(left.len(), 1);
}

#[test]
fn test_disjoint_outlines_stay_separate() {
    let a = dot_at(20.0, 20.0, 3.0);
    let b = dot_at(70.0, 70.0, 3.0);
    let region = merge(&[a.clone(), b.clone()], 1e-5).unwrap();
    assert_eq!(region.len(), 2);
    assert_relative_eq!(region.area(), a.area() + b.area(), max_relative = 1e-6);
}

#[test]
fn test_closed_loop_encloses_hole() {
    let points = vec![
        Point2::new(20.0, 20.0),
        Point2::new(80.0, 20.0),
        Point2::new(80.0, 80.0),
        Point2::new(20.0, 80.0),
        Point2::new(20.0, 20.0),
    ];
    let curve = PathCurve::from_points(pair(0, 1), points);
    let outline = offset(&curve, 2.0, 32).unwrap();
    let region = merge(&[outline], 1e-5).unwrap();
    assert_eq!(region.len(), 1);
    assert_eq!(region.hole_count(), 1);
}

#[test]
fn test_merge_rejects_nothing() {
    let err = merge(&[], 1e-5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GeometryMerge);
}

#[test]
fn test_validate_region_finds_problems() {
    let overlapping = MultiPolygon::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(5.0, 5.0, 15.0, 15.0)]);
    assert!(validate_region(&overlapping).is_err());

    let nested = MultiPolygon::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 4.0, 4.0)]);
    assert!(validate_region(&nested).is_err());

    let bowtie = Polygon::new(
        LineString::from(vec![(0.0, 0.0), (10.0, 10.0), (10.0, 0.0), (0.0, 10.0)]),
        vec![],
    );
    assert!(find_crossing(&MultiPolygon::new(vec![bowtie])).is_some());

    let touching = MultiPolygon::new(vec![rect(0.0, 0.0, 10.0, 10.0), rect(10.0, 10.0, 20.0, 20.0)]);
    assert!(validate_region(&touching).is_ok());
    assert!(MergedRegion::from_polygons(touching).is_ok());
}

#[test]
fn test_every_matching_merges_cleanly() {
    let pipeline = default_pipeline();
    for (index, m) in pipeline.matchings().iter().enumerate() {
        let region = pipeline.region(m).unwrap();
        assert!(find_crossing(region.polygons()).is_none(), "tile #{index}");
        assert!(region.area() > 0.0);
    }
}

// --------------------------------------------------------
//   Triangulation
// --------------------------------------------------------

fn square_with_hole() -> Polygon<Real> {
    let outer = rect(0.0, 0.0, 10.0, 10.0);
    let hole = rect(3.0, 3.0, 6.0, 6.0);
    Polygon::new(outer.exterior().clone(), vec![hole.exterior().clone()])
}

#[test]
fn test_engines_cover_polygon_with_hole() {
    let poly = square_with_hole();
    for engine in [&Earcut as &dyn Triangulator, &Delaunay] {
        let tris = engine.triangulate(&poly).unwrap();
        let covered: Real = tris
            .iter()
            .map(|[a, b, c]| 0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs())
            .sum();
        assert_relative_eq!(covered, 91.0, max_relative = 1e-9);
    }
}

struct HalfCut;

impl Triangulator for HalfCut {
    fn name(&self) -> &'static str {
        "half"
    }

    fn raw_triangles(&self, _: &Polygon<Real>) -> Result<Vec<[Coord<Real>; 3]>, String> {
        Ok(vec![[
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 10.0, y: 0.0 },
            Coord { x: 10.0, y: 10.0 },
        ]])
    }
}

#[test]
fn test_lost_area_is_a_triangulation_error() {
    let err = HalfCut.triangulate(&rect(0.0, 0.0, 10.0, 10.0)).unwrap_err();
    assert!(matches!(err, TileError::Triangulation { engine: "half", .. }));
}

#[test]
fn test_engine_names() {
    assert_eq!("earcut".parse::<TriangulationEngine>().unwrap(), TriangulationEngine::Earcut);
    assert_eq!("triangle".parse::<TriangulationEngine>().unwrap(), TriangulationEngine::Delaunay);
    assert!("voronoi".parse::<TriangulationEngine>().is_err());
    assert_eq!(TriangulationEngine::Delaunay.to_string(), "delaunay");
    assert_eq!(TriangulationEngine::Earcut.alternate(), TriangulationEngine::Delaunay);

    let parsed: TriangulationEngine = serde_json::from_str("\"triangle\"").unwrap();
    assert_eq!(parsed, TriangulationEngine::Delaunay);
    assert_eq!(serde_json::to_string(&TriangulationEngine::Earcut).unwrap(), "\"earcut\"");
}

// --------------------------------------------------------
//   Mesh
// --------------------------------------------------------

#[test]
fn test_weld_merges_close_vertices() {
    let soup = [
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        [
            Point3::new(1.0 + 1e-7, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0 - 1e-7, 0.0),
        ],
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e-7, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
    ];
    let mesh = TileSolid::from_soup(&soup, 1e-5);
    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.triangles.len(), 2);
}

#[test]
fn test_t_junction_repair_closes_mesh() {
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(1.0, 1.0, 0.0);
    let d = Point3::new(0.0, 1.0, 0.0);
    let m = Point3::new(0.5, 0.0, 0.0);
    // a flat two-sided sheet; only the front has a vertex at m
    let soup = [[a, m, d], [m, b, d], [b, c, d], [a, c, b], [a, d, c]];
    let mut mesh = TileSolid::from_soup(&soup, 1e-9);
    assert!(!mesh.is_manifold());
    assert_eq!(mesh.open_edge_count(), 3);

    assert_eq!(mesh.repair_t_junctions(1e-9), 1);
    mesh.check_manifold().unwrap();
    assert_eq!(mesh.triangles.len(), 6);
}

#[test]
fn test_t_junction_repair_skips_the_opposite_corner() {
    // c sits within the repair tolerance of edge a..b
    let a = Point3::new(0.0, 0.0, 0.0);
    let b = Point3::new(1.0, 0.0, 0.0);
    let c = Point3::new(0.5, 1e-7, 0.0);
    let mut mesh = TileSolid::from_soup(&[[a, b, c]], 1e-9);
    assert_eq!(mesh.repair_t_junctions(4e-5), 0);
    assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
}

#[test]
fn test_unit_cube_measures() {
    let cube = Prism::slab(1.0, 1.0).to_solid(&Earcut, 1e-9).unwrap();
    cube.check_manifold().unwrap();
    assert_relative_eq!(cube.volume(), 1.0, max_relative = 1e-12);
    assert_relative_eq!(cube.surface_area(), 6.0, max_relative = 1e-12);
    let (lo, hi) = cube.bounding_box().unwrap();
    assert_eq!(lo, Point3::new(0.0, 0.0, 0.0));
    assert_eq!(hi, Point3::new(1.0, 1.0, 1.0));

    let mut open = cube.clone();
    open.triangles.pop();
    assert!(open.check_manifold().is_err());
    assert!(TileSolid::default().bounding_box().is_none());
}

// --------------------------------------------------------
//   Extrusion
// --------------------------------------------------------

#[test]
fn test_slab_volume() {
    let slab = Prism::slab(100.0, 5.0);
    let solid = slab.to_solid(&Earcut, 1e-5).unwrap();
    assert!(solid.is_manifold());
    assert_relative_eq!(solid.volume(), 100.0 * 100.0 * 5.0, max_relative = 1e-9);
}

#[test]
fn test_channel_prism_volume() {
    let region = merge(&[dot_at(30.0, 40.0, 6.0), dot_at(36.0, 40.0, 6.0)], 1e-5).unwrap();
    let prism = Prism::extrude(region.polygons(), 2.0, 3.0);
    let solid = prism.to_solid(&Earcut, 1e-5).unwrap();
    assert!(solid.is_manifold());
    assert_relative_eq!(solid.volume(), region.area() * 3.0, max_relative = 1e-6);
    assert_relative_eq!(prism.volume(), region.area() * 3.0, max_relative = 1e-12);
}

#[test]
fn test_subtract_inner_pocket() {
    let slab = Prism::slab(100.0, 5.0);
    let tool = Prism::extrude(&MultiPolygon::new(vec![rect(40.0, 40.0, 60.0, 60.0)]), 2.0, 3.0);
    let solid = slab.subtract(&tool, &Earcut, 1e-5).unwrap();
    solid.check_manifold().unwrap();
    assert_relative_eq!(solid.volume(), 50_000.0 - 400.0 * 3.0, max_relative = 1e-9);
}

#[test]
fn test_subtract_notch_through_side() {
    let slab = Prism::slab(100.0, 5.0);
    let tool = Prism::extrude(&MultiPolygon::new(vec![rect(40.0, 90.0, 60.0, 110.0)]), 2.0, 4.0);
    for engine in [&Earcut as &dyn Triangulator, &Delaunay] {
        let solid = slab.subtract(&tool, engine, 1e-5).unwrap();
        solid.check_manifold().unwrap();
        assert_relative_eq!(solid.volume(), 50_000.0 - 200.0 * 3.0, max_relative = 1e-9);
    }
}

#[test]
fn test_subtract_snaps_tool_onto_slab_edge() {
    let slab = Prism::slab(100.0, 5.0);
    let shy = 100.0 - 1e-7;
    let tool = Prism::extrude(&MultiPolygon::new(vec![rect(40.0, 90.0, 60.0, shy)]), 2.0, 3.0);
    for engine in [&Earcut as &dyn Triangulator, &Delaunay] {
        let solid = slab.subtract(&tool, engine, 1e-5).unwrap();
        solid.check_manifold().unwrap();
        assert_relative_eq!(solid.volume(), 50_000.0 - 200.0 * 3.0, max_relative = 1e-9);
        let (_, hi) = solid.bounding_box().unwrap();
        assert_eq!(hi.y, 100.0);
    }
}

#[test]
fn test_subtract_rejects_tool_below_top() {
    let slab = Prism::slab(100.0, 5.0);
    let tool = Prism::extrude(&MultiPolygon::new(vec![rect(40.0, 40.0, 60.0, 60.0)]), 1.0, 2.0);
    assert!(slab.subtract(&tool, &Earcut, 1e-5).is_err());
}

fn assert_every_tile_closed(pipeline: &TilePipeline) {
    let config = pipeline.config().clone();
    let full = config.tile_size * config.tile_size * config.tile_thickness;
    let slab = MultiPolygon::new(vec![rect(0.0, 0.0, config.tile_size, config.tile_size)]);

    for index in 0..MATCHING_COUNT {
        let m = pipeline.matchings()[index];
        let solid = pipeline.build_tile(index).unwrap();
        solid.check_manifold().unwrap();
        let volume = solid.volume();
        assert!(volume > 0.0 && volume < full, "tile #{index}: volume {volume}");

        let region = pipeline.region(&m).unwrap();
        let carved = geo::BooleanOps::intersection(region.polygons(), &slab).unsigned_area();
        assert_relative_eq!(
            volume,
            full - carved * config.channel_depth,
            max_relative = 1e-4
        );
    }
}

#[test]
fn test_every_matching_builds_a_closed_solid() {
    assert_every_tile_closed(&default_pipeline());
}

#[test]
fn test_small_dots_leave_tube_caps_on_the_edge() {
    let defaults = TileConfig::default();
    let config = TileConfig {
        dot_radius: Some(defaults.path_radius),
        ..defaults
    };
    assert_every_tile_closed(&TilePipeline::new(config).unwrap());
}

#[test]
fn test_delaunay_engine_builds_a_closed_solid() {
    let config = TileConfig {
        engine: TriangulationEngine::Delaunay,
        fallback_engine: None,
        ..TileConfig::default()
    };
    let pipeline = TilePipeline::new(config).unwrap();
    let solid = pipeline.build_tile(0).unwrap();
    assert!(solid.is_manifold());
}

#[test]
fn test_failed_triangulation_retries_with_fallback() {
    let pipeline = default_pipeline();
    let m = pipeline.matchings()[17];
    let solid = pipeline.build_with(&m, &HalfCut, Some(&Earcut)).unwrap();
    solid.check_manifold().unwrap();
    assert_eq!(solid, pipeline.build_with(&m, &Earcut, None).unwrap());

    let err = pipeline.build_with(&m, &HalfCut, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Triangulation);
    assert!(!err.is_fatal());

    let err = pipeline.build_with(&m, &HalfCut, Some(&HalfCut)).unwrap_err();
    assert!(matches!(err, TileError::Triangulation { engine: "half", .. }));
}

// --------------------------------------------------------
//   Configuration
// --------------------------------------------------------

#[test]
fn test_config_defaults_and_json() {
    let config = BatchConfig::from_json_str(r#"{ "seed": 5, "tile": { "engine": "triangle" } }"#).unwrap();
    assert_eq!(config.seed, 5);
    assert_eq!(config.sample_count, Some(36));
    assert_eq!(config.tile.engine, TriangulationEngine::Delaunay);
    assert_eq!(config.tile.tile_size, 100.0);
    assert_eq!(config.tile.dot_radius(), 6.0);
    assert_eq!(config.tile.retry_engine(), None);
    assert_eq!(TileConfig::default().retry_engine(), Some(TriangulationEngine::Delaunay));

    let err = BatchConfig::from_json_str("{ not json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Json);

    let err = BatchConfig::from_json_str(r#"{ "tile": { "channel_depth": 10.0 } }"#).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_invalid_config_is_rejected() {
    let bad = [
        TileConfig { tile_size: -1.0, ..TileConfig::default() },
        TileConfig { curve_samples: 1, ..TileConfig::default() },
        TileConfig { arc_segments: 4, ..TileConfig::default() },
        TileConfig { path_radius: 20.0, ..TileConfig::default() },
        TileConfig { tolerance: 0.0, ..TileConfig::default() },
    ];
    for config in bad {
        let err = TilePipeline::new(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }
}

// --------------------------------------------------------
//   Batches
// --------------------------------------------------------

#[test]
fn test_sampling_is_reproducible() {
    let a = sample_indices(MATCHING_COUNT, Some(36), 7).unwrap();
    let b = sample_indices(MATCHING_COUNT, Some(36), 7).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 36);
    let unique: HashSet<usize> = a.iter().copied().collect();
    assert_eq!(unique.len(), 36);
    assert!(a.iter().all(|&i| i < MATCHING_COUNT));
    assert_ne!(a, sample_indices(MATCHING_COUNT, Some(36), 8).unwrap());
}

#[test]
fn test_sampling_everything() {
    let all: Vec<usize> = (0..MATCHING_COUNT).collect();
    assert_eq!(sample_indices(MATCHING_COUNT, Some(MATCHING_COUNT), 3).unwrap(), all);
    assert_eq!(sample_indices(MATCHING_COUNT, None, 3).unwrap(), all);
    let err = sample_indices(MATCHING_COUNT, Some(MATCHING_COUNT + 1), 3).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn test_failing_tiles_do_not_stop_the_batch() {
    let pipeline = default_pipeline();
    let mut ordinals = Vec::new();
    let summary = pipeline.run(&[0, 999, 1, 2], |tile| {
        ordinals.push(tile.ordinal);
        if tile.index == 2 {
            return Err(TileError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    });

    assert_eq!(summary.succeeded, vec![0, 1]);
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.failed[0].index, 999);
    assert_eq!(summary.failed[0].error.kind(), ErrorKind::InvalidConfig);
    assert_eq!(summary.failed[1].error.kind(), ErrorKind::Io);
    assert_eq!(ordinals, vec![1, 3, 4]);
    assert!(summary.to_string().ends_with("2 of 4 tiles built, 2 failed"));
}

#[test]
fn test_ascii_stl_is_well_formed() {
    let solid = Prism::slab(10.0, 2.0).to_solid(&Earcut, 1e-5).unwrap();
    let stl = solid.to_stl_ascii("tile");
    assert!(stl.starts_with("solid tile\n"));
    assert!(stl.ends_with("endsolid tile\n"));
    assert_eq!(stl.matches("facet normal").count(), solid.triangles.len());
    assert_eq!(stl.matches("vertex ").count(), 3 * solid.triangles.len());
}

#[cfg(feature = "stl-io")]
#[test]
fn test_binary_stl_is_well_formed() {
    let solid = default_pipeline().build_tile(3).unwrap();
    let bytes = solid.to_stl_binary().unwrap();
    assert_eq!(bytes.len(), 84 + 50 * solid.triangles.len());
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]);
    assert_eq!(count as usize, solid.triangles.len());
}
