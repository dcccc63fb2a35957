// Our Real scalar type. geo's boolean and triangulation backends run in f64,
// so the whole pipeline does too.
pub type Real = f64;

/// A small epsilon for exact-ish geometric comparisons.
pub const EPSILON: Real = 1e-10;

// Pi
pub const PI: Real = core::f64::consts::PI;

// Frac Pi 2
pub const FRAC_PI_2: Real = core::f64::consts::FRAC_PI_2;

// Tau
pub const TAU: Real = core::f64::consts::TAU;

/// Relative slack allowed between a polygon's area and the summed area of its triangulation.
pub const AREA_RELATIVE_TOLERANCE: Real = 1e-6;

/// Rings and polygons smaller than `tolerance² * SLIVER_AREA_FACTOR` are treated as slivers.
pub const SLIVER_AREA_FACTOR: Real = 100.0;

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Unit conversion
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
pub const MM: Real = 1.0;
