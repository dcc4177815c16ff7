//! # Geometry
//!
//! Spherical-earth helpers used by the geofence check and the path player.
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_km`] | Haversine great-circle distance |
//! | [`bearing_degrees`] | Initial compass bearing, `[0, 360)` |
//! | [`segment_lengths_km`] | Length of each consecutive segment of a path |
//! | [`path_length_km`] | Total length of a path |
//! | [`locate_along`] | Segment index and in-segment fraction for a distance |
//! | [`point_at_fraction`] | Point at a fraction of a path's total length |
//!
//! Interpolation inside a segment is linear in latitude/longitude. Sampled
//! points are at most a few kilometres apart, where the difference from a
//! true great-circle interpolation is far below GPS noise.

use serde::{Deserialize, Serialize};

/// Mean earth radius used by every distance computation.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside `[-90, 90] x [-180, 180]`.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    fn lerp(&self, other: &Coordinate, t: f64) -> Coordinate {
        Coordinate::new(
            self.latitude + (other.latitude - self.latitude) * t,
            self.longitude + (other.longitude - self.longitude) * t,
        )
    }
}

/// Bounding box of a set of coordinates, handed to `MapSurface::fit_bounds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// `None` for an empty slice.
    pub fn from_points(points: &[Coordinate]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_lng: first.longitude,
            max_lng: first.longitude,
        };
        for point in &points[1..] {
            bounds.min_lat = bounds.min_lat.min(point.latitude);
            bounds.max_lat = bounds.max_lat.max(point.latitude);
            bounds.min_lng = bounds.min_lng.min(point.longitude);
            bounds.max_lng = bounds.max_lng.max(point.longitude);
        }
        Some(bounds)
    }
}

/// Great-circle distance in kilometres using the haversine formula.
///
/// Symmetric, and exactly `0.0` for identical coordinates.
///
/// ```
/// use fieldtrack::geometry::{distance_km, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0);
/// let b = Coordinate::new(1.0, 0.0);
/// assert!((distance_km(&a, &b) - 111.19).abs() < 0.1);
/// ```
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial bearing from `a` towards `b`, clockwise from true north, in `[0, 360)`.
pub fn bearing_degrees(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let y = d_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lng.cos();
    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);

    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Distance of each consecutive pair in `path`. Empty for fewer than two points.
pub fn segment_lengths_km(path: &[Coordinate]) -> Vec<f64> {
    path.windows(2)
        .map(|w| distance_km(&w[0], &w[1]))
        .collect()
}

/// Sum of the segment lengths of `path`.
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    segment_lengths_km(path).iter().sum()
}

/// Where a target distance falls on a path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPosition {
    /// Index of the segment start; the segment ends at `segment + 1`.
    pub segment: usize,
    /// How far through that segment the target lies, `[0, 1]`.
    pub fraction: f64,
    pub coordinate: Coordinate,
}

/// Walk the cumulative segment lengths and return the first segment whose
/// cumulative sum reaches `target_km`, with the point linearly interpolated
/// inside it.
///
/// `segments` must be `segment_lengths_km(path)`. Targets past the end land
/// on the last point. Returns `None` when `path` has fewer than two points.
pub fn locate_along(path: &[Coordinate], segments: &[f64], target_km: f64) -> Option<PathPosition> {
    if path.len() < 2 || segments.len() != path.len() - 1 {
        return None;
    }

    let mut accumulated = 0.0;
    for (index, length) in segments.iter().enumerate() {
        if accumulated + length >= target_km {
            let fraction = if *length > 0.0 {
                ((target_km - accumulated) / length).clamp(0.0, 1.0)
            } else {
                0.0
            };
            return Some(PathPosition {
                segment: index,
                fraction,
                coordinate: path[index].lerp(&path[index + 1], fraction),
            });
        }
        accumulated += length;
    }

    let last = segments.len() - 1;
    Some(PathPosition {
        segment: last,
        fraction: 1.0,
        coordinate: path[last + 1],
    })
}

/// The point at `fraction * path_length_km(path)` along `path`.
///
/// A single-point path yields that point for any fraction, `fraction <= 0`
/// yields the first point and `fraction >= 1` the last. Empty paths yield
/// `None`.
pub fn point_at_fraction(path: &[Coordinate], fraction: f64) -> Option<Coordinate> {
    let first = *path.first()?;
    let last = *path.last()?;

    if path.len() == 1 || fraction <= 0.0 {
        return Some(first);
    }
    if fraction >= 1.0 {
        return Some(last);
    }

    let segments = segment_lengths_km(path);
    let total: f64 = segments.iter().sum();
    locate_along(path, &segments, fraction * total).map(|pos| pos.coordinate)
}
