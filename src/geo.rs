//! Route geometry: midpoint densification and forward-azimuth bearings.
//!
//! Both are deliberately simple. Midpoints are arithmetic means of the raw
//! coordinates (a planar approximation; fine over the short inter-point
//! distances of a recorded track, not geodesically exact), and neighbor
//! bearings are averaged with a plain arithmetic mean rather than a circular
//! one, which is only wrong near the 0/360 seam for sharp heading changes.

use crate::track::TrackPoint;

/// Inserts the midpoint between every adjacent pair, once per iteration,
/// preserving the original points in order. `iterations` passes over N >= 2
/// points yield `(N-1) * 2^iterations + 1` points. Sequences with fewer than
/// two points come back unchanged.
pub fn densify(points: &[TrackPoint], iterations: u32) -> Vec<TrackPoint> {
    let mut current = points.to_vec();
    for _ in 0..iterations {
        if current.len() < 2 {
            break;
        }
        let mut denser = Vec::with_capacity(current.len() * 2 - 1);
        for pair in current.windows(2) {
            denser.push(pair[0]);
            denser.push(midpoint(pair[0], pair[1]));
        }
        denser.push(current[current.len() - 1]);
        current = denser;
    }
    current
}

fn midpoint(a: TrackPoint, b: TrackPoint) -> TrackPoint {
    TrackPoint::new((a.lat + b.lat) / 2.0, (a.lon + b.lon) / 2.0)
}

/// Initial compass bearing from `from` to `to` in degrees, `[0, 360)`.
///
/// Standard forward-azimuth formula with inputs converted to radians.
/// Degenerate for coincident points (returns 0.0); definedness at route ends
/// is handled by [`request_bearing`].
pub fn bearing(from: TrackPoint, to: TrackPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let dlon = (to.lon - from.lon).to_radians();

    let x = lat2.cos() * dlon.sin();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Heading for the panorama request at `here`: the mean of the incoming and
/// outgoing bearings, whichever of the two is defined, or `None` at a
/// single-point route's only point (no neighbors at all).
pub fn request_bearing(
    prev: Option<TrackPoint>,
    here: TrackPoint,
    next: Option<TrackPoint>,
) -> Option<f64> {
    let incoming = prev.map(|p| bearing(p, here));
    let outgoing = next.map(|n| bearing(here, n));
    match (incoming, outgoing) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
