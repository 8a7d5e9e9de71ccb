use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::error::{DrivelapseError, DrivelapseResult};

/// A single recorded position, degrees. Sequence order is the direction of
/// travel; reversing the sequence reverses every bearing derived from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
}

impl TrackPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Reads the first track of a GPX file as one ordered point sequence
/// (segments concatenated in file order).
///
/// Any parse problem is fatal here, before the pipeline touches the network
/// or the frames directory.
pub fn read_track_points(path: &Path) -> DrivelapseResult<Vec<TrackPoint>> {
    let f = File::open(path).with_context(|| format!("open track '{}'", path.display()))?;
    let doc = gpx::read(BufReader::new(f))
        .map_err(|e| DrivelapseError::track(format!("parse gpx '{}': {e}", path.display())))?;

    let track = doc
        .tracks
        .first()
        .ok_or_else(|| DrivelapseError::track(format!("'{}' contains no tracks", path.display())))?;

    let mut points = Vec::new();
    for segment in &track.segments {
        for waypoint in &segment.points {
            let p = waypoint.point();
            points.push(TrackPoint::new(p.y(), p.x()));
        }
    }

    if points.is_empty() {
        return Err(DrivelapseError::track(format!(
            "'{}' track has no points",
            path.display()
        )));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    const MINIMAL_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>loop</name>
    <trkseg>
      <trkpt lat="52.5170" lon="13.3888"></trkpt>
      <trkpt lat="52.5171" lon="13.3890"></trkpt>
      <trkpt lat="52.5173" lon="13.3893"></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("target").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_points_in_order() {
        let path = scratch_dir("track_read").join("ok.gpx");
        std::fs::write(&path, MINIMAL_GPX).unwrap();

        let points = read_track_points(&path).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], TrackPoint::new(52.5170, 13.3888));
        assert_eq!(points[2], TrackPoint::new(52.5173, 13.3893));
    }

    #[test]
    fn malformed_gpx_is_fatal() {
        let path = scratch_dir("track_read").join("bad.gpx");
        std::fs::write(&path, "<gpx").unwrap();
        assert!(read_track_points(&path).is_err());
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(read_track_points(Path::new("target/track_read/nope.gpx")).is_err());
    }
}
