//! End-to-end driver: track file -> densified route -> frame artifacts ->
//! encoded MP4.

use std::path::Path;

use anyhow::Context as _;
use tracing::{info, warn};

use crate::{
    assemble::{self, VideoSink},
    config::PipelineConfig,
    encode_ffmpeg::{FfmpegEncoder, default_mp4_config},
    error::DrivelapseResult,
    fetch::{self, FetchOutcome, FetchSummary},
    geo,
    provider::ImageryProvider,
    track::{self, TrackPoint},
};

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub raw_points: usize,
    pub fetch: FetchSummary,
}

/// Densifies and caps the route, wipes and recreates the frames directory,
/// then runs the sequential fetch pass.
#[tracing::instrument(skip(raw_points, provider, cfg))]
pub fn prepare_and_fetch(
    raw_points: &[TrackPoint],
    provider: &dyn ImageryProvider,
    cfg: &PipelineConfig,
) -> DrivelapseResult<FetchOutcome> {
    let mut points = geo::densify(raw_points, cfg.densify_iterations);
    info!(
        raw = raw_points.len(),
        densified = points.len(),
        "densified route"
    );

    if points.len() > cfg.max_points {
        // Hard cap: truncate and keep going, never refuse the whole track.
        warn!(
            points = points.len(),
            cap = cfg.max_points,
            "route exceeds the point cap; processing only the first points"
        );
        points.truncate(cfg.max_points);
    }

    if cfg.frames_dir.exists() {
        std::fs::remove_dir_all(&cfg.frames_dir).with_context(|| {
            format!("remove stale frames dir '{}'", cfg.frames_dir.display())
        })?;
    }
    std::fs::create_dir_all(&cfg.frames_dir)
        .with_context(|| format!("create frames dir '{}'", cfg.frames_dir.display()))?;

    fetch::fetch_frames(&points, provider, cfg, &cfg.frames_dir)
}

/// Runs the whole pipeline. The output video file exists iff this returns
/// `Ok`; every per-point problem is absorbed earlier and only shows up in the
/// summary counts.
pub fn run(
    track_path: &Path,
    out_path: &Path,
    provider: &dyn ImageryProvider,
    cfg: &PipelineConfig,
) -> DrivelapseResult<RunSummary> {
    cfg.validate()?;

    // Parse first: a malformed track must fail before any network or
    // filesystem side effect.
    let raw_points = track::read_track_points(track_path)?;
    info!(points = raw_points.len(), track = %track_path.display(), "parsed track");

    let outcome = prepare_and_fetch(&raw_points, provider, cfg)?;

    let mut encoder = FfmpegEncoder::new(default_mp4_config(out_path, cfg.fps))?;
    let assembled = assemble::assemble(&cfg.frames_dir, &mut encoder)?;
    encoder.finish()?;

    info!(
        points = outcome.summary.points_processed,
        frames = assembled,
        duplicates = outcome.summary.duplicates_skipped,
        failures = outcome.summary.failures,
        out = %out_path.display(),
        "run complete"
    );

    Ok(RunSummary {
        raw_points: raw_points.len(),
        fetch: outcome.summary,
    })
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::PathBuf};

    use super::*;
    use crate::provider::{PanoStatus, PanoramaMetadata, PanoramaQuery};

    /// Counts metadata calls; reports no coverage anywhere.
    struct CountingProvider {
        metadata_calls: RefCell<usize>,
    }

    impl ImageryProvider for CountingProvider {
        fn fetch_metadata(&self, _q: &PanoramaQuery) -> DrivelapseResult<PanoramaMetadata> {
            *self.metadata_calls.borrow_mut() += 1;
            Ok(PanoramaMetadata {
                status: PanoStatus::ZeroResults,
                pano_id: None,
            })
        }
        fn fetch_image(&self, _q: &PanoramaQuery) -> DrivelapseResult<Vec<u8>> {
            unreachable!("no point reports coverage")
        }
    }

    #[test]
    fn cap_truncates_instead_of_failing() {
        let raw: Vec<TrackPoint> = (0..3000)
            .map(|i| TrackPoint::new(50.0 + i as f64 * 1e-5, 8.0))
            .collect();

        let mut cfg = PipelineConfig::default();
        cfg.densify_iterations = 0;
        cfg.max_points = 2500;
        cfg.frames_dir = PathBuf::from("target").join("pipeline_tests").join("cap");

        let provider = CountingProvider {
            metadata_calls: RefCell::new(0),
        };
        let outcome = prepare_and_fetch(&raw, &provider, &cfg).unwrap();

        assert_eq!(*provider.metadata_calls.borrow(), 2500);
        assert_eq!(outcome.summary.points_processed, 2500);
        assert!(outcome.frames.is_empty());
    }

    #[test]
    fn frames_dir_is_wiped_between_runs() {
        let mut cfg = PipelineConfig::default();
        cfg.densify_iterations = 0;
        cfg.frames_dir = PathBuf::from("target").join("pipeline_tests").join("wipe");

        std::fs::create_dir_all(&cfg.frames_dir).unwrap();
        let stale = cfg.frames_dir.join("00099.jpg");
        std::fs::write(&stale, "stale").unwrap();

        let provider = CountingProvider {
            metadata_calls: RefCell::new(0),
        };
        let raw = vec![TrackPoint::new(50.0, 8.0)];
        prepare_and_fetch(&raw, &provider, &cfg).unwrap();

        assert!(!stale.exists());
        assert!(cfg.frames_dir.is_dir());
    }
}
