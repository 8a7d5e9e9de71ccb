//! The sequential dedup/fetch loop at the heart of the pipeline.
//!
//! Consecutive track points frequently resolve to the same source panorama
//! (recorded points sit closer together than the provider's panorama
//! density); without the dedup step the output video would be runs of
//! identical frames. The loop is a fold carrying `{ last_pano_id,
//! sequence_index }`, which is why processing is strictly sequential: point
//! i's decision depends on point i-1's outcome.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::{
    config::PipelineConfig,
    error::DrivelapseResult,
    geo,
    provider::{ImageryProvider, PanoramaQuery},
    track::TrackPoint,
};

/// One successfully written frame artifact. Indices are contiguous ascending
/// from 1 with no gaps, regardless of how many points were skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRecord {
    pub sequence_index: u32,
    pub path: PathBuf,
}

/// End-of-run accounting, surfaced in the summary log line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub points_processed: usize,
    pub frames_written: usize,
    pub duplicates_skipped: usize,
    pub failures: usize,
}

/// What one fetch pass produced: the ordered frame records plus the counts.
#[derive(Clone, Debug, Default)]
pub struct FetchOutcome {
    pub frames: Vec<FrameRecord>,
    pub summary: FetchSummary,
}

pub fn frame_path(frames_dir: &Path, sequence_index: u32) -> PathBuf {
    // Zero-padded so the index survives any listing order; the assembler
    // still sorts numerically rather than trusting the filesystem.
    frames_dir.join(format!("{sequence_index:05}.jpg"))
}

/// Walks the (densified, capped) route in order and writes one JPEG artifact
/// per non-duplicate panorama.
///
/// Per-point failures (transport errors, non-OK statuses, undecodable
/// payloads) are logged and skipped, never fatal and never retried; only
/// local filesystem trouble aborts the run.
pub fn fetch_frames(
    points: &[TrackPoint],
    provider: &dyn ImageryProvider,
    cfg: &PipelineConfig,
    frames_dir: &Path,
) -> DrivelapseResult<FetchOutcome> {
    let mut last_pano_id: Option<String> = None;
    let mut sequence_index: u32 = 1;
    let mut frames = Vec::new();
    let mut summary = FetchSummary::default();

    for (i, point) in points.iter().copied().enumerate() {
        summary.points_processed += 1;

        let prev = i.checked_sub(1).map(|j| points[j]);
        let next = points.get(i + 1).copied();
        let heading = geo::request_bearing(prev, point, next);
        let query = PanoramaQuery::for_point(cfg, point, heading);

        debug!(point = i, lat = point.lat, lon = point.lon, ?heading, "querying panorama");

        let metadata = match provider.fetch_metadata(&query) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(point = i, error = %e, "metadata fetch failed, skipping point");
                summary.failures += 1;
                continue;
            }
        };

        if !metadata.status.is_ok() {
            warn!(point = i, status = ?metadata.status, "no usable panorama, skipping point");
            summary.failures += 1;
            continue;
        }

        let Some(pano_id) = metadata.pano_id else {
            warn!(point = i, "OK status without a panorama id, skipping point");
            summary.failures += 1;
            continue;
        };

        if last_pano_id.as_deref() == Some(pano_id.as_str()) {
            debug!(point = i, pano_id = %pano_id, "same panorama as previous frame, skipping");
            summary.duplicates_skipped += 1;
            continue;
        }
        last_pano_id = Some(pano_id);

        let bytes = match provider.fetch_image(&query) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(point = i, error = %e, "image fetch failed, skipping point");
                summary.failures += 1;
                continue;
            }
        };

        if image::guess_format(&bytes).is_err() {
            // Providers can answer 200 with an error document.
            warn!(point = i, len = bytes.len(), "payload is not an image, skipping point");
            summary.failures += 1;
            continue;
        }

        let path = frame_path(frames_dir, sequence_index);
        std::fs::write(&path, &bytes)
            .with_context(|| format!("write frame '{}'", path.display()))?;

        frames.push(FrameRecord {
            sequence_index,
            path,
        });
        sequence_index += 1;
        summary.frames_written += 1;
    }

    debug!(
        points = summary.points_processed,
        frames = summary.frames_written,
        duplicates = summary.duplicates_skipped,
        failures = summary.failures,
        "fetch pass complete"
    );
    Ok(FetchOutcome { frames, summary })
}
