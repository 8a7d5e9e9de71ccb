//! Orders frame artifacts and streams them into the video sink.
//!
//! The sequence index is parsed from each artifact's file name, never taken
//! from directory-listing order or timestamps, and each frame is handed to
//! the sink in full before the next one starts.

use std::path::Path;

use anyhow::Context as _;
use tracing::debug;

use crate::{
    error::{DrivelapseError, DrivelapseResult},
    fetch::FrameRecord,
};

/// Where assembled frames go. Implemented by the ffmpeg encoder and by test
/// collectors.
pub trait VideoSink {
    /// Consumes one complete frame. Must not return before the frame is
    /// fully accepted; interleaving two frames corrupts the encoder input.
    fn write_frame(&mut self, bytes: &[u8]) -> DrivelapseResult<()>;

    /// Finalizes the output. An error here is fatal to the run.
    fn finish(&mut self) -> DrivelapseResult<()>;
}

/// Scans the frames directory and returns records sorted by ascending
/// sequence index, verifying the indices are exactly `1..=n` with no gaps.
pub fn collect_frames(frames_dir: &Path) -> DrivelapseResult<Vec<FrameRecord>> {
    let entries = std::fs::read_dir(frames_dir)
        .with_context(|| format!("list frames dir '{}'", frames_dir.display()))?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", frames_dir.display()))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let sequence_index: u32 = stem.parse().map_err(|_| {
            DrivelapseError::validation(format!(
                "frame artifact '{}' has a non-numeric name",
                path.display()
            ))
        })?;

        frames.push(FrameRecord {
            sequence_index,
            path,
        });
    }

    frames.sort_by_key(|f| f.sequence_index);

    for (i, frame) in frames.iter().enumerate() {
        let expected = (i + 1) as u32;
        if frame.sequence_index != expected {
            return Err(DrivelapseError::validation(format!(
                "frame sequence has a gap: expected index {expected}, found {}",
                frame.sequence_index
            )));
        }
    }

    Ok(frames)
}

/// Streams every frame in the directory into the sink, in sequence order.
/// Returns the number of frames written; does not finalize the sink.
pub fn assemble(frames_dir: &Path, sink: &mut dyn VideoSink) -> DrivelapseResult<usize> {
    let frames = collect_frames(frames_dir)?;
    for frame in &frames {
        let bytes = std::fs::read(&frame.path)
            .with_context(|| format!("read frame '{}'", frame.path.display()))?;
        sink.write_frame(&bytes)?;
        debug!(index = frame.sequence_index, "frame handed to encoder");
    }
    Ok(frames.len())
}
