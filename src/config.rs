use std::{path::PathBuf, time::Duration};

use crate::error::{DrivelapseError, DrivelapseResult};

/// Everything the pipeline needs to know up front, passed in by the caller
/// rather than read from globals.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Provider endpoint root; `/metadata` is appended for metadata lookups.
    pub base_url: String,
    pub api_key: String,
    /// Transient frame artifact directory, wiped and recreated each run.
    pub frames_dir: PathBuf,
    /// Midpoint-densification passes. Each pass doubles the sample count.
    pub densify_iterations: u32,
    /// Hard cap on points processed after densification.
    pub max_points: usize,
    pub fps: u32,
    pub image_width: u32,
    pub image_height: u32,
    /// Camera field of view in degrees.
    pub fov: u32,
    /// Camera pitch in degrees (0 = level).
    pub pitch: i32,
    /// Panorama search radius in meters.
    pub radius: u32,
    /// Per-request timeout; a timed-out request skips the point, not the run.
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/streetview".to_string(),
            api_key: String::new(),
            frames_dir: PathBuf::from("_frames"),
            densify_iterations: 1,
            max_points: 2500,
            fps: 30,
            image_width: 1920,
            image_height: 1080,
            fov: 80,
            pitch: 0,
            radius: 10,
            timeout: Duration::from_secs(15),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> DrivelapseResult<()> {
        if self.base_url.is_empty() {
            return Err(DrivelapseError::validation("base_url must be non-empty"));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(DrivelapseError::validation(
                "image width/height must be non-zero",
            ));
        }
        if !self.image_width.is_multiple_of(2) || !self.image_height.is_multiple_of(2) {
            // We target yuv420p output for maximum compatibility.
            return Err(DrivelapseError::validation(
                "image width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps == 0 {
            return Err(DrivelapseError::validation("fps must be non-zero"));
        }
        if self.max_points == 0 {
            return Err(DrivelapseError::validation("max_points must be non-zero"));
        }
        if self.densify_iterations > 16 {
            // Each pass doubles the point count; anything past this is a typo.
            return Err(DrivelapseError::validation(
                "densify_iterations is implausibly large",
            ));
        }
        Ok(())
    }
}
