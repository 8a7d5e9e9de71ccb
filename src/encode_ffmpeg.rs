use std::{
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    assemble::VideoSink,
    error::{DrivelapseError, DrivelapseResult},
};

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub fps: u32,
    pub out_path: PathBuf,
    pub overwrite: bool,
}

impl EncodeConfig {
    pub fn validate(&self) -> DrivelapseResult<()> {
        if self.fps == 0 {
            return Err(DrivelapseError::validation("encode fps must be non-zero"));
        }
        if self.out_path.as_os_str().is_empty() {
            return Err(DrivelapseError::validation("encode out_path must be set"));
        }
        Ok(())
    }
}

pub fn default_mp4_config(out_path: impl Into<PathBuf>, fps: u32) -> EncodeConfig {
    EncodeConfig {
        fps,
        out_path: out_path.into(),
        overwrite: true,
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> DrivelapseResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Feeds JPEG frames to a system `ffmpeg` process over stdin and produces one
/// H.264 yuv420p MP4.
///
/// We intentionally use the system `ffmpeg` binary rather than `ffmpeg-next`
/// to avoid native FFmpeg dev header/lib requirements. The output file exists
/// iff the whole encode succeeded: a failed or abandoned encode removes it.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> DrivelapseResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !cfg.overwrite && cfg.out_path.exists() {
            return Err(DrivelapseError::validation(format!(
                "output file '{}' already exists",
                cfg.out_path.display()
            )));
        }

        if !is_ffmpeg_on_path() {
            return Err(DrivelapseError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if cfg.overwrite {
            cmd.arg("-y");
        } else {
            cmd.arg("-n");
        }

        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "image2pipe",
            "-r",
            &cfg.fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&cfg.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            DrivelapseError::encode(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DrivelapseError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child: Some(child),
            stdin: Some(stdin),
        })
    }

    fn remove_partial_output(&self) {
        let _ = std::fs::remove_file(&self.cfg.out_path);
    }
}

impl VideoSink for FfmpegEncoder {
    fn write_frame(&mut self, bytes: &[u8]) -> DrivelapseResult<()> {
        let Some(stdin) = self.stdin.as_mut() else {
            return Err(DrivelapseError::encode(
                "ffmpeg encoder is already finalized",
            ));
        };

        use std::io::Write as _;
        stdin.write_all(bytes).map_err(|e| {
            DrivelapseError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        Ok(())
    }

    fn finish(&mut self) -> DrivelapseResult<()> {
        // Closing stdin tells ffmpeg the stream is complete.
        drop(self.stdin.take());

        let Some(child) = self.child.take() else {
            return Err(DrivelapseError::encode(
                "ffmpeg encoder is already finalized",
            ));
        };

        let output = child.wait_with_output().map_err(|e| {
            DrivelapseError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !output.status.success() {
            self.remove_partial_output();
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DrivelapseError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Abandoned mid-run (an earlier pipeline stage failed): kill the
        // encoder and make sure no half-written video survives.
        if let Some(mut child) = self.child.take() {
            drop(self.stdin.take());
            let _ = child.kill();
            let _ = child.wait();
            self.remove_partial_output();
        }
    }
}
