//! Output-file guarantees of the ffmpeg encoder: the MP4 exists after a
//! successful encode and never after a failed or abandoned one.
//!
//! All tests skip themselves when ffmpeg is not on PATH.

use std::path::PathBuf;

use drivelapse::{
    VideoSink,
    encode_ffmpeg::{FfmpegEncoder, default_mp4_config, is_ffmpeg_on_path},
};

fn scratch_path(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("encode_mp4");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

fn jpeg_frame() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([30, 120, 200]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut buf),
            image::ImageFormat::Jpeg,
        )
        .unwrap();
    buf
}

#[test]
fn successful_encode_leaves_output_file() {
    if !is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }

    let out = scratch_path("ok.mp4");
    let mut encoder = FfmpegEncoder::new(default_mp4_config(&out, 30)).unwrap();
    let frame = jpeg_frame();
    for _ in 0..4 {
        encoder.write_frame(&frame).unwrap();
    }
    encoder.finish().unwrap();

    assert!(out.exists());
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}

#[test]
fn failed_encode_removes_output_file() {
    if !is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }

    let out = scratch_path("garbage.mp4");
    let mut encoder = FfmpegEncoder::new(default_mp4_config(&out, 30)).unwrap();
    // Not a decodable image stream; ffmpeg exits non-zero at finalization.
    // The write itself may already fail if ffmpeg dies early, which is fine.
    let _ = encoder.write_frame(b"this is not an image stream");
    let err = encoder.finish().unwrap_err();

    assert!(err.to_string().contains("encode error"));
    assert!(!out.exists());
}

#[test]
fn abandoned_encode_removes_output_file() {
    if !is_ffmpeg_on_path() {
        eprintln!("ffmpeg not on PATH, skipping");
        return;
    }

    let out = scratch_path("abandoned.mp4");
    let mut encoder = FfmpegEncoder::new(default_mp4_config(&out, 30)).unwrap();
    let _ = encoder.write_frame(&jpeg_frame());
    // Dropping without finish() is what happens when an earlier pipeline
    // stage errors out mid-stream.
    drop(encoder);

    assert!(!out.exists());
}
