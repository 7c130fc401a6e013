//! Frame and audio extraction via ffmpeg

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::logic::error::ModerationError;

/// Build the select filter expression for an every-Nth-frame stride.
fn select_filter(stride: u64) -> String {
    format!("select=not(mod(n\\,{}))", stride)
}

/// Extract every `stride`-th frame of `video` into `out_dir` as PNGs.
///
/// Returns the extracted frame paths in decode order. A mid-stream decode
/// failure is not fatal: whatever ffmpeg managed to write before stopping
/// is returned, so a truncated video still yields its leading frames. A
/// fully unreadable video yields an empty list.
pub fn extract_candidate_frames(
    video: &Path,
    stride: u64,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ModerationError> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| ModerationError::decode(format!("failed to create frame dir: {}", e)))?;

    let input = video
        .to_str()
        .ok_or_else(|| ModerationError::decode("non-UTF8 media path"))?;
    let pattern = out_dir.join("frame_%06d.png");

    let output = Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-i",
            input,
            "-vf",
            &select_filter(stride.max(1)),
            "-vsync",
            "vfr",
            "-f",
            "image2",
        ])
        .arg(&pattern)
        .output()
        .map_err(|e| ModerationError::decode(format!("failed to spawn ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::warn!(
            "ffmpeg stopped early for {}: {} - using frames extracted so far",
            input,
            stderr.trim()
        );
    }

    let mut frames: Vec<PathBuf> = std::fs::read_dir(out_dir)
        .map_err(|e| ModerationError::decode(format!("failed to read frame dir: {}", e)))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    frames.sort();

    log::debug!("extracted {} candidate frames from {}", frames.len(), input);
    Ok(frames)
}

/// Extract the audio track of `video` as mono 16 kHz PCM WAV.
pub fn extract_audio_track(video: &Path, out_wav: &Path) -> Result<(), ModerationError> {
    let input = video
        .to_str()
        .ok_or_else(|| ModerationError::decode("non-UTF8 media path"))?;

    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-i", input, "-vn"])
        .args(["-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(out_wav)
        .output()
        .map_err(|e| ModerationError::decode(format!("failed to spawn ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ModerationError::decode(format!(
            "audio extraction failed for {}: {}",
            input,
            stderr.trim()
        )));
    }

    log::debug!("extracted audio track to {}", out_wav.display());
    Ok(())
}
