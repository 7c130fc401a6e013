//! Container metadata via ffprobe

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use crate::logic::error::ModerationError;

/// Metadata the pipeline needs before touching any frame.
#[derive(Debug, Clone, Default)]
pub struct MediaInfo {
    pub fps: f64,
    pub total_frames: u64,
    pub duration_secs: f64,
    pub has_audio: bool,
}

/// Seam over ffprobe so orchestration can be tested without media files.
pub trait MediaProber: Send + Sync {
    fn probe(&self, path: &Path) -> Result<MediaInfo, ModerationError>;
}

/// ffprobe-backed prober.
pub struct FfprobeProber;

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> Result<MediaInfo, ModerationError> {
        let input = path
            .to_str()
            .ok_or_else(|| ModerationError::decode("non-UTF8 media path"))?;

        let output = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-show_entries",
                "stream=codec_type,avg_frame_rate,nb_frames",
                "-show_entries",
                "format=duration",
                "-of",
                "json",
                input,
            ])
            .output()
            .map_err(|e| ModerationError::decode(format!("failed to spawn ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ModerationError::decode(format!(
                "ffprobe failed for {}: {}",
                input,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        parse_probe_output(&text)
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse the JSON ffprobe emits into `MediaInfo`.
pub fn parse_probe_output(json: &str) -> Result<MediaInfo, ModerationError> {
    let data: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ModerationError::decode(format!("failed to parse ffprobe output: {}", e)))?;

    let duration_secs = data
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let video = data
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let fps = video
        .and_then(|s| s.avg_frame_rate.as_deref())
        .map(parse_frame_rate)
        .unwrap_or(0.0);

    // nb_frames is container-dependent; estimate from duration when absent.
    let total_frames = video
        .and_then(|s| s.nb_frames.as_deref())
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_else(|| (fps * duration_secs).round() as u64);

    let has_audio = data
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    Ok(MediaInfo {
        fps,
        total_frames,
        duration_secs,
        has_audio,
    })
}

/// Parse an ffprobe "num/den" frame rate.
fn parse_frame_rate(rate: &str) -> f64 {
    let parts: Vec<&str> = rate.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(0.0);
        if den > 0.0 {
            return num / den;
        }
    }
    rate.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_fraction() {
        assert_eq!(parse_frame_rate("30000/1001").round(), 30.0);
        assert_eq!(parse_frame_rate("25/1"), 25.0);
        assert_eq!(parse_frame_rate("0/0"), 0.0);
        assert_eq!(parse_frame_rate("garbage"), 0.0);
    }

    #[test]
    fn test_parse_probe_output_full() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "avg_frame_rate": "24/1", "nb_frames": "240"},
                {"codec_type": "audio", "avg_frame_rate": "0/0"}
            ],
            "format": {"duration": "10.000000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.fps, 24.0);
        assert_eq!(info.total_frames, 240);
        assert_eq!(info.duration_secs, 10.0);
        assert!(info.has_audio);
    }

    #[test]
    fn test_parse_probe_output_estimates_frames() {
        // Some containers omit nb_frames.
        let json = r#"{
            "streams": [{"codec_type": "video", "avg_frame_rate": "30/1"}],
            "format": {"duration": "4.5"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.total_frames, 135);
        assert!(!info.has_audio);
    }

    #[test]
    fn test_parse_probe_output_rejects_garbage() {
        assert!(parse_probe_output("not json").is_err());
    }
}
