//! Frame sampler
//!
//! Walks decoded frames in order, keeps every Nth candidate and drops the
//! ones that duplicate a recently retained frame. The stride is derived
//! from the measured frame rate so the candidate density is roughly
//! constant in wall-clock time regardless of fps.

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::constants;
use crate::logic::error::ModerationError;
use crate::logic::media::{extract, MediaInfo, RequestWorkspace};

use super::similarity::similarity_thumb;
use super::window::SimilarityWindow;

/// A retained frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Index in the original decode order.
    pub index: u64,
    /// Position derived from the measured frame rate.
    pub timestamp_secs: f64,
    pub image: RgbImage,
}

/// Result of sampling one video.
#[derive(Debug, Default)]
pub struct SampledVideo {
    pub frames: Vec<Frame>,
    pub fps: f64,
    pub total_frames: u64,
}

/// Sampler knobs. Defaults honor the `FRAME_SIMILARITY_THRESH` and
/// `SKIP_N_FRAMES` environment overrides.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub skip_fraction: f64,
    pub similarity_threshold: f32,
    pub window_depth: usize,
    /// When set, retained frames are also written here as zero-padded PNGs.
    pub dump_dir: Option<PathBuf>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            skip_fraction: constants::skip_fraction(),
            similarity_threshold: constants::frame_similarity_thresh(),
            window_depth: constants::DEFAULT_SIMILARITY_WINDOW_DEPTH,
            dump_dir: None,
        }
    }
}

/// Candidate stride for a given frame rate: `round(skip_fraction * fps)`,
/// never below 1.
pub fn stride_for_fps(skip_fraction: f64, fps: f64) -> u64 {
    let stride = (skip_fraction * fps).round() as i64;
    stride.max(1) as u64
}

pub struct FrameSampler {
    config: SamplerConfig,
}

impl FrameSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sample a video file whose container metadata was already probed.
    ///
    /// A zero-length video (no frame rate or no frames) is a valid,
    /// empty result - not an error. A decode failure partway through
    /// returns the frames retained so far together with the measured
    /// frame rate.
    pub fn sample_video(
        &self,
        path: &Path,
        info: &MediaInfo,
        workspace: &RequestWorkspace,
    ) -> Result<SampledVideo, ModerationError> {
        if info.fps <= 0.0 || info.total_frames == 0 {
            log::warn!("video {} has no decodable frames", path.display());
            return Ok(SampledVideo {
                frames: Vec::new(),
                fps: info.fps,
                total_frames: info.total_frames,
            });
        }

        let stride = stride_for_fps(self.config.skip_fraction, info.fps);
        log::debug!(
            "sampling {} at stride {} (fps {:.2}, {} frames)",
            path.display(),
            stride,
            info.fps,
            info.total_frames
        );

        let candidates = extract::extract_candidate_frames(path, stride, &workspace.frames_dir())?;
        let sampled = self.sample_candidates(&candidates, stride, info.fps, info.total_frames);

        log::info!(
            "{} interesting frames retained from {} of length {}",
            sampled.frames.len(),
            path.display(),
            info.total_frames
        );

        Ok(sampled)
    }

    /// Walk extracted candidate files in decode order, applying the
    /// similarity window. A file that fails to read stops the walk;
    /// whatever was retained before it is kept.
    pub fn sample_candidates(
        &self,
        candidates: &[PathBuf],
        stride: u64,
        fps: f64,
        total_frames: u64,
    ) -> SampledVideo {
        let mut window =
            SimilarityWindow::new(self.config.window_depth, self.config.similarity_threshold);
        let mut retained = Vec::new();

        for (position, candidate_path) in candidates.iter().enumerate() {
            let image = match image::open(candidate_path) {
                Ok(img) => img.to_rgb8(),
                Err(e) => {
                    // Stop early on a read failure, keep what we have.
                    log::warn!("frame read failed at {}: {}", candidate_path.display(), e);
                    break;
                }
            };
            let index = position as u64 * stride;
            self.consider(&mut window, &mut retained, index, fps, image);
        }

        SampledVideo {
            frames: retained,
            fps,
            total_frames,
        }
    }

    /// Sample an in-memory frame sequence, applying both the stride and
    /// the similarity window. Used for already-decoded sources.
    pub fn sample_frames(&self, frames: Vec<RgbImage>, fps: f64) -> SampledVideo {
        let total_frames = frames.len() as u64;
        let stride = stride_for_fps(self.config.skip_fraction, fps);

        let mut window =
            SimilarityWindow::new(self.config.window_depth, self.config.similarity_threshold);
        let mut retained = Vec::new();

        for (i, image) in frames.into_iter().enumerate() {
            if i as u64 % stride != 0 {
                continue;
            }
            self.consider(&mut window, &mut retained, i as u64, fps, image);
        }

        SampledVideo {
            frames: retained,
            fps,
            total_frames,
        }
    }

    fn consider(
        &self,
        window: &mut SimilarityWindow,
        retained: &mut Vec<Frame>,
        index: u64,
        fps: f64,
        image: RgbImage,
    ) {
        let thumb = similarity_thumb(&image);
        if let Some(earlier) = window.matches(&thumb) {
            log::debug!("frame {} is similar to {}", index, earlier);
            return;
        }

        log::debug!("frame {} added to interesting frames", index);
        if let Some(dir) = &self.config.dump_dir {
            self.dump_frame(dir, index, &image);
        }
        window.push(index, thumb);
        retained.push(Frame {
            index,
            timestamp_secs: if fps > 0.0 { index as f64 / fps } else { 0.0 },
            image,
        });
    }

    fn dump_frame(&self, dir: &Path, index: u64, image: &RgbImage) {
        if let Err(e) = std::fs::create_dir_all(dir) {
            log::warn!("cannot create dump dir {}: {}", dir.display(), e);
            return;
        }
        let path = dir.join(format!("{:010}.png", index));
        if let Err(e) = image.save(&path) {
            log::warn!("failed to dump frame {}: {}", path.display(), e);
        }
    }
}
