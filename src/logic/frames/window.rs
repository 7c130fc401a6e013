//! Similarity window
//!
//! Bounded lookback buffer over the most recently retained frames. A
//! candidate is redundant when any frame still in the window scores at or
//! above the similarity threshold against it; comparisons run newest
//! first, matching the reverse-chronological scan of the source material.

use std::collections::VecDeque;

use image::GrayImage;

use super::similarity::ssim;

/// Ring of recently retained frame thumbnails.
///
/// Invariant: no two frames simultaneously held here are mutually similar
/// at or above `threshold` - a candidate that matches anything in the
/// window is rejected before it can be pushed.
pub struct SimilarityWindow {
    depth: usize,
    threshold: f32,
    retained: VecDeque<(u64, GrayImage)>,
}

impl SimilarityWindow {
    pub fn new(depth: usize, threshold: f32) -> Self {
        Self {
            depth: depth.max(1),
            threshold,
            retained: VecDeque::with_capacity(depth.max(1)),
        }
    }

    /// Index of the first retained frame the candidate duplicates, newest
    /// first; `None` when the candidate is distinct within the window.
    pub fn matches(&self, candidate: &GrayImage) -> Option<u64> {
        for (index, thumb) in self.retained.iter().rev() {
            if ssim(thumb, candidate) >= self.threshold {
                return Some(*index);
            }
        }
        None
    }

    /// Record a retained frame, evicting the oldest beyond the depth.
    pub fn push(&mut self, index: u64, thumb: GrayImage) {
        self.retained.push_back((index, thumb));
        while self.retained.len() > self.depth {
            self.retained.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }
}
