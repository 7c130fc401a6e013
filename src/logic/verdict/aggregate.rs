//! Visual aggregation
//!
//! Reduces per-frame category scores into one visual verdict. A frame
//! qualifies as unsafe when its "unsafe" probability exceeds the frame
//! threshold; the video is unsafe when the qualifying ratio exceeds the
//! ratio threshold.

use std::collections::BTreeMap;

use crate::constants;
use crate::logic::model::FrameScores;

use super::types::{SafetyLabel, VisualVerdict};

/// Threshold reduction policy.
#[derive(Debug, Clone)]
pub struct VisualAggregator {
    pub unsafe_category: String,
    pub frame_threshold: f32,
    pub ratio_threshold: f32,
}

impl Default for VisualAggregator {
    fn default() -> Self {
        Self {
            unsafe_category: "unsafe".to_string(),
            frame_threshold: constants::UNSAFE_FRAME_PROB_THRESHOLD,
            ratio_threshold: constants::UNSAFE_RATIO_THRESHOLD,
        }
    }
}

impl VisualAggregator {
    /// Reduce per-frame scores to one verdict.
    ///
    /// The denominator is the number of frames actually classified. Zero
    /// classified frames is a no-signal condition and deliberately
    /// resolves to Safe with ratio 0.0 rather than dividing by zero.
    pub fn aggregate<K: Ord>(&self, scores: &BTreeMap<K, FrameScores>) -> VisualVerdict {
        let sampled_frame_count = scores.len();
        if sampled_frame_count == 0 {
            log::warn!("no frames classified - defaulting visual verdict to Safe");
            return VisualVerdict {
                label: SafetyLabel::Safe,
                unsafe_ratio: 0.0,
                sampled_frame_count: 0,
            };
        }

        let qualifying = scores
            .values()
            .filter(|s| {
                s.probability(&self.unsafe_category)
                    .is_some_and(|p| p > self.frame_threshold)
            })
            .count();

        let unsafe_ratio = qualifying as f32 / sampled_frame_count as f32;
        let label = if unsafe_ratio > self.ratio_threshold {
            SafetyLabel::Unsafe
        } else {
            SafetyLabel::Safe
        };

        log::debug!(
            "visual verdict: {} ({}/{} qualifying frames, ratio {:.3})",
            label,
            qualifying,
            sampled_frame_count,
            unsafe_ratio
        );

        VisualVerdict {
            label,
            unsafe_ratio,
            sampled_frame_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::model::CategoryScore;

    fn scores_with_unsafe(prob: f32) -> FrameScores {
        let mut ranked = vec![
            CategoryScore {
                label: "unsafe".to_string(),
                probability: prob,
            },
            CategoryScore {
                label: "safe".to_string(),
                probability: 1.0 - prob,
            },
        ];
        ranked.sort_by(|a, b| a.probability.partial_cmp(&b.probability).unwrap());
        FrameScores { ranked }
    }

    fn frame_map(probs: &[f32]) -> BTreeMap<u64, FrameScores> {
        probs
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as u64, scores_with_unsafe(p)))
            .collect()
    }

    #[test]
    fn test_two_of_ten_unsafe_frames_flip_the_verdict() {
        // 2/10 frames at 0.7 -> ratio 0.2 > 0.1 -> Unsafe.
        let mut probs = vec![0.1; 8];
        probs.extend([0.7, 0.7]);
        let verdict = VisualAggregator::default().aggregate(&frame_map(&probs));

        assert_eq!(verdict.label, SafetyLabel::Unsafe);
        assert!((verdict.unsafe_ratio - 0.2).abs() < 1e-6);
        assert_eq!(verdict.sampled_frame_count, 10);
    }

    #[test]
    fn test_all_frames_below_threshold_is_safe() {
        let verdict = VisualAggregator::default().aggregate(&frame_map(&[0.4, 0.3, 0.2, 0.1, 0.45]));
        assert_eq!(verdict.label, SafetyLabel::Safe);
        assert_eq!(verdict.unsafe_ratio, 0.0);
        assert_eq!(verdict.sampled_frame_count, 5);
    }

    #[test]
    fn test_ratio_monotonic_in_qualifying_count() {
        let n = 10;
        let mut previous = -1.0f32;
        for unsafe_count in 0..=n {
            let mut probs = vec![0.2; n - unsafe_count];
            probs.extend(vec![0.9; unsafe_count]);
            let verdict = VisualAggregator::default().aggregate(&frame_map(&probs));
            assert!(verdict.unsafe_ratio > previous);
            previous = verdict.unsafe_ratio;
        }
    }

    #[test]
    fn test_zero_frames_defaults_to_safe() {
        let verdict = VisualAggregator::default().aggregate(&BTreeMap::<u64, FrameScores>::new());
        assert_eq!(verdict.label, SafetyLabel::Safe);
        assert_eq!(verdict.unsafe_ratio, 0.0);
        assert_eq!(verdict.sampled_frame_count, 0);
    }

    #[test]
    fn test_exactly_threshold_probability_does_not_qualify() {
        // Strict comparison: 0.5 is not "> 0.5".
        let verdict = VisualAggregator::default().aggregate(&frame_map(&[0.5, 0.5]));
        assert_eq!(verdict.label, SafetyLabel::Safe);
    }
}
