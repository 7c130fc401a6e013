//! Structural similarity scoring
//!
//! Near-duplicate detection compares downsized grayscale copies of two
//! frames with SSIM (uniform 7x7 window, standard K1/K2 constants on an
//! 8-bit dynamic range). Scores are in [-1, 1]; identical images score 1.

use image::{imageops::FilterType, GrayImage, RgbImage};

use crate::constants::SIMILARITY_THUMB_SIZE;

const WINDOW: u32 = 7;
const C1: f64 = 6.5025; // (0.01 * 255)^2
const C2: f64 = 58.5225; // (0.03 * 255)^2

/// Downsized grayscale copy used for similarity comparisons.
pub fn similarity_thumb(image: &RgbImage) -> GrayImage {
    let resized = image::imageops::resize(
        image,
        SIMILARITY_THUMB_SIZE,
        SIMILARITY_THUMB_SIZE,
        FilterType::Triangle,
    );
    image::imageops::grayscale(&resized)
}

/// Mean SSIM over all fully-contained 7x7 windows.
///
/// Images of mismatched dimensions never count as similar.
pub fn ssim(a: &GrayImage, b: &GrayImage) -> f32 {
    let (w, h) = a.dimensions();
    if (w, h) != b.dimensions() {
        return 0.0;
    }
    if w < WINDOW || h < WINDOW {
        return global_ssim(a, b);
    }

    let n = (WINDOW * WINDOW) as f64;
    let mut total = 0.0f64;
    let mut windows = 0u32;

    for y0 in 0..=(h - WINDOW) {
        for x0 in 0..=(w - WINDOW) {
            let mut sum_a = 0.0f64;
            let mut sum_b = 0.0f64;
            let mut sum_aa = 0.0f64;
            let mut sum_bb = 0.0f64;
            let mut sum_ab = 0.0f64;

            for y in y0..y0 + WINDOW {
                for x in x0..x0 + WINDOW {
                    let pa = a.get_pixel(x, y).0[0] as f64;
                    let pb = b.get_pixel(x, y).0[0] as f64;
                    sum_a += pa;
                    sum_b += pb;
                    sum_aa += pa * pa;
                    sum_bb += pb * pb;
                    sum_ab += pa * pb;
                }
            }

            let mu_a = sum_a / n;
            let mu_b = sum_b / n;
            let var_a = sum_aa / n - mu_a * mu_a;
            let var_b = sum_bb / n - mu_b * mu_b;
            let cov = sum_ab / n - mu_a * mu_b;

            let num = (2.0 * mu_a * mu_b + C1) * (2.0 * cov + C2);
            let den = (mu_a * mu_a + mu_b * mu_b + C1) * (var_a + var_b + C2);
            total += num / den;
            windows += 1;
        }
    }

    (total / windows as f64) as f32
}

/// Whole-image SSIM for inputs smaller than the sliding window.
fn global_ssim(a: &GrayImage, b: &GrayImage) -> f32 {
    let n = (a.width() * a.height()) as f64;
    let mut sum_a = 0.0f64;
    let mut sum_b = 0.0f64;
    let mut sum_aa = 0.0f64;
    let mut sum_bb = 0.0f64;
    let mut sum_ab = 0.0f64;

    for (pa, pb) in a.pixels().zip(b.pixels()) {
        let va = pa.0[0] as f64;
        let vb = pb.0[0] as f64;
        sum_a += va;
        sum_b += vb;
        sum_aa += va * va;
        sum_bb += vb * vb;
        sum_ab += va * vb;
    }

    let mu_a = sum_a / n;
    let mu_b = sum_b / n;
    let var_a = sum_aa / n - mu_a * mu_a;
    let var_b = sum_bb / n - mu_b * mu_b;
    let cov = sum_ab / n - mu_a * mu_b;

    let num = (2.0 * mu_a * mu_b + C1) * (2.0 * cov + C2);
    let den = (mu_a * mu_a + mu_b * mu_b + C1) * (var_a + var_b + C2);
    (num / den) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    /// Deterministic pseudo-random gray image (LCG). Independent seeds
    /// produce structurally unrelated noise.
    pub fn noise_gray(seed: u64, size: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        GrayImage::from_fn(size, size, |_, _| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            Luma([(state >> 33) as u8])
        })
    }

    #[test]
    fn test_identical_images_score_one() {
        let img = noise_gray(7, 64);
        let score = ssim(&img, &img);
        assert!((score - 1.0).abs() < 1e-4, "score = {}", score);
    }

    #[test]
    fn test_independent_noise_scores_low() {
        let a = noise_gray(1, 64);
        let b = noise_gray(2, 64);
        let score = ssim(&a, &b);
        assert!(score < 0.1, "score = {}", score);
    }

    #[test]
    fn test_mismatched_dimensions_never_similar() {
        let a = noise_gray(1, 64);
        let b = noise_gray(1, 32);
        assert_eq!(ssim(&a, &b), 0.0);
    }

    #[test]
    fn test_small_images_use_global_path() {
        let a = noise_gray(3, 4);
        let score = ssim(&a, &a);
        assert!((score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_thumb_dimensions() {
        let img = RgbImage::new(640, 480);
        let thumb = similarity_thumb(&img);
        assert_eq!(thumb.dimensions(), (64, 64));
    }
}
