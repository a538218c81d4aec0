//! Logo locator: multi-scale template matching of an IdP's logo assets
//! against a page screenshot (§4.2 "Pattern/logo locator").
//!
//! No template-matching crate exists anywhere in the retrieval pack, so the
//! sliding-window correlation / sum-of-squared-differences scan is
//! hand-written over `image::GrayImage` buffers.

use image::{GenericImageView, GrayImage};

use authscope_domain::config::{
    clamp_scale_bound, LogoRecognitionConfig, MatchAlgorithm, ScaleMethod, ScaleOrder, ScaleSpace,
};
use authscope_domain::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub struct LogoMatch {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub score: f64,
}

/// Run multi-scale template matching of `template_png` over `screenshot_png`.
/// Returns the best match whose score clears `lower_bound`, or `None`.
pub fn locate(
    screenshot_png: &[u8],
    template_png: &[u8],
    cfg: &LogoRecognitionConfig,
) -> Result<Option<LogoMatch>> {
    let screenshot = image::load_from_memory(screenshot_png)
        .map_err(|e| Error::Browser(format!("decoding screenshot failed: {e}")))?
        .to_luma8();
    let template = image::load_from_memory(template_png)
        .map_err(|e| Error::Browser(format!("decoding logo template failed: {e}")))?
        .to_luma8();

    let scales = scale_steps(cfg);
    let mut best: Option<LogoMatch> = None;

    for scale in scales {
        let (scaled_screenshot, scaled_template) = match cfg.scale_method {
            ScaleMethod::ScaleTemplate => (screenshot.clone(), resize(&template, scale)),
            ScaleMethod::ScaleScreenshot => (resize(&screenshot, scale), template.clone()),
        };
        if scaled_template.width() == 0
            || scaled_template.height() == 0
            || scaled_template.width() > scaled_screenshot.width()
            || scaled_template.height() > scaled_screenshot.height()
        {
            continue;
        }

        if let Some((x, y, score)) =
            best_window(&scaled_screenshot, &scaled_template, cfg.match_algorithm)
        {
            let is_better = best.map(|b| score > b.score).unwrap_or(true);
            if is_better {
                best = Some(LogoMatch {
                    x,
                    y,
                    width: scaled_template.width(),
                    height: scaled_template.height(),
                    scale,
                    score,
                });
            }
            if score >= cfg.max_matching {
                break;
            }
        }
    }

    Ok(best.filter(|m| m.score >= cfg.lower_bound))
}

/// Whether a found match should be treated as a confident hit rather than a
/// borderline one requiring corroboration (between `lower_bound` and
/// `upper_bound`).
pub fn is_confident(m: &LogoMatch, cfg: &LogoRecognitionConfig) -> bool {
    m.score >= cfg.upper_bound
}

fn scale_steps(cfg: &LogoRecognitionConfig) -> Vec<f64> {
    let lower = clamp_scale_bound(cfg.scale_lower_bound);
    let upper = clamp_scale_bound(cfg.scale_upper_bound).max(lower);
    let steps = cfg.match_intensity.max(1) as usize;

    let mut values: Vec<f64> = match cfg.scale_space {
        ScaleSpace::Linspace => linspace(lower, upper, steps),
        ScaleSpace::Geomspace => geomspace(lower, upper, steps),
    };

    if cfg.scale_order == ScaleOrder::Descending {
        values.reverse();
    }
    values
}

fn linspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 {
        return vec![start];
    }
    let step = (end - start) / (steps - 1) as f64;
    (0..steps).map(|i| start + step * i as f64).collect()
}

fn geomspace(start: f64, end: f64, steps: usize) -> Vec<f64> {
    if steps <= 1 || start <= 0.0 {
        return vec![start];
    }
    let log_start = start.ln();
    let log_end = end.ln();
    let step = (log_end - log_start) / (steps - 1) as f64;
    (0..steps).map(|i| (log_start + step * i as f64).exp()).collect()
}

fn resize(img: &GrayImage, scale: f64) -> GrayImage {
    let (w, h) = img.dimensions();
    let new_w = ((w as f64) * scale).round().max(1.0) as u32;
    let new_h = ((h as f64) * scale).round().max(1.0) as u32;
    image::imageops::resize(img, new_w, new_h, image::imageops::FilterType::Triangle)
}

/// Brute-force sliding window scan. Returns `(x, y, normalized_score)` of the
/// best-matching window, where higher is always better regardless of
/// algorithm (SSD is inverted into a similarity score).
fn best_window(haystack: &GrayImage, needle: &GrayImage, algorithm: MatchAlgorithm) -> Option<(u32, u32, f64)> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return None;
    }

    let mut best: Option<(u32, u32, f64)> = None;
    for y in 0..=(hh - nh) {
        for x in 0..=(hw - nw) {
            let score = match algorithm {
                MatchAlgorithm::Correlation => correlation(haystack, needle, x, y),
                MatchAlgorithm::SumOfSquaredDiffs => 1.0 - normalized_ssd(haystack, needle, x, y),
            };
            if best.map(|(_, _, s)| score > s).unwrap_or(true) {
                best = Some((x, y, score));
            }
        }
    }
    best
}

fn correlation(haystack: &GrayImage, needle: &GrayImage, ox: u32, oy: u32) -> f64 {
    let (nw, nh) = needle.dimensions();
    let n = (nw * nh) as f64;
    let (mut sum_h, mut sum_n, mut sum_hn, mut sum_h2, mut sum_n2) = (0f64, 0f64, 0f64, 0f64, 0f64);
    for y in 0..nh {
        for x in 0..nw {
            let h = haystack.get_pixel(ox + x, oy + y).0[0] as f64;
            let t = needle.get_pixel(x, y).0[0] as f64;
            sum_h += h;
            sum_n += t;
            sum_hn += h * t;
            sum_h2 += h * h;
            sum_n2 += t * t;
        }
    }
    let numerator = n * sum_hn - sum_h * sum_n;
    let denominator = ((n * sum_h2 - sum_h * sum_h) * (n * sum_n2 - sum_n * sum_n)).sqrt();
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        (numerator / denominator).clamp(-1.0, 1.0).max(0.0)
    }
}

fn normalized_ssd(haystack: &GrayImage, needle: &GrayImage, ox: u32, oy: u32) -> f64 {
    let (nw, nh) = needle.dimensions();
    let n = (nw * nh) as f64;
    let mut sum = 0f64;
    for y in 0..nh {
        for x in 0..nw {
            let h = haystack.get_pixel(ox + x, oy + y).0[0] as f64;
            let t = needle.get_pixel(x, y).0[0] as f64;
            sum += (h - t).powi(2);
        }
    }
    (sum / n / (255.0 * 255.0)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_spans_endpoints() {
        let values = linspace(0.5, 2.0, 4);
        assert_eq!(values.first().copied(), Some(0.5));
        assert_eq!(values.last().copied(), Some(2.0));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn geomspace_spans_endpoints() {
        let values = geomspace(0.5, 2.0, 4);
        assert!((values.first().unwrap() - 0.5).abs() < 1e-9);
        assert!((values.last().unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn scale_steps_respects_descending_order() {
        let cfg = LogoRecognitionConfig {
            scale_order: ScaleOrder::Descending,
            ..Default::default()
        };
        let steps = scale_steps(&cfg);
        assert!(steps.first().unwrap() >= steps.last().unwrap());
    }
}
