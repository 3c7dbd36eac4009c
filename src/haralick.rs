// src/haralick.rs - Gray-level co-occurrence texture measures over the whole image

use crate::config::HaralickConfig;
use crate::image_utils::GrayPlane;

/// Output labels, in output order
pub const HARALICK_LABELS: [&str; 6] = [
    "Haralick_ASM",
    "Haralick_IDM",
    "Haralick_Contrast",
    "Haralick_Correlation",
    "Haralick_Entropy",
    "Haralick_SumAverage",
];

/// Haralick measures averaged over the 0, 45, 90 and 135 degree directions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HaralickFeatures {
    /// Angular second moment (energy)
    pub asm: f64,
    /// Inverse difference moment (homogeneity)
    pub idm: f64,
    pub contrast: f64,
    pub correlation: f64,
    /// Shannon entropy in bits
    pub entropy: f64,
    pub sum_average: f64,
}

impl HaralickFeatures {
    pub fn undefined() -> Self {
        Self {
            asm: f64::NAN,
            idm: f64::NAN,
            contrast: f64::NAN,
            correlation: f64::NAN,
            entropy: f64::NAN,
            sum_average: f64::NAN,
        }
    }

    pub fn to_array(&self) -> [f64; 6] {
        [self.asm, self.idm, self.contrast, self.correlation, self.entropy, self.sum_average]
    }
}

/// Quantize the gray plane to `levels` evenly spaced gray levels over [0, sample_max]
pub fn quantize(gray: &GrayPlane, levels: usize) -> Vec<usize> {
    let top = (levels - 1) as f64;
    gray.data
        .iter()
        .map(|&v| {
            let q = (v / gray.sample_max * top).round();
            if q.is_finite() { q.clamp(0.0, top) as usize } else { 0 }
        })
        .collect()
}

/// Symmetric, normalized co-occurrence matrix for one pixel offset.
/// Returns None when no pixel pair fits inside the image.
pub fn co_occurrence_matrix(
    quantized: &[usize],
    width: usize,
    height: usize,
    levels: usize,
    offset: (i64, i64),
) -> Option<Vec<f64>> {
    let (dx, dy) = offset;
    let mut glcm = vec![0.0; levels * levels];
    let mut total = 0.0;

    for y in 0..height as i64 {
        let ny = y + dy;
        if ny < 0 || ny >= height as i64 {
            continue;
        }
        for x in 0..width as i64 {
            let nx = x + dx;
            if nx < 0 || nx >= width as i64 {
                continue;
            }
            let a = quantized[y as usize * width + x as usize];
            let b = quantized[ny as usize * width + nx as usize];
            glcm[a * levels + b] += 1.0;
            glcm[b * levels + a] += 1.0;
            total += 2.0;
        }
    }

    if total == 0.0 {
        return None;
    }
    for p in &mut glcm {
        *p /= total;
    }
    Some(glcm)
}

/// Haralick measures of a single normalized co-occurrence matrix
pub fn glcm_features(glcm: &[f64], levels: usize) -> HaralickFeatures {
    let mut asm = 0.0;
    let mut idm = 0.0;
    let mut contrast = 0.0;
    let mut entropy = 0.0;
    let mut joint = 0.0;
    let mut mu_x = 0.0;
    let mut mu_y = 0.0;
    let mut sum_dist = vec![0.0; 2 * levels - 1];

    for i in 0..levels {
        for j in 0..levels {
            let p = glcm[i * levels + j];
            if p == 0.0 {
                continue;
            }
            let diff = i as f64 - j as f64;
            asm += p * p;
            idm += p / (1.0 + diff * diff);
            contrast += diff * diff * p;
            entropy -= p * p.log2();
            joint += (i * j) as f64 * p;
            mu_x += i as f64 * p;
            mu_y += j as f64 * p;
            sum_dist[i + j] += p;
        }
    }

    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..levels {
        for j in 0..levels {
            let p = glcm[i * levels + j];
            if p == 0.0 {
                continue;
            }
            var_x += (i as f64 - mu_x).powi(2) * p;
            var_y += (j as f64 - mu_y).powi(2) * p;
        }
    }

    let sigma = (var_x * var_y).sqrt();
    // A single populated gray level is perfectly correlated with itself
    let correlation = if sigma < 1e-12 { 1.0 } else { (joint - mu_x * mu_y) / sigma };

    let sum_average = sum_dist.iter().enumerate().map(|(k, p)| k as f64 * p).sum();

    HaralickFeatures {
        asm,
        idm,
        contrast,
        correlation,
        entropy,
        sum_average,
    }
}

/// Compute the six Haralick measures of the whole gray plane
pub fn haralick_features(gray: &GrayPlane, config: &HaralickConfig) -> HaralickFeatures {
    let levels = config.gray_levels;
    let d = config.distance as i64;
    let width = gray.width as usize;
    let height = gray.height as usize;

    let quantized = quantize(gray, levels);
    // Image rows grow downward, so "up" is a negative row offset
    let offsets = [(d, 0), (d, -d), (0, -d), (-d, -d)];

    let per_direction: Vec<[f64; 6]> = offsets
        .iter()
        .filter_map(|&offset| co_occurrence_matrix(&quantized, width, height, levels, offset))
        .map(|glcm| glcm_features(&glcm, levels).to_array())
        .collect();

    if per_direction.is_empty() {
        log::warn!(
            "Image {}x{} too small for co-occurrence distance {}",
            width,
            height,
            config.distance
        );
        return HaralickFeatures::undefined();
    }

    let n = per_direction.len() as f64;
    let mut avg = [0.0; 6];
    for values in &per_direction {
        for (a, v) in avg.iter_mut().zip(values) {
            *a += v / n;
        }
    }

    HaralickFeatures {
        asm: avg[0],
        idm: avg[1],
        contrast: avg[2],
        correlation: avg[3],
        entropy: avg[4],
        sum_average: avg[5],
    }
}
