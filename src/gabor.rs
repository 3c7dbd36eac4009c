// src/gabor.rs - Multi-scale, multi-orientation Gabor filter bank over the gray projection

use std::f64::consts::{LN_2, PI};
use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::config::FilterBankConfig;
use crate::image_utils::GrayPlane;
use crate::statistics::{mean, sample_stdev};

/// Envelope extent in standard deviations
const KERNEL_SIGMAS: f64 = 3.0;

/// Complex Gabor kernel sampled on a (2 * half_size + 1)^2 grid, row-major
#[derive(Debug, Clone)]
pub struct GaborKernel {
    pub wavelength: f64,
    pub orientation_deg: f64,
    pub sigma_x: f64,
    pub sigma_y: f64,
    pub half_size: usize,
    pub weights: Vec<Complex<f64>>,
}

/// Envelope widths for a wavelength, bandwidth (octaves) and aspect ratio
pub fn gabor_sigmas(wavelength: f64, bandwidth: f64, aspect_ratio: f64) -> (f64, f64) {
    let octave = 2f64.powf(bandwidth);
    let sigma_x = wavelength / PI * (LN_2 / 2.0).sqrt() * (octave + 1.0) / (octave - 1.0);
    (sigma_x, sigma_x / aspect_ratio)
}

/// Half width of the sampled kernel for a wavelength
pub fn kernel_half_size(wavelength: f64, bandwidth: f64, aspect_ratio: f64) -> usize {
    let (sigma_x, sigma_y) = gabor_sigmas(wavelength, bandwidth, aspect_ratio);
    (KERNEL_SIGMAS * sigma_x.max(sigma_y)).ceil() as usize
}

impl GaborKernel {
    /// Build the kernel. The carrier runs along the orientation direction
    /// (counter-clockwise from the x axis, y pointing up) and the envelope is
    /// normalized to unit sum.
    pub fn new(wavelength: f64, orientation_deg: f64, bandwidth: f64, aspect_ratio: f64) -> Self {
        let (sigma_x, sigma_y) = gabor_sigmas(wavelength, bandwidth, aspect_ratio);
        let half_size = kernel_half_size(wavelength, bandwidth, aspect_ratio);
        let (sin_t, cos_t) = orientation_deg.to_radians().sin_cos();

        let h = half_size as i64;
        let mut weights = Vec::with_capacity(((2 * h + 1) * (2 * h + 1)) as usize);
        let mut envelope_sum = 0.0;

        for row in -h..=h {
            for col in -h..=h {
                let x = col as f64;
                let y = -(row as f64);
                let x_rot = x * cos_t + y * sin_t;
                let y_rot = -x * sin_t + y * cos_t;

                let exponent =
                    x_rot * x_rot / (sigma_x * sigma_x) + y_rot * y_rot / (sigma_y * sigma_y);
                let envelope = (-0.5 * exponent).exp();
                envelope_sum += envelope;
                weights.push(Complex::from_polar(envelope, 2.0 * PI * x_rot / wavelength));
            }
        }

        for w in &mut weights {
            *w /= envelope_sum;
        }

        Self {
            wavelength,
            orientation_deg,
            sigma_x,
            sigma_y,
            half_size,
            weights,
        }
    }

    pub fn side(&self) -> usize {
        2 * self.half_size + 1
    }
}

/// Mean and standard deviation of one filter's magnitude image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterResponse {
    pub wavelength: f64,
    pub orientation_deg: f64,
    pub mean: f64,
    pub stdev: f64,
}

/// Per-wavelength aggregation of filter responses over orientations
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBankSummary {
    pub wavelengths: Vec<f64>,
    /// Mean over orientations of the per-filter mean magnitude
    pub avg_avg: Vec<f64>,
    /// Mean over orientations of the per-filter magnitude stdev
    pub std_avg: Vec<f64>,
    /// Stdev over orientations of the per-filter mean magnitude
    pub avg_std: Vec<f64>,
    /// Stdev over orientations of the per-filter magnitude stdev
    pub std_std: Vec<f64>,
}

impl FilterBankSummary {
    pub fn from_responses(wavelengths: &[f64], responses: &[FilterResponse]) -> Self {
        let mut summary = Self {
            wavelengths: wavelengths.to_vec(),
            avg_avg: Vec::with_capacity(wavelengths.len()),
            std_avg: Vec::with_capacity(wavelengths.len()),
            avg_std: Vec::with_capacity(wavelengths.len()),
            std_std: Vec::with_capacity(wavelengths.len()),
        };

        for &wavelength in wavelengths {
            let at_scale: Vec<&FilterResponse> =
                responses.iter().filter(|r| r.wavelength == wavelength).collect();
            let means: Vec<f64> = at_scale.iter().map(|r| r.mean).collect();
            let stdevs: Vec<f64> = at_scale.iter().map(|r| r.stdev).collect();

            summary.avg_avg.push(mean(&means));
            summary.std_avg.push(mean(&stdevs));
            summary.avg_std.push(sample_stdev(&means));
            summary.std_std.push(sample_stdev(&stdevs));
        }

        summary
    }

    /// Scalars in output order: all avg_avg, then std_avg, avg_std, std_std
    pub fn values(&self) -> Vec<f64> {
        self.avg_avg
            .iter()
            .chain(&self.std_avg)
            .chain(&self.avg_std)
            .chain(&self.std_std)
            .copied()
            .collect()
    }

    /// Labels matching `values`
    pub fn labels(wavelengths: &[f64]) -> Vec<String> {
        let groups = [
            ("GaborAvg", "Avg"),
            ("GaborStd", "Avg"),
            ("GaborAvg", "Std"),
            ("GaborStd", "Std"),
        ];
        groups
            .iter()
            .flat_map(|(filter, stat)| {
                wavelengths.iter().map(move |w| format!("{}{}_{}", filter, w, stat))
            })
            .collect()
    }
}

/// Filter the gray plane with every (wavelength, orientation) pair.
/// Responses come back wavelength-major in configuration order.
pub fn apply_filter_bank(
    gray: &GrayPlane,
    config: &FilterBankConfig,
    parallel: bool,
) -> Vec<FilterResponse> {
    let mut planner = FftPlanner::<f64>::new();
    let mut responses =
        Vec::with_capacity(config.wavelengths.len() * config.orientations_deg.len());

    for &wavelength in &config.wavelengths {
        let half = kernel_half_size(
            wavelength,
            config.spatial_frequency_bandwidth,
            config.spatial_aspect_ratio,
        );
        let rows = gray.height as usize + 2 * half;
        let cols = gray.width as usize + 2 * half;

        let row_fft = planner.plan_fft_forward(cols);
        let col_fft = planner.plan_fft_forward(rows);
        let row_ifft = planner.plan_fft_inverse(cols);
        let col_ifft = planner.plan_fft_inverse(rows);

        let mut image_spectrum = symmetric_pad(gray, half);
        fft2d(&mut image_spectrum, rows, cols, &row_fft, &col_fft);

        let filter_one = |orientation_deg: f64| -> FilterResponse {
            let kernel = GaborKernel::new(
                wavelength,
                orientation_deg,
                config.spatial_frequency_bandwidth,
                config.spatial_aspect_ratio,
            );

            let mut buffer = vec![Complex::new(0.0, 0.0); rows * cols];
            let side = kernel.side();
            for kr in 0..side {
                buffer[kr * cols..kr * cols + side]
                    .copy_from_slice(&kernel.weights[kr * side..(kr + 1) * side]);
            }

            fft2d(&mut buffer, rows, cols, &row_fft, &col_fft);
            for (b, s) in buffer.iter_mut().zip(&image_spectrum) {
                *b *= *s;
            }
            fft2d(&mut buffer, rows, cols, &row_ifft, &col_ifft);

            // Valid output starts at (2h, 2h) of the padded convolution
            let scale = (rows * cols) as f64;
            let offset = 2 * half;
            let magnitudes: Vec<f64> = (0..gray.height as usize)
                .flat_map(|r| {
                    let start = (r + offset) * cols + offset;
                    buffer[start..start + gray.width as usize].iter().map(move |c| c.norm() / scale)
                })
                .collect();

            FilterResponse {
                wavelength,
                orientation_deg,
                mean: mean(&magnitudes),
                stdev: sample_stdev(&magnitudes),
            }
        };

        let at_scale: Vec<FilterResponse> = if parallel {
            config.orientations_deg.par_iter().map(|&o| filter_one(o)).collect()
        } else {
            config.orientations_deg.iter().map(|&o| filter_one(o)).collect()
        };

        log::debug!(
            "Gabor wavelength {}: kernel {}x{}, padded {}x{}",
            wavelength,
            2 * half + 1,
            2 * half + 1,
            rows,
            cols
        );

        responses.extend(at_scale);
    }

    responses
}

/// Mirror-pad the plane by `pad` pixels on every side (edge pixels repeated),
/// returned as a complex buffer ready for the FFT
fn symmetric_pad(gray: &GrayPlane, pad: usize) -> Vec<Complex<f64>> {
    let width = gray.width as usize;
    let height = gray.height as usize;
    let rows = height + 2 * pad;
    let cols = width + 2 * pad;

    let mut padded = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        let src_r = reflect(r as i64 - pad as i64, height);
        for c in 0..cols {
            let src_c = reflect(c as i64 - pad as i64, width);
            padded.push(Complex::new(gray.data[src_r * width + src_c], 0.0));
        }
    }
    padded
}

/// Symmetric reflection of an index into 0..n, repeating as often as needed
fn reflect(index: i64, n: usize) -> usize {
    let n = n as i64;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    if m < n { m as usize } else { (period - 1 - m) as usize }
}

/// In-place 2D FFT of a row-major buffer (unnormalized)
fn fft2d(
    data: &mut [Complex<f64>],
    rows: usize,
    cols: usize,
    row_fft: &Arc<dyn Fft<f64>>,
    col_fft: &Arc<dyn Fft<f64>>,
) {
    row_fft.process(data);

    let mut transposed = vec![Complex::new(0.0, 0.0); rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            transposed[c * rows + r] = data[r * cols + c];
        }
    }

    col_fft.process(&mut transposed);

    for c in 0..cols {
        for r in 0..rows {
            data[r * cols + c] = transposed[c * rows + r];
        }
    }
}
