// src/color.rs - Per-region color and intensity statistics

use rayon::prelude::*;

use crate::image_utils::ChannelPlanes;
use crate::regions::Region;
use crate::statistics::{mean, sample_stdev};

/// Mean and standard deviation of the three color channels and of gray
/// intensity over one region's pixels. Absent for an empty region.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorStats {
    pub channel_mean: [Option<f64>; 3],
    pub channel_std: [Option<f64>; 3],
    pub gray_mean: Option<f64>,
    pub gray_std: Option<f64>,
}

/// Gather the region's samples and summarize them
pub fn calculate_region_color(planes: &ChannelPlanes, region: &Region) -> ColorStats {
    if region.pixels.is_empty() {
        return ColorStats::default();
    }

    let indices: Vec<usize> = region
        .pixels
        .iter()
        .map(|&(x, y)| planes.index(x, y))
        .collect();

    let samples: Vec<Vec<f64>> = planes
        .channels
        .iter()
        .map(|plane| indices.iter().map(|&i| plane[i]).collect())
        .collect();

    let gray: Vec<f64> = (0..indices.len())
        .map(|k| (samples[0][k] + samples[1][k] + samples[2][k]) / 3.0)
        .collect();

    let mut stats = ColorStats::default();
    for (c, channel) in samples.iter().enumerate() {
        stats.channel_mean[c] = Some(mean(channel));
        stats.channel_std[c] = Some(sample_stdev(channel));
    }
    stats.gray_mean = Some(mean(&gray));
    stats.gray_std = Some(sample_stdev(&gray));

    stats
}

/// Color statistics for every region, in region order
pub fn calculate_region_colors(
    planes: &ChannelPlanes,
    regions: &[Region],
    parallel: bool,
) -> Vec<ColorStats> {
    if parallel {
        regions.par_iter().map(|r| calculate_region_color(planes, r)).collect()
    } else {
        regions.iter().map(|r| calculate_region_color(planes, r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn region_statistics_on_rgb_image() {
        let mut image = RgbImage::from_pixel(3, 1, Rgb([10, 20, 30]));
        image.put_pixel(1, 0, Rgb([30, 20, 60]));
        let planes = ChannelPlanes::from_image(&DynamicImage::ImageRgb8(image));
        let region = Region { label: 1, pixels: vec![(0, 0), (1, 0)] };

        let stats = calculate_region_color(&planes, &region);
        assert_approx_eq!(stats.channel_mean[0].unwrap(), 20.0);
        assert_approx_eq!(stats.channel_mean[1].unwrap(), 20.0);
        assert_approx_eq!(stats.channel_mean[2].unwrap(), 45.0);
        assert_approx_eq!(stats.channel_std[0].unwrap(), 200.0f64.sqrt());
        assert_approx_eq!(stats.channel_std[1].unwrap(), 0.0);
        // Gray values 20 and 110/3
        assert_approx_eq!(stats.gray_mean.unwrap(), (20.0 + 110.0 / 3.0) / 2.0);
    }

    #[test]
    fn single_channel_image_behaves_like_three_equal_channels() {
        let mut gray = GrayImage::from_pixel(2, 2, Luma([40]));
        gray.put_pixel(0, 1, Luma([100]));
        let rgb = RgbImage::from_fn(2, 2, |x, y| {
            let v = gray.get_pixel(x, y)[0];
            Rgb([v, v, v])
        });

        let region = Region { label: 1, pixels: vec![(0, 0), (1, 0), (0, 1)] };
        let gray_planes = ChannelPlanes::from_image(&DynamicImage::ImageLuma8(gray));
        let rgb_planes = ChannelPlanes::from_image(&DynamicImage::ImageRgb8(rgb));
        let from_gray = calculate_region_color(&gray_planes, &region);
        let from_rgb = calculate_region_color(&rgb_planes, &region);
        assert_eq!(from_gray, from_rgb);
        assert_approx_eq!(from_gray.gray_mean.unwrap(), 60.0);
    }

    #[test]
    fn empty_region_is_undefined() {
        let planes = ChannelPlanes::from_image(&DynamicImage::ImageLuma8(GrayImage::new(1, 1)));
        let stats = calculate_region_color(&planes, &Region { label: 1, pixels: Vec::new() });
        assert_eq!(stats, ColorStats::default());
        assert!(stats.gray_mean.is_none());
    }
}
