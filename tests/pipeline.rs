use std::f64::consts::PI;

use assert_approx_eq::assert_approx_eq;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

use nuclear_grade_features_lib::{
    analyze_region_shape, compute_nuclear_features, feature_labels, Config, FeatureVector,
    NucleiFeatureError, RegionSet,
};

/// Label map with one filled square per (label, x0, y0, side)
fn square_labels(width: u32, height: u32, squares: &[(u32, u32, u32, u32)]) -> RegionSet {
    let mut labels = vec![0u32; (width * height) as usize];
    for &(label, x0, y0, side) in squares {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                labels[(y * width + x) as usize] = label;
            }
        }
    }
    RegionSet::from_label_map(width, height, &labels).unwrap()
}

/// Label map with one digital disk, (x - cx)^2 + (y - cy)^2 <= r^2, per (label, cx, cy, r)
fn disk_labels(width: u32, height: u32, disks: &[(u32, i64, i64, i64)]) -> RegionSet {
    let mut labels = vec![0u32; (width * height) as usize];
    for &(label, cx, cy, r) in disks {
        for y in cy - r..=cy + r {
            for x in cx - r..=cx + r {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    labels[(y * width as i64 + x) as usize] = label;
                }
            }
        }
    }
    RegionSet::from_label_map(width, height, &labels).unwrap()
}

// A radius-5 disk has row half-widths 5, 4, 4, 4, 3, 0 from the center row
// outwards: 11 + 2 * (9 + 9 + 9 + 7 + 1) = 81 pixels. Its traced outline takes
// per quadrant three diagonal and four unit steps.
const DISK_AREA: f64 = 81.0;

fn disk_perimeter() -> f64 {
    16.0 + 12.0 * 2f64.sqrt()
}

fn small_bank_config() -> Config {
    let mut config = Config::default();
    config.filter_bank.wavelengths = vec![4.0, 8.0];
    config.filter_bank.orientations_deg = vec![0.0, 90.0];
    config
}

fn assert_same_values(a: &FeatureVector, b: &FeatureVector) {
    assert_eq!(a.labels, b.labels);
    for ((label, x), y) in a.iter().zip(&b.values) {
        if x.is_nan() {
            assert!(y.is_nan(), "{}: NaN vs {}", label, y);
        } else {
            assert!((x - y).abs() <= 1e-9 * x.abs().max(1.0), "{}: {} vs {}", label, x, y);
        }
    }
}

#[test]
fn three_squares_on_uniform_image() {
    // Three 6x6 nuclei plus a 2x2 fragment that must be filtered out
    let regions = square_labels(
        64,
        64,
        &[(1, 5, 5, 6), (2, 40, 8, 6), (3, 20, 45, 6), (4, 55, 55, 2)],
    );
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([120, 80, 40])));

    let features = compute_nuclear_features(&regions, &image, &Config::default()).unwrap();
    assert_eq!(features.len(), 171);
    assert_eq!(features.labels, feature_labels(&Config::default()));

    let get = |label: &str| features.get(label).unwrap();

    assert_approx_eq!(get("Area_Mean"), 36.0);
    assert_approx_eq!(get("Area_Std"), 0.0);
    assert_approx_eq!(get("Area_Median"), 36.0);
    assert_approx_eq!(get("Area_IQR"), 0.0);
    assert_approx_eq!(get("EquivDiameter_Mean"), (4.0 * 36.0 / PI).sqrt());
    assert_approx_eq!(get("Eccentricity_Mean"), 0.0);
    assert_approx_eq!(get("Solidity_Mean"), 1.0);
    // Boundary through pixel centers of a 6x6 square is 20 long
    assert_approx_eq!(get("Compactness_Mean"), 4.0 * PI * 36.0 / 400.0);

    // One triangle gives a single Voronoi vertex: every cell is unbounded
    assert!(get("Crowdedness_Mean").is_nan());
    // Round nuclei carry no orientation signal
    assert_approx_eq!(get("Alignedness_Mean"), 0.0);

    assert_approx_eq!(get("MeanR_Mean"), 120.0);
    assert_approx_eq!(get("MeanG_Mean"), 80.0);
    assert_approx_eq!(get("MeanB_Mean"), 40.0);
    assert_approx_eq!(get("StdR_Mean"), 0.0);
    assert_approx_eq!(get("MeanGray_Mean"), 80.0);

    // Uniform image: flat filter responses and a single gray level
    for label in &features.labels {
        if label.starts_with("GaborStd") && label.ends_with("_Avg") {
            assert!(get(label).abs() < 1e-6, "{} = {}", label, get(label));
        }
    }
    assert_approx_eq!(get("Haralick_ASM"), 1.0);
    assert_approx_eq!(get("Haralick_Contrast"), 0.0);
    assert_approx_eq!(get("Haralick_Entropy"), 0.0);
    assert_approx_eq!(get("Haralick_Correlation"), 1.0);
    assert_approx_eq!(get("Haralick_SumAverage"), 160.0);
}

#[test]
fn three_disks_on_uniform_image() {
    let regions = disk_labels(64, 64, &[(1, 12, 12, 5), (2, 48, 14, 5), (3, 24, 48, 5)]);
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([150, 90, 60])));

    for region in regions.regions() {
        let shape = analyze_region_shape(region).unwrap();
        assert_approx_eq!(shape.area, DISK_AREA);
        assert_approx_eq!(shape.perimeter, disk_perimeter());
    }

    let features = compute_nuclear_features(&regions, &image, &small_bank_config()).unwrap();
    let get = |label: &str| features.get(label).unwrap();

    assert_approx_eq!(get("Area_Mean"), DISK_AREA);
    assert_approx_eq!(get("Area_Std"), 0.0);
    assert_approx_eq!(get("EquivDiameter_Mean"), (4.0 * DISK_AREA / PI).sqrt());
    assert_approx_eq!(get("Compactness_Mean"), 4.0 * PI * DISK_AREA / disk_perimeter().powi(2));
    assert_approx_eq!(get("Eccentricity_Mean"), 0.0);

    assert_approx_eq!(get("MeanR_Mean"), 150.0);
    assert_approx_eq!(get("MeanG_Mean"), 90.0);
    assert_approx_eq!(get("MeanB_Mean"), 60.0);
    assert_approx_eq!(get("MeanGray_Mean"), 100.0);
    assert_approx_eq!(get("StdGray_Mean"), 0.0);
}

#[test]
fn surrounded_nucleus_crowdedness() {
    // Four corner disks 40 px apart around a center disk; the center's
    // Voronoi cell is the diamond through (32, 12), (52, 32), (32, 52), (12, 32)
    let regions = disk_labels(
        64,
        64,
        &[(1, 12, 12, 5), (2, 52, 12, 5), (3, 52, 52, 5), (4, 12, 52, 5), (5, 32, 32, 5)],
    );
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([128])));

    let features = compute_nuclear_features(&regions, &image, &small_bank_config()).unwrap();
    let get = |label: &str| features.get(label).unwrap();

    let cell_area = 40.0 * 40.0 / 2.0;
    // Corner cells are unbounded, so the center alone defines the population
    assert_approx_eq!(get("Crowdedness_Mean"), DISK_AREA / cell_area);
    assert_approx_eq!(get("Crowdedness_Median"), DISK_AREA / cell_area);
    assert_approx_eq!(get("Crowdedness_Std"), 0.0);

    // Four hull sides of 40 and four spokes of 20 sqrt(2)
    assert_approx_eq!(get("EdgeDist_Mean"), 20.0 + 10.0 * 2f64.sqrt());
}

#[test]
fn alpha_does_not_change_texture() {
    let regions = square_labels(32, 32, &[(1, 3, 3, 5), (2, 18, 4, 6), (3, 8, 20, 5)]);
    let color = |x: u32, y: u32| [(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x * y) % 256) as u8];
    let rgb = RgbImage::from_fn(32, 32, |x, y| Rgb(color(x, y)));
    let rgba = RgbaImage::from_fn(32, 32, |x, y| {
        let [r, g, b] = color(x, y);
        Rgba([r, g, b, ((x + y) * 8 % 256) as u8])
    });

    let config = small_bank_config();
    let from_rgb =
        compute_nuclear_features(&regions, &DynamicImage::ImageRgb8(rgb), &config).unwrap();
    let from_rgba =
        compute_nuclear_features(&regions, &DynamicImage::ImageRgba8(rgba), &config).unwrap();

    let texture_labels: Vec<&String> = from_rgb
        .labels
        .iter()
        .filter(|label| label.starts_with("Gabor") || label.starts_with("Haralick"))
        .collect();
    assert_eq!(texture_labels.len(), 4 * 2 + 6);
    for label in texture_labels {
        let a = from_rgb.get(label).unwrap();
        let b = from_rgba.get(label).unwrap();
        assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0), "{}: {} vs {}", label, a, b);
    }
}

#[test]
fn invalid_config_is_rejected() {
    let regions = square_labels(16, 16, &[(1, 2, 2, 5)]);
    let image = DynamicImage::ImageLuma8(GrayImage::new(16, 16));

    let mut config = small_bank_config();
    config.haralick.gray_levels = 0;
    let result = compute_nuclear_features(&regions, &image, &config);
    assert!(matches!(result, Err(NucleiFeatureError::Config(_))));

    let mut config = small_bank_config();
    config.filter_bank.wavelengths.clear();
    let result = compute_nuclear_features(&regions, &image, &config);
    assert!(matches!(result, Err(NucleiFeatureError::Config(_))));
}

#[test]
fn edge_distances_between_square_centroids() {
    // Centroids at (3.5, 3.5), (23.5, 3.5), (3.5, 18.5)
    let regions = square_labels(32, 32, &[(1, 1, 1, 6), (2, 21, 1, 6), (3, 1, 16, 6)]);
    let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([90])));

    let features = compute_nuclear_features(&regions, &image, &small_bank_config()).unwrap();
    let edges = [20.0, 15.0, 25.0];
    let mean = edges.iter().sum::<f64>() / 3.0;
    assert_approx_eq!(features.get("EdgeDist_Mean").unwrap(), mean);
    assert_approx_eq!(features.get("EdgeDist_Median").unwrap(), 20.0);

    let diameter = (4.0 * 36.0 / PI).sqrt();
    assert_approx_eq!(features.get("EdgeDistNormDiam_Mean").unwrap(), mean / diameter);
}

#[test]
fn label_order_does_not_depend_on_content() {
    let config = small_bank_config();
    let a = compute_nuclear_features(
        &square_labels(24, 24, &[(1, 2, 2, 4)]),
        &DynamicImage::ImageLuma8(GrayImage::from_pixel(24, 24, Luma([10]))),
        &config,
    )
    .unwrap();
    let b = compute_nuclear_features(
        &square_labels(40, 30, &[(1, 2, 2, 5), (7, 20, 3, 4), (9, 8, 18, 6), (12, 30, 20, 3)]),
        &DynamicImage::ImageRgb8(RgbImage::from_fn(40, 30, |x, y| Rgb([x as u8, y as u8, 7]))),
        &config,
    )
    .unwrap();

    assert_eq!(a.labels, b.labels);
    assert_eq!(a.labels, feature_labels(&config));
    assert_eq!(a.len(), 19 * 7 + 4 * 2 + 6);
}

#[test]
fn single_channel_matches_replicated_rgb() {
    let regions =
        square_labels(30, 30, &[(1, 2, 2, 5), (2, 18, 4, 4), (3, 6, 20, 6), (4, 22, 22, 4)]);
    let gray = GrayImage::from_fn(30, 30, |x, y| Luma([((x * 7 + y * 3) % 200) as u8]));
    let rgb = RgbImage::from_fn(30, 30, |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    });

    let config = small_bank_config();
    let from_gray =
        compute_nuclear_features(&regions, &DynamicImage::ImageLuma8(gray), &config).unwrap();
    let from_rgb =
        compute_nuclear_features(&regions, &DynamicImage::ImageRgb8(rgb), &config).unwrap();
    assert_same_values(&from_gray, &from_rgb);
}

#[test]
fn parallel_and_sequential_runs_agree() {
    let regions =
        square_labels(36, 36, &[(1, 2, 2, 5), (2, 20, 3, 7), (3, 5, 22, 4), (4, 25, 25, 6)]);
    let image = DynamicImage::ImageRgb8(RgbImage::from_fn(36, 36, |x, y| {
        Rgb([(x * 5) as u8, (y * 5) as u8, ((x + y) * 2) as u8])
    }));

    let mut config = small_bank_config();
    let parallel = compute_nuclear_features(&regions, &image, &config).unwrap();
    config.use_parallel = false;
    let sequential = compute_nuclear_features(&regions, &image, &config).unwrap();
    assert_same_values(&parallel, &sequential);
}

#[test]
fn mismatched_sizes_are_rejected() {
    let regions = square_labels(20, 10, &[(1, 0, 0, 4)]);
    let image = DynamicImage::ImageLuma8(GrayImage::new(10, 20));

    match compute_nuclear_features(&regions, &image, &small_bank_config()) {
        Err(NucleiFeatureError::SizeMismatch { regions, image }) => {
            assert_eq!(regions, (10, 20));
            assert_eq!(image, (20, 10));
        }
        other => panic!("expected SizeMismatch, got {:?}", other),
    }
}

#[test]
fn only_fragments_is_an_error() {
    // 2x2 and 1x1 regions are all below the 9 pixel minimum
    let regions = square_labels(16, 16, &[(1, 1, 1, 2), (2, 8, 8, 1), (3, 12, 3, 2)]);
    let image = DynamicImage::ImageLuma8(GrayImage::new(16, 16));

    let result = compute_nuclear_features(&regions, &image, &small_bank_config());
    assert!(matches!(result, Err(NucleiFeatureError::NoRegions { min_area: 9 })));
}
