use image::{DynamicImage, ImageBuffer, Pixel};

/// Three color planes of an image as raw numeric samples, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlanes {
    pub width: u32,
    pub height: u32,
    pub channels: [Vec<f64>; 3],
    /// Largest representable sample value (255 for 8-bit, 65535 for 16-bit, 1.0 for float)
    pub sample_max: f64,
}

/// Single grayscale plane, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct GrayPlane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f64>,
    pub sample_max: f64,
}

impl ChannelPlanes {
    /// Split an image into three planes.
    ///
    /// Images with exactly three channels map them directly. Any other
    /// channel count (gray, gray+alpha, RGBA) copies the first channel into
    /// all three planes.
    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageRgb8(buf) => planes_from_buffer(buf, true, 255.0),
            DynamicImage::ImageRgb16(buf) => planes_from_buffer(buf, true, 65535.0),
            DynamicImage::ImageRgb32F(buf) => planes_from_buffer(buf, true, 1.0),
            DynamicImage::ImageLuma8(buf) => planes_from_buffer(buf, false, 255.0),
            DynamicImage::ImageLumaA8(buf) => planes_from_buffer(buf, false, 255.0),
            DynamicImage::ImageRgba8(buf) => planes_from_buffer(buf, false, 255.0),
            DynamicImage::ImageLuma16(buf) => planes_from_buffer(buf, false, 65535.0),
            DynamicImage::ImageLumaA16(buf) => planes_from_buffer(buf, false, 65535.0),
            DynamicImage::ImageRgba16(buf) => planes_from_buffer(buf, false, 65535.0),
            DynamicImage::ImageRgba32F(buf) => planes_from_buffer(buf, false, 1.0),
            other => planes_from_buffer(&other.to_rgba16(), false, 65535.0),
        }
    }

    /// Row-major index of pixel (x, y)
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

}

impl GrayPlane {
    /// Gray projection for texture measures: the unweighted mean of the
    /// first three channels when the image has at least three, otherwise
    /// the first channel. Alpha never contributes.
    pub fn from_image(image: &DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(buf) => gray_from_buffer(buf, 255.0),
            DynamicImage::ImageLumaA8(buf) => gray_from_buffer(buf, 255.0),
            DynamicImage::ImageRgb8(buf) => gray_from_buffer(buf, 255.0),
            DynamicImage::ImageRgba8(buf) => gray_from_buffer(buf, 255.0),
            DynamicImage::ImageLuma16(buf) => gray_from_buffer(buf, 65535.0),
            DynamicImage::ImageLumaA16(buf) => gray_from_buffer(buf, 65535.0),
            DynamicImage::ImageRgb16(buf) => gray_from_buffer(buf, 65535.0),
            DynamicImage::ImageRgba16(buf) => gray_from_buffer(buf, 65535.0),
            DynamicImage::ImageRgb32F(buf) => gray_from_buffer(buf, 1.0),
            DynamicImage::ImageRgba32F(buf) => gray_from_buffer(buf, 1.0),
            other => gray_from_buffer(&other.to_rgba16(), 65535.0),
        }
    }
}

fn gray_from_buffer<P>(buffer: &ImageBuffer<P, Vec<P::Subpixel>>, sample_max: f64) -> GrayPlane
where
    P: Pixel,
    P::Subpixel: Into<f64>,
{
    let (width, height) = buffer.dimensions();
    let data = buffer
        .pixels()
        .map(|pixel| {
            let samples = pixel.channels();
            if samples.len() >= 3 {
                samples[..3].iter().map(|&s| Into::<f64>::into(s)).sum::<f64>() / 3.0
            } else {
                samples[0].into()
            }
        })
        .collect();

    GrayPlane { width, height, data, sample_max }
}

fn planes_from_buffer<P>(
    buffer: &ImageBuffer<P, Vec<P::Subpixel>>,
    three_channels: bool,
    sample_max: f64,
) -> ChannelPlanes
where
    P: Pixel,
    P::Subpixel: Into<f64>,
{
    let (width, height) = buffer.dimensions();
    let len = width as usize * height as usize;
    let mut channels = [Vec::with_capacity(len), Vec::with_capacity(len), Vec::with_capacity(len)];

    for pixel in buffer.pixels() {
        let samples = pixel.channels();
        if three_channels {
            for (plane, &sample) in channels.iter_mut().zip(samples) {
                plane.push(sample.into());
            }
        } else {
            let first: f64 = samples[0].into();
            for plane in channels.iter_mut() {
                plane.push(first);
            }
        }
    }

    ChannelPlanes { width, height, channels, sample_max }
}
