//! Page classification: does a rendered page carry any color?
//!
//! A page is black-and-white when every pixel has `R == G == B`. The test is
//! exact, with no perceptual tolerance: one channel off by one unit in one
//! pixel makes the whole page color.
//!
//! Pixels are compared in the image's native depth. Converting a 16-bit or
//! float image to 8-bit first would merge nearly-equal channel values and
//! could turn a color page black-and-white.

use crate::output::PageTone;
use image::{DynamicImage, ImageBuffer, Pixel};

/// Classify one rendered page.
///
/// Total and deterministic: defined for every image, never fails. Alpha is
/// ignored.
pub fn classify(img: &DynamicImage) -> PageTone {
    if first_color_pixel(img).is_none() {
        PageTone::BlackAndWhite
    } else {
        PageTone::Color
    }
}

/// Position `(x, y)` of the first pixel with unequal channels, scanning in
/// row-major order, or `None` for a black-and-white image.
pub fn first_color_pixel(img: &DynamicImage) -> Option<(u32, u32)> {
    match img {
        // Single-channel sources expand to R = G = B.
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => None,
        DynamicImage::ImageRgb8(buf) => find_unequal(buf),
        DynamicImage::ImageRgba8(buf) => find_unequal(buf),
        DynamicImage::ImageRgb16(buf) => find_unequal(buf),
        DynamicImage::ImageRgba16(buf) => find_unequal(buf),
        DynamicImage::ImageRgb32F(buf) => find_unequal(buf),
        DynamicImage::ImageRgba32F(buf) => find_unequal(buf),
        // f32 holds every 8- and 16-bit value exactly.
        other => find_unequal(&other.to_rgb32f()),
    }
}

fn find_unequal<P: Pixel>(buf: &ImageBuffer<P, Vec<P::Subpixel>>) -> Option<(u32, u32)> {
    buf.enumerate_pixels()
        .find(|(_, _, px)| {
            let c = px.channels();
            c[0] != c[1] || c[1] != c[2]
        })
        .map(|(x, y, _)| (x, y))
}
