//! Pixel sources that can be sampled by coordinate.

use crate::hsv::Hsv;
use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel, Rgba};
use std::ops::Deref;

/// A half-open rectangle `[min_x, max_x) x [min_y, max_y)` in pixel coordinates.
///
/// Unlike the dimensions of an `image::ImageBuffer`, a `Rect` may have a non-zero origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A rectangle of `width` by `height` pixels anchored at the origin.
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0, 0, width as i32, height as i32)
    }

    pub fn width(&self) -> usize {
        (self.max_x - self.min_x).max(0) as usize
    }

    pub fn height(&self) -> usize {
        (self.max_y - self.min_y).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.min_x <= x && x < self.max_x && self.min_y <= y && y < self.max_y
    }

    /// The largest rectangle contained by both `self` and `other`.
    ///
    /// Disjoint rectangles intersect to an empty rectangle.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        if r.is_empty() { Rect::default() } else { r }
    }

    /// Offset the rectangle by `(dx, dy)`.
    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }
}

/// Anything with bounds and a color at each pixel in those bounds.
///
/// Colors are reported as opaque 16-bit RGB. Reading outside of `bounds()` is allowed and
/// returns an implementation-defined color, usually black.
pub trait ImageSource {
    fn bounds(&self) -> Rect;

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16>;

    /// The color at `(x, y)` in the HSV model.
    ///
    /// Sources that already hold HSV values should override this to skip the RGB round trip.
    fn hsv_at(&self, x: i32, y: i32) -> Hsv {
        Hsv::from_rgba(self.color_at(x, y))
    }
}

impl<S: ImageSource + ?Sized> ImageSource for &S {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        (**self).color_at(x, y)
    }

    fn hsv_at(&self, x: i32, y: i32) -> Hsv {
        (**self).hsv_at(x, y)
    }
}

// Widen an 8-bit channel so that 0xff maps to 0xffff.
fn widen(c: u8) -> u16 {
    c as u16 * 0x101
}

fn widen_rgba(Rgba([r, g, b, _]): Rgba<u8>) -> Rgba<u16> {
    Rgba([widen(r), widen(g), widen(b), u16::MAX])
}

fn opaque(Rgba([r, g, b, _]): Rgba<u16>) -> Rgba<u16> {
    Rgba([r, g, b, u16::MAX])
}

impl<P, C> ImageSource for ImageBuffer<P, C>
where
    P: Pixel<Subpixel = u8>,
    C: Deref<Target = [u8]>,
{
    fn bounds(&self) -> Rect {
        let (width, height) = self.dimensions();
        Rect::from_dimensions(width, height)
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        match self.get_pixel_checked(x as u32, y as u32) {
            Some(pixel) if x >= 0 && y >= 0 => widen_rgba(pixel.to_rgba()),
            _ => Rgba([0, 0, 0, u16::MAX]),
        }
    }
}

impl ImageSource for DynamicImage {
    fn bounds(&self) -> Rect {
        let (width, height) = self.dimensions();
        Rect::from_dimensions(width, height)
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        if !self.in_bounds(x as u32, y as u32) || x < 0 || y < 0 {
            return Rgba([0, 0, 0, u16::MAX]);
        }
        let (x, y) = (x as u32, y as u32);
        // 16-bit frames are read at full depth, everything else through 8-bit RGBA.
        match self {
            DynamicImage::ImageLuma16(buf) => opaque(buf.get_pixel(x, y).to_rgba()),
            DynamicImage::ImageLumaA16(buf) => opaque(buf.get_pixel(x, y).to_rgba()),
            DynamicImage::ImageRgb16(buf) => opaque(buf.get_pixel(x, y).to_rgba()),
            DynamicImage::ImageRgba16(buf) => opaque(buf.get_pixel(x, y).to_rgba()),
            _ => widen_rgba(self.get_pixel(x, y)),
        }
    }
}

/// A view of `source` with its origin moved by `(dx, dy)`.
///
/// Useful when a frame is a crop of the full scene and has to line up with the others.
#[derive(Debug, Clone)]
pub struct Translated<S> {
    source: S,
    dx: i32,
    dy: i32,
}

impl<S: ImageSource> Translated<S> {
    pub fn new(source: S, dx: i32, dy: i32) -> Self {
        Self { source, dx, dy }
    }
}

impl<S: ImageSource> ImageSource for Translated<S> {
    fn bounds(&self) -> Rect {
        self.source.bounds().translate(self.dx, self.dy)
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        self.source.color_at(x - self.dx, y - self.dy)
    }

    fn hsv_at(&self, x: i32, y: i32) -> Hsv {
        self.source.hsv_at(x - self.dx, y - self.dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::luminance;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn intersection_of_overlapping_rects() {
        let a = Rect::new(0, 0, 4, 4);
        let b = Rect::new(2, -1, 6, 3);
        assert_eq!(a.intersect(&b), Rect::new(2, 0, 4, 3));
        assert_eq!(b.intersect(&a), a.intersect(&b));
    }

    #[test]
    fn disjoint_rects_intersect_to_empty() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(5, 5, 7, 7);
        let r = a.intersect(&b);
        assert!(r.is_empty());
        assert_eq!(r.width(), 0);
        assert_eq!(r.height(), 0);
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(-1, -1, 1, 1);
        assert!(r.contains(-1, -1));
        assert!(r.contains(0, 0));
        assert!(!r.contains(1, 0));
        assert!(!r.contains(0, 1));
    }

    #[test]
    fn gray_buffer_widens_to_16_bit() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(1, 0, Luma([0xff]));
        assert_eq!(ImageSource::bounds(&img), Rect::from_dimensions(2, 1));
        assert_eq!(img.color_at(0, 0), Rgba([0, 0, 0, 0xffff]));
        assert_eq!(img.color_at(1, 0), Rgba([0xffff, 0xffff, 0xffff, 0xffff]));
    }

    #[test]
    fn out_of_bounds_reads_are_black() {
        let img = RgbImage::from_pixel(2, 2, Rgb([10, 20, 30]));
        assert_eq!(img.color_at(-1, 0), Rgba([0, 0, 0, 0xffff]));
        assert_eq!(img.color_at(2, 0), Rgba([0, 0, 0, 0xffff]));

        let dynamic = DynamicImage::ImageRgb8(img);
        assert_eq!(dynamic.color_at(0, -1), Rgba([0, 0, 0, 0xffff]));
        assert_eq!(dynamic.color_at(1, 1), Rgba([0x0a0a, 0x1414, 0x1e1e, 0xffff]));
    }

    #[test]
    fn sixteen_bit_frames_keep_full_depth() {
        // 0xff00 narrows to 0xfe through 8 bits
        let gray = DynamicImage::ImageLuma16(ImageBuffer::from_pixel(1, 1, Luma([0xff00u16])));
        assert_eq!(gray.color_at(0, 0), Rgba([0xff00, 0xff00, 0xff00, 0xffff]));
        assert_eq!(luminance(gray.color_at(0, 0)), 0xff);

        let rgba = DynamicImage::ImageRgba16(ImageBuffer::from_pixel(
            2,
            1,
            Rgba([0x0102u16, 0xfedc, 0x1234, 0]),
        ));
        assert_eq!(rgba.color_at(1, 0), Rgba([0x0102, 0xfedc, 0x1234, 0xffff]));
        assert_eq!(rgba.color_at(2, 0), Rgba([0, 0, 0, 0xffff]));
    }

    #[test]
    fn translated_source_moves_origin() {
        let mut img = GrayImage::new(2, 2);
        img.put_pixel(0, 0, Luma([0x80]));
        let moved = Translated::new(&img, 3, -1);
        assert_eq!(moved.bounds(), Rect::new(3, -1, 5, 1));
        assert_eq!(moved.color_at(3, -1), Rgba([0x8080, 0x8080, 0x8080, 0xffff]));
    }
}
