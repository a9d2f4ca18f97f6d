use crate::source::ImageSource;
use image::{Rgb, RgbImage, Rgba};
use rayon::prelude::*;

/// Render `source` into an 8-bit RGB buffer, one row per rayon task.
///
/// The buffer starts at `source.bounds()`'s origin, so `(min_x, min_y)` lands at `(0, 0)`.
pub fn to_rgb8<S>(source: &S) -> RgbImage
where
    S: ImageSource + Sync + ?Sized,
{
    let rect = source.bounds();
    let (width, height) = (rect.width() as u32, rect.height() as u32);
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }

    out.par_chunks_mut(3 * width as usize)
        .enumerate()
        .for_each(|(row, line)| {
            let y = rect.min_y + row as i32;
            for (col, px) in line.chunks_exact_mut(3).enumerate() {
                let Rgb(c) = narrow(source.color_at(rect.min_x + col as i32, y));
                px.copy_from_slice(&c);
            }
        });
    out
}

fn narrow(Rgba([r, g, b, _]): Rgba<u16>) -> Rgb<u8> {
    Rgb([(r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8])
}
