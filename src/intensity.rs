//! Running intensity statistics for a single pixel.

use crate::hsv::Hsv;
use image::Rgba;

/// Reduce a 16-bit color to an 8-bit perceptual luminance.
///
/// Uses the ITU-R 601 weights, so color and grayscale frames reduce the same way.
pub fn luminance(Rgba([r, g, b, _]): Rgba<u16>) -> u8 {
    let y = (19595 * r as u32 + 38470 * g as u32 + 7471 * b as u32 + (1 << 15)) >> 24;
    y as u8
}

const UNSET: u32 = u32::MAX;

/// The peak and summed luminance seen at one pixel across every sample applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntensityPixel {
    max_intensity: u8,
    max_index: u32,
    sum_intensity: u64,
}

impl Default for IntensityPixel {
    fn default() -> Self {
        Self {
            max_intensity: 0,
            max_index: UNSET,
            sum_intensity: 0,
        }
    }
}

impl IntensityPixel {
    /// Fold the luminance of sample `index` into this pixel.
    ///
    /// The peak moves to this sample when it is strictly brighter, or equally bright with a
    /// lower index. Ties therefore go to the lowest index whatever order samples arrive in.
    pub fn add_sample(&mut self, index: u32, luminance: u8) {
        if luminance > self.max_intensity
            || (luminance == self.max_intensity && index < self.max_index)
        {
            self.max_intensity = luminance;
            self.max_index = index;
        }
        self.sum_intensity += luminance as u64;
    }

    pub fn max_intensity(&self) -> u8 {
        self.max_intensity
    }

    /// Index of the sample with the peak luminance, if any sample has been applied.
    pub fn max_index(&self) -> Option<u32> {
        (self.max_index != UNSET).then_some(self.max_index)
    }

    pub fn sum_intensity(&self) -> u64 {
        self.sum_intensity
    }

    /// Summarize the pixel as if `total_samples` samples have been added to the image.
    ///
    /// Hue encodes which sample peaked, saturation the gap between peak and mean, and value the
    /// mean luminance.
    ///
    /// # Panics
    ///
    /// Panics if `total_samples` is zero.
    pub fn finalize(&self, total_samples: u32) -> Hsv {
        assert!(total_samples > 0, "finalize needs at least one sample");
        let n = total_samples as f64;
        let max_v = self.max_intensity as f64 / 255.0;
        let avg_v = self.sum_intensity as f64 / (255.0 * n);
        Hsv {
            h: self.max_index().unwrap_or(0) as f64 / n,
            s: (max_v - avg_v).abs(),
            v: avg_v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u16> = Rgba([u16::MAX; 4]);
    const BLACK: Rgba<u16> = Rgba([0, 0, 0, u16::MAX]);

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn luminance_of_extremes() {
        assert_eq!(luminance(WHITE), 255);
        assert_eq!(luminance(BLACK), 0);
        assert_eq!(luminance(Rgba([0x8080, 0x8080, 0x8080, u16::MAX])), 0x80);
    }

    #[test]
    fn luminance_weights_green_highest() {
        let red = luminance(Rgba([u16::MAX, 0, 0, u16::MAX]));
        let green = luminance(Rgba([0, u16::MAX, 0, u16::MAX]));
        let blue = luminance(Rgba([0, 0, u16::MAX, u16::MAX]));
        assert_eq!((red, green, blue), (76, 150, 29));
    }

    #[test]
    fn partial_totals_follow_peak() {
        // white at 0, then black at 1 and 2
        let mut p = IntensityPixel::default();
        let samples = [255u8, 0, 0];
        for (k, &y) in samples.iter().enumerate() {
            p.add_sample(k as u32, y);
            let n = k as u32 + 1;
            let c = p.finalize(n);
            assert!(close(c.h, 0.0));
            assert!(close(c.v, 1.0 / n as f64));
            assert!(close(c.s, 1.0 - 1.0 / n as f64));
        }
    }

    #[test]
    fn peak_at_each_position() {
        for k in 0..3u32 {
            let mut p = IntensityPixel::default();
            for i in 0..3u32 {
                p.add_sample(i, if i == k { 255 } else { 0 });
            }
            let c = p.finalize(3);
            assert!(close(c.h, k as f64 / 3.0), "k = {k}, h = {}", c.h);
            assert!(close(c.s, 2.0 / 3.0));
            assert!(close(c.v, 1.0 / 3.0));
        }
    }

    #[test]
    fn ties_go_to_the_lower_index() {
        let mut p = IntensityPixel::default();
        p.add_sample(0, 100);
        p.add_sample(1, 100);
        assert_eq!(p.max_index(), Some(0));

        let mut q = IntensityPixel::default();
        q.add_sample(1, 100);
        q.add_sample(0, 100);
        assert_eq!(q.max_index(), Some(0));
        assert_eq!(p, q);
    }

    #[test]
    fn dark_samples_still_record_an_index() {
        let mut p = IntensityPixel::default();
        assert_eq!(p.max_index(), None);
        p.add_sample(2, 0);
        assert_eq!(p.max_index(), Some(2));
        assert_eq!(p.finalize(3), Hsv::new(2.0 / 3.0, 0.0, 0.0));
    }

    #[test]
    fn untouched_pixel_is_black() {
        assert_eq!(IntensityPixel::default().finalize(4), Hsv::new(0.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "at least one sample")]
    fn finalize_without_samples_panics() {
        IntensityPixel::default().finalize(0);
    }
}
