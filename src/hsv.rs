//! The HSV color model and a saturation adjusting view over any [`ImageSource`].

use crate::source::{ImageSource, Rect};
use image::Rgba;

/// Hue reported for colors without one, i.e. when saturation is zero.
pub const NO_HUE: f64 = -1.0;

/// A fully opaque color with hue, saturation and value each in `[0, 1]`.
///
/// `h` is [`NO_HUE`] for grays.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Hsv {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl Hsv {
    pub fn new(h: f64, s: f64, v: f64) -> Self {
        Self { h, s, v }
    }

    /// Convert an additive 16-bit color. Alpha is ignored.
    pub fn from_rgba(Rgba([r, g, b, _]): Rgba<u16>) -> Self {
        let r = r as f64 / u16::MAX as f64;
        let g = g as f64 / u16::MAX as f64;
        let b = b as f64 / u16::MAX as f64;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let d = max - min;

        let v = max;
        let s = if max != 0.0 { d / max } else { 0.0 };
        if s == 0.0 {
            return Self::new(NO_HUE, s, v);
        }

        let sector = if r == max {
            (g - b) / d
        } else if g == max {
            2.0 + (b - r) / d
        } else {
            4.0 + (r - g) / d
        };
        let mut h = sector / 6.0;
        if h < 0.0 {
            h += 1.0;
        }
        Self::new(h, s, v)
    }

    /// Convert back to an opaque 16-bit color.
    pub fn to_rgba(&self) -> Rgba<u16> {
        let v = quantize(self.v);
        if self.s == 0.0 {
            return Rgba([v, v, v, u16::MAX]);
        }

        // Folds h == 1 onto h == 0 so the sector index stays below 6.
        let h = self.h.rem_euclid(1.0) * 6.0;
        let f = h.fract();
        let sector = h as usize % 6;

        let p = quantize(self.v * (1.0 - self.s));
        let q = quantize(self.v * (1.0 - self.s * f));
        let t = quantize(self.v * (1.0 - self.s * (1.0 - f)));

        let [r, g, b] = match sector {
            0 => [v, t, p],
            1 => [q, v, p],
            2 => [p, v, t],
            3 => [p, q, v],
            4 => [t, p, v],
            _ => [v, p, q],
        };
        Rgba([r, g, b, u16::MAX])
    }
}

fn quantize(x: f64) -> u16 {
    (x.clamp(0.0, 1.0) * u16::MAX as f64).round() as u16
}

/// Squash the real line onto `(-1, 1)` with a sigmoid.
pub fn squash(t: f64) -> f64 {
    2.0 / (1.0 + (-t).exp()) - 1.0
}

/// A view of an [`ImageSource`] with the saturation of every pixel rescaled.
///
/// Each read replaces `s` with `squash(coefficient * s)`; hue and value pass through. Nothing is
/// cached, so the view is as thread safe as its source.
#[derive(Debug, Clone)]
pub struct Saturate<S> {
    source: S,
    coefficient: f64,
}

impl<S: ImageSource> Saturate<S> {
    pub fn new(source: S, coefficient: f64) -> Self {
        Self {
            source,
            coefficient,
        }
    }
}

/// Rescale the saturation of `source` by `coefficient`.
///
/// `0` removes all saturation, large coefficients push any nonzero saturation towards `1`.
pub fn saturate<S: ImageSource>(source: S, coefficient: f64) -> Saturate<S> {
    Saturate::new(source, coefficient)
}

impl<S: ImageSource> ImageSource for Saturate<S> {
    fn bounds(&self) -> Rect {
        self.source.bounds()
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        self.hsv_at(x, y).to_rgba()
    }

    fn hsv_at(&self, x: i32, y: i32) -> Hsv {
        let mut c = self.source.hsv_at(x, y);
        c.s = squash(self.coefficient * c.s);
        c
    }
}
