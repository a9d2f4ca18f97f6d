//! Accumulate photos taken through a rotating polarizer into one polarimetric image.
//!
//! Accumulation has two phases. While writing, a [`Polarimetric`] is shared between any number
//! of threads which each call [`Polarimetric::add_sample`] with a whole frame and its position
//! in the rotation sequence. Once every writer has been joined, [`Polarimetric::freeze`] turns
//! it into a read-only [`PolarimetricImage`] whose pixels are finalized on read:
//!
//! - hue is the index of the frame that was brightest at that pixel, divided by the number of
//!   frames,
//! - saturation is the gap between the peak and the mean luminance,
//! - value is the mean luminance.
//!
//! The hue only means something if the caller numbers frames densely from zero in the order the
//! polarizer was rotated.

use crate::error::PolarizeError;
use crate::hsv::Hsv;
use crate::intensity::{IntensityPixel, luminance};
use crate::source::{ImageSource, Rect};
use image::Rgba;
use log::{debug, trace, warn};
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock};
use uom::si::f64::Angle;

struct Grid {
    rect: Rect,
    rows: Vec<Mutex<Vec<IntensityPixel>>>,
}

impl Grid {
    fn new(rect: Rect) -> Self {
        let rows = (0..rect.height())
            .map(|_| Mutex::new(vec![IntensityPixel::default(); rect.width()]))
            .collect();
        Self { rect, rows }
    }
}

/// The writer half of a polarimetric image.
///
/// The pixel grid is sized by the first frame added. Later frames only touch the pixels they
/// share with that rectangle. Each row has its own lock, so concurrent writers only wait on each
/// other when they land on the same row.
#[derive(Default)]
pub struct Polarimetric {
    grid: OnceLock<Grid>,
    samples: AtomicU32,
}

impl Polarimetric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate a polarimetric image from `frames` in parallel.
    ///
    /// Each frame's position in the slice is its sample index.
    pub fn from_frames<S>(frames: &[S]) -> Result<PolarimetricImage, PolarizeError>
    where
        S: ImageSource + Sync,
    {
        let acc = Polarimetric::new();
        frames
            .par_iter()
            .enumerate()
            .try_for_each(|(index, frame)| acc.add_sample(index as u32, frame))?;
        acc.freeze()
    }

    /// The fixed rectangle of the image, or `None` until the first sample has been added.
    pub fn bounds(&self) -> Option<Rect> {
        self.grid.get().map(|grid| grid.rect)
    }

    /// Number of samples merged so far.
    pub fn samples(&self) -> u32 {
        self.samples.load(Ordering::Acquire)
    }

    /// Merge `frame` as sample `index`.
    ///
    /// Pixels of `frame` outside the image rectangle are dropped, and pixels of the image that
    /// `frame` does not cover are left alone. `index` must be less than `u32::MAX`.
    pub fn add_sample<S>(&self, index: u32, frame: &S) -> Result<(), PolarizeError>
    where
        S: ImageSource + ?Sized,
    {
        debug_assert!(index < u32::MAX, "sample index {index} is reserved");

        let frame_rect = frame.bounds();
        let grid = self.grid.get_or_init(|| {
            debug!(
                "allocating {}x{} polarimetric grid at ({}, {})",
                frame_rect.width(),
                frame_rect.height(),
                frame_rect.min_x,
                frame_rect.min_y
            );
            Grid::new(frame_rect)
        });

        if frame_rect != grid.rect {
            warn!(
                "sample {index} covers {frame_rect:?}, image is {:?}; only the overlap is used",
                grid.rect
            );
        }

        let overlap = frame_rect.intersect(&grid.rect);
        for y in overlap.min_y..overlap.max_y {
            let row = (y - grid.rect.min_y) as usize;
            let mut pixels = grid.rows[row]
                .lock()
                .map_err(|_| PolarizeError::PoisonedRow { row: y })?;
            for x in overlap.min_x..overlap.max_x {
                let col = (x - grid.rect.min_x) as usize;
                pixels[col].add_sample(index, luminance(frame.color_at(x, y)));
            }
        }

        let total = self.samples.fetch_add(1, Ordering::AcqRel) + 1;
        trace!("merged sample {index} ({total} so far)");
        Ok(())
    }

    /// Finish accumulating and hand back the readable image.
    ///
    /// Taking `self` by value means every writer must have been joined first.
    pub fn freeze(self) -> Result<PolarimetricImage, PolarizeError> {
        let samples = self.samples.into_inner();
        let grid = match self.grid.into_inner() {
            Some(grid) if samples > 0 => grid,
            _ => return Err(PolarizeError::NoSamples),
        };

        let rect = grid.rect;
        let mut pix = Vec::with_capacity(rect.width() * rect.height());
        for (row, pixels) in grid.rows.into_iter().enumerate() {
            let pixels = pixels.into_inner().map_err(|_| PolarizeError::PoisonedRow {
                row: rect.min_y + row as i32,
            })?;
            pix.extend(pixels);
        }

        Ok(PolarimetricImage {
            pix,
            stride: rect.width(),
            rect,
            samples,
        })
    }
}

/// The read-only, frozen polarimetric image.
#[derive(Debug, Clone)]
pub struct PolarimetricImage {
    pix: Vec<IntensityPixel>,
    stride: usize,
    rect: Rect,
    samples: u32,
}

impl PolarimetricImage {
    /// Number of samples the image was accumulated from. Always at least one.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// The raw statistics at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&IntensityPixel> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let i = (y - self.rect.min_y) as usize * self.stride + (x - self.rect.min_x) as usize;
        self.pix.get(i)
    }

    /// Polarizer angle of the brightest sample at `(x, y)` when frames are `step` apart.
    pub fn peak_angle(&self, x: i32, y: i32, step: Angle) -> Option<Angle> {
        let index = self.pixel(x, y)?.max_index()?;
        Some(step * index as f64)
    }
}

impl ImageSource for PolarimetricImage {
    fn bounds(&self) -> Rect {
        self.rect
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u16> {
        self.hsv_at(x, y).to_rgba()
    }

    fn hsv_at(&self, x: i32, y: i32) -> Hsv {
        match self.pixel(x, y) {
            Some(p) => p.finalize(self.samples),
            None => Hsv::default(),
        }
    }
}
