use crate::cli::OutputFormat;
use crate::hsv::saturate;
use crate::polarimetric::{Polarimetric, PolarimetricImage};
use crate::render;
use crate::source::ImageSource;
use anyhow::Context;
use anyhow::Result;
use image::{ImageFormat, ImageReader};
use log::info;
use rayon::prelude::*;
use std::{
    ffi::OsStr,
    fs::File,
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
    thread,
};
use uom::si::angle::degree;
use uom::si::f64::Angle;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Params {
    saturation: f64,
    threads: Option<usize>,
    angle_step_deg: Option<f64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            saturation: 1.,
            threads: None,
            angle_step_deg: None,
        }
    }
}

impl Params {
    fn saturation(&self) -> f64 {
        self.saturation
    }

    fn threads(&self) -> Result<usize> {
        match self.threads {
            Some(0) => anyhow::bail!("at least one thread is required"),
            Some(threads) => Ok(threads),
            None => Ok(thread::available_parallelism()?.get()),
        }
    }

    /// Rotation between consecutive photos.
    ///
    /// Without an explicit step the photos are assumed to span half a turn.
    fn angle_step(&self, photos: usize) -> Angle {
        let step = self
            .angle_step_deg
            .unwrap_or(180. / photos.max(1) as f64);
        Angle::new::<degree>(step)
    }
}

pub fn run(
    photos: &[PathBuf],
    params: &Option<PathBuf>,
    output: &PathBuf,
    format: &Option<OutputFormat>,
    saturation: Option<f64>,
    threads: Option<usize>,
) -> Result<()> {
    let mut params = match params {
        Some(path) => parse_params(path)?,
        None => Params::default(),
    };
    if let Some(saturation) = saturation {
        params.saturation = saturation;
    }
    if threads.is_some() {
        params.threads = threads;
    }

    let format = match format.or_else(|| infer_format(output)) {
        Some(format) => format,
        None => anyhow::bail!("unsupported output format"),
    };

    let image = compose(photos, params.threads()?)?;

    match format {
        OutputFormat::Png | OutputFormat::Jpeg => {
            write_image(&image, params.saturation(), format, output)
        }
        OutputFormat::Dat => write_dat(&image, params.angle_step(photos.len()), output),
    }
}

fn infer_format(output: &Path) -> Option<OutputFormat> {
    match output.extension().map(|os_str: &OsStr| os_str.to_str()) {
        Some(Some("png")) => Some(OutputFormat::Png),
        Some(Some("jpg" | "jpeg")) => Some(OutputFormat::Jpeg),
        Some(Some("dat")) => Some(OutputFormat::Dat),
        _ => None,
    }
}

/// Decode `photos` on `threads` workers and accumulate them in command line order.
///
/// Each worker holds at most one decoded photo. The first photo that fails to decode aborts.
pub fn compose(photos: &[PathBuf], threads: usize) -> Result<PolarimetricImage> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    let image = Polarimetric::new();
    pool.install(|| {
        photos
            .par_iter()
            .enumerate()
            .with_max_len(1)
            .try_for_each(|(index, path)| -> Result<()> {
                info!("processing {path:?}");
                let photo = ImageReader::open(path)
                    .with_context(|| format!("failed to open {path:?}"))?
                    .with_guessed_format()?
                    .decode()
                    .with_context(|| format!("failed to decode {path:?}"))?;
                image.add_sample(index.try_into()?, &photo)?;
                Ok(())
            })
    })?;

    Ok(image.freeze()?)
}

fn parse_params(path: &PathBuf) -> Result<Params> {
    let mut buffer = String::new();
    std::fs::File::open(path)
        .with_context(|| format!("failed to open {path:?}"))?
        .read_to_string(&mut buffer)?;
    let params = toml::from_str(&buffer)?;

    Ok(params)
}

fn write_image(
    image: &PolarimetricImage,
    saturation: f64,
    format: OutputFormat,
    path: &PathBuf,
) -> Result<()> {
    let rgb = render::to_rgb8(&saturate(image, saturation));
    let format = match format {
        OutputFormat::Png => ImageFormat::Png,
        _ => ImageFormat::Jpeg,
    };

    info!("writing to {path:?}");
    rgb.save_with_format(path, format)
        .with_context(|| format!("failed to write {path:?}"))?;

    Ok(())
}

fn write_dat(image: &PolarimetricImage, step: Angle, path: &PathBuf) -> Result<()> {
    // The polarizer angle of peak intensity for each pixel.
    // Pixels that show no polarization are written as NaN.
    let rect = image.bounds();

    info!("writing to {path:?}");
    let mut output_file = BufWriter::new(File::create(path)?);
    for y in rect.min_y..rect.max_y {
        for x in rect.min_x..rect.max_x {
            let angle = match image.peak_angle(x, y, step) {
                Some(angle) if image.hsv_at(x, y).s > 0. => angle.get::<degree>(),
                _ => f64::NAN,
            };
            write!(output_file, "{:8.3} ", angle)?;
        }
        write!(output_file, "\n")?;
    }
    output_file.flush()?;

    Ok(())
}
