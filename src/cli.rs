use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum Commands {
    /// Compose a polarimetric image from photos taken through a rotating polarizer.
    ///
    /// Photos are numbered by their position on the command line, which must follow the order
    /// the polarizer was rotated in.
    Compose {
        /// Photos of the same scene, one per polarizer angle.
        #[arg(required = true)]
        photos: Vec<PathBuf>,

        /// Optional path to TOML formatted Params.
        ///
        /// Values given on the command line take precedence over the file.
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// File path for the composed output.
        #[arg(short, long, default_value = "out.jpg")]
        output: PathBuf,

        /// Format for the composed output.
        ///
        /// If not provided, the output format is inferred from the file extension.
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Saturation coefficient. 0 removes all color, large values saturate fully.
        #[arg(short, long)]
        saturation: Option<f64>,

        /// Number of photos decoded at once.
        ///
        /// Memory use is proportional to this. Defaults to the available parallelism.
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[non_exhaustive]
pub enum OutputFormat {
    Png,
    Jpeg,
    Dat,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone()
    }
}
