use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use polarize::cli::Cli;
use polarize::cli::Commands;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command() {
        Commands::Compose {
            photos,
            params,
            output,
            format,
            saturation,
            threads,
        } => polarize::compose::run(photos, params, output, format, *saturation, *threads),
        _ => bail!("this command has not been implemented!"),
    }
}
