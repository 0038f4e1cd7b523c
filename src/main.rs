use std::path::{Path, PathBuf};

use clap::Parser;

use soft_raster::app;

#[derive(Parser)]
#[command(name = "soft_raster")]
#[command(about = "Renders a model on the CPU and saves the frame as an image")]
struct Cli {
    /// TOML settings file, defaults are used for everything it doesn't set.
    /// Falls back to settings.toml in the working directory, if there is one
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OBJ model to render
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Where to save the image, format follows the extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    width: Option<usize>,

    #[arg(long)]
    height: Option<usize>,

    /// Weight of the scene against the background, in [0, 1]
    #[arg(short, long)]
    transparency: Option<f32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let params = app::Params {
        config_path: app::config_path_or_default(cli.config, Path::new(app::DEFAULT_CONFIG_PATH)),
        model_path: cli.model,
        result_path: cli.output,
        width: cli.width,
        height: cli.height,
        transparency: cli.transparency,
    };

    if let Err(e) = app::run(params) {
        log::error!("{}", e);
        return Err(Box::new(e));
    }
    return Ok(());
}
