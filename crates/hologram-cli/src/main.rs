use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use hologram_core::config::PipelineConfig;
use hologram_core::frame::Frame;
use hologram_core::pipeline::{run_clip, PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod summary;

#[derive(Parser)]
#[command(name = "hologram", about = "Hologram-authentication video pipeline")]
#[command(version)]
struct Cli {
    /// Directory of sequentially numbered frame images (e.g. 0001.png, 0002.png, ...)
    frames_dir: PathBuf,

    /// Optional TOML config file overriding pipeline defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deterministic RNG seed for RANSAC homography sampling
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Drives an [`indicatif`] progress bar from pipeline stage callbacks.
struct BarReporter {
    bar: Mutex<ProgressBar>,
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        let bar = self.bar.lock().unwrap();
        bar.set_message(stage.to_string());
        if let Some(total) = total_items {
            bar.set_length(total as u64);
            bar.set_position(0);
        }
    }

    fn advance(&self, items_done: usize) {
        self.bar.lock().unwrap().set_position(items_done as u64);
    }

    fn finish_stage(&self) {}
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref())?;
    config.validate().context("invalid pipeline configuration")?;
    summary::print_pipeline_summary(&config);

    let frames = load_frames(&cli.frames_dir)?;
    info!(count = frames.len(), dir = %cli.frames_dir.display(), "loaded frames");

    let bar = ProgressBar::new(frames.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:24} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    let reporter: Arc<dyn ProgressReporter> = Arc::new(BarReporter { bar: Mutex::new(bar.clone()) });

    let aggregate = run_clip(&frames, config, cli.seed, reporter)?;
    bar.finish_with_message("Done");

    println!("{}", serde_json::to_string_pretty(&aggregate)?);
    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            let config: PipelineConfig = toml::from_str(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?;
            Ok(config)
        }
        None => Ok(PipelineConfig::default()),
    }
}

fn load_frames(dir: &std::path::Path) -> Result<Vec<Frame>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading frames directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    if paths.is_empty() {
        anyhow::bail!("no frame images found in {}", dir.display());
    }

    paths.iter().map(|p| load_frame(p)).collect()
}

fn load_frame(path: &std::path::Path) -> Result<Frame> {
    let img = image::open(path)
        .with_context(|| format!("opening frame image {}", path.display()))?
        .to_rgb8();
    let (w, h) = img.dimensions();

    let mut data = ndarray::Array3::<u8>::zeros((h as usize, w as usize, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        data[[y as usize, x as usize, 0]] = b;
        data[[y as usize, x as usize, 1]] = g;
        data[[y as usize, x as usize, 2]] = r;
    }

    Ok(Frame::new(data))
}
