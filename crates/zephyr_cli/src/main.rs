//! Zephyr command line renderer.
//!
//! Renders the built-in Cornell box progressively and writes the result as a
//! PNG. Settings come from defaults, then an optional JSON file, then flags.

mod scenes;

use anyhow::{Context, Result};
use clap::Parser;
use std::f32::consts::TAU;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use zephyr_renderer::{Camera, PostProcess, ProgressiveRenderer, RenderConfig, RenderContext};

#[derive(Parser, Debug)]
#[command(name = "zephyr", version, about = "Progressive path tracer")]
struct Cli {
    /// JSON render configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel for each still pass
    #[arg(long)]
    spp: Option<u32>,

    #[arg(long)]
    max_depth: Option<u32>,

    #[arg(long)]
    threads: Option<usize>,

    #[arg(long)]
    gamma: Option<f32>,

    /// none, box_blur, median, depth or normals
    #[arg(long)]
    postproc: Option<PostProcess>,

    /// Filter for each fresh pass before it is averaged; not part of the
    /// saved image
    #[arg(long)]
    pass_postproc: Option<PostProcess>,

    /// Post-process kernel radius in pixels
    #[arg(long)]
    radius: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Still passes to accumulate
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    passes: u32,

    /// Passes rendered while sweeping the camera before settling
    #[arg(long, default_value_t = 0)]
    preview_passes: u32,

    #[arg(long, default_value = "zephyr.png")]
    output: PathBuf,

    /// Print the scene's BVH before rendering
    #[arg(long)]
    dump_bvh: bool,
}

impl Cli {
    fn load_config(&self) -> Result<RenderConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse config {}", path.display()))?
            }
            None => RenderConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.validate().context("invalid render configuration")?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut RenderConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(spp) = self.spp {
            config.samples_per_pixel = spp;
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(postproc) = self.postproc {
            config.postproc = postproc;
        }
        if let Some(pass_postproc) = self.pass_postproc {
            config.pass_postproc = pass_postproc;
        }
        if let Some(radius) = self.radius {
            config.postproc_radius = radius;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

/// Camera sway for preview pass `pass` of `total`, as the change from the
/// previous pass. The steps of a full sweep sum to zero.
fn sway_step(pass: u32, total: u32, amplitude: f32) -> f32 {
    let phase = |i: u32| (TAU * i as f32 / total as f32).sin();
    amplitude * (phase(pass + 1) - phase(pass))
}

/// Slide the camera sideways and turn it back toward the scene.
fn sway(camera: &mut Camera, pass: u32, total: u32) {
    camera.translate(camera.right() * sway_step(pass, total, 40.0));
    camera.rotate(sway_step(pass, total, 0.05), 0.0);
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.load_config()?;
    let context = RenderContext::from_config(&config);
    log::info!(
        "Rendering {}x{} at {} spp, depth {}, {} threads, seed {}",
        config.width,
        config.height,
        config.samples_per_pixel,
        config.max_depth,
        config.threads,
        context.seed()
    );

    let scene = scenes::cornell_box().context("failed to build the Cornell box scene")?;
    log::info!("Scene prepared");

    if cli.dump_bvh {
        print!("{}", scene.dump_world());
    }

    let start = Instant::now();
    let mut renderer = ProgressiveRenderer::new(scene, config, context)?;

    if cli.preview_passes > 0 {
        renderer.set_moving(true);
        for pass in 0..cli.preview_passes {
            sway(renderer.camera_mut(), pass, cli.preview_passes);
            renderer.render_pass()?;
        }
        renderer.set_moving(false);
        log::info!("Rendered {} preview passes", cli.preview_passes);
    }

    for pass in 1..=cli.passes {
        renderer.render_pass()?;
        log::debug!("Accumulated pass {}/{}", pass, cli.passes);
    }
    renderer.shutdown();

    log::info!(
        "Rendered {} passes in {:.2}s",
        renderer.passes_rendered(),
        start.elapsed().as_secs_f64()
    );

    renderer
        .image()
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("Saved {}", cli.output.display());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
