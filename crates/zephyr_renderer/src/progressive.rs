//! Progressive render session: a pass loop over a fixed scene.

use crate::{
    Accumulator, Camera, Frame, PostProcess, RenderConfig, RenderContext, RenderResult, Scene,
    Threader,
};
use image::RgbaImage;
use std::time::{Duration, Instant};

/// Owns the worker pool and both frames of a progressive render.
///
/// Each call to [`render_pass`](Self::render_pass) renders one pass into the
/// scratch frame, folds it into the accumulated frame and refreshes the
/// display image. The scratch frame's own filtered output only ever reaches
/// [`last_pass`](Self::last_pass); the average is built from raw color.
pub struct ProgressiveRenderer {
    scene: Scene,
    config: RenderConfig,
    context: RenderContext,
    threader: Threader,
    accumulator: Accumulator,
    frame: Frame,
    scratch: Frame,
    image: RgbaImage,
    passes_rendered: u64,
    total_time: Duration,
}

impl ProgressiveRenderer {
    /// Validate `config`, size the camera to it and start the worker pool.
    pub fn new(mut scene: Scene, config: RenderConfig, context: RenderContext) -> RenderResult<Self> {
        config.validate()?;
        scene.camera.set_resolution(config.width, config.height);

        let threader = Threader::with_row_tasks(config.threads, config.width, config.height)?;
        let frame = Frame::new(config.width, config.height)?;
        let scratch = Frame::new(config.width, config.height)?;

        Ok(Self {
            scene,
            accumulator: Accumulator::from_config(&config),
            image: RgbaImage::new(config.width, config.height),
            config,
            context,
            threader,
            frame,
            scratch,
            passes_rendered: 0,
            total_time: Duration::ZERO,
        })
    }

    /// Render one pass and return the updated display image.
    pub fn render_pass(&mut self) -> RenderResult<&RgbaImage> {
        let start = Instant::now();

        let mut pass_config = self.config.clone();
        if self.accumulator.is_moving() {
            pass_config.samples_per_pixel = 1;
        }

        self.scratch.clear();
        self.threader.perform(
            &self.scene,
            &pass_config,
            &mut self.scratch,
            &self.context,
            self.passes_rendered,
        )?;
        self.scratch.postprocess(pass_config.pass_postproc, pass_config.postproc_radius);
        self.accumulator.accumulate(&mut self.frame, &self.scratch)?;
        self.frame.write_rgba(self.config.gamma, &mut self.image);

        let elapsed = start.elapsed();
        self.passes_rendered += 1;
        self.total_time += elapsed;
        log::debug!(
            "Pass {} ({} accumulated, {} spp) took {:.1} ms, mean {:.1} ms",
            self.passes_rendered,
            self.accumulator.pass_count(),
            pass_config.samples_per_pixel,
            elapsed.as_secs_f64() * 1000.0,
            self.total_time.as_secs_f64() * 1000.0 / self.passes_rendered as f64
        );

        Ok(&self.image)
    }

    /// Report whether the camera is being moved between passes.
    pub fn set_moving(&mut self, moving: bool) {
        self.accumulator.set_moving(moving);
    }

    pub fn is_moving(&self) -> bool {
        self.accumulator.is_moving()
    }

    /// Change the filter used while the camera is still.
    pub fn set_postproc(&mut self, mode: PostProcess) {
        self.config.postproc = mode;
        self.accumulator.set_postproc(mode);
    }

    /// Camera access for movement between passes.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.scene.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Accumulated frame.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The most recent pass on its own, with `pass_postproc` in its final
    /// buffer.
    pub fn last_pass(&self) -> &Frame {
        &self.scratch
    }

    /// Display image from the latest pass.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Passes in the current running average.
    pub fn pass_count(&self) -> u32 {
        self.accumulator.pass_count()
    }

    /// Passes rendered since the session started.
    pub fn passes_rendered(&self) -> u64 {
        self.passes_rendered
    }

    /// Stop the worker pool. Later passes fail.
    pub fn shutdown(&mut self) {
        self.threader.join();
    }
}
