//! Fixed worker pool executing one batch of render tasks per pass.

use crate::{
    partition_rows, Frame, RenderConfig, RenderContext, RenderError, RenderResult, RenderTask,
    Scene,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Worker pool plus the task list it runs every pass.
///
/// The pool is created once and reused across passes. `perform` blocks until
/// every task of the pass has finished.
pub struct Threader {
    pool: Option<ThreadPool>,
    threads: usize,
    tasks: Vec<RenderTask>,
}

impl Threader {
    /// Start `threads` workers (at least one) with an empty task list.
    pub fn new(threads: usize) -> RenderResult<Self> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("zephyr-worker-{i}"))
            .build()?;
        log::info!("Started render pool with {} workers", threads);

        Ok(Self {
            pool: Some(pool),
            threads,
            tasks: Vec::new(),
        })
    }

    /// Start a pool and give each worker one row band of a `width x height`
    /// image.
    pub fn with_row_tasks(threads: usize, width: u32, height: u32) -> RenderResult<Self> {
        let mut threader = Self::new(threads)?;
        for task in partition_rows(width, height, threader.threads) {
            log::debug!(
                "Worker {} renders rows {}..{}",
                task.worker,
                task.rect.min_y,
                task.rect.max_y
            );
            threader.add_task(task);
        }
        Ok(threader)
    }

    pub fn add_task(&mut self, task: RenderTask) {
        self.tasks.push(task);
    }

    pub fn tasks(&self) -> &[RenderTask] {
        &self.tasks
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_some()
    }

    /// Run every task once and wait for all of them.
    ///
    /// Each task gets its own copy of `config`, the band of `frame` covering
    /// its rectangle and a generator seeded from `(pass, worker)`. Tasks must
    /// not overlap and must span the frame's full width.
    pub fn perform(
        &self,
        scene: &Scene,
        config: &RenderConfig,
        frame: &mut Frame,
        context: &RenderContext,
        pass: u64,
    ) -> RenderResult<()> {
        let pool = self.pool.as_ref().ok_or(RenderError::PoolShutDown)?;
        if self.tasks.is_empty() {
            return Err(RenderError::TaskLayout("no render tasks registered".into()));
        }

        let mut tasks = self.tasks.clone();
        tasks.sort_by_key(|task| task.rect.min_y);
        let rects: Vec<_> = tasks.iter().map(|task| task.rect).collect();
        let bands = frame.bands_mut(&rects)?;

        pool.scope(|s| {
            for (task, mut band) in tasks.iter().zip(bands) {
                let config = config.clone();
                let seed = context.task_seed(pass, task.worker);
                s.spawn(move |_| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    task.render(scene, &config, &mut band, &mut rng);
                });
            }
        });

        Ok(())
    }

    /// Shut the pool down. Later calls to `perform` fail.
    pub fn join(&mut self) {
        if self.pool.take().is_some() {
            log::info!("Stopped render pool");
        }
    }
}
