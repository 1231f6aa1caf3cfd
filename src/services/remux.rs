use crate::metrics::Metrics;
use crate::services::naming::SplitPath;
use crate::state::{StateChange, StateManager};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::time::timeout;

/// Container every remux job converts into
pub const REMUX_TARGET_EXTENSION: &str = ".mp4";

/// Jobs waiting for a worker beyond this are dropped
pub const REMUX_QUEUE_CAPACITY: usize = 32;

/// Default number of jobs processed at the same time
pub const DEFAULT_REMUX_WORKERS: usize = 2;

/// Errors that can occur while remuxing
#[derive(Error, Debug)]
pub enum RemuxError {
    #[error("Source file {0} not found")]
    SourceMissing(Utf8PathBuf),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Remux of {source_path} exited with code {code}: {stderr}")]
    Failed {
        source_path: Utf8PathBuf,
        code: i32,
        stderr: String,
    },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Remux queue is full")]
    QueueFull,

    #[error("Remux queue has shut down")]
    QueueClosed,
}

/// One source → target conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxItem {
    pub source: Utf8PathBuf,
    pub target: Utf8PathBuf,
}

impl RemuxItem {
    /// Remux `source` into a sibling with the same base name and `.mp4`
    pub fn to_target_container(source: Utf8PathBuf) -> Self {
        let target = remux_target(&source);
        Self { source, target }
    }
}

/// A batch of conversions processed sequentially by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxJob {
    pub items: Vec<RemuxItem>,
}

impl RemuxJob {
    pub fn single(source: Utf8PathBuf) -> Self {
        Self {
            items: vec![RemuxItem::to_target_container(source)],
        }
    }

    pub fn batch(sources: impl IntoIterator<Item = Utf8PathBuf>) -> Self {
        Self {
            items: sources
                .into_iter()
                .map(RemuxItem::to_target_container)
                .collect(),
        }
    }
}

/// Sibling path with the target container extension
pub fn remux_target(source: &Utf8Path) -> Utf8PathBuf {
    let split = SplitPath::parse(source.as_str());
    split.path_with_extension(&split.base, REMUX_TARGET_EXTENSION)
}

/// Whether a file with `extension` has to be remuxed
pub fn needs_remux(extension: &str) -> bool {
    !extension.eq_ignore_ascii_case(REMUX_TARGET_EXTENSION)
}

/// Backend that repackages a media file into another container.
///
/// Hosts usually provide their own; [`FfmpegRemuxer`] shells out to ffmpeg.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Remux `source` into `target` without re-encoding
    ///
    /// # Errors
    /// Any failure leaves `source` untouched.
    async fn remux(&self, source: &Utf8Path, target: &Utf8Path) -> Result<(), RemuxError>;
}

/// Remuxer running `ffmpeg -i <source> -c copy <target>`
pub struct FfmpegRemuxer {
    program: String,
    timeout: Duration,
}

impl FfmpegRemuxer {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Arguments passed to ffmpeg
    pub fn build_args(source: &Utf8Path, target: &Utf8Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            source.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            target.to_string(),
        ]
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new("ffmpeg", Duration::from_secs(30 * 60))
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    async fn remux(&self, source: &Utf8Path, target: &Utf8Path) -> Result<(), RemuxError> {
        if !source.exists() {
            return Err(RemuxError::SourceMissing(source.to_path_buf()));
        }

        let child = Command::new(&self.program)
            .args(Self::build_args(source, target))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RemuxError::Timeout(self.timeout))??;

        if output.status.success() {
            Ok(())
        } else {
            Err(RemuxError::Failed {
                source_path: source.to_path_buf(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Background remux queue.
///
/// Jobs go through a bounded channel to a dispatcher task on the tokio runtime;
/// a semaphore caps how many jobs run at once. Submitting never blocks the
/// caller, which is usually the host UI thread.
pub struct RemuxQueue {
    job_tx: mpsc::Sender<RemuxJob>,

    /// Send `true` to stop dispatching and abandon remaining batch items
    cancel_tx: watch::Sender<bool>,

    metrics: Arc<Metrics>,
}

impl RemuxQueue {
    /// Start the dispatcher on `handle`
    pub fn start(
        handle: &tokio::runtime::Handle,
        remuxer: Arc<dyn Remuxer>,
        max_workers: usize,
        state: StateManager,
        metrics: Arc<Metrics>,
    ) -> Self {
        let (job_tx, mut job_rx) = mpsc::channel::<RemuxJob>(REMUX_QUEUE_CAPACITY);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
        let worker_metrics = Arc::clone(&metrics);

        handle.spawn(async move {
            tracing::debug!("Remux dispatcher started with {} workers", max_workers.max(1));

            loop {
                let job = tokio::select! {
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                    job = job_rx.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };

                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };

                let remuxer = Arc::clone(&remuxer);
                let state = state.clone();
                let metrics = Arc::clone(&worker_metrics);
                let cancel_rx = cancel_rx.clone();
                tokio::spawn(async move {
                    run_job(job, remuxer.as_ref(), &state, &metrics, &cancel_rx).await;
                    drop(permit);
                });
            }

            tracing::debug!("Remux dispatcher stopped");
        });

        Self {
            job_tx,
            cancel_tx,
            metrics,
        }
    }

    /// Queue a job without waiting for it
    pub fn submit(&self, job: RemuxJob) -> Result<(), RemuxError> {
        let files = job.items.len();
        match self.job_tx.try_send(job) {
            Ok(()) => {
                self.metrics.record_remux_queued();
                tracing::info!("Queued remux job with {} file(s)", files);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_remux_dropped();
                Err(RemuxError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_remux_dropped();
                Err(RemuxError::QueueClosed)
            }
        }
    }

    /// Stop dispatching; running batches stop after their current file
    pub fn shutdown(&self) {
        tracing::info!("Remux queue shutting down");
        self.cancel_tx.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

async fn run_job(
    job: RemuxJob,
    remuxer: &dyn Remuxer,
    state: &StateManager,
    metrics: &Metrics,
    cancel_rx: &watch::Receiver<bool>,
) {
    for item in job.items {
        if *cancel_rx.borrow() {
            tracing::info!("Remux cancelled before {}", item.source);
            break;
        }

        let start = Instant::now();
        let success = match remuxer.remux(&item.source, &item.target).await {
            Ok(()) => {
                tracing::info!(
                    "Remuxed {} -> {} in {:.2}s",
                    item.source,
                    item.target,
                    start.elapsed().as_secs_f32()
                );
                metrics.record_remux_completed();
                true
            }
            Err(e) => {
                tracing::error!("Remux of {} failed: {}", item.source, e);
                metrics.record_remux_failed();
                false
            }
        };

        state.emit(StateChange::RemuxFinished {
            target: item.target,
            success,
        });
    }
}
