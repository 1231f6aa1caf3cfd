//! Rename decisions for finished recordings and saved replays.
//!
//! [`RenameOrchestrator`] runs on the UI thread. A single file is renamed to
//! the formatted pattern, or to whatever the user types into the prompt. A
//! split recording is renamed as a set that shares one base name:
//!
//! ```text
//! [rec.mkv, rec_1.mkv] -> "Run" -> [Run (1).mkv, Run (2).mkv]
//! ```
//!
//! Each decision consumes the one-shot vendor pattern. With auto-remux enabled the
//! final paths are handed to the [`RemuxQueue`].

use super::collision::{self, NameRequest, multi_file_title};
use super::naming::{PatternFormatter, SplitPath};
use super::remux::{RemuxJob, RemuxQueue, needs_remux};
use crate::host::{Host, NamePrompt};
use crate::metrics::Metrics;
use crate::state::{StateChange, StateManager};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::Arc;
use thiserror::Error;

/// Reasons a rename event is not carried out
#[derive(Error, Debug)]
pub enum RenameError {
    #[error("Host AutoRemux is enabled")]
    HostAutoRemux,

    #[error("File not found: {0}")]
    FileNotFound(Utf8PathBuf),

    #[error("No files recorded for output")]
    EmptyFileSet,

    #[error("Failed to rename {from} to {to}: {source}")]
    RenameFailed {
        from: Utf8PathBuf,
        to: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The name chosen for one rename event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDecision {
    pub folder: String,
    pub original_base: String,
    pub resolved_base: String,
    pub extension: String,
    pub force: bool,
}

impl RenameDecision {
    pub fn is_renamed(&self) -> bool {
        self.resolved_base != self.original_base
    }
}

/// What a rename event ended up doing
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub decision: RenameDecision,

    /// Successful moves, in the order they happened
    pub renamed: Vec<(Utf8PathBuf, Utf8PathBuf)>,

    /// Moves that failed; those files keep their original name
    pub failed: Vec<Utf8PathBuf>,

    /// Job handed to the remux queue, if any
    pub remux: Option<RemuxJob>,
}

impl RenameOutcome {
    fn new(decision: RenameDecision) -> Self {
        Self {
            decision,
            renamed: Vec::new(),
            failed: Vec::new(),
            remux: None,
        }
    }
}

/// Decides the final name of finished recordings and moves them there.
///
/// Runs on the host UI thread: it may block in the modal [`NamePrompt`].
pub struct RenameOrchestrator {
    state: StateManager,
    host: Arc<dyn Host>,
    formatter: PatternFormatter,
    prompt: Arc<dyn NamePrompt>,
    remux: Option<Arc<RemuxQueue>>,
    metrics: Arc<Metrics>,
}

impl RenameOrchestrator {
    /// # Arguments
    /// * `remux` - Queue for auto-remux jobs; `None` disables remuxing
    pub fn new(
        state: StateManager,
        host: Arc<dyn Host>,
        formatter: PatternFormatter,
        prompt: Arc<dyn NamePrompt>,
        remux: Option<Arc<RemuxQueue>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            state,
            host,
            formatter,
            prompt,
            remux,
            metrics,
        }
    }

    /// Rename one finished file (plain recording or replay save).
    pub fn rename_file(&self, path: &Utf8Path) -> Result<RenameOutcome, RenameError> {
        if self.host.auto_remux_on_stop() {
            return Err(RenameError::HostAutoRemux);
        }
        if !path.exists() {
            return Err(RenameError::FileNotFound(path.to_path_buf()));
        }

        let split = SplitPath::parse(path.as_str());
        let request = NameRequest::single(&split, path);
        let (decision, auto_remux) = self.decide(&split, &request);
        let mut outcome = RenameOutcome::new(decision);

        let mut final_path = path.to_path_buf();
        if outcome.decision.is_renamed() {
            let target = split.path_for(&outcome.decision.resolved_base);
            match self.move_file(path, &target) {
                Ok(()) => {
                    outcome.renamed.push((path.to_path_buf(), target.clone()));
                    final_path = target;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    outcome.failed.push(path.to_path_buf());
                }
            }
        }

        if auto_remux && needs_remux(&split.extension) {
            outcome.remux = self.submit_remux(RemuxJob::single(final_path));
        }

        Ok(outcome)
    }

    /// Rename every file of a split recording as `base (N)ext`.
    ///
    /// The name is decided once, from the first file.
    pub fn rename_files(&self, paths: &[Utf8PathBuf]) -> Result<RenameOutcome, RenameError> {
        let first = paths.first().ok_or(RenameError::EmptyFileSet)?;
        if self.host.auto_remux_on_stop() {
            return Err(RenameError::HostAutoRemux);
        }

        let split = SplitPath::parse(first.as_str());
        let title = multi_file_title(paths.len());
        let request = NameRequest::multi(&split, first, &title);
        let (decision, auto_remux) = self.decide(&split, &request);
        let mut outcome = RenameOutcome::new(decision);

        let mut final_paths = Vec::with_capacity(paths.len());
        for (i, source) in paths.iter().enumerate() {
            if !outcome.decision.is_renamed() {
                final_paths.push(source.clone());
                continue;
            }

            let target = split.indexed_path(&outcome.decision.resolved_base, i + 1);
            if target == *source {
                final_paths.push(target);
                continue;
            }

            match self.move_file(source, &target) {
                Ok(()) => {
                    outcome.renamed.push((source.clone(), target.clone()));
                    final_paths.push(target);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    outcome.failed.push(source.clone());
                    final_paths.push(source.clone());
                }
            }
        }

        if auto_remux && needs_remux(&split.extension) {
            outcome.remux = self.submit_remux(RemuxJob::batch(final_paths));
        }

        Ok(outcome)
    }

    /// Rename one file, logging instead of returning failures
    pub fn process_file(&self, path: &Utf8Path) {
        let result = self.rename_file(path);
        self.report(path, result);
    }

    /// Rename a split recording, logging instead of returning failures
    pub fn process_files(&self, paths: &[Utf8PathBuf]) {
        let Some(first) = paths.first() else {
            tracing::debug!("Output stopped without recorded files");
            return;
        };
        let result = self.rename_files(paths);
        self.report(first, result);
    }

    fn report(&self, path: &Utf8Path, result: Result<RenameOutcome, RenameError>) {
        match result {
            Ok(outcome) => {
                if outcome.renamed.is_empty() {
                    tracing::debug!("Kept name of {}", path);
                }
            }
            Err(RenameError::HostAutoRemux) => {
                tracing::info!("AutoRemux is enabled, skipping rename.");
                self.skip(path, "host auto remux");
            }
            Err(RenameError::FileNotFound(missing)) => {
                tracing::error!("File not found: {}", missing);
                self.skip(path, "file not found");
            }
            Err(e) => {
                tracing::warn!("Rename of {} skipped: {}", path, e);
                self.skip(path, &e.to_string());
            }
        }
    }

    fn skip(&self, path: &Utf8Path, reason: &str) {
        self.metrics.record_rename_skipped();
        self.state.emit(StateChange::RenameSkipped {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        });
    }

    /// Pick the final base name. Consumes the vendor pattern.
    ///
    /// # Returns
    /// The decision and whether auto-remux is enabled for this event
    fn decide(&self, split: &SplitPath, request: &NameRequest<'_>) -> (RenameDecision, bool) {
        let snapshot = self.state.begin_decision();

        let (candidate, force) = match snapshot.active_pattern() {
            Some((pattern, force)) => (
                self.formatter.format(pattern, &snapshot.hook, &split.base),
                force,
            ),
            None => (split.base.clone(), false),
        };

        let exists = |p: &Utf8Path| p.exists();
        let resolved_base = if force && !request.collides(&candidate, &exists) {
            tracing::debug!("Forced name {:?} is free, not prompting", candidate);
            candidate
        } else if snapshot.config.prompt_user {
            self.metrics.record_prompt_shown();
            collision::prompt_for_name(request, candidate, &exists, self.prompt.as_ref())
        } else {
            candidate
        };

        let decision = RenameDecision {
            folder: split.folder.clone(),
            original_base: split.base.clone(),
            resolved_base,
            extension: split.extension.clone(),
            force,
        };
        (decision, snapshot.config.auto_remux)
    }

    /// Create the target's folder chain and move the file.
    fn move_file(&self, from: &Utf8Path, to: &Utf8Path) -> Result<(), RenameError> {
        if let Some(parent) = to.parent().filter(|p| !p.as_str().is_empty()) {
            // A failure here surfaces as a rename failure below
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!("Failed to create directory {}: {}", parent, e);
            }
        }

        match fs::rename(from, to) {
            Ok(()) => {
                tracing::info!("Renamed {} to {}", from, to);
                self.metrics.record_file_renamed();
                self.state.emit(StateChange::FileRenamed {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                });
                Ok(())
            }
            Err(source) => {
                self.metrics.record_rename_failed();
                Err(RenameError::RenameFailed {
                    from: from.to_path_buf(),
                    to: to.to_path_buf(),
                    source,
                })
            }
        }
    }

    fn submit_remux(&self, job: RemuxJob) -> Option<RemuxJob> {
        let Some(queue) = &self.remux else {
            tracing::warn!("Auto remux is enabled but no remux queue is running");
            return None;
        };

        let files = job.items.len();
        match queue.submit(job.clone()) {
            Ok(()) => {
                self.state.emit(StateChange::RemuxQueued { files });
                Some(job)
            }
            Err(e) => {
                tracing::warn!("Remux job dropped: {}", e);
                None
            }
        }
    }
}
