//! Output subscription and per-output file bookkeeping.
//!
//! The tracker is the [`OutputEvents`] sink the host delivers signals to. Signal
//! handlers run on output threads, so they only update the file sets and push
//! the rename work onto the UI queue.
//!
//! A recording that splits files reports each new segment through
//! `file_changed`; the first file is never announced, so it is seeded from the
//! output's configured path the first time a segment arrives:
//!
//! ```text
//! file_changed(seg1) -> [initial, seg1]
//! file_changed(seg2) -> [initial, seg1, seg2]
//! stop               -> rename_files([initial, seg1, seg2])
//! ```

use super::rename::RenameOrchestrator;
use crate::host::{
    Host, OUTPUT_PATH_KEYS, OutputEvents, OutputId, OutputKind, UiQueue, is_hookable_source,
};
use crate::models::HookContext;
use crate::state::StateManager;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct OutputTracker {
    host: Arc<dyn Host>,
    state: StateManager,
    ui_queue: Arc<dyn UiQueue>,
    orchestrator: Arc<RenameOrchestrator>,

    /// Outputs whose signals are currently connected
    subscribed: Mutex<IndexMap<OutputId, OutputKind>>,

    /// Files written so far by each splitting output, in creation order
    file_sets: Mutex<IndexMap<OutputId, Vec<Utf8PathBuf>>>,

    /// Set by `teardown`; later refreshes connect nothing
    torn_down: AtomicBool,
}

impl OutputTracker {
    pub fn new(
        host: Arc<dyn Host>,
        state: StateManager,
        ui_queue: Arc<dyn UiQueue>,
        orchestrator: Arc<RenameOrchestrator>,
    ) -> Self {
        Self {
            host,
            state,
            ui_queue,
            orchestrator,
            subscribed: Mutex::new(IndexMap::new()),
            file_sets: Mutex::new(IndexMap::new()),
            torn_down: AtomicBool::new(false),
        }
    }

    /// Reconcile subscriptions with the host's current outputs.
    ///
    /// New outputs get their signals connected, outputs the host no longer
    /// lists are disconnected, known ones are left alone.
    ///
    /// Does nothing once the tracker has been torn down, so refreshes still
    /// sitting on the UI queue at unload cannot reconnect signals.
    ///
    /// # Returns
    /// The number of newly subscribed outputs
    pub fn refresh(self: &Arc<Self>) -> usize {
        if self.is_torn_down() {
            tracing::debug!("Skipping refresh after teardown");
            return 0;
        }

        let outputs = self.host.outputs();
        let events: Arc<dyn OutputEvents> = Arc::clone(self) as Arc<dyn OutputEvents>;
        let mut subscribed = self.subscribed.lock();
        if self.is_torn_down() {
            return 0;
        }
        let mut added = 0;

        for output in &outputs {
            if subscribed.contains_key(&output.id) {
                continue;
            }

            let connected = output
                .kind
                .signals()
                .iter()
                .all(|&signal| self.host.connect(output.id, signal, Arc::clone(&events)));

            if connected {
                tracing::debug!("Subscribed to {} ({:?})", output.id, output.kind);
                subscribed.insert(output.id, output.kind);
                added += 1;
            } else {
                tracing::warn!("Failed to subscribe to {}, will retry", output.id);
                for &signal in output.kind.signals() {
                    self.host.disconnect(output.id, signal);
                }
            }
        }

        let gone: Vec<(OutputId, OutputKind)> = subscribed
            .iter()
            .filter(|(id, _)| !outputs.iter().any(|o| o.id == **id))
            .map(|(id, kind)| (*id, *kind))
            .collect();
        for (id, kind) in gone {
            for &signal in kind.signals() {
                self.host.disconnect(id, signal);
            }
            subscribed.shift_remove(&id);
            tracing::debug!("Unsubscribed from vanished {}", id);
        }

        if added > 0 {
            tracing::info!("Now tracking {} output(s)", subscribed.len());
        }
        added
    }

    /// Disconnect every tracked output and forget all pending file sets.
    ///
    /// Final: the tracker never subscribes again afterwards.
    pub fn teardown(&self) {
        let mut subscribed = self.subscribed.lock();
        self.torn_down.store(true, Ordering::SeqCst);
        for (id, kind) in subscribed.drain(..) {
            for &signal in kind.signals() {
                self.host.disconnect(id, signal);
            }
        }
        self.file_sets.lock().clear();
        tracing::info!("Output subscriptions torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self, output: OutputId) -> bool {
        self.subscribed.lock().contains_key(&output)
    }

    pub fn subscribed_count(&self) -> usize {
        self.subscribed.lock().len()
    }

    /// Files recorded so far for `output`
    pub fn pending_files(&self, output: OutputId) -> Vec<Utf8PathBuf> {
        self.file_sets
            .lock()
            .get(&output)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a new segment, seeding the set with the configured path first
    pub fn record_segment(&self, output: OutputId, next_file: &str) {
        let mut file_sets = self.file_sets.lock();
        let files = file_sets.entry(output).or_insert_with(|| {
            let seed: Vec<Utf8PathBuf> = self.configured_path(output).into_iter().collect();
            tracing::debug!("Started file set for {} with {:?}", output, seed);
            seed
        });

        if next_file.is_empty() {
            tracing::debug!("{} reported a file change without a file", output);
            return;
        }

        let next = Utf8PathBuf::from(next_file);
        if !files.contains(&next) {
            files.push(next);
        }
    }

    /// Remove and return the file set of `output`
    pub fn take_files(&self, output: OutputId) -> Vec<Utf8PathBuf> {
        self.file_sets
            .lock()
            .shift_remove(&output)
            .unwrap_or_default()
    }

    /// First non-empty, existing `path`/`url` setting of the output
    fn configured_path(&self, output: OutputId) -> Option<Utf8PathBuf> {
        OUTPUT_PATH_KEYS
            .iter()
            .filter_map(|key| self.host.output_setting(output, key))
            .filter(|value| !value.is_empty())
            .map(Utf8PathBuf::from)
            .find(|path| path.exists())
    }

    fn queue_single(&self, path: Utf8PathBuf) {
        let orchestrator = Arc::clone(&self.orchestrator);
        self.ui_queue
            .queue(Box::new(move || orchestrator.process_file(&path)));
    }

    fn queue_multi(&self, paths: Vec<Utf8PathBuf>) {
        let orchestrator = Arc::clone(&self.orchestrator);
        self.ui_queue
            .queue(Box::new(move || orchestrator.process_files(&paths)));
    }
}

impl OutputEvents for OutputTracker {
    fn on_file_segment(&self, output: OutputId, next_file: &str) {
        if !self.state.read(|s| s.config.rename_on_record_stop) {
            return;
        }
        self.record_segment(output, next_file);
    }

    fn on_output_stopped(&self, output: OutputId) {
        let files = self.take_files(output);

        if !self.state.read(|s| s.config.rename_on_record_stop) {
            return;
        }

        if !files.is_empty() {
            tracing::debug!("{} stopped after {} file(s)", output, files.len());
            self.queue_multi(files);
            return;
        }

        match self.configured_path(output) {
            Some(path) => self.queue_single(path),
            None => tracing::debug!("{} stopped without an existing output file", output),
        }
    }

    fn on_replay_saved(&self, output: OutputId) {
        if !self.state.read(|s| s.config.rename_on_replay_save) {
            return;
        }

        match self.host.last_replay_path(output) {
            Some(path) if !path.is_empty() => self.queue_single(Utf8PathBuf::from(path)),
            _ => tracing::debug!("{} saved a replay without a path", output),
        }
    }

    fn on_source_hooked(&self, source_type: &str, hook: HookContext) {
        if !is_hookable_source(source_type) {
            return;
        }
        tracing::debug!("Hooked {:?} ({})", hook.title, hook.executable);
        self.state.set_hook_context(hook);
    }
}
