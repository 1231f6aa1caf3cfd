// Plugin context - wires the rename engine to a host
//
// RecordRename owns every long-lived component:
// - StateManager (settings, vendor slot, hook context)
// - ConfigManager (profile persistence)
// - OutputTracker / RenameOrchestrator (signal handling and renaming)
// - RemuxQueue (background remux workers)
// - the reconciliation timer that keeps output subscriptions current
//
// Host glue creates it once with `init`, forwards frontend events, menu
// activations and vendor requests, and calls `shutdown` on unload.

use crate::config::ConfigManager;
use crate::host::{FrontendEvent, Host, NamePrompt, UiQueue};
use crate::metrics::Metrics;
use crate::models::{MAX_NAME_CHARS, RenameConfig};
use crate::services::naming::{EXECUTABLE_TOKEN, TITLE_TOKEN};
use crate::services::{
    DEFAULT_REMUX_WORKERS, FilenameExpander, OutputTracker, PatternFormatter, RemuxQueue,
    RenameOrchestrator, Remuxer, VendorHandler,
};
use crate::state::StateManager;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};

/// How often output subscriptions are reconciled with the host
pub const RECONCILE_INTERVAL: Duration = Duration::from_secs(10);

/// Title of the filename format editor
pub const FILENAME_FORMAT_TITLE: &str = "Filename Format";

/// Tokens offered as completions in the filename format editor
pub const FORMAT_COMPLETIONS: [&str; 10] = [
    TITLE_TOKEN,
    EXECUTABLE_TOKEN,
    "%CCYY",
    "%YY",
    "%MM",
    "%DD",
    "%hh",
    "%mm",
    "%ss",
    "%%",
];

/// Host capabilities the plugin is built on
#[derive(Clone)]
pub struct HostServices {
    pub host: Arc<dyn Host>,
    pub ui_queue: Arc<dyn UiQueue>,
    pub prompt: Arc<dyn NamePrompt>,
    pub remuxer: Arc<dyn Remuxer>,
    pub expander: Arc<dyn FilenameExpander>,
}

#[derive(Debug, Clone)]
pub struct PluginOptions {
    /// Directory holding `record-rename.yaml`
    pub config_dir: Utf8PathBuf,

    pub remux_workers: usize,

    pub reconcile_interval: Duration,
}

impl PluginOptions {
    pub fn new(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            remux_workers: DEFAULT_REMUX_WORKERS,
            reconcile_interval: RECONCILE_INTERVAL,
        }
    }
}

/// Entries of the plugin's tools menu
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    ToggleRecord,
    ToggleReplay,
    ToggleConfirm,
    ToggleAutoRemux,
    EditFilenameFormat,
}

impl MenuAction {
    pub const ALL: [MenuAction; 5] = [
        MenuAction::ToggleRecord,
        MenuAction::ToggleReplay,
        MenuAction::ToggleConfirm,
        MenuAction::ToggleAutoRemux,
        MenuAction::EditFilenameFormat,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::ToggleRecord => "Record",
            MenuAction::ToggleReplay => "Replay Buffer",
            MenuAction::ToggleConfirm => "Confirm",
            MenuAction::ToggleAutoRemux => "Auto Remux",
            MenuAction::EditFilenameFormat => "Filename Format",
        }
    }

    /// Checked state for toggles, `None` for plain actions
    fn checked(self, config: &RenameConfig) -> Option<bool> {
        match self {
            MenuAction::ToggleRecord => Some(config.rename_on_record_stop),
            MenuAction::ToggleReplay => Some(config.rename_on_replay_save),
            MenuAction::ToggleConfirm => Some(config.prompt_user),
            MenuAction::ToggleAutoRemux => Some(config.auto_remux),
            MenuAction::EditFilenameFormat => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub action: MenuAction,
    pub label: &'static str,
    pub checked: Option<bool>,
}

/// The loaded plugin.
///
/// # Example
/// ```ignore
/// let runtime = tokio::runtime::Runtime::new()?;
/// let plugin = RecordRename::init(services, PluginOptions::new(profile_dir), runtime.handle())?;
///
/// plugin.on_frontend_event(FrontendEvent::FinishedLoading);
/// plugin.vendor_request("set_filename", json!({"filename": "%TITLE"}));
///
/// plugin.shutdown();
/// ```
pub struct RecordRename {
    state: StateManager,
    config_manager: ConfigManager,
    prompt: Arc<dyn NamePrompt>,
    ui_queue: Arc<dyn UiQueue>,
    tracker: Arc<OutputTracker>,
    orchestrator: Arc<RenameOrchestrator>,
    remux: Arc<RemuxQueue>,
    vendor: VendorHandler,
    metrics: Arc<Metrics>,

    /// Send `true` to stop the reconciliation timer
    cancel_tx: watch::Sender<bool>,
}

impl RecordRename {
    /// Load settings, subscribe to outputs and start the background tasks.
    ///
    /// # Errors
    /// Fails only if the configuration directory cannot be created. A broken
    /// profile file falls back to defaults.
    pub fn init(
        services: HostServices,
        options: PluginOptions,
        runtime: &tokio::runtime::Handle,
    ) -> Result<Arc<Self>> {
        let config_manager = ConfigManager::new(&options.config_dir)
            .with_context(|| format!("Failed to open config directory {}", options.config_dir))?;

        let state = StateManager::new();
        state.load_from_config(&load_or_default(&config_manager));

        let metrics = Arc::new(Metrics::new());
        let remux = Arc::new(RemuxQueue::start(
            runtime,
            services.remuxer,
            options.remux_workers,
            state.clone(),
            Arc::clone(&metrics),
        ));

        let orchestrator = Arc::new(RenameOrchestrator::new(
            state.clone(),
            Arc::clone(&services.host),
            PatternFormatter::new(services.expander),
            Arc::clone(&services.prompt),
            Some(Arc::clone(&remux)),
            Arc::clone(&metrics),
        ));

        let tracker = Arc::new(OutputTracker::new(
            services.host,
            state.clone(),
            Arc::clone(&services.ui_queue),
            Arc::clone(&orchestrator),
        ));

        let (cancel_tx, _) = watch::channel(false);

        let plugin = Arc::new(Self {
            vendor: VendorHandler::new(state.clone(), Arc::clone(&metrics)),
            state,
            config_manager,
            prompt: services.prompt,
            ui_queue: services.ui_queue,
            tracker,
            orchestrator,
            remux,
            metrics,
            cancel_tx,
        });

        plugin.tracker.refresh();
        plugin.spawn_reconciler(runtime, options.reconcile_interval);

        tracing::info!("{} v{} loaded", crate::APP_NAME, crate::VERSION);
        Ok(plugin)
    }

    /// Periodically re-subscribe so outputs created later are picked up
    fn spawn_reconciler(&self, runtime: &tokio::runtime::Handle, period: Duration) {
        let mut cancel_rx = self.cancel_tx.subscribe();
        let tracker = Arc::clone(&self.tracker);
        let ui_queue = Arc::clone(&self.ui_queue);

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let tracker = Arc::clone(&tracker);
                        ui_queue.queue(Box::new(move || {
                            tracker.refresh();
                        }));
                    }
                }
            }

            tracing::debug!("Output reconciliation stopped");
        });
    }

    pub fn on_frontend_event(&self, event: FrontendEvent) {
        if self.is_shut_down() {
            tracing::debug!("Ignoring frontend event after shutdown: {:?}", event);
            return;
        }

        tracing::debug!("Frontend event: {:?}", event);
        match event {
            FrontendEvent::RecordingStarted | FrontendEvent::ReplayBufferStarted => {
                self.tracker.refresh();
            }
            FrontendEvent::ProfileChanged | FrontendEvent::FinishedLoading => self.reconfigure(),
        }
    }

    /// Re-read the profile file into state and refresh subscriptions
    pub fn reconfigure(&self) {
        self.state
            .load_from_config(&load_or_default(&self.config_manager));
        self.tracker.refresh();
    }

    /// Menu entries with the current checked state
    pub fn menu(&self) -> Vec<MenuItem> {
        let config = self.state.config();
        MenuAction::ALL
            .iter()
            .map(|&action| MenuItem {
                action,
                label: action.label(),
                checked: action.checked(&config),
            })
            .collect()
    }

    /// Run a menu entry. Toggles are persisted immediately.
    pub fn activate(&self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::ToggleRecord => {
                self.toggle(|c| c.rename_on_record_stop = !c.rename_on_record_stop)
            }
            MenuAction::ToggleReplay => {
                self.toggle(|c| c.rename_on_replay_save = !c.rename_on_replay_save)
            }
            MenuAction::ToggleConfirm => self.toggle(|c| c.prompt_user = !c.prompt_user),
            MenuAction::ToggleAutoRemux => self.toggle(|c| c.auto_remux = !c.auto_remux),
            MenuAction::EditFilenameFormat => self.edit_filename_format().map(|_| ()),
        }
    }

    fn toggle<F>(&self, toggle_fn: F) -> Result<()>
    where
        F: FnOnce(&mut RenameConfig),
    {
        self.state.update_settings(toggle_fn);
        self.persist()
    }

    /// Ask for a new persistent pattern, pre-filled with the current one.
    ///
    /// # Returns
    /// Whether a new pattern was accepted
    pub fn edit_filename_format(&self) -> Result<bool> {
        let current = self.state.read(|s| s.config.filename_format.clone());

        let Some(answer) = self.prompt.prompt_for_name(FILENAME_FORMAT_TITLE, &current) else {
            return Ok(false);
        };

        let pattern: String = answer.chars().take(MAX_NAME_CHARS).collect();
        self.set_filename_format(pattern)?;
        Ok(true)
    }

    /// Replace the persistent pattern. An empty pattern disables it.
    pub fn set_filename_format(&self, pattern: String) -> Result<()> {
        tracing::info!("Filename format set to {:?}", pattern);
        self.state
            .update_settings(|c| c.filename_format = pattern);
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let config = self.state.config();
        self.config_manager
            .save_rename_config(&config)
            .inspect_err(|e| tracing::error!("Failed to save settings: {:#}", e))
    }

    /// Handle a request addressed to this plugin's vendor
    pub fn vendor_request(&self, request: &str, data: Value) -> Value {
        self.vendor.dispatch(request, data)
    }

    /// Stop background work and disconnect from every output
    pub fn shutdown(&self) {
        if self.cancel_tx.send_replace(true) {
            return;
        }

        self.tracker.teardown();
        self.remux.shutdown();
        self.metrics.log_summary();
        tracing::info!("{} unloaded", crate::APP_NAME);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn tracker(&self) -> &Arc<OutputTracker> {
        &self.tracker
    }

    pub fn orchestrator(&self) -> &Arc<RenameOrchestrator> {
        &self.orchestrator
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn config_path(&self) -> &Utf8Path {
        self.config_manager.profile_path()
    }
}

fn load_or_default(config_manager: &ConfigManager) -> RenameConfig {
    config_manager.load_rename_config().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings, using defaults: {:#}", e);
        RenameConfig::default()
    })
}
