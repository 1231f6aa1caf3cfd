// State management module
//
// This module provides the StateManager which wraps RenameState with thread-safe access
// and emits change events for interested listeners (menu sync, tests, diagnostics).

use crate::models::{HookContext, RenameConfig, RenameSnapshot, RenameState, VendorPattern};
use camino::Utf8PathBuf;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change events emitted when state is modified or the engine acts on a file
#[derive(Clone, Debug, PartialEq)]
pub enum StateChange {
    /// One of the `RecordRename` settings changed
    SettingsChanged,

    /// A remote controller supplied the next filename pattern
    VendorPatternSet { force: bool },

    /// The one-shot vendor pattern was taken by a rename decision
    VendorPatternConsumed,

    /// A game/window capture hooked a new window
    HookUpdated { title: String, executable: String },

    /// A file was moved to its new name
    FileRenamed { from: Utf8PathBuf, to: Utf8PathBuf },

    /// A rename event was dropped without touching the file
    RenameSkipped { path: Utf8PathBuf, reason: String },

    /// A remux batch was handed to the worker queue
    RemuxQueued { files: usize },

    /// A single remux finished
    RemuxFinished { target: Utf8PathBuf, success: bool },
}

/// Thread-safe state manager with event emission
///
/// This is the application context shared by every component:
/// - Provides thread-safe access to [`RenameState`]
/// - Detects settings changes and emits [`StateChange`] events
/// - Hands out consistent [`RenameSnapshot`]s to rename decisions
///
/// # Usage
///
/// - [`read()`](Self::read) for reading state
/// - [`update()`](Self::update) for mutations with automatic event emission
/// - [`subscribe()`](Self::subscribe) for listening to state changes
pub struct StateManager {
    state: Arc<RwLock<RenameState>>,

    /// Broadcast channel for emitting state change events
    state_tx: broadcast::Sender<StateChange>,
}

impl StateManager {
    /// Create a new StateManager with default state
    ///
    /// The broadcast channel buffers 100 events; slow subscribers lag rather
    /// than block the emitter.
    pub fn new() -> Self {
        let (state_tx, _) = broadcast::channel(100);
        Self {
            state: Arc::new(RwLock::new(RenameState::default())),
            state_tx,
        }
    }

    /// Clone of the whole state
    pub fn snapshot(&self) -> RenameState {
        self.state.read().clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let prompt = state_manager.read(|state| state.config.prompt_user);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&RenameState) -> R,
    {
        let state = self.state.read();
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// # Returns
    /// The StateChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut RenameState),
    {
        let changes = {
            let mut state = self.state.write();
            let old_state = state.clone();
            update_fn(&mut state);
            Self::detect_changes(&old_state, &state)
        };

        for change in &changes {
            self.emit(change.clone());
        }

        changes
    }

    /// Subscribe to state change events
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state_tx.subscribe()
    }

    /// Broadcast an event that is not derived from a state diff
    pub fn emit(&self, change: StateChange) {
        // Ignore send errors - it's OK if no one is listening
        let _ = self.state_tx.send(change);
    }

    fn detect_changes(old: &RenameState, new: &RenameState) -> Vec<StateChange> {
        let mut changes = Vec::new();

        if old.config != new.config {
            changes.push(StateChange::SettingsChanged);
        }

        match (&old.vendor, &new.vendor) {
            (_, Some(vendor)) if old.vendor.as_ref() != Some(vendor) => {
                changes.push(StateChange::VendorPatternSet {
                    force: vendor.force,
                });
            }
            (Some(_), None) => changes.push(StateChange::VendorPatternConsumed),
            _ => {}
        }

        if old.hook != new.hook {
            changes.push(StateChange::HookUpdated {
                title: new.hook.title.clone(),
                executable: new.hook.executable.clone(),
            });
        }

        changes
    }

    // Convenience methods for common state updates

    /// Current settings
    pub fn config(&self) -> RenameConfig {
        self.read(|state| state.config.clone())
    }

    /// Replace the settings wholesale (profile load / profile change)
    pub fn load_from_config(&self, config: &RenameConfig) -> Vec<StateChange> {
        self.update(|state| {
            state.config = config.clone();

            tracing::info!(
                "Loaded settings: record={}, replay={}, confirm={}, auto_remux={}, format={:?}",
                config.rename_on_record_stop,
                config.rename_on_replay_save,
                config.prompt_user,
                config.auto_remux,
                config.filename_format
            );
        })
    }

    /// Update settings
    pub fn update_settings<F>(&self, settings_fn: F) -> Vec<StateChange>
    where
        F: FnOnce(&mut RenameConfig),
    {
        self.update(|state| settings_fn(&mut state.config))
    }

    /// Store the one-shot vendor pattern
    pub fn set_vendor_pattern(&self, pattern: String, force: bool) -> Vec<StateChange> {
        self.update(|state| {
            state.vendor = Some(VendorPattern { pattern, force });
        })
    }

    /// Replace the hook context with the most recent hooked window
    pub fn set_hook_context(&self, hook: HookContext) -> Vec<StateChange> {
        self.update(|state| state.hook = hook)
    }

    /// Take the snapshot for a rename decision, consuming the vendor slot
    pub fn begin_decision(&self) -> RenameSnapshot {
        let snapshot = self.state.write().begin_decision();
        if snapshot.vendor.is_some() {
            self.emit(StateChange::VendorPatternConsumed);
        }
        snapshot
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

// Make StateManager cloneable for sharing across threads
impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
