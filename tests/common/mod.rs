//! Shared fakes for the integration tests
//!
//! - `FakeHost`: in-memory outputs, settings and signal routing
//! - `ScriptedPrompt`: canned prompt answers, records what was shown
//! - `InlineUiQueue`: runs UI tasks on the calling thread
//! - `RecordingRemuxer`: writes the target file and records each call

#![allow(dead_code)]

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use record_rename::host::{
    Host, NamePrompt, OutputEvents, OutputId, OutputInfo, OutputKind, OutputSignal, UiQueue,
    UiTask,
};
use record_rename::services::{FilenameExpander, RemuxError, Remuxer};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

#[derive(Default)]
pub struct FakeHost {
    outputs: Mutex<Vec<OutputInfo>>,
    settings: Mutex<HashMap<(OutputId, String), String>>,
    last_replay: Mutex<HashMap<OutputId, String>>,
    auto_remux: AtomicBool,
    connections: Mutex<HashMap<(OutputId, OutputSignal), Arc<dyn OutputEvents>>>,
    refused: Mutex<HashSet<OutputId>>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_output(&self, id: u64, kind: OutputKind) -> OutputId {
        let id = OutputId(id);
        self.outputs.lock().push(OutputInfo { id, kind });
        id
    }

    pub fn remove_output(&self, id: OutputId) {
        self.outputs.lock().retain(|o| o.id != id);
    }

    pub fn set_setting(&self, id: OutputId, key: &str, value: &str) {
        self.settings
            .lock()
            .insert((id, key.to_string()), value.to_string());
    }

    pub fn set_last_replay(&self, id: OutputId, path: &Utf8Path) {
        self.last_replay.lock().insert(id, path.to_string());
    }

    pub fn set_auto_remux(&self, enabled: bool) {
        self.auto_remux.store(enabled, Ordering::SeqCst);
    }

    /// Make `connect` fail for this output
    pub fn refuse(&self, id: OutputId) {
        self.refused.lock().insert(id);
    }

    pub fn is_connected(&self, id: OutputId, signal: OutputSignal) -> bool {
        self.connections.lock().contains_key(&(id, signal))
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn handler(&self, id: OutputId, signal: OutputSignal) -> Option<Arc<dyn OutputEvents>> {
        self.connections.lock().get(&(id, signal)).cloned()
    }

    pub fn fire_file_changed(&self, id: OutputId, next_file: &Utf8Path) {
        if let Some(events) = self.handler(id, OutputSignal::FileChanged) {
            events.on_file_segment(id, next_file.as_str());
        }
    }

    pub fn fire_stop(&self, id: OutputId) {
        if let Some(events) = self.handler(id, OutputSignal::Stop) {
            events.on_output_stopped(id);
        }
    }

    pub fn fire_saved(&self, id: OutputId) {
        if let Some(events) = self.handler(id, OutputSignal::Saved) {
            events.on_replay_saved(id);
        }
    }
}

impl Host for FakeHost {
    fn outputs(&self) -> Vec<OutputInfo> {
        self.outputs.lock().clone()
    }

    fn connect(
        &self,
        output: OutputId,
        signal: OutputSignal,
        events: Arc<dyn OutputEvents>,
    ) -> bool {
        if self.refused.lock().contains(&output) {
            return false;
        }
        self.connections.lock().insert((output, signal), events);
        true
    }

    fn disconnect(&self, output: OutputId, signal: OutputSignal) {
        self.connections.lock().remove(&(output, signal));
    }

    fn output_setting(&self, output: OutputId, key: &str) -> Option<String> {
        self.settings.lock().get(&(output, key.to_string())).cloned()
    }

    fn last_replay_path(&self, output: OutputId) -> Option<String> {
        self.last_replay.lock().get(&output).cloned()
    }

    fn auto_remux_on_stop(&self) -> bool {
        self.auto_remux.load(Ordering::SeqCst)
    }
}

/// Prompt that replays canned answers; runs out as "cancel"
#[derive(Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    shown: Mutex<Vec<(String, String)>>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(String::from)).collect()),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, answer: Option<&str>) {
        self.answers.lock().push_back(answer.map(String::from));
    }

    /// `(title, initial)` of every prompt shown so far
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().clone()
    }
}

impl NamePrompt for ScriptedPrompt {
    fn prompt_for_name(&self, title: &str, initial: &str) -> Option<String> {
        self.shown
            .lock()
            .push((title.to_string(), initial.to_string()));
        self.answers.lock().pop_front().flatten()
    }
}

/// Runs every task immediately
pub struct InlineUiQueue;

impl UiQueue for InlineUiQueue {
    fn queue(&self, task: UiTask) {
        task();
    }
}

/// Leaves patterns untouched apart from the hook tokens
pub struct IdentityExpander;

impl FilenameExpander for IdentityExpander {
    fn expand(&self, format: &str) -> String {
        format.to_string()
    }
}

/// Remuxer that copies the source and records each conversion
#[derive(Default)]
pub struct RecordingRemuxer {
    calls: Mutex<Vec<(Utf8PathBuf, Utf8PathBuf)>>,
    fail: AtomicBool,
}

impl RecordingRemuxer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let remuxer = Self::default();
        remuxer.fail.store(true, Ordering::SeqCst);
        Arc::new(remuxer)
    }

    pub fn calls(&self) -> Vec<(Utf8PathBuf, Utf8PathBuf)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Remuxer for RecordingRemuxer {
    async fn remux(&self, source: &Utf8Path, target: &Utf8Path) -> Result<(), RemuxError> {
        self.calls
            .lock()
            .push((source.to_path_buf(), target.to_path_buf()));

        if self.fail.load(Ordering::SeqCst) {
            return Err(RemuxError::Failed {
                source_path: source.to_path_buf(),
                code: 1,
                stderr: "simulated failure".to_string(),
            });
        }

        fs::copy(source, target)?;
        Ok(())
    }
}

/// Temporary directory as a UTF-8 path
pub fn utf8_dir(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("temp dir is not UTF-8")
}

/// Create `name` in `dir` with some content
pub fn touch(dir: &Utf8Path, name: &str) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, name.as_bytes()).expect("failed to create test file");
    path
}

/// Sorted file names in `dir`
pub fn file_names(dir: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("failed to read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().into_string().ok())
        .collect();
    names.sort();
    names
}
