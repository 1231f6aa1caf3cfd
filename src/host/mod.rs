//! Host integration surface.
//!
//! Everything the engine needs from the media-production host is expressed as a
//! trait here, so the engine itself never touches FFI handles:
//!
//! - [`Host`]: output enumeration, signal (dis)connection, settings queries
//! - [`OutputEvents`]: the callbacks the host delivers for connected signals
//! - [`NamePrompt`]: modal "ask the operator for a string" capability
//! - [`UiQueue`]: marshals work onto the host's UI thread
//!
//! [`bridge::ChannelUiQueue`] is a channel-backed [`UiQueue`] for hosts (and
//! tests) that drain UI work themselves.

pub mod bridge;

pub use bridge::{ChannelUiQueue, UiTaskReceiver};

use crate::models::HookContext;
use std::fmt;
use std::sync::Arc;

/// Host output id used for replay buffer outputs.
pub const REPLAY_BUFFER_OUTPUT_ID: &str = "replay_buffer";

/// Source types whose `hooked` signal feeds `%TITLE` / `%EXECUTABLE`.
pub const HOOKABLE_SOURCE_TYPES: [&str; 2] = ["game_capture", "window_capture"];

/// Settings keys holding an output's target file, in lookup order.
pub const OUTPUT_PATH_KEYS: [&str; 2] = ["path", "url"];

/// Opaque identity of a host output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(pub u64);

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "output#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Recording,
    ReplayBuffer,
}

impl OutputKind {
    /// Classify an output by its host type id.
    pub fn from_host_id(id: &str) -> Self {
        if id == REPLAY_BUFFER_OUTPUT_ID {
            OutputKind::ReplayBuffer
        } else {
            OutputKind::Recording
        }
    }

    /// Signals the engine listens to for this kind of output.
    pub fn signals(self) -> &'static [OutputSignal] {
        match self {
            OutputKind::ReplayBuffer => &[OutputSignal::Saved],
            OutputKind::Recording => &[OutputSignal::Stop, OutputSignal::FileChanged],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputSignal {
    Stop,
    FileChanged,
    Saved,
}

impl OutputSignal {
    /// Host signal name
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSignal::Stop => "stop",
            OutputSignal::FileChanged => "file_changed",
            OutputSignal::Saved => "saved",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputInfo {
    pub id: OutputId,
    pub kind: OutputKind,
}

/// Frontend lifecycle events the plugin reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrontendEvent {
    RecordingStarted,
    ReplayBufferStarted,
    ProfileChanged,
    FinishedLoading,
}

/// Signal callbacks delivered by the host.
///
/// Called from arbitrary host threads. Implementations must only capture data
/// and queue UI work.
pub trait OutputEvents: Send + Sync {
    /// A recording output started writing `next_file` (file splitting)
    fn on_file_segment(&self, output: OutputId, next_file: &str);

    /// A recording output stopped
    fn on_output_stopped(&self, output: OutputId);

    /// A replay buffer saved a clip
    fn on_replay_saved(&self, output: OutputId);

    /// A capture source hooked a window
    fn on_source_hooked(&self, source_type: &str, hook: HookContext);
}

/// Access to host outputs and profile-level settings.
pub trait Host: Send + Sync {
    /// All outputs the host currently knows about
    fn outputs(&self) -> Vec<OutputInfo>;

    /// Route `signal` of `output` to `events`. Returns false if the output is gone.
    fn connect(&self, output: OutputId, signal: OutputSignal, events: Arc<dyn OutputEvents>)
    -> bool;

    /// Stop routing `signal` of `output`. Must tolerate outputs that no longer exist.
    fn disconnect(&self, output: OutputId, signal: OutputSignal);

    /// String setting of an output (`path`, `url`), if set
    fn output_setting(&self, output: OutputId, key: &str) -> Option<String>;

    /// Path of the clip the replay buffer saved last
    fn last_replay_path(&self, output: OutputId) -> Option<String>;

    /// Host-level `Video/AutoRemux`: the host remuxes on stop by itself
    fn auto_remux_on_stop(&self) -> bool;
}

/// Modal prompt for a name.
///
/// `None` means the operator cancelled.
pub trait NamePrompt: Send + Sync {
    fn prompt_for_name(&self, title: &str, initial: &str) -> Option<String>;
}

/// Unit of work that must run on the host UI thread.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Schedules work onto the host UI thread without blocking the caller.
pub trait UiQueue: Send + Sync {
    fn queue(&self, task: UiTask);
}

/// Whether hooks from `source_type` update the hook context.
pub fn is_hookable_source(source_type: &str) -> bool {
    HOOKABLE_SOURCE_TYPES.contains(&source_type)
}
