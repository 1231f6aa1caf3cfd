//! Services module - the rename engine.
//!
//! Everything here is host-agnostic: the host is reached only through the
//! traits in [`crate::host`], so every service can be driven from tests with
//! fakes and temporary directories.
//!
//! # Components
//!
//! - [`OutputTracker`]: subscribes to host outputs and collects the files each
//!   recording writes. Signal handlers only record and queue UI work.
//!
//! - [`RenameOrchestrator`]: runs on the UI thread and decides the final name
//!   of a finished recording:
//!   - [`PatternFormatter`] expands the vendor or persistent pattern
//!   - the collision resolver re-prompts while the target exists
//!   - split recordings become `name (1).ext`, `name (2).ext`, ...
//!
//! - [`RemuxQueue`]: background container conversion on tokio workers, fed by
//!   the orchestrator when auto-remux is enabled.
//!
//! - [`VendorHandler`]: the `set_filename` remote request.
//!
//! # Flow
//!
//! ```text
//! host signal ──> OutputTracker ──UiQueue──> RenameOrchestrator ──> fs::rename
//!                                                   │
//!                                                   └──> RemuxQueue ──> Remuxer
//! ```

pub mod collision;
pub mod naming;
pub mod remux;
pub mod rename;
pub mod tracker;
pub mod vendor;

pub use collision::{NameRequest, prompt_for_name, resolve_collision};
pub use naming::{FilenameExpander, LocalTimeExpander, PatternFormatter, SplitPath};
pub use remux::{
    DEFAULT_REMUX_WORKERS, FfmpegRemuxer, RemuxError, RemuxItem, RemuxJob, RemuxQueue, Remuxer,
};
pub use rename::{RenameDecision, RenameError, RenameOrchestrator, RenameOutcome};
pub use tracker::OutputTracker;
pub use vendor::{SET_FILENAME, VENDOR_NAME, VendorError, VendorHandler, VendorResponse};
