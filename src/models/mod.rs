//! Data models for the Record Rename plugin.
//!
//! - [`RenameState`]: runtime state (config flags, vendor slot, hook context)
//! - [`RenameSnapshot`]: the consistent copy a rename decision works from
//! - [`ProfileConfig`] / [`RenameConfig`]: the `RecordRename` profile section
//! - [`MAX_NAME_CHARS`]: prompt input limit
//!
//! `RenameState` is wrapped by [`StateManager`](crate::state::StateManager);
//! mutations go through its `update()` method so change events are emitted.

pub mod app_state;
pub mod config;

pub use app_state::{HookContext, MAX_NAME_CHARS, RenameSnapshot, RenameState, VendorPattern};
pub use config::{ProfileConfig, RenameConfig};
