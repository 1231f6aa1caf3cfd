// Record Rename - rename recordings and replay saves as soon as they are written
//
// The crate is host-agnostic: host glue implements the traits in `host` and
// drives a `plugin::RecordRename`.

pub mod config;
pub mod host;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod plugin;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use host::{FrontendEvent, Host, NamePrompt, OutputEvents, OutputId, UiQueue};
pub use models::{HookContext, RenameConfig, RenameState};
pub use plugin::{HostServices, MenuAction, PluginOptions, RecordRename};
pub use state::{StateChange, StateManager};

/// Plugin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Plugin name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
