use super::config::RenameConfig;

/// Maximum length of a name accepted from the rename or format prompts.
pub const MAX_NAME_CHARS: usize = 170;

/// Details of the most recently hooked game/window capture.
///
/// Updated whenever the host reports a newly captured window; read by the
/// pattern formatter for `%TITLE` and `%EXECUTABLE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HookContext {
    pub source: String,
    pub title: String,
    pub class: String,
    pub executable: String,
}

/// Externally supplied pattern for the next rename decision only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VendorPattern {
    pub pattern: String,
    pub force: bool,
}

/// Single source of truth for plugin state.
///
/// # Thread Safety
///
/// `RenameState` is wrapped in a lock by [`crate::state::StateManager`]. Signal
/// handlers, the vendor handler and menu actions all run on different threads;
/// go through the manager rather than holding a `RenameState` directly.
#[derive(Clone, Debug, Default)]
pub struct RenameState {
    pub config: RenameConfig,

    /// One-shot pattern slot, cleared by the first rename decision that reads it
    pub vendor: Option<VendorPattern>,

    pub hook: HookContext,
}

/// Consistent view taken at the start of a rename decision.
#[derive(Clone, Debug)]
pub struct RenameSnapshot {
    pub config: RenameConfig,
    pub hook: HookContext,
    pub vendor: Option<VendorPattern>,
}

impl RenameSnapshot {
    /// Pattern that applies to this decision and whether it is forced.
    ///
    /// The vendor pattern wins over the persistent one; only the vendor pattern
    /// can be forced.
    pub fn active_pattern(&self) -> Option<(&str, bool)> {
        if let Some(vendor) = &self.vendor {
            return Some((vendor.pattern.as_str(), vendor.force));
        }
        self.config.persistent_pattern().map(|p| (p, false))
    }
}

impl RenameState {
    /// Take a snapshot and consume the vendor slot in the same step.
    pub fn begin_decision(&mut self) -> RenameSnapshot {
        RenameSnapshot {
            config: self.config.clone(),
            hook: self.hook.clone(),
            vendor: self.vendor.take(),
        }
    }
}
