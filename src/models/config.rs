use serde::{Deserialize, Serialize};

/// Profile configuration file (`record-rename.yaml`).
///
/// Mirrors the host's profile layout: everything this plugin owns lives in the
/// `RecordRename` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(rename = "RecordRename", default)]
    pub record_rename: RenameConfig,
}

/// Operator settings for the `RecordRename` profile section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameConfig {
    #[serde(rename = "RenameRecord", default = "default_true")]
    pub rename_on_record_stop: bool,

    #[serde(rename = "RenameReplay", default = "default_true")]
    pub rename_on_replay_save: bool,

    #[serde(rename = "UserConfirm", default = "default_true")]
    pub prompt_user: bool,

    #[serde(rename = "AutoRemux", default)]
    pub auto_remux: bool,

    #[serde(rename = "FilenameFormat", default)]
    pub filename_format: String,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            rename_on_record_stop: true,
            rename_on_replay_save: true,
            prompt_user: true,
            auto_remux: false,
            filename_format: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl RenameConfig {
    /// The persistent pattern, if one is configured.
    pub fn persistent_pattern(&self) -> Option<&str> {
        if self.filename_format.is_empty() {
            None
        } else {
            Some(&self.filename_format)
        }
    }
}
