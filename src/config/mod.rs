use crate::models::{ProfileConfig, RenameConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the per-profile settings file.
pub const PROFILE_FILE_NAME: &str = "record-rename.yaml";

/// Configuration manager for the `RecordRename` profile section.
///
/// Each host profile gets its own directory; switching profiles means building a
/// new manager for the new directory and reloading.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    profile_dir: Utf8PathBuf,
    profile_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager for a profile directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new<P: AsRef<Utf8Path>>(profile_dir: P) -> Result<Self> {
        let profile_dir = profile_dir.as_ref().to_path_buf();

        if !profile_dir.exists() {
            fs::create_dir_all(&profile_dir)
                .with_context(|| format!("Failed to create profile directory: {}", profile_dir))?;
        }

        Ok(Self {
            profile_path: profile_dir.join(PROFILE_FILE_NAME),
            profile_dir,
        })
    }

    /// Load the profile file.
    ///
    /// # Returns
    /// The loaded ProfileConfig, or defaults if the file doesn't exist
    pub fn load_profile(&self) -> Result<ProfileConfig> {
        if !self.profile_path.exists() {
            tracing::warn!(
                "Profile config not found at {}, using defaults",
                self.profile_path
            );
            return Ok(ProfileConfig::default());
        }

        let file_contents = fs::read_to_string(&self.profile_path)
            .with_context(|| format!("Failed to read profile config: {}", self.profile_path))?;

        // An empty file is a valid, never-saved profile
        if file_contents.trim().is_empty() {
            return Ok(ProfileConfig::default());
        }

        let config: ProfileConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse profile config: {}", self.profile_path))?;

        tracing::info!("Loaded profile config from {}", self.profile_path);
        Ok(config)
    }

    /// Save the profile file.
    pub fn save_profile(&self, config: &ProfileConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize profile config to YAML")?;

        fs::write(&self.profile_path, yaml_string)
            .with_context(|| format!("Failed to write profile config: {}", self.profile_path))?;

        tracing::info!("Saved profile config to {}", self.profile_path);
        Ok(())
    }

    /// Load just the `RecordRename` section.
    pub fn load_rename_config(&self) -> Result<RenameConfig> {
        Ok(self.load_profile()?.record_rename)
    }

    /// Persist the `RecordRename` section.
    pub fn save_rename_config(&self, config: &RenameConfig) -> Result<()> {
        self.save_profile(&ProfileConfig {
            record_rename: config.clone(),
        })?;

        tracing::info!(
            "Config saved: {} {} {} {}",
            config.rename_on_record_stop,
            config.rename_on_replay_save,
            config.prompt_user,
            config.auto_remux
        );
        Ok(())
    }

    /// Get the profile directory path.
    pub fn profile_dir(&self) -> &Utf8Path {
        &self.profile_dir
    }

    /// Get the profile file path.
    pub fn profile_path(&self) -> &Utf8Path {
        &self.profile_path
    }
}
