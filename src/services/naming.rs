//! Path splitting and filename pattern expansion.
//!
//! A recording path is handled as three strings, `folder + base + extension`,
//! so a new name can be spliced in without touching the folder or container:
//!
//! ```ignore
//! let split = SplitPath::parse("/videos/2024-03-09 14-05-07.mkv");
//! assert_eq!(split.base, "2024-03-09 14-05-07");
//! assert_eq!(split.path_for("Hades run").as_str(), "/videos/Hades run.mkv");
//! ```
//!
//! Patterns support `%TITLE` and `%EXECUTABLE` (from the last hooked window),
//! followed by whatever the host's filename generator expands.

use crate::models::HookContext;
use camino::Utf8PathBuf;
use chrono::{DateTime, Local, TimeZone};
use regex::{Captures, Regex};
use std::fmt::Display;
use std::sync::Arc;

/// Token replaced with the hooked window title
pub const TITLE_TOKEN: &str = "%TITLE";

/// Token replaced with the hooked executable name
pub const EXECUTABLE_TOKEN: &str = "%EXECUTABLE";

/// A file path split into `folder`, `base` and `extension`.
///
/// `folder` keeps its trailing separator and `extension` its leading dot, so
/// concatenating the three yields the original path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPath {
    pub folder: String,
    pub base: String,
    pub extension: String,
}

impl SplitPath {
    /// Split on the last separator (`/` or `\`) and the last `.` after it.
    ///
    /// A file name without a dot has an empty extension.
    pub fn parse(path: &str) -> Self {
        let name_start = path.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
        let (folder, file_name) = path.split_at(name_start);

        let (base, extension) = match file_name.rfind('.') {
            Some(dot) => file_name.split_at(dot),
            None => (file_name, ""),
        };

        Self {
            folder: folder.to_string(),
            base: base.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Path with the base name replaced
    pub fn path_for(&self, base: &str) -> Utf8PathBuf {
        self.path_with_extension(base, &self.extension)
    }

    /// Path with the base name and extension replaced
    pub fn path_with_extension(&self, base: &str, extension: &str) -> Utf8PathBuf {
        Utf8PathBuf::from(format!("{}{}{}", self.folder, base, extension))
    }

    /// Path of the `index`-th member of a split recording: `folder/base (N)ext`
    pub fn indexed_path(&self, base: &str, index: usize) -> Utf8PathBuf {
        self.path_for(&indexed_base(base, index))
    }

    /// Original path
    pub fn original_path(&self) -> Utf8PathBuf {
        self.path_for(&self.base)
    }
}

/// `base (N)`
pub fn indexed_base(base: &str, index: usize) -> String {
    format!("{} ({})", base, index)
}

/// The host's formatted-filename generator (date, time, counters...).
pub trait FilenameExpander: Send + Sync {
    fn expand(&self, format: &str) -> String;
}

/// Expands the host's date/time tokens against the local clock.
///
/// Supports the long-form tokens `%CCYY %YY %MM %DD %hh %mm %ss`, the
/// strftime letters `%a %A %b %B %d %H %I %m %M %p %S %y %Y %z %Z` and `%%`.
/// Unknown tokens are left as they are.
pub struct LocalTimeExpander {
    token_pattern: Regex,
}

impl LocalTimeExpander {
    pub fn new() -> Self {
        Self {
            token_pattern: Regex::new(r"%(CCYY|YY|MM|DD|hh|mm|ss|%|[aAbBdHImMpSyYzZ])")
                .expect("Invalid time token regex"),
        }
    }

    /// Expand `format` for a fixed point in time
    pub fn expand_at<Tz>(&self, format: &str, now: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.token_pattern
            .replace_all(format, |caps: &Captures| {
                let token_format = match &caps[1] {
                    "CCYY" => "%Y",
                    "YY" => "%y",
                    "MM" => "%m",
                    "DD" => "%d",
                    "hh" => "%H",
                    "mm" => "%M",
                    "ss" => "%S",
                    "%" => return "%".to_string(),
                    _ => return now.format(&caps[0]).to_string(),
                };
                now.format(token_format).to_string()
            })
            .into_owned()
    }
}

impl Default for LocalTimeExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl FilenameExpander for LocalTimeExpander {
    fn expand(&self, format: &str) -> String {
        self.expand_at(format, &Local::now())
    }
}

/// Replace `%TITLE` and `%EXECUTABLE`, in that order.
pub fn substitute_hook_tokens(pattern: &str, hook: &HookContext) -> String {
    pattern
        .replace(TITLE_TOKEN, &hook.title)
        .replace(EXECUTABLE_TOKEN, &hook.executable)
}

/// Expands filename patterns into base names.
#[derive(Clone)]
pub struct PatternFormatter {
    expander: Arc<dyn FilenameExpander>,
}

impl PatternFormatter {
    pub fn new(expander: Arc<dyn FilenameExpander>) -> Self {
        Self { expander }
    }

    /// Expand `pattern`, falling back to `original_base` if the result is empty.
    pub fn format(&self, pattern: &str, hook: &HookContext, original_base: &str) -> String {
        let substituted = substitute_hook_tokens(pattern, hook);
        let formatted = self.expander.expand(&substituted);

        if formatted.is_empty() {
            tracing::debug!(
                "Pattern {:?} expanded to an empty name, keeping {:?}",
                pattern,
                original_base
            );
            original_base.to_string()
        } else {
            formatted
        }
    }
}

impl Default for PatternFormatter {
    fn default() -> Self {
        Self::new(Arc::new(LocalTimeExpander::new()))
    }
}
