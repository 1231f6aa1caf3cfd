//! Collision resolution for rename targets.
//!
//! The resolver never loops on its own: every extra iteration needs a new name
//! from the [`NamePrompt`], and a cancelled prompt ends the loop with the
//! original name.

use super::naming::SplitPath;
use crate::host::NamePrompt;
use crate::models::MAX_NAME_CHARS;
use camino::Utf8Path;

pub const RENAME_FILE_TITLE: &str = "Rename File";
pub const RENAME_FILES_TITLE: &str = "Rename Files";
pub const FILES_LABEL: &str = "Files";
pub const FILE_EXISTS_LABEL: &str = "File Exists";

/// Everything needed to test a candidate base name for collisions.
#[derive(Clone, Copy, Debug)]
pub struct NameRequest<'a> {
    pub split: &'a SplitPath,

    /// File being renamed. A candidate equal to it is never a collision.
    pub source: &'a Utf8Path,

    /// For split recordings, the member whose `(N)` path is checked
    pub member: Option<usize>,

    /// Prompt title without the collision suffix
    pub title: &'a str,
}

impl<'a> NameRequest<'a> {
    /// Request for a single file
    pub fn single(split: &'a SplitPath, source: &'a Utf8Path) -> Self {
        Self {
            split,
            source,
            member: None,
            title: RENAME_FILE_TITLE,
        }
    }

    /// Request for a split recording; collisions are checked on member `(1)`
    pub fn multi(split: &'a SplitPath, source: &'a Utf8Path, title: &'a str) -> Self {
        Self {
            split,
            source,
            member: Some(1),
            title,
        }
    }

    pub fn original_base(&self) -> &str {
        &self.split.base
    }

    /// Path a base name maps to for the collision check
    pub fn candidate_path(&self, base: &str) -> camino::Utf8PathBuf {
        match self.member {
            Some(index) => self.split.indexed_path(base, index),
            None => self.split.path_for(base),
        }
    }

    pub fn collides<E>(&self, base: &str, exists: &E) -> bool
    where
        E: Fn(&Utf8Path) -> bool + ?Sized,
    {
        let path = self.candidate_path(base);
        path.as_path() != self.source && exists(&path)
    }

    /// Prompt title, flagged when `base` is a new name that collides
    pub fn title_for<E>(&self, base: &str, exists: &E) -> String
    where
        E: Fn(&Utf8Path) -> bool + ?Sized,
    {
        if base != self.original_base() && self.collides(base, exists) {
            format!("{}: {}", self.title, FILE_EXISTS_LABEL)
        } else {
            self.title.to_string()
        }
    }
}

/// Title for a split recording of `count` files
pub fn multi_file_title(count: usize) -> String {
    format!("{} ({} {})", RENAME_FILES_TITLE, count, FILES_LABEL)
}

/// Ask once. Cancel, or an empty answer, keeps the original name.
fn ask(prompt: &dyn NamePrompt, title: &str, initial: &str, original: &str) -> String {
    match prompt.prompt_for_name(title, initial) {
        Some(name) if !name.trim().is_empty() => name.chars().take(MAX_NAME_CHARS).collect(),
        Some(_) => {
            tracing::debug!("Empty name entered, keeping {:?}", original);
            original.to_string()
        }
        None => {
            tracing::debug!("Rename prompt cancelled, keeping {:?}", original);
            original.to_string()
        }
    }
}

/// Re-prompt while `desired` is a new name whose target already exists.
///
/// Returns `desired` untouched, with no prompt, when it does not collide.
pub fn resolve_collision<E>(
    request: &NameRequest<'_>,
    desired: String,
    exists: &E,
    prompt: &dyn NamePrompt,
) -> String
where
    E: Fn(&Utf8Path) -> bool + ?Sized,
{
    let original = request.original_base();
    let mut name = desired;

    while name != original && request.collides(&name, exists) {
        tracing::info!(
            "Rename target {} already exists, asking for another name",
            request.candidate_path(&name)
        );
        let title = request.title_for(&name, exists);
        name = ask(prompt, &title, &name, original);
    }

    name
}

/// Full interactive flow: show the prompt pre-filled with `candidate`, then
/// resolve any collision the answer produces.
pub fn prompt_for_name<E>(
    request: &NameRequest<'_>,
    candidate: String,
    exists: &E,
    prompt: &dyn NamePrompt,
) -> String
where
    E: Fn(&Utf8Path) -> bool + ?Sized,
{
    let title = request.title_for(&candidate, exists);
    let answer = ask(prompt, &title, &candidate, request.original_base());
    resolve_collision(request, answer, exists, prompt)
}
