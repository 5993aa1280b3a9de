//! Session persistence utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::app::page::Page;

const SESSION_DIR: &str = ".optfilter";
const SESSION_FILE: &str = "session.json";

/// Snapshot of interactive UI state persisted between sessions.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Markup file the session was recorded against.
    pub document: String,
    /// Filter text and selection per binding.
    pub bindings: Vec<BindingRecord>,
    /// Key of the binding that had focus when the session closed.
    pub focused: Option<String>,
    /// Unix timestamp of the save.
    #[serde(default)]
    pub saved_at: i64,
}

/// Serializable state of one binding.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BindingRecord {
    pub key: String,
    pub filter: String,
    #[serde(default)]
    pub selected: Vec<String>,
}

impl SessionSnapshot {
    /// Capture the filter text and selection of every binding on `page`.
    pub fn capture(document: &Path, page: &Page, focused: Option<String>) -> Self {
        let bindings = page
            .bindings()
            .iter()
            .enumerate()
            .map(|(index, binding)| BindingRecord {
                key: binding.key(),
                filter: page.filter_text(index).to_owned(),
                selected: page.selected_values(index),
            })
            .collect();

        Self {
            document: document_key(document),
            bindings,
            focused,
            saved_at: OffsetDateTime::now_utc().unix_timestamp(),
        }
    }

    /// Whether the snapshot was taken for `document`.
    pub fn matches(&self, document: &Path) -> bool {
        self.document == document_key(document)
    }

    /// Replay selections and filter text onto `page`. Records whose binding no
    /// longer exists are skipped. Returns the number of restored bindings.
    pub fn restore(&self, page: &mut Page) -> usize {
        let mut restored = 0;
        for record in &self.bindings {
            let Ok(index) = page.binding_index(&record.key) else {
                tracing::debug!(key = %record.key, "session binding no longer present");
                continue;
            };
            page.set_selected_values(index, &record.selected);
            page.type_into(index, &record.filter);
            restored += 1;
        }
        restored
    }
}

/// Canonical form of `document`, so differently spelled paths to one file
/// share a session. Paths that cannot be resolved are kept as given.
fn document_key(document: &Path) -> String {
    fs::canonicalize(document)
        .unwrap_or_else(|_| document.to_path_buf())
        .display()
        .to_string()
}

/// Persists UI state to a session file under `.optfilter/`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    root: PathBuf,
    path: PathBuf,
}

impl SessionStore {
    /// Create a new store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = root.join(SESSION_DIR).join(SESSION_FILE);
        Self { root, path }
    }

    /// Location of the persisted session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the most recently persisted session snapshot.
    pub fn load(&self) -> Result<Option<SessionSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read session file at {}", self.path.display()))?;
        let snapshot = serde_json::from_str(&data)
            .with_context(|| format!("invalid session data in {}", self.path.display()))?;
        Ok(Some(snapshot))
    }

    /// Persist the provided snapshot to disk, creating parent directories as needed.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let dir = self.path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create session directory {}", dir.display()))?;

        let data = serde_json::to_string_pretty(snapshot)
            .context("failed to serialize session snapshot")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write session file to {}", self.path.display()))?;
        Ok(())
    }
}
