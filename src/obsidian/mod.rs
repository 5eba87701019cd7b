//! Obsidian vault integration.
//!
//! The vault is a directory of Markdown notes. Summaries report the notes
//! modified inside the window together with the open tasks they contain;
//! the todo list reports every open task in the vault.

mod tasks;

use std::fs;
use std::time::SystemTime;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use walkdir::{DirEntry, WalkDir};

use crate::activity::{ActivityKind, TimeWindow, WorkItem};
use crate::provider::{Provider, ProviderError};
use crate::todo::{TodoSection, TodoSource};

use tasks::{OpenTask, open_tasks, task_tags};

const PLATFORM: &str = "obsidian";

/// Settings for [`ObsidianProvider`].
#[derive(Debug, Clone, Default)]
pub struct ObsidianSettings {
    /// Whether the integration is switched on.
    pub enabled: bool,
    /// Root directory of the vault.
    pub vault: Option<Utf8PathBuf>,
}

/// Obsidian provider for summaries and todos.
#[derive(Debug, Clone)]
pub struct ObsidianProvider {
    vault: Option<Utf8PathBuf>,
}

/// A Markdown file found while walking the vault.
#[derive(Debug, Clone)]
struct VaultNote {
    path: Utf8PathBuf,
    relative: Utf8PathBuf,
    modified: DateTime<Utc>,
}

impl VaultNote {
    fn title(&self) -> &str {
        self.relative.file_stem().unwrap_or(self.relative.as_str())
    }

    fn into_note_item(self) -> WorkItem {
        WorkItem::new(
            format!("obsidian-{}", self.relative),
            ActivityKind::Note,
            PLATFORM,
            self.title(),
            self.modified,
        )
        .with_description(format!("Note: {}", self.relative))
    }

    /// Open tasks in the note, or none when the file cannot be read.
    fn task_items(&self, vault_name: &str) -> Vec<WorkItem> {
        let Ok(content) = fs::read_to_string(&self.path).inspect_err(|error| {
            tracing::debug!(path = %self.path, %error, "skipping unreadable note");
        }) else {
            return Vec::new();
        };
        open_tasks(&content)
            .into_iter()
            .map(|task| self.task_item(vault_name, task))
            .collect()
    }

    fn task_item(&self, vault_name: &str, task: OpenTask) -> WorkItem {
        let tags = task_tags(&task.text);
        WorkItem::new(
            format!("obsidian-task-{}:{}", self.relative, task.line),
            ActivityKind::Task,
            PLATFORM,
            task.text,
            self.modified,
        )
        .with_description(format!("Task in {}", self.title()))
        .with_url(format!(
            "obsidian://open?vault={vault_name}&file={}",
            self.relative
        ))
        .with_tags(tags)
    }
}

impl ObsidianProvider {
    /// Creates a provider from `settings`.
    ///
    /// The provider is unconfigured unless it is enabled and has a vault
    /// path. The path is not checked until the vault is scanned.
    #[must_use]
    pub fn new(settings: ObsidianSettings) -> Self {
        let vault = settings
            .vault
            .filter(|path| settings.enabled && !path.as_str().trim().is_empty());
        Self { vault }
    }

    fn vault(&self) -> Result<&Utf8Path, ProviderError> {
        self.vault
            .as_deref()
            .ok_or_else(|| ProviderError::not_configured(PLATFORM))
    }

    /// Walks the vault off the async runtime and hands the notes to
    /// `build`, which also runs on the blocking pool since it reads files.
    async fn scan<T, F>(&self, build: F) -> Result<T, ProviderError>
    where
        T: Send + 'static,
        F: FnOnce(&str, Vec<VaultNote>) -> T + Send + 'static,
    {
        let root = self.vault()?.to_owned();
        tokio::task::spawn_blocking(move || {
            let vault_name = root.file_name().unwrap_or(root.as_str());
            scan_vault(&root).map(|notes| build(vault_name, notes))
        })
        .await
        .map_err(|error| ProviderError::Io {
            message: format!("vault scan did not finish: {error}"),
        })?
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Markdown files under `root`, sorted by path. Hidden directories such as
/// `.obsidian` and `.trash` are not entered.
fn scan_vault(root: &Utf8Path) -> Result<Vec<VaultNote>, ProviderError> {
    let mut notes = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));
    for entry in walker {
        let found = entry.map_err(|error| ProviderError::Io {
            message: format!("failed to walk vault {root}: {error}"),
        })?;
        if !found.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(found.path()) else {
            tracing::debug!(path = %found.path().display(), "skipping non UTF-8 path");
            continue;
        };
        if path.extension() != Some("md") {
            continue;
        }
        let modified = found
            .metadata()
            .map_err(|error| ProviderError::Io {
                message: format!("failed to stat {path}: {error}"),
            })?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let relative = path.strip_prefix(root).unwrap_or(path).to_owned();
        notes.push(VaultNote {
            path: path.to_owned(),
            relative,
            modified: DateTime::<Utc>::from(modified),
        });
    }
    Ok(notes)
}

#[async_trait]
impl Provider for ObsidianProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.vault.is_some()
    }

    /// Notes modified in `window`, followed by the open tasks in those
    /// notes.
    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError> {
        let bounds = *window;
        self.scan(move |vault_name, notes| {
            let recent: Vec<VaultNote> = notes
                .into_iter()
                .filter(|note| bounds.contains(note.modified))
                .collect();
            let tasks: Vec<WorkItem> = recent
                .iter()
                .flat_map(|note| note.task_items(vault_name))
                .collect();
            let mut items: Vec<WorkItem> =
                recent.into_iter().map(VaultNote::into_note_item).collect();
            items.extend(tasks);
            items
        })
        .await
    }
}

#[async_trait]
impl TodoSource for ObsidianProvider {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn is_configured(&self) -> bool {
        self.vault.is_some()
    }

    /// Every open task in the vault.
    async fn todo_sections(&self) -> Result<Vec<TodoSection>, ProviderError> {
        let items: Vec<WorkItem> = self
            .scan(|vault_name, notes| {
                notes
                    .iter()
                    .flat_map(|note| note.task_items(vault_name))
                    .collect()
            })
            .await?;
        Ok(vec![TodoSection::new(PLATFORM, "Tasks", items)])
    }
}
