// File: ./src/config.rs
// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::Stage;
use crate::storage::LocalStorage;
use anyhow::{Error, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fs;

pub const DEFAULT_DELETE_DELAY_MS: u64 = 1000;
pub const DEFAULT_BLOCK_LANGUAGE: &str = "todo";

const DEFAULT_TODO_TITLE: &str = "To do";
const DEFAULT_IN_PROGRESS_TITLE: &str = "In progress";
const DEFAULT_DONE_TITLE: &str = "Done";

fn default_todo_title() -> String {
    DEFAULT_TODO_TITLE.to_string()
}
fn default_in_progress_title() -> String {
    DEFAULT_IN_PROGRESS_TITLE.to_string()
}
fn default_done_title() -> String {
    DEFAULT_DONE_TITLE.to_string()
}

fn default_delete_delay_ms() -> u64 {
    DEFAULT_DELETE_DELAY_MS
}

fn default_block_language() -> String {
    DEFAULT_BLOCK_LANGUAGE.to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ColumnNames {
    #[serde(default = "default_todo_title")]
    pub todo: String,
    #[serde(default = "default_in_progress_title")]
    pub in_progress: String,
    #[serde(default = "default_done_title")]
    pub done: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            todo: default_todo_title(),
            in_progress: default_in_progress_title(),
            done: default_done_title(),
        }
    }
}

impl ColumnNames {
    /// Column title for `stage`. A blank configured name falls back to the default.
    pub fn title(&self, stage: Stage) -> &str {
        let (configured, fallback) = match stage {
            Stage::Todo => (&self.todo, DEFAULT_TODO_TITLE),
            Stage::InProgress => (&self.in_progress, DEFAULT_IN_PROGRESS_TITLE),
            Stage::Done => (&self.done, DEFAULT_DONE_TITLE),
        };
        if configured.trim().is_empty() {
            fallback
        } else {
            configured
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub column_names: ColumnNames,
    #[serde(default)]
    pub center_board: bool,
    /// How long a dragged card must stay off the board before release deletes it.
    #[serde(default = "default_delete_delay_ms")]
    pub delete_delay_ms: u64,
    /// Info string of the fenced blocks rendered as boards.
    #[serde(default = "default_block_language")]
    pub block_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            column_names: ColumnNames::default(),
            center_board: false,
            delete_delay_ms: DEFAULT_DELETE_DELAY_MS,
            block_language: default_block_language(),
        }
    }
}

impl Config {
    pub fn delete_delay(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.delete_delay_ms).unwrap_or(i64::MAX))
    }

    /// Load the configuration from disk using an explicit context.
    /// Returns a contextualized error if reading or parsing fails.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(cfg) => Ok(cfg),
            Err(e) if Self::is_missing_config_error(&e) => {
                log::debug!("No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether an error from [`Config::load`] means the file was simply absent.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Save configuration using an explicit context.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        LocalStorage::with_lock(&path, || {
            let toml_str = toml::to_string_pretty(self)?;
            LocalStorage::atomic_write(&path, toml_str)?;
            Ok(())
        })?;
        Ok(())
    }
}
