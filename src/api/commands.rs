/*!
 * Diff Information Commands
 * Named command handlers that run only when diff information is available
 */

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::vfs::Disposable;

/// One contiguous block of changed lines
///
/// Line numbers are 1-based. An end of 0 means that side has no lines: an
/// original end of 0 is a pure insertion, a modified end of 0 a pure deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChange {
    pub original_start_line_number: u32,
    pub original_end_line_number: u32,
    pub modified_start_line_number: u32,
    pub modified_end_line_number: u32,
}

impl LineChange {
    pub fn new(
        original_start_line_number: u32,
        original_end_line_number: u32,
        modified_start_line_number: u32,
        modified_end_line_number: u32,
    ) -> Result<Self, CommandError> {
        let change = Self {
            original_start_line_number,
            original_end_line_number,
            modified_start_line_number,
            modified_end_line_number,
        };
        change.validate()?;
        Ok(change)
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        let ordered = |start: u32, end: u32| end == 0 || start <= end;
        if ordered(self.original_start_line_number, self.original_end_line_number)
            && ordered(self.modified_start_line_number, self.modified_end_line_number)
        {
            Ok(())
        } else {
            Err(CommandError::InvalidLineChange(*self))
        }
    }

    pub fn is_insertion(&self) -> bool {
        self.original_end_line_number == 0
    }

    pub fn is_deletion(&self) -> bool {
        self.modified_end_line_number == 0
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CommandError {
    #[error("Command '{0}' is already registered")]
    #[diagnostic(code(commands::duplicate))]
    DuplicateCommand(String),

    #[error("Command '{0}' not found")]
    #[diagnostic(code(commands::unknown))]
    UnknownCommand(String),

    #[error("Invalid line change: {0:?}")]
    #[diagnostic(code(commands::invalid_line_change))]
    InvalidLineChange(LineChange),
}

type Handler = Arc<dyn Fn(&[LineChange], &[Value]) -> Value + Send + Sync>;

struct Registered {
    id: u64,
    handler: Handler,
}

/// Registry of diff information commands keyed by name
#[derive(Clone)]
pub struct DiffCommandRegistry {
    commands: Arc<DashMap<String, Registered, RandomState>>,
    next_id: Arc<AtomicU64>,
}

impl DiffCommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: Arc::new(DashMap::with_hasher(RandomState::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register `handler` under `name`; disposing unregisters it
    pub fn register<F>(&self, name: &str, handler: F) -> Result<Disposable, CommandError>
    where
        F: Fn(&[LineChange], &[Value]) -> Value + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.commands.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(CommandError::DuplicateCommand(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Registered {
                    id,
                    handler: Arc::new(handler),
                });
            }
        }
        info!(command = name, "diff command registered");

        let commands = Arc::downgrade(&self.commands);
        let name = name.to_string();
        Ok(Disposable::new(move || {
            if let Some(commands) = commands.upgrade() {
                if commands.remove_if(&name, |_, r| r.id == id).is_some() {
                    debug!(command = %name, "diff command unregistered");
                }
            }
        }))
    }

    /// Run `name` against `diff`
    ///
    /// Returns `Ok(None)` without invoking the handler when no diff
    /// information is available.
    pub fn execute(
        &self,
        name: &str,
        diff: Option<&[LineChange]>,
        args: &[Value],
    ) -> Result<Option<Value>, CommandError> {
        // Clone out so the handler runs without holding a shard lock
        let handler = self
            .commands
            .get(name)
            .map(|r| Arc::clone(&r.handler))
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        let Some(diff) = diff else {
            debug!(command = name, "no diff information; command skipped");
            return Ok(None);
        };
        Ok(Some(handler(diff, args)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl Default for DiffCommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
