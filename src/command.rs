//! Command registry: named executors with their own flag scopes.

use std::collections::BTreeMap;
use std::io::Write;
use std::rc::Rc;

use crate::context::RunContext;
use crate::flags::SharedFlags;
use crate::info::CommandInfo;

/// The callable performing a command's actual work.
///
/// Invoked at most once per run with the run's context, the positional
/// arguments remaining after flag parsing, and the app's output sink.
pub type Executor = Box<dyn FnMut(&RunContext, &[String], &mut dyn Write) -> anyhow::Result<()>>;

pub(crate) struct CommandEntry {
    pub(crate) info: CommandInfo,
    pub(crate) exec: Option<Executor>,
    pub(crate) flags: SharedFlags,
}

/// Registered commands, keyed by name. Re-registering a name overwrites
/// its entry; entries are never implicitly removed.
pub(crate) struct CommandSet {
    entries: BTreeMap<String, CommandEntry>,
}

impl CommandSet {
    pub(crate) fn new() -> Self {
        CommandSet {
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, entry: CommandEntry) {
        self.entries.insert(entry.info.name.clone(), entry);
    }

    pub(crate) fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut CommandEntry> {
        self.entries.get_mut(name)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Iterate entries in name order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.values()
    }

    /// Whether `scope` is already owned by a registered command other
    /// than `except` (the entry about to be overwritten).
    pub(crate) fn owns_scope(&self, scope: &SharedFlags, except: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.info.name != except && Rc::ptr_eq(&entry.flags, scope))
    }
}
