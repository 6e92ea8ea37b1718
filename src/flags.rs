//! Flag-scope abstraction over an external argument parser.
//!
//! The run loop and the help renderer only ever talk to the [`Flags`]
//! trait, so the token-level parser stays replaceable (and mockable in
//! tests). [`FlagSet`] is the default implementation, an adapter over
//! clap's builder API.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::rc::Rc;

use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::errors::FlagError;
use crate::render;

/// Internal id of the catch-all positional argument.
const REST_ID: &str = "__arguments";

/// The value shape of a defined flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Bool,
    String,
    Int,
}

/// Descriptive record of one defined flag, used for usage rendering and
/// for merging app-level and command-level scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    pub kind: FlagKind,
    pub help: String,
    /// Default value as entered on the command line; `None` for bool flags.
    pub default: Option<String>,
}

/// Capability over one flag-defining scope.
///
/// Each app and each registered command owns exactly one scope instance.
/// `define_*` must be idempotent for an already-defined name of the same
/// kind; the built-in `help`/`version` flags rely on that.
pub trait Flags {
    /// Define a boolean flag, off by default.
    fn define_bool(&mut self, name: &str, help: &str);

    /// Define a string-valued flag with a default.
    fn define_string(&mut self, name: &str, default: &str, help: &str);

    /// Define an integer-valued flag with a default.
    fn define_int(&mut self, name: &str, default: i64, help: &str);

    /// Parse the given arguments. Flag values and remaining positional
    /// arguments are observable afterwards through the getters.
    fn parse(&mut self, args: &[String]) -> Result<(), FlagError>;

    /// All defined flags, in this scope's native rendering order
    /// (lexical by name for [`FlagSet`]).
    fn specs(&self) -> Vec<FlagSpec>;

    /// Names of all defined flags.
    fn flag_names(&self) -> Vec<String> {
        self.specs().into_iter().map(|spec| spec.name).collect()
    }

    /// Value of a boolean flag after a successful parse.
    fn get_bool(&self, name: &str) -> Option<bool>;

    /// Value of a string flag after a successful parse.
    fn get_string(&self, name: &str) -> Option<String>;

    /// Value of an integer flag after a successful parse.
    fn get_int(&self, name: &str) -> Option<i64>;

    /// Positional arguments remaining after the last successful parse.
    fn positional(&self) -> Vec<String>;

    /// Write the formatted listing of all defined flags.
    fn write_usage(&self, w: &mut dyn Write) -> io::Result<()> {
        render::write_flag_specs(w, &self.specs())
    }
}

/// Shared handle to a flag scope.
///
/// Scopes are shared between the app, the registry, and the caller that
/// defined the flags; duplicate-ownership detection compares handle
/// identity via [`Rc::ptr_eq`].
pub type SharedFlags = Rc<RefCell<dyn Flags>>;

/// Default [`Flags`] implementation backed by clap's builder API.
///
/// Unknown flags are a parse error with clap's rendered message;
/// everything that is not a defined flag is collected as positional
/// arguments.
pub struct FlagSet {
    command: Command,
    specs: BTreeMap<String, FlagSpec>,
    matches: Option<ArgMatches>,
}

impl FlagSet {
    pub fn new(name: &str) -> Self {
        let command = Command::new(name.to_string())
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(Arg::new(REST_ID).num_args(0..).value_name("ARGUMENTS"));

        FlagSet {
            command,
            specs: BTreeMap::new(),
            matches: None,
        }
    }

    /// Convenience constructor for the shared-handle form the app API expects.
    pub fn shared(name: &str) -> SharedFlags {
        Rc::new(RefCell::new(FlagSet::new(name)))
    }

    fn insert(&mut self, arg: Arg, spec: FlagSpec) {
        self.command = self.command.clone().arg(arg);
        self.specs.insert(spec.name.clone(), spec);
    }
}

impl Flags for FlagSet {
    fn define_bool(&mut self, name: &str, help: &str) {
        if self.specs.contains_key(name) {
            return;
        }
        let arg = Arg::new(name.to_string())
            .long(name.to_string())
            .action(ArgAction::SetTrue)
            .help(help.to_string());
        self.insert(
            arg,
            FlagSpec {
                name: name.to_string(),
                kind: FlagKind::Bool,
                help: help.to_string(),
                default: None,
            },
        );
    }

    fn define_string(&mut self, name: &str, default: &str, help: &str) {
        if self.specs.contains_key(name) {
            return;
        }
        let arg = Arg::new(name.to_string())
            .long(name.to_string())
            .action(ArgAction::Set)
            .value_name("STRING")
            .default_value(default.to_string())
            .help(help.to_string());
        self.insert(
            arg,
            FlagSpec {
                name: name.to_string(),
                kind: FlagKind::String,
                help: help.to_string(),
                default: Some(default.to_string()),
            },
        );
    }

    fn define_int(&mut self, name: &str, default: i64, help: &str) {
        if self.specs.contains_key(name) {
            return;
        }
        let arg = Arg::new(name.to_string())
            .long(name.to_string())
            .action(ArgAction::Set)
            .value_name("INT")
            .value_parser(clap::value_parser!(i64))
            .default_value(default.to_string())
            .help(help.to_string());
        self.insert(
            arg,
            FlagSpec {
                name: name.to_string(),
                kind: FlagKind::Int,
                help: help.to_string(),
                default: Some(default.to_string()),
            },
        );
    }

    fn parse(&mut self, args: &[String]) -> Result<(), FlagError> {
        let matches = self.command.clone().try_get_matches_from(args.iter())?;
        self.matches = Some(matches);
        Ok(())
    }

    fn specs(&self) -> Vec<FlagSpec> {
        self.specs.values().cloned().collect()
    }

    fn get_bool(&self, name: &str) -> Option<bool> {
        let spec = self.specs.get(name)?;
        if spec.kind != FlagKind::Bool {
            return None;
        }
        let matches = self.matches.as_ref()?;
        Some(matches.get_flag(name))
    }

    fn get_string(&self, name: &str) -> Option<String> {
        let spec = self.specs.get(name)?;
        if spec.kind != FlagKind::String {
            return None;
        }
        let matches = self.matches.as_ref()?;
        matches.get_one::<String>(name).cloned()
    }

    fn get_int(&self, name: &str) -> Option<i64> {
        let spec = self.specs.get(name)?;
        if spec.kind != FlagKind::Int {
            return None;
        }
        let matches = self.matches.as_ref()?;
        matches.get_one::<i64>(name).copied()
    }

    fn positional(&self) -> Vec<String> {
        self.matches
            .as_ref()
            .and_then(|matches| matches.get_many::<String>(REST_ID))
            .map(|values| values.cloned().collect())
            .unwrap_or_default()
    }
}
