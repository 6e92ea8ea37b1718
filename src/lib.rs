//! Minimal scaffolding for command-line applications.
//!
//! An app is either a single top-level command or one level of named
//! subcommands. Each command owns an argument-parsing scope and an
//! execution callback; the library supplies consistent usage, help, and
//! version output, built-in `--help`/`--version` flags, and the mapping
//! from failures to process exit codes. Actually terminating the process
//! stays with the caller.
//!
//! ```no_run
//! use std::io::Write;
//!
//! use adjutant::{AppInfo, RunContext, SingleCommandApp};
//!
//! let mut app = SingleCommandApp::new(
//!     AppInfo {
//!         name: "example".to_string(),
//!         ..Default::default()
//!     },
//!     Box::new(|_ctx, arguments, out| {
//!         writeln!(out, "{arguments:?}")?;
//!         Ok(())
//!     }),
//!     None,
//!     std::io::stdout(),
//!     std::io::stderr(),
//! );
//!
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! std::process::exit(app.run(&RunContext::new(), &args));
//! ```

pub mod app;
pub mod command;
pub mod context;
pub mod errors;
pub mod exitcode;
pub mod flags;
pub mod info;
pub mod util;

mod render;

pub use app::{MultiCommandApp, SingleCommandApp, HELP_FLAG, VERSION_FLAG};
pub use command::Executor;
pub use context::RunContext;
pub use errors::{FlagError, RegistryError, RunError};
pub use flags::{FlagKind, FlagSet, FlagSpec, Flags, SharedFlags};
pub use info::{AppInfo, CommandInfo, DEFAULT_COMMAND_USAGE, DEFAULT_PARENT_COMMAND_USAGE};
