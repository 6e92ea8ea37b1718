//! App construction, command resolution, and the run loop.

use std::io::{self, Write};
use std::rc::Rc;

use tracing::debug;

use crate::command::{CommandEntry, CommandSet, Executor};
use crate::context::RunContext;
use crate::errors::{RegistryError, RunError};
use crate::exitcode;
use crate::flags::{FlagSet, SharedFlags};
use crate::info::{AppInfo, CommandInfo, DEFAULT_COMMAND_USAGE, DEFAULT_PARENT_COMMAND_USAGE};
use crate::render;

/// Name of the always-present built-in help flag.
pub const HELP_FLAG: &str = "help";

/// Name of the always-present built-in version flag.
pub const VERSION_FLAG: &str = "version";

const HELP_FLAG_HELP: &str = "Display the help message";
const VERSION_FLAG_HELP: &str = "Display the application version";

/// State shared by both app kinds: metadata, the app-level flag scope,
/// the optional init hook, and the two output sinks.
struct AppBase {
    info: AppInfo,
    flags: SharedFlags,
    init: Option<Box<dyn FnMut() -> anyhow::Result<()>>>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl AppBase {
    fn new(
        info: AppInfo,
        default_usage: &str,
        flags: Option<SharedFlags>,
        out: Box<dyn Write>,
        err: Box<dyn Write>,
    ) -> Self {
        let info = info.with_defaults(default_usage);
        let flags = flags.unwrap_or_else(|| FlagSet::shared(&info.name));
        ensure_builtin_flags(&flags);

        AppBase {
            info,
            flags,
            init: None,
            out,
            err,
        }
    }

    fn run_init(&mut self) -> Result<(), RunError> {
        if let Some(hook) = self.init.as_mut() {
            hook().map_err(RunError::Init)?;
        }
        Ok(())
    }

    /// Write the failure to the error sink and return its exit code.
    fn fail(&mut self, err: RunError) -> i32 {
        debug!(error = %err, "run aborted");
        writeln!(self.err, "{err}").ok();
        err.exit_code()
    }

    fn print_version(&mut self) {
        render::write_version_line(self.out.as_mut(), &self.info.name, &self.info.version).ok();
    }

    /// Built-in flag values after a parse, `(help, version)`.
    fn builtin_flags(scope: &SharedFlags) -> (bool, bool) {
        let scope = scope.borrow();
        (
            scope.get_bool(HELP_FLAG).unwrap_or(false),
            scope.get_bool(VERSION_FLAG).unwrap_or(false),
        )
    }
}

/// Define the built-in `help`/`version` flags on a scope unless a flag
/// of that name already exists. Idempotent.
fn ensure_builtin_flags(flags: &SharedFlags) {
    let mut scope = flags.borrow_mut();
    let names = scope.flag_names();
    if !names.iter().any(|name| name == HELP_FLAG) {
        scope.define_bool(HELP_FLAG, HELP_FLAG_HELP);
    }
    if !names.iter().any(|name| name == VERSION_FLAG) {
        scope.define_bool(VERSION_FLAG, VERSION_FLAG_HELP);
    }
}

/// An app with exactly one executor; all arguments belong to it.
pub struct SingleCommandApp {
    base: AppBase,
    exec: Executor,
}

impl SingleCommandApp {
    /// Construct a single-command app.
    ///
    /// An empty `info.name` is inferred from the running executable, an
    /// empty `info.usage` falls back to [`DEFAULT_COMMAND_USAGE`]. With
    /// `None` for `flags` a fresh empty scope is created.
    pub fn new(
        info: AppInfo,
        exec: Executor,
        flags: Option<SharedFlags>,
        out: impl Write + 'static,
        err: impl Write + 'static,
    ) -> Self {
        SingleCommandApp {
            base: AppBase::new(
                info,
                DEFAULT_COMMAND_USAGE,
                flags,
                Box::new(out),
                Box::new(err),
            ),
            exec,
        }
    }

    /// Register a hook run before resolution; a second call replaces the
    /// previous hook.
    pub fn on_init<F>(&mut self, hook: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.base.init = Some(Box::new(hook));
    }

    pub fn info(&self) -> &AppInfo {
        &self.base.info
    }

    /// Handle to the app-level flag scope, for defining flags and for
    /// reading parsed values from the executor.
    pub fn flags(&self) -> SharedFlags {
        self.base.flags.clone()
    }

    pub fn print_usage(&mut self) {
        let mut buf = Vec::new();
        self.render_usage(&mut buf).ok();
        self.base.out.write_all(&buf).ok();
    }

    pub fn print_version(&mut self) {
        self.base.print_version();
    }

    pub fn print_help(&mut self) {
        let mut buf = Vec::new();
        self.render_help(&mut buf).ok();
        self.base.out.write_all(&buf).ok();
    }

    /// Run one invocation and return the exit code; the process is never
    /// terminated here.
    pub fn run(&mut self, ctx: &RunContext, args: &[String]) -> i32 {
        if let Err(err) = self.base.run_init() {
            return self.base.fail(err);
        }

        ensure_builtin_flags(&self.base.flags);
        let parsed = self.base.flags.borrow_mut().parse(args);
        if let Err(err) = parsed {
            return self.base.fail(RunError::Parse(err));
        }

        let (help, version) = AppBase::builtin_flags(&self.base.flags);
        if help {
            self.print_help();
            return exitcode::OK;
        }
        if version {
            self.print_version();
            return exitcode::OK;
        }

        let positional = self.base.flags.borrow().positional();
        if let Err(err) = (self.exec)(ctx, &positional, self.base.out.as_mut()) {
            return self.base.fail(RunError::Execution(err));
        }
        exitcode::OK
    }

    fn render_usage(&self, w: &mut dyn Write) -> io::Result<()> {
        render::write_usage_line(w, &self.base.info.name, &self.base.info.usage)
    }

    fn render_help(&self, w: &mut dyn Write) -> io::Result<()> {
        self.render_usage(w)?;
        if !self.base.info.summary.is_empty() {
            writeln!(w)?;
            writeln!(w, "{}", self.base.info.summary)?;
        }
        writeln!(w)?;
        writeln!(w, "Options:")?;
        writeln!(w)?;
        render::write_flag_specs(w, &self.base.flags.borrow().specs())?;
        writeln!(w)?;
        render::write_version_line(w, &self.base.info.name, &self.base.info.version)
    }
}

/// An app dispatching to one level of named subcommands.
pub struct MultiCommandApp {
    base: AppBase,
    commands: CommandSet,
}

impl MultiCommandApp {
    /// Construct a multi-command app with no commands registered.
    ///
    /// An empty `info.usage` falls back to
    /// [`DEFAULT_PARENT_COMMAND_USAGE`].
    pub fn new(
        info: AppInfo,
        flags: Option<SharedFlags>,
        out: impl Write + 'static,
        err: impl Write + 'static,
    ) -> Self {
        MultiCommandApp {
            base: AppBase::new(
                info,
                DEFAULT_PARENT_COMMAND_USAGE,
                flags,
                Box::new(out),
                Box::new(err),
            ),
            commands: CommandSet::new(),
        }
    }

    /// Register or overwrite a command.
    ///
    /// `exec` may be `None`, in which case invoking the command prints
    /// its help. With `None` for `flags` a fresh empty scope is created;
    /// a scope instance already owned by the app or by another command
    /// is rejected with [`RegistryError::DuplicateFlagScope`] and the
    /// registry is left unchanged.
    pub fn set_command(
        &mut self,
        info: CommandInfo,
        exec: Option<Executor>,
        flags: Option<SharedFlags>,
    ) -> Result<(), RegistryError> {
        if info.name.is_empty() {
            return Err(RegistryError::InvalidCommand);
        }
        let info = info.with_defaults();

        if let Some(scope) = &flags {
            if Rc::ptr_eq(scope, &self.base.flags) || self.commands.owns_scope(scope, &info.name) {
                return Err(RegistryError::DuplicateFlagScope(info.name));
            }
        }

        let flags = flags.unwrap_or_else(|| FlagSet::shared(&info.name));
        ensure_builtin_flags(&flags);

        debug!(command = %info.name, "registered command");
        self.commands.insert(CommandEntry { info, exec, flags });
        Ok(())
    }

    /// Names of all registered commands.
    pub fn command_names(&self) -> Vec<String> {
        self.commands.names()
    }

    /// Register a hook run before resolution; a second call replaces the
    /// previous hook.
    pub fn on_init<F>(&mut self, hook: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.base.init = Some(Box::new(hook));
    }

    pub fn info(&self) -> &AppInfo {
        &self.base.info
    }

    /// Handle to the app-level flag scope.
    pub fn flags(&self) -> SharedFlags {
        self.base.flags.clone()
    }

    pub fn print_usage(&mut self, for_command: &str) {
        let mut buf = Vec::new();
        self.render_usage(&mut buf, for_command).ok();
        self.base.out.write_all(&buf).ok();
    }

    pub fn print_version(&mut self) {
        self.base.print_version();
    }

    pub fn print_help(&mut self, for_command: &str) {
        let mut buf = Vec::new();
        self.render_help(&mut buf, for_command).ok();
        self.base.out.write_all(&buf).ok();
    }

    /// Run one invocation and return the exit code; the process is never
    /// terminated here.
    ///
    /// With no matching command the app-level scope parses the
    /// arguments, and unless help or version was requested the help text
    /// is printed and a usage exit code returned.
    pub fn run(&mut self, ctx: &RunContext, args: &[String]) -> i32 {
        if let Err(err) = self.base.run_init() {
            return self.base.fail(err);
        }

        let (scope, selected, rest) = self.resolve(args);
        debug!(
            command = selected.as_deref().unwrap_or("<none>"),
            "resolved invocation"
        );

        ensure_builtin_flags(&scope);
        let parsed = scope.borrow_mut().parse(&rest);
        if let Err(err) = parsed {
            return self.base.fail(RunError::Parse(err));
        }

        let (help, version) = AppBase::builtin_flags(&scope);
        if help {
            self.print_help(selected.as_deref().unwrap_or(""));
            return exitcode::OK;
        }
        if version {
            self.print_version();
            return exitcode::OK;
        }

        let Some(name) = selected else {
            self.print_help("");
            return exitcode::USAGE;
        };

        let positional = scope.borrow().positional();
        if let Some(exec) = self.commands.get_mut(&name).and_then(|c| c.exec.as_mut()) {
            if let Err(err) = exec(ctx, &positional, self.base.out.as_mut()) {
                return self.base.fail(RunError::Execution(err));
            }
            return exitcode::OK;
        }

        // Registered without an executor: the command is help-only.
        self.print_help(&name);
        exitcode::OK
    }

    /// Determine the scope owning the arguments: the first token selects
    /// a command by exact name match, everything else stays app-level.
    fn resolve(&self, args: &[String]) -> (SharedFlags, Option<String>, Vec<String>) {
        if let Some(first) = args.first() {
            if let Some(entry) = self.commands.get(first) {
                return (
                    entry.flags.clone(),
                    Some(entry.info.name.clone()),
                    args[1..].to_vec(),
                );
            }
        }
        (self.base.flags.clone(), None, args.to_vec())
    }

    fn render_usage(&self, w: &mut dyn Write, for_command: &str) -> io::Result<()> {
        match self.commands.get(for_command) {
            Some(entry) => {
                let invocation = format!("{} {}", self.base.info.name, entry.info.name);
                render::write_usage_line(w, &invocation, &entry.info.usage)
            }
            None => render::write_usage_line(w, &self.base.info.name, &self.base.info.usage),
        }
    }

    fn render_help(&self, w: &mut dyn Write, for_command: &str) -> io::Result<()> {
        let command = self.commands.get(for_command);

        self.render_usage(w, for_command)?;

        let summary = command
            .map(|entry| entry.info.summary.as_str())
            .unwrap_or(self.base.info.summary.as_str());
        if !summary.is_empty() {
            writeln!(w)?;
            writeln!(w, "{summary}")?;
        }

        if command.is_none() && !self.commands.is_empty() {
            writeln!(w)?;
            writeln!(w, "Commands:")?;
            writeln!(w)?;
            for entry in self.commands.iter() {
                writeln!(w, "\t{}\t{}", entry.info.name, entry.info.summary)?;
            }
        }

        let specs = match command {
            Some(entry) => render::merge_specs(
                &self.base.flags.borrow().specs(),
                &entry.flags.borrow().specs(),
            ),
            None => self.base.flags.borrow().specs(),
        };
        writeln!(w)?;
        writeln!(w, "Options:")?;
        writeln!(w)?;
        render::write_flag_specs(w, &specs)?;

        writeln!(w)?;
        render::write_version_line(w, &self.base.info.name, &self.base.info.version)
    }
}
