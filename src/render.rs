//! Usage, help, and version text rendering.

use std::env;
use std::io::{self, Write};

use crate::flags::{FlagKind, FlagSpec};

/// `Usage: <invocation> <usage>` with a single trailing newline.
pub(crate) fn write_usage_line(w: &mut dyn Write, invocation: &str, usage: &str) -> io::Result<()> {
    writeln!(w, "Usage: {invocation} {usage}")
}

/// `<name>[ <version>] (<os>/<arch>)`; the version segment is omitted
/// entirely, including its leading space, when `version` is empty.
pub(crate) fn write_version_line(w: &mut dyn Write, name: &str, version: &str) -> io::Result<()> {
    if version.is_empty() {
        writeln!(w, "{} ({}/{})", name, env::consts::OS, env::consts::ARCH)
    } else {
        writeln!(w, "{} {} ({}/{})", name, version, env::consts::OS, env::consts::ARCH)
    }
}

/// Two lines per flag: `  --name <hint>` and an indented description with
/// the default value appended for typed flags.
pub(crate) fn write_flag_specs(w: &mut dyn Write, specs: &[FlagSpec]) -> io::Result<()> {
    for spec in specs {
        let hint = match spec.kind {
            FlagKind::Bool => "",
            FlagKind::String => " <string>",
            FlagKind::Int => " <int>",
        };
        writeln!(w, "  --{}{}", spec.name, hint)?;

        let default = match (spec.kind, &spec.default) {
            (FlagKind::String, Some(value)) => format!(" (default: {value:?})"),
            (FlagKind::Int, Some(value)) => format!(" (default: {value})"),
            _ => String::new(),
        };
        writeln!(w, "        {}{}", spec.help, default)?;
    }
    Ok(())
}

/// Union of app-level and command-level flag specs, sorted by name.
/// Command flags shadow app flags on a name collision.
pub(crate) fn merge_specs(app: &[FlagSpec], command: &[FlagSpec]) -> Vec<FlagSpec> {
    let mut merged: std::collections::BTreeMap<String, FlagSpec> = std::collections::BTreeMap::new();
    for spec in app.iter().chain(command) {
        merged.insert(spec.name.clone(), spec.clone());
    }
    merged.into_values().collect()
}
