//! `huntdiff completions`: shell completion scripts.

use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    pub shell: Shell,
}

fn write_completions(shell: Shell, command: &mut clap::Command, out: &mut dyn Write) {
    let bin = command.get_name().to_string();
    generate(shell, command, bin, out);
}

/// Write the completion script for `shell` to stdout.
///
/// # Errors
///
/// Returns an error if stdout cannot be flushed.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_completions(shell, command, &mut out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_names_subcommands() {
        let mut command = clap::Command::new("huntdiff")
            .subcommand(clap::Command::new("reprocess"))
            .subcommand(clap::Command::new("compare"));
        let mut buf = Vec::new();
        write_completions(Shell::Bash, &mut command, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("huntdiff"));
        assert!(script.contains("reprocess"));
    }
}
