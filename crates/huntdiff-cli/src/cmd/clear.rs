//! `huntdiff clear`: remove every hunt and label.

use clap::Args;
use huntdiff_core::lifecycle::clear;
use std::io::{IsTerminal, Write};

use crate::output::{fail, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip the interactive confirmation prompt.
    #[arg(long)]
    pub force: bool,
}

fn confirm_clear() -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return Ok(true);
    }

    eprint!("Remove all hunts and labels? [y/N] ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub fn run_clear(args: &ClearArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    if !args.force && !confirm_clear()? {
        anyhow::bail!("clear cancelled");
    }

    let report = session
        .mutate(|state, _| Ok(clear(state)))
        .map_err(|err| fail(output, &err))?;

    render_mode(
        output,
        &report,
        |r, w| writeln!(w, "cleared hunts={} labels={}", r.hunts, r.labels),
        |r, w| writeln!(w, "Removed {} hunts and {} labels.", r.hunts, r.labels),
    )
}
