//! `huntdiff add`: import a completed upstream hunt.

use chrono::Utc;
use clap::Args;
use huntdiff_core::lifecycle::{AddReport, add_hunt};
use std::io::Write;

use crate::cmd::list::stats_line;
use crate::cmd::reprocess::write_failures;
use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Upstream hunt job id.
    pub hunt_id: String,

    /// Display name for the hunt.
    #[arg(long)]
    pub name: String,
}

pub fn run_add(args: &AddArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let report = session
        .mutate(|state, source| add_hunt(state, source, &args.hunt_id, &args.name, Utc::now()))
        .map_err(|err| fail(output, &err))?;

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(w, "added {} \"{}\"  {}", r.hunt_id, r.name, stats_line(&r.stats))?;
            write_failures(w, &r.reconcile)
        },
        |r, w| write_pretty(r, w),
    )
}

fn write_pretty(r: &AddReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Added hunt \"{}\"", r.name))?;
    pretty_kv(w, "id", &r.hunt_id)?;
    pretty_kv(w, "samples", r.stats.total_samples.to_string())?;
    pretty_kv(w, "pre-labeled", r.pre_labeled.to_string())?;
    pretty_kv(w, "new", r.stats.total_new_samples.to_string())?;
    pretty_kv(w, "unlabeled", r.stats.unlabeled.to_string())?;
    pretty_kv(
        w,
        "reconciled",
        format!(
            "{} hunts, {} labels reassigned, {} removed",
            r.reconcile.hunts, r.reconcile.reassigned, r.reconcile.removed
        ),
    )?;
    write_failures(w, &r.reconcile)
}
