//! `huntdiff delete`: remove a hunt and repair the labels it owned.

use clap::Args;
use huntdiff_core::lifecycle::delete_hunt;
use std::io::Write;

use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Hunt id to delete.
    pub hunt_id: String,
}

pub fn run_delete(args: &DeleteArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let report = session
        .mutate(|state, source| delete_hunt(state, source, &args.hunt_id))
        .map_err(|err| fail(output, &err))?;

    render_mode(
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "deleted {}  reassigned={} removed={} remaining={}",
                r.hunt_id, r.reassigned, r.removed, r.remaining_hunts
            )
        },
        |r, w| {
            pretty_section(w, &format!("Deleted hunt \"{}\"", r.name))?;
            pretty_kv(w, "id", &r.hunt_id)?;
            pretty_kv(w, "samples", r.samples.to_string())?;
            pretty_kv(w, "reassigned", r.reassigned.to_string())?;
            pretty_kv(w, "removed", r.removed.to_string())?;
            pretty_kv(w, "remaining", r.remaining_hunts.to_string())
        },
    )
}
