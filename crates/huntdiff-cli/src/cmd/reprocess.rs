//! `huntdiff reprocess`: reconcile every registered hunt.

use clap::Args;
use huntdiff_core::reconcile::{FetchOutcome, MetadataOutcome, ReconcileReport, reconcile};
use std::io::Write;

use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug, Default)]
pub struct ReprocessArgs {}

pub fn run_reprocess(_args: &ReprocessArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let report = session
        .mutate(|state, source| Ok(reconcile(state, source)))
        .map_err(|err| fail(output, &err))?;

    render_mode(output, &report, write_text, write_pretty)
}

/// List hunts whose fetch failed, if any.
pub fn write_failures(w: &mut dyn Write, report: &ReconcileReport) -> std::io::Result<()> {
    for outcome in report.failed_hunts() {
        if let FetchOutcome::Failed { error } = &outcome.fetch {
            writeln!(w, "warning: could not reprocess {}: {error}", outcome.hunt_id)?;
        }
    }
    if report.deferred > 0 {
        writeln!(
            w,
            "warning: {} labels left for the next reprocess",
            report.deferred
        )?;
    }
    Ok(())
}

fn metadata_note(metadata: &MetadataOutcome) -> Option<String> {
    match metadata {
        MetadataOutcome::Present => None,
        MetadataOutcome::Backfilled => Some("metadata backfilled".to_string()),
        MetadataOutcome::StatusWarning { upstream_status } => {
            Some(format!("upstream status {upstream_status}"))
        }
        MetadataOutcome::Failed { error } => Some(format!("metadata fetch failed: {error}")),
    }
}

fn write_text(report: &ReconcileReport, w: &mut dyn Write) -> std::io::Result<()> {
    for outcome in &report.outcomes {
        let changed = if outcome.stats_changed() { "changed" } else { "same" };
        let fetch = match &outcome.fetch {
            FetchOutcome::Ok { samples } => format!("{samples} samples"),
            FetchOutcome::Failed { .. } => "failed".to_string(),
        };
        writeln!(w, "{}  {fetch}  {changed}", outcome.hunt_id)?;
    }
    writeln!(
        w,
        "reassigned={} removed={} deferred={}",
        report.reassigned, report.removed, report.deferred
    )?;
    write_failures(w, report)
}

fn write_pretty(report: &ReconcileReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Reprocessed hunts")?;
    if report.outcomes.is_empty() {
        writeln!(w, "No hunts registered.")?;
    }
    for outcome in &report.outcomes {
        let a = &outcome.after;
        match &outcome.fetch {
            FetchOutcome::Ok { samples } => writeln!(
                w,
                "{:<24}  {:>5} samples  tp={} fp={} pre={}{}",
                outcome.name,
                samples,
                a.true_positives,
                a.false_positives,
                a.pre_labeled,
                if outcome.stats_changed() { "  (updated)" } else { "" }
            )?,
            FetchOutcome::Failed { .. } => writeln!(w, "{:<24}  fetch failed", outcome.name)?,
        }
        if let Some(note) = metadata_note(&outcome.metadata) {
            writeln!(w, "  {note}")?;
        }
    }
    pretty_kv(w, "reassigned", report.reassigned.to_string())?;
    pretty_kv(w, "removed", report.removed.to_string())?;
    write_failures(w, report)
}
