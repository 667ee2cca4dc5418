//! `huntdiff show`: one hunt's samples with their labels.

use clap::Args;
use huntdiff_core::model::Classification;
use huntdiff_core::view::{HuntView, SampleRow, analyze_hunt};
use std::io::Write;

use crate::cmd::list::stats_line;
use crate::output::{fail, pretty_kv, pretty_rule, pretty_section, render_mode};
use crate::session::Session;

const SUBJECT_WIDTH: usize = 48;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Hunt id to display.
    pub hunt_id: String,

    /// Include samples labeled while working on another hunt.
    #[arg(long)]
    pub all: bool,
}

pub fn run_show(args: &ShowArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let view = session
        .mutate(|state, source| analyze_hunt(state, source, &args.hunt_id, args.all))
        .map_err(|err| fail(output, &err))?;

    render_mode(output, &view, write_text, write_pretty)
}

fn status_label(row: &SampleRow) -> &'static str {
    row.status.map_or("-", Classification::as_str)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

fn write_text(view: &HuntView, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "{}  {}", view.hunt.id, stats_line(&view.hunt.stats))?;
    for row in &view.rows {
        writeln!(
            w,
            "{}  {}  {}  {}",
            row.id,
            status_label(row),
            row.labeled_in.as_deref().unwrap_or("-"),
            row.subject
        )?;
    }
    Ok(())
}

fn write_pretty(view: &HuntView, w: &mut dyn Write) -> std::io::Result<()> {
    let hunt = &view.hunt;
    pretty_section(w, &format!("Hunt \"{}\"", hunt.name))?;
    pretty_kv(w, "id", &hunt.id)?;
    pretty_kv(w, "counts", stats_line(&hunt.stats))?;
    if let Some(timeframe) = &hunt.timeframe {
        pretty_kv(
            w,
            "timeframe",
            format!("{} .. {}", timeframe.formatted_start, timeframe.formatted_end),
        )?;
    }
    if let Some(warning) = &hunt.status_warning {
        pretty_kv(w, "warning", warning)?;
    }
    if view.counts_mismatch {
        pretty_kv(
            w,
            "note",
            format!(
                "cached counts differ ({}); run `huntdiff reprocess`",
                stats_line(&view.cached_stats)
            ),
        )?;
    }
    if view.first_view && hunt.stats.pre_labeled > 0 {
        pretty_kv(
            w,
            "note",
            format!(
                "{} samples were already labeled in other hunts",
                hunt.stats.pre_labeled
            ),
        )?;
    }
    writeln!(w)?;

    writeln!(
        w,
        "{:<20}  {:<14}  {:<SUBJECT_WIDTH$}  SENDER",
        "SAMPLE", "STATUS", "SUBJECT"
    )?;
    pretty_rule(w)?;
    for row in &view.rows {
        let status = match &row.labeled_in {
            Some(origin) => format!("{} ({origin})", status_label(row)),
            None => status_label(row).to_string(),
        };
        writeln!(
            w,
            "{:<20}  {:<14}  {:<SUBJECT_WIDTH$}  {}",
            row.id,
            status,
            truncate(&row.subject, SUBJECT_WIDTH),
            row.sender.as_deref().unwrap_or("-")
        )?;
        if !row.rules.is_empty() {
            let more = row.rule_count.saturating_sub(row.rules.len());
            let suffix = if more > 0 { format!(" (+{more})") } else { String::new() };
            writeln!(w, "{:<22}rules: {}{suffix}", "", row.rules.join(", "))?;
        }
    }
    if view.hidden_pre_labeled > 0 {
        writeln!(
            w,
            "{} pre-labeled samples hidden; pass --all to show them",
            view.hidden_pre_labeled
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate("", 3), "");
    }
}
