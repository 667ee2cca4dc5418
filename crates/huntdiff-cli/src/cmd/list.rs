//! `huntdiff list`: registered hunts with cached statistics.

use clap::Args;
use huntdiff_core::model::{Hunt, HuntStats};
use serde::Serialize;
use std::io::Write;

use crate::output::{fail, pretty_rule, render_mode};
use crate::session::Session;

#[derive(Args, Debug, Default)]
pub struct ListArgs {}

#[derive(Debug, Serialize)]
struct ListOutput {
    hunts: Vec<Hunt>,
    labels: usize,
}

/// One-line summary of cached counts.
pub fn stats_line(stats: &HuntStats) -> String {
    format!(
        "{} samples  tp={} fp={} pre={} unlabeled={}",
        stats.total_samples,
        stats.true_positives,
        stats.false_positives,
        stats.pre_labeled,
        stats.unlabeled
    )
}

pub fn run_list(_args: &ListArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let state = session.read().map_err(|err| fail(output, &err))?;
    let payload = ListOutput {
        hunts: state.hunts.iter().cloned().collect(),
        labels: state.labels.len(),
    };

    render_mode(output, &payload, write_text, write_pretty)
}

fn write_text(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.hunts.is_empty() {
        return Ok(());
    }
    writeln!(w, "ID  NAME  TOTAL  TP  FP  PRE  UNLABELED  STATUS")?;
    for hunt in &out.hunts {
        let s = &hunt.stats;
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}  {}",
            hunt.id,
            hunt.name,
            s.total_samples,
            s.true_positives,
            s.false_positives,
            s.pre_labeled,
            s.unlabeled,
            hunt.upstream_status.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

fn write_pretty(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.hunts.is_empty() {
        return writeln!(w, "No hunts yet. Add one with `huntdiff add <HUNT_ID> --name <NAME>`.");
    }

    writeln!(
        w,
        "{:<24}  {:<24}  {:>6}  {:>4}  {:>4}  {:>4}  {:>9}",
        "ID", "NAME", "TOTAL", "TP", "FP", "PRE", "UNLABELED"
    )?;
    pretty_rule(w)?;
    for hunt in &out.hunts {
        let s = &hunt.stats;
        writeln!(
            w,
            "{:<24}  {:<24}  {:>6}  {:>4}  {:>4}  {:>4}  {:>9}",
            hunt.id,
            hunt.name,
            s.total_samples,
            s.true_positives,
            s.false_positives,
            s.pre_labeled,
            s.unlabeled
        )?;
        if let Some(timeframe) = &hunt.timeframe {
            writeln!(
                w,
                "  {} .. {} ({:.1} days)",
                timeframe.formatted_start, timeframe.formatted_end, timeframe.duration_days
            )?;
        }
        if let Some(warning) = &hunt.status_warning {
            writeln!(w, "  warning: {warning}")?;
        }
    }
    pretty_rule(w)?;
    writeln!(w, "{} hunts, {} labels", out.hunts.len(), out.labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn text_rows_have_a_header() {
        let mut hunt = Hunt::new("h1", "baseline", Utc::now());
        hunt.stats.total_samples = 3;
        hunt.stats.true_positives = 1;
        let out = ListOutput {
            hunts: vec![hunt],
            labels: 1,
        };
        let mut buf = Vec::new();
        write_text(&out, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ID  NAME  TOTAL  TP  FP  PRE  UNLABELED  STATUS");
        assert_eq!(lines[1], "h1  baseline  3  1  0  0  0  -");
    }

    #[test]
    fn empty_list_prints_a_hint() {
        let out = ListOutput {
            hunts: Vec::new(),
            labels: 0,
        };
        let mut buf = Vec::new();
        write_pretty(&out, &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().starts_with("No hunts yet"));
    }

    #[test]
    fn stats_line_format() {
        let stats = HuntStats {
            total_samples: 4,
            true_positives: 2,
            false_positives: 1,
            unlabeled: 1,
            ..HuntStats::default()
        };
        assert_eq!(stats_line(&stats), "4 samples  tp=2 fp=1 pre=0 unlabeled=1");
    }
}
