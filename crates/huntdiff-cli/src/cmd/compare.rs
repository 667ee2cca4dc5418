//! `huntdiff compare`: compare a previous and a current hunt.

use clap::Args;
use huntdiff_core::compare::{Comparison, HuntSummary, compare_hunts};
use huntdiff_core::diff::render_text;
use std::io::Write;

use crate::output::{fail, pretty_kv, pretty_rule, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Previous (baseline) hunt id.
    pub previous: String,

    /// Current hunt id.
    pub current: String,

    /// Print the rule diff as HTML.
    #[arg(long)]
    pub html: bool,
}

pub fn run_compare(args: &CompareArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let source = session.source();
    let comparison = session
        .read()
        .and_then(|state| compare_hunts(&state, source.as_ref(), &args.previous, &args.current))
        .map_err(|err| fail(output, &err))?;

    let html = args.html;
    render_mode(
        output,
        &comparison,
        move |c, w| write_text(c, w, html),
        move |c, w| write_pretty(c, w, html),
    )
}

fn write_text(c: &Comparison, w: &mut dyn Write, html: bool) -> std::io::Result<()> {
    writeln!(w, "verdict  {}  {}", c.verdict.kind.as_str(), c.verdict.message)?;
    writeln!(
        w,
        "metrics  fp_reduction={} ({:.1}%) tp_retention={:.1}% new_tp={}",
        c.metrics.fp_reduction_count,
        c.metrics.fp_reduction_percent,
        c.metrics.tp_retention_percent,
        c.metrics.new_tp_count
    )?;
    if let Some(warning) = &c.timeframe_warning {
        writeln!(w, "warning  {warning}")?;
    }
    for warning in &c.status_warnings {
        writeln!(w, "warning  {warning}")?;
    }
    for s in &c.missing_true_positives {
        writeln!(w, "missing_tp  {}  {}", s.id, s.subject)?;
    }
    for s in &c.eliminated_false_positives {
        writeln!(w, "eliminated_fp  {}  {}", s.id, s.subject)?;
    }
    for s in &c.new_true_positives {
        writeln!(w, "new_tp  {}  {}", s.id, s.subject)?;
    }
    for s in &c.missing_all_true_positives {
        writeln!(w, "missing_any_tp  {}  {}  {}", s.id, s.hunt_name, s.subject)?;
    }
    if html {
        writeln!(w, "{}", c.rule_diff_html)?;
    } else if !c.rule_diff.is_empty() {
        writeln!(w, "rule_diff  {}", render_text(&c.rule_diff))?;
    }
    Ok(())
}

fn write_summary(w: &mut dyn Write, label: &str, h: &HuntSummary) -> std::io::Result<()> {
    pretty_kv(
        w,
        label,
        format!(
            "{} ({})  {} samples, tp={} fp={}",
            h.name, h.id, h.samples, h.stats.true_positives, h.stats.false_positives
        ),
    )?;
    if let Some(timeframe) = &h.timeframe {
        writeln!(
            w,
            "{:<15}{} .. {} ({:.1} days)",
            "", timeframe.formatted_start, timeframe.formatted_end, timeframe.duration_days
        )?;
    }
    Ok(())
}

fn write_pretty(c: &Comparison, w: &mut dyn Write, html: bool) -> std::io::Result<()> {
    pretty_section(w, "Hunt comparison")?;
    write_summary(w, "previous", &c.previous)?;
    write_summary(w, "current", &c.current)?;
    if let Some(warning) = &c.timeframe_warning {
        pretty_kv(w, "warning", warning)?;
    }
    for warning in &c.status_warnings {
        pretty_kv(w, "warning", warning)?;
    }
    writeln!(w)?;

    pretty_section(w, &format!("Verdict: {}", c.verdict.kind.as_str()))?;
    writeln!(w, "{}", c.verdict.message)?;
    pretty_kv(
        w,
        "fp reduction",
        format!(
            "{} of {} ({:.1}%)",
            c.metrics.fp_reduction_count, c.prev_false_positives, c.metrics.fp_reduction_percent
        ),
    )?;
    pretty_kv(
        w,
        "tp retention",
        format!(
            "{} of {} ({:.1}%)",
            c.common_true_positives.len(),
            c.prev_true_positives,
            c.metrics.tp_retention_percent
        ),
    )?;
    pretty_kv(w, "new tp", c.metrics.new_tp_count.to_string())?;
    writeln!(w)?;

    if !c.missing_all_true_positives.is_empty() {
        pretty_section(w, "True positives the current hunt misses")?;
        for s in &c.missing_all_true_positives {
            writeln!(w, "{:<20}  {:<20}  {}", s.id, s.hunt_name, s.subject)?;
        }
        writeln!(w)?;
    }
    if !c.eliminated_false_positives.is_empty() {
        pretty_section(w, "Eliminated false positives")?;
        for s in &c.eliminated_false_positives {
            writeln!(w, "{:<20}  {}", s.id, s.subject)?;
        }
        writeln!(w)?;
    }
    if !c.new_true_positives.is_empty() {
        pretty_section(w, "New true positives")?;
        for s in &c.new_true_positives {
            writeln!(w, "{:<20}  {}", s.id, s.subject)?;
        }
        writeln!(w)?;
    }

    pretty_section(w, "Rule diff")?;
    if html {
        writeln!(w, "{}", c.rule_diff_html)
    } else if c.rule_diff.is_empty() {
        writeln!(w, "(no rule source for either hunt)")
    } else {
        writeln!(w, "{}", render_text(&c.rule_diff))?;
        pretty_rule(w)
    }
}
