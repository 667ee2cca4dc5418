//! `huntdiff mass-categorize`: label many samples of one hunt.

use clap::Args;
use huntdiff_core::labeling::mass_categorize;
use huntdiff_core::labels::BulkOutcome;
use serde::Serialize;
use std::io::Write;

use crate::cmd::categorize::parse_classification;
use crate::output::{fail, pretty_kv, pretty_section, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct MassCategorizeArgs {
    /// Hunt the labels are made for.
    pub hunt_id: String,

    /// `tp`, `fp`, `true_positive`, or `false_positive`.
    pub classification: String,

    /// Sample ids to label.
    #[arg(required = true, value_name = "SAMPLE_ID")]
    pub sample_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct MassCategorizeOutput {
    hunt_id: String,
    classification: String,
    #[serde(flatten)]
    outcome: BulkOutcome,
}

pub fn run_mass_categorize(args: &MassCategorizeArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let classification = parse_classification(&args.classification, output)?;

    let outcome = session
        .mutate(|state, source| {
            mass_categorize(state, source, &args.hunt_id, &args.sample_ids, classification)
        })
        .map_err(|err| fail(output, &err))?;

    let payload = MassCategorizeOutput {
        hunt_id: args.hunt_id.clone(),
        classification: classification.to_string(),
        outcome,
    };

    render_mode(
        output,
        &payload,
        |p, w| {
            for id in &p.outcome.succeeded {
                writeln!(w, "ok   {id}  {}", p.classification)?;
            }
            for failure in &p.outcome.failed {
                writeln!(w, "err  {}  {}", failure.sample_id, failure.reason)?;
            }
            Ok(())
        },
        |p, w| {
            pretty_section(w, &format!("Labeled samples in {}", p.hunt_id))?;
            pretty_kv(w, "label", &p.classification)?;
            pretty_kv(w, "labeled", p.outcome.succeeded.len().to_string())?;
            pretty_kv(w, "failed", p.outcome.failed.len().to_string())?;
            for failure in &p.outcome.failed {
                writeln!(w, "  {}: {}", failure.sample_id, failure.reason)?;
            }
            Ok(())
        },
    )
}
