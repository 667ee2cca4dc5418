//! `huntdiff categorize`: label one sample.

use clap::Args;
use huntdiff_core::labeling::categorize;
use huntdiff_core::model::Classification;
use huntdiff_core::{EngineError, ErrorCode};
use std::io::Write;

use crate::output::{CliError, OutputMode, fail, pretty_kv, pretty_section, render_error, render_mode};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct CategorizeArgs {
    /// Hunt the label is made for.
    pub hunt_id: String,

    /// Sample (message group) id.
    pub sample_id: String,

    /// `tp`, `fp`, `true_positive`, or `false_positive`.
    pub classification: String,

    /// Sample subject; fetched from the hunt when omitted.
    #[arg(long)]
    pub subject: Option<String>,
}

/// Parse a classification argument, rendering the error on failure.
pub fn parse_classification(raw: &str, output: OutputMode) -> anyhow::Result<Classification> {
    raw.parse::<Classification>().map_err(|err| {
        let cli_error = CliError::from_code(ErrorCode::InvalidClassification, err.to_string());
        if let Err(render_err) = render_error(output, &cli_error) {
            tracing::warn!("failed to render error: {render_err}");
        }
        anyhow::anyhow!("{err}")
    })
}

pub fn run_categorize(args: &CategorizeArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let classification = parse_classification(&args.classification, output)?;

    let outcome = session
        .mutate(|state, source| {
            if !state.hunts.contains(&args.hunt_id) {
                return Err(EngineError::hunt_not_found(&args.hunt_id));
            }
            let subject = match &args.subject {
                Some(subject) => subject.clone(),
                None => source
                    .fetch_hunt_results(&args.hunt_id)?
                    .into_iter()
                    .find(|s| s.id == args.sample_id)
                    .map(|s| s.subject)
                    .ok_or_else(|| EngineError::sample_not_found(&args.sample_id))?,
            };
            categorize(state, &args.sample_id, &args.hunt_id, &subject, classification)
        })
        .map_err(|err| fail(output, &err))?;

    render_mode(
        output,
        &outcome,
        |o, w| {
            writeln!(
                w,
                "{}  {}  {}",
                o.record.sample_id, o.record.classification, o.record.origin_hunt_id
            )
        },
        |o, w| {
            pretty_section(w, &format!("Labeled {}", o.record.sample_id))?;
            pretty_kv(w, "subject", &o.record.cached_subject)?;
            pretty_kv(w, "label", o.record.classification.as_str())?;
            pretty_kv(w, "hunt", &o.record.origin_hunt_id)?;
            if let Some(previous) = &o.previous {
                pretty_kv(
                    w,
                    "was",
                    format!("{} ({})", previous.classification, previous.origin_hunt_id),
                )?;
            }
            Ok(())
        },
    )
}
