//! `huntdiff diff`: character diff of two rule sources.

use anyhow::Context;
use clap::Args;
use huntdiff_core::EngineError;
use huntdiff_core::diff::{DiffSpan, diff, render_html, render_text};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::output::{fail, render};
use crate::session::Session;

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Old side: a file, or a hunt id with --hunts.
    pub old: String,

    /// New side: a file, or a hunt id with --hunts.
    pub new: String,

    /// Treat OLD and NEW as hunt ids and diff their cached rule source.
    #[arg(long)]
    pub hunts: bool,

    /// Print the HTML rendering instead of inline markers.
    #[arg(long)]
    pub html: bool,
}

#[derive(Debug, Serialize)]
struct DiffOutput {
    spans: Vec<DiffSpan>,
    html: String,
}

fn read_side(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(Path::new(path)).with_context(|| format!("Failed to read {path}"))
}

fn hunt_sources(session: &Session, old: &str, new: &str) -> Result<(String, String), EngineError> {
    let state = session.read()?;
    let source_of = |id: &str| {
        state
            .hunts
            .get(id)
            .map(|h| h.rule_source.clone().unwrap_or_default())
            .ok_or_else(|| EngineError::hunt_not_found(id))
    };
    Ok((source_of(old)?, source_of(new)?))
}

pub fn run_diff(args: &DiffArgs, session: &Session) -> anyhow::Result<()> {
    let output = session.output;
    let (old, new) = if args.hunts {
        hunt_sources(session, &args.old, &args.new).map_err(|err| fail(output, &err))?
    } else {
        (read_side(&args.old)?, read_side(&args.new)?)
    };

    let payload = DiffOutput {
        spans: diff(&old, &new),
        html: render_html(&old, &new),
    };

    let html = args.html;
    render(output, &payload, move |p, w| {
        if html {
            writeln!(w, "{}", p.html)
        } else {
            writeln!(w, "{}", render_text(&p.spans))
        }
    })
}
