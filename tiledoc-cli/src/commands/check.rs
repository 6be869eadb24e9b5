//! Validate records without writing output.

use super::{load_corpus, render_options};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tiledoc_render::render_all;

#[derive(Serialize)]
struct CheckSummary {
    topics: usize,
    functions: usize,
    storage_variants: usize,
    documents: usize,
}

/// Run the whole pipeline in memory so template and error-code problems
/// surface as well as record problems.
pub fn check_records(config_path: &Path, json: bool) -> Result<()> {
    let (config, corpus) = load_corpus(config_path)?;
    let opts = render_options(&config)?;
    let documents = render_all(&corpus, &opts).context("Failed to render documentation")?;

    let summary = CheckSummary {
        topics: corpus.topics().len(),
        functions: corpus.function_count(),
        storage_variants: corpus
            .functions()
            .filter(|(_, f)| f.storage_of.is_some())
            .count(),
        documents: documents.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Check complete: {} topics, {} functions ({} storage variants), {} documents",
            summary.topics, summary.functions, summary.storage_variants, summary.documents
        );
    }
    Ok(())
}
