//! Build command implementation.

use super::{load_corpus, render_options};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tiledoc_render::{render_all, DocumentKind};

#[derive(Serialize)]
struct BuildSummary {
    pages: usize,
    toc: Option<PathBuf>,
    header: Option<PathBuf>,
    output: PathBuf,
}

/// Render everything in memory, then write the documents.
pub fn build_docs(config_path: &Path, json: bool) -> Result<()> {
    let (config, corpus) = load_corpus(config_path)?;
    let opts = render_options(&config)?;
    let documents = render_all(&corpus, &opts).context("Failed to render documentation")?;

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).context("Failed to create output directory")?;

    let mut summary = BuildSummary {
        pages: 0,
        toc: None,
        header: None,
        output: output_dir.clone(),
    };
    for doc in &documents {
        let path = output_dir.join(&doc.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        fs::write(&path, &doc.contents)
            .with_context(|| format!("Failed to write {:?}", path))?;
        tracing::debug!("Wrote {:?}", path);

        match doc.kind {
            DocumentKind::Page => summary.pages += 1,
            DocumentKind::Toc => summary.toc = Some(path),
            DocumentKind::Header => summary.header = Some(path),
        }
    }

    tracing::info!("✓ Built {} pages", summary.pages);
    tracing::info!("✓ Output written to {:?}", output_dir);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
