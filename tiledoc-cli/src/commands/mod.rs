//! CLI command implementations.

pub mod build;
pub mod check;
pub mod topics;

pub use build::build_docs;
pub use check::check_records;
pub use topics::list_topics;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tiledoc_core::{Config, Corpus, CorpusBuilder};
use tiledoc_render::RenderOptions;

/// Load the config and build the corpus from its records directory.
pub(crate) fn load_corpus(config_path: &Path) -> Result<(Config, Corpus)> {
    tracing::info!("Loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let records = config.records_dir();
    let builder = CorpusBuilder::from_dir(&records)
        .with_context(|| format!("Failed to load records from {:?}", records))?;
    let corpus = builder.build().context("Failed to build corpus")?;
    Ok((config, corpus))
}

/// Render options for `config`, reading the header skeleton if one is set.
pub(crate) fn render_options(config: &Config) -> Result<RenderOptions> {
    let header_template = match config.header_template_path() {
        Some(path) if config.enable_header => Some(
            fs::read_to_string(&path)
                .with_context(|| format!("Failed to read header template {:?}", path))?,
        ),
        _ => None,
    };
    Ok(RenderOptions::from_config(config, header_template))
}
