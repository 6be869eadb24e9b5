//! # tiledoc-render
//!
//! Renderers for tiledoc.
//!
//! This crate turns a built [`Corpus`] into reference pages, a table of
//! contents (Askama) and the consolidated header.

pub mod header;
pub mod reflow;
pub mod sections;
pub mod templates;

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tiledoc_core::{Config, Corpus, TemplateError};

pub use header::{render_header, DEFAULT_SKELETON};
pub use reflow::reflow;
pub use sections::render_page;
pub use templates::{TocSection, TocTemplate};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Askama error: {0}")]
    Askama(#[from] askama::Error),

    #[error("Function '{function}' lists unknown error code {code}")]
    UnknownErrorCode { function: String, code: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Page,
    Toc,
    Header,
}

/// One output file, addressed relative to the output directory
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub reflow_paragraphs: bool,
    pub page_extension: String,
    pub enable_toc: bool,
    pub enable_header: bool,
    /// Header skeleton; `None` uses [`DEFAULT_SKELETON`]
    pub header_template: Option<String>,
    pub header_path: PathBuf,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            reflow_paragraphs: true,
            page_extension: "md".to_string(),
            enable_toc: true,
            enable_header: true,
            header_template: None,
            header_path: PathBuf::from(tiledoc_core::CANONICAL_HEADER),
        }
    }
}

impl RenderOptions {
    /// Options from `config`; the header skeleton is read by the caller.
    pub fn from_config(config: &Config, header_template: Option<String>) -> Self {
        Self {
            reflow_paragraphs: config.reflow_paragraphs,
            page_extension: config.page_extension().to_string(),
            enable_toc: config.enable_toc,
            enable_header: config.enable_header,
            header_template,
            header_path: config.paths.header_output.clone(),
        }
    }
}

/// Render every page, then the table of contents and the header.
///
/// Nothing is written here, so a failure leaves no partial output behind.
pub fn render_all(
    corpus: &Corpus,
    opts: &RenderOptions,
) -> Result<Vec<RenderedDocument>, RenderError> {
    let mut documents = Vec::with_capacity(corpus.function_count() + 2);

    for (topic, function) in corpus.functions() {
        let page = render_page(topic, function)?;
        let mut contents = page.to_string();
        contents.push('\n');
        if opts.reflow_paragraphs {
            contents = reflow(&contents);
        }
        documents.push(RenderedDocument {
            path: PathBuf::from(format!("{}.{}", function.name, opts.page_extension)),
            kind: DocumentKind::Page,
            contents,
        });
    }
    tracing::info!("Rendered {} pages", documents.len());

    if opts.enable_toc {
        documents.push(RenderedDocument {
            path: PathBuf::from(format!("toc.{}", opts.page_extension)),
            kind: DocumentKind::Toc,
            contents: TocTemplate::from_corpus(corpus).render_toc()?,
        });
    }

    if opts.enable_header {
        let skeleton = opts.header_template.as_deref().unwrap_or(DEFAULT_SKELETON);
        documents.push(RenderedDocument {
            path: opts.header_path.clone(),
            kind: DocumentKind::Header,
            contents: render_header(corpus, skeleton)?,
        });
    }

    Ok(documents)
}
