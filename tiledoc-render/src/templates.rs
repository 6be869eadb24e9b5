//! Askama template definitions.

use askama::Template;
use tiledoc_core::Corpus;

/// Extension used in table-of-contents links; pages are published as HTML.
pub const LINK_EXTENSION: &str = "html";

/// One topic heading with its function names
#[derive(Debug, Clone)]
pub struct TocSection {
    pub title: String,
    pub entries: Vec<String>,
}

/// Table of contents template
#[derive(Template)]
#[template(path = "toc.md", escape = "none")]
pub struct TocTemplate<'a> {
    pub sections: Vec<TocSection>,
    pub link_extension: &'a str,
}

impl<'a> TocTemplate<'a> {
    /// Topics in corpus order, functions by name; topics without functions
    /// are left out.
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let sections = corpus
            .topics()
            .iter()
            .filter(|t| !t.functions.is_empty())
            .map(|t| TocSection {
                title: t.title.clone(),
                entries: t
                    .sorted_functions()
                    .into_iter()
                    .map(|f| f.name.clone())
                    .collect(),
            })
            .collect();
        Self {
            sections,
            link_extension: LINK_EXTENSION,
        }
    }

    /// Render with exactly one trailing newline.
    pub fn render_toc(&self) -> askama::Result<String> {
        let rendered = self.render()?;
        let mut toc = rendered.trim_end().to_string();
        toc.push('\n');
        Ok(toc)
    }
}
