//! # tiledoc-core
//!
//! Core library for the tiledoc reference-manual generator.
//!
//! This crate validates declarative topic and function records, derives the
//! implicit arguments and error codes of each function, orders topics, and
//! provides the text-tile algebra the renderers compose pages with.

pub mod builder;
pub mod config;
pub mod enrich;
pub mod index;
pub mod models;
pub mod records;
pub mod schema;
pub mod tile;

pub use builder::{BuildError, CorpusBuilder};
pub use config::{Config, ConfigError};
pub use index::Corpus;
pub use models::{
    Argument, ArgumentOptions, Capabilities, Function, FunctionOptions, Placement, ResultOptions,
    ResultSpec, Topic, TopicOptions, CANONICAL_HEADER,
};
pub use records::RecordKind;
pub use schema::SchemaError;
pub use tile::{Context, JoinMode, Template, TemplateError, Tile};
