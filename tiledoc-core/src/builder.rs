//! Corpus building - collects records, then validates, enriches and indexes.

use crate::{
    enrich::enrich_all,
    index::Corpus,
    models::{standard_error, Function, Placement, Topic},
    records::{discover, function_from_record, topic_from_record, RecordKind},
    schema::{validate, Record, SchemaError, FUNCTION, TOPIC},
};
use serde_yaml::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk records directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to parse {label}: {source}")]
    Parse {
        label: String,
        source: serde_yaml::Error,
    },

    #[error("Invalid record {label}: {source}")]
    Schema { label: String, source: SchemaError },

    #[error("Duplicate topic: {0}")]
    DuplicateTopic(String),

    #[error("Duplicate function: {0}")]
    DuplicateFunction(String),

    #[error("Function '{function}' refers to unknown topic '{topic}'")]
    UnknownTopic { function: String, topic: String },

    #[error("Function '{function}' names '{topic}' as its protocol, but that topic has no protocol")]
    NotAProtocol { function: String, topic: String },

    #[error("Function '{function}' lists unknown error code {code}")]
    UnknownErrorCode { function: String, code: String },
}

/// Collects raw declaration records; [`CorpusBuilder::build`] turns them
/// into a [`Corpus`] in a single pass.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    topics: Vec<(String, Value)>,
    functions: Vec<(String, Value)>,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw topic record. `label` names it in error messages.
    pub fn add_topic(&mut self, label: impl Into<String>, record: Value) -> &mut Self {
        self.topics.push((label.into(), record));
        self
    }

    /// Add a raw function record. `label` names it in error messages.
    pub fn add_function(&mut self, label: impl Into<String>, record: Value) -> &mut Self {
        self.functions.push((label.into(), record));
        self
    }

    pub fn add_record(
        &mut self,
        kind: RecordKind,
        label: impl Into<String>,
        record: Value,
    ) -> &mut Self {
        match kind {
            RecordKind::Topic => self.add_topic(label, record),
            RecordKind::Function => self.add_function(label, record),
        }
    }

    /// Load every record file found under `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, BuildError> {
        let files = discover(dir)?;
        tracing::info!("Found {} record files", files.len());

        let mut builder = Self::new();
        for (path, kind) in files {
            let label = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();
            let contents = fs::read_to_string(&path)?;
            let record: Value = serde_yaml::from_str(&contents).map_err(|source| {
                BuildError::Parse {
                    label: label.clone(),
                    source,
                }
            })?;
            tracing::debug!("Loaded {} record {}", kind.as_str(), label);
            builder.add_record(kind, label, record);
        }
        Ok(builder)
    }

    pub fn record_count(&self) -> usize {
        self.topics.len() + self.functions.len()
    }

    /// Validate, construct, enrich and index every collected record.
    ///
    /// Fails on the first structural or referential problem.
    pub fn build(self) -> Result<Corpus, BuildError> {
        let mut topics: Vec<Topic> = Vec::with_capacity(self.topics.len());
        let mut topic_index: HashMap<String, usize> = HashMap::new();
        for (label, mut value) in self.topics {
            let topic = load(&TOPIC, &label, &mut value, topic_from_record)?;
            let id = topic.id.as_str().to_string();
            if topic_index.contains_key(&id) {
                tracing::warn!("Duplicate topic: {}", id);
                return Err(BuildError::DuplicateTopic(id));
            }
            topic_index.insert(id, topics.len());
            topics.push(topic);
        }

        let mut functions: Vec<Function> = Vec::with_capacity(self.functions.len());
        let mut variants = 0;
        for (label, mut value) in self.functions {
            let function = load(&FUNCTION, &label, &mut value, function_from_record)?;
            let variant = function.storage_variant();
            functions.push(function);
            if let Some(variant) = variant {
                variants += 1;
                functions.push(variant);
            }
        }
        tracing::debug!("Derived {} storage variants", variants);

        let mut names = HashSet::new();
        for function in &functions {
            if !names.insert(function.name.as_str()) {
                tracing::warn!("Duplicate function: {}", function.name);
                return Err(BuildError::DuplicateFunction(function.name.clone()));
            }
        }

        let mut slots = Vec::with_capacity(functions.len());
        for function in &functions {
            let topic = function.topic_id().as_str();
            let Some(&idx) = topic_index.get(topic) else {
                return Err(BuildError::UnknownTopic {
                    function: function.name.clone(),
                    topic: topic.to_string(),
                });
            };
            if matches!(function.placement, Placement::Protocol(_)) && topics[idx].protocol.is_none()
            {
                return Err(BuildError::NotAProtocol {
                    function: function.name.clone(),
                    topic: topic.to_string(),
                });
            }
            slots.push(idx);
        }

        enrich_all(functions.iter_mut());

        for function in &functions {
            let unknown = function
                .errors
                .iter()
                .find(|code| {
                    standard_error(code).is_none() && !function.custom_errors.contains_key(*code)
                });
            if let Some(code) = unknown {
                return Err(BuildError::UnknownErrorCode {
                    function: function.name.clone(),
                    code: code.clone(),
                });
            }
        }

        let function_count = functions.len();
        for (function, idx) in functions.into_iter().zip(slots) {
            topics[idx].functions.insert(function.name.clone(), function);
        }

        tracing::info!(
            "Built corpus: {} topics, {} functions",
            topics.len(),
            function_count
        );
        Ok(Corpus::new(topics))
    }
}

fn load<T>(
    shape: &'static crate::schema::Shape,
    label: &str,
    value: &mut Value,
    convert: fn(&Record<'_>) -> Result<T, SchemaError>,
) -> Result<T, BuildError> {
    let schema_error = |source| BuildError::Schema {
        label: label.to_string(),
        source,
    };
    validate(shape, value).map_err(schema_error)?;
    let record = Record::new(value).map_err(schema_error)?;
    convert(&record).map_err(schema_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    fn sample() -> CorpusBuilder {
        let mut builder = CorpusBuilder::new();
        builder
            .add_topic("handles", yaml("name: handles\ntitle: Handles\norder: 4\n"))
            .add_topic(
                "tcp",
                yaml("name: tcp\ntitle: TCP protocol\nprotocol: bytestream\n"),
            )
            .add_function(
                "hclose",
                yaml("name: hclose\ninfo: hard-closes a handle\ntopic: handles\nhas_handle_argument: true\n"),
            )
            .add_function(
                "tcp_accept",
                yaml("name: tcp_accept\ninfo: accepts a connection\nprotocol: tcp\nallocates_resource: true\nhas_deadline: true\nstorage: tcp_storage\nargs:\n  - name: s\n    type: int\n    info: Listening socket.\n"),
            );
        builder
    }

    #[test]
    fn test_build_places_and_enriches_functions() {
        let corpus = sample().build().unwrap();

        assert_eq!(corpus.function_count(), 3);
        let (topic, accept) = corpus.find_function("tcp_accept").unwrap();
        assert_eq!(topic.id.as_str(), "tcp");
        let arg_names: Vec<&str> = accept.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(arg_names, ["s", "deadline"]);
        assert!(accept.errors.iter().any(|c| c == "ENOMEM"));

        let (_, variant) = corpus.find_function("tcp_accept_mem").unwrap();
        let arg_names: Vec<&str> = variant.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(arg_names, ["s", "mem", "deadline"]);
        assert_eq!(variant.storage_of.as_deref(), Some("tcp_accept"));
    }

    #[test]
    fn test_duplicate_function_is_rejected() {
        let mut builder = sample();
        builder.add_function(
            "again",
            yaml("name: hclose\ninfo: again\ntopic: handles\n"),
        );
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BuildError::DuplicateFunction(ref name) if name == "hclose"));
    }

    #[test]
    fn test_storage_variant_takes_part_in_duplicate_check() {
        let mut builder = sample();
        builder.add_function(
            "clash",
            yaml("name: tcp_accept_mem\ninfo: clash\ntopic: handles\n"),
        );
        assert!(matches!(
            builder.build(),
            Err(BuildError::DuplicateFunction(_))
        ));
    }

    #[test]
    fn test_duplicate_topic_is_rejected() {
        let mut builder = sample();
        builder.add_topic("dup", yaml("name: tcp\ntitle: Again\n"));
        assert!(matches!(builder.build(), Err(BuildError::DuplicateTopic(_))));
    }

    #[test]
    fn test_unknown_topic_is_rejected() {
        let mut builder = sample();
        builder.add_function("f", yaml("name: f\ninfo: x\ntopic: nowhere\n"));
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BuildError::UnknownTopic { ref topic, .. } if topic == "nowhere"));
    }

    #[test]
    fn test_protocol_placement_requires_protocol_topic() {
        let mut builder = sample();
        builder.add_function("f", yaml("name: f\ninfo: x\nprotocol: handles\n"));
        assert!(matches!(builder.build(), Err(BuildError::NotAProtocol { .. })));
    }

    #[test]
    fn test_unknown_error_code_is_rejected() {
        let mut builder = sample();
        builder.add_function(
            "f",
            yaml("name: f\ninfo: x\ntopic: handles\nerrors: [EPIPE]\n"),
        );
        let err = builder.build().unwrap_err();
        assert!(matches!(err, BuildError::UnknownErrorCode { ref code, .. } if code == "EPIPE"));

        let mut builder = sample();
        builder.add_function(
            "f",
            yaml("name: f\ninfo: x\ntopic: handles\nerrors: [EPIPE]\ncustom_errors:\n  EPIPE: Pipe closed.\n"),
        );
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_schema_error_names_record() {
        let mut builder = sample();
        builder.add_function("broken.function.yml", yaml("name: f\ntopic: handles\n"));
        let err = builder.build().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid record broken.function.yml: Missing required field: function.info"
        );
    }

    #[test]
    fn test_from_dir() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("cr.topic.yml"),
            "name: cr\ntitle: Coroutines\norder: 1\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("yield.function.json"),
            r#"{"name": "yield", "info": "yields CPU to other coroutines", "topic": "cr"}"#,
        )
        .unwrap();

        let builder = CorpusBuilder::from_dir(dir.path()).unwrap();
        assert_eq!(builder.record_count(), 2);
        let corpus = builder.build().unwrap();
        assert!(corpus.find_function("yield").is_some());
    }

    #[test]
    fn test_from_dir_reports_parse_errors() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.topic.yml"), "name: [unclosed\n").unwrap();
        let err = CorpusBuilder::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::Parse { ref label, .. } if label == "bad.topic.yml"));
    }
}
