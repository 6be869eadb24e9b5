//! Declaration record discovery and conversion into models.

use crate::models::{
    Argument, ArgumentOptions, Capabilities, Function, FunctionOptions, Placement, ResultOptions,
    ResultSpec, Topic, TopicOptions,
};
use crate::schema::{Record, SchemaError, PROTOCOL_CHOICES};
use std::path::{Path, PathBuf};
use tiledoc_types::{Protocol, TopicId};
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Topic,
    Function,
}

impl RecordKind {
    /// Classify `name.topic.yml`, `name.function.json` and friends.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if !EXTENSIONS.contains(&ext) {
            return None;
        }
        let stem = Path::new(path.file_stem()?);
        match stem.extension()?.to_str()? {
            "topic" => Some(RecordKind::Topic),
            "function" => Some(RecordKind::Function),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Topic => "topic",
            RecordKind::Function => "function",
        }
    }
}

/// Record files under `dir`, ordered by relative path.
pub fn discover(dir: &Path) -> Result<Vec<(PathBuf, RecordKind)>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = RecordKind::from_path(entry.path()) {
            files.push((entry.path().to_path_buf(), kind));
        } else {
            tracing::debug!("Skipping {}", entry.path().display());
        }
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

pub fn topic_from_record(record: &Record<'_>) -> Result<Topic, SchemaError> {
    let protocol = match record.string("protocol") {
        Some(name) => Some(name.parse::<Protocol>().map_err(|_| SchemaError::InvalidChoice {
            path: "topic.protocol".to_string(),
            found: name.to_string(),
            allowed: PROTOCOL_CHOICES.join(", "),
        })?),
        None => None,
    };

    Ok(Topic::new(
        record.required("name")?,
        record.required("title")?,
        TopicOptions {
            order: record.integer("order"),
            protocol,
            info: record.string("info").map(str::to_string),
            example: record.string("example").map(str::to_string),
            experimental: record.flag("experimental"),
        },
    ))
}

fn argument_from_record(record: &Record<'_>) -> Result<Argument, SchemaError> {
    Ok(Argument::new(
        record.required("name")?,
        record.required("info")?,
        ArgumentOptions {
            type_name: record.text("type"),
            suffix: record.text("suffix"),
            internal: record.flag("internal"),
        },
    ))
}

fn result_from_record(record: &Record<'_>) -> Result<ResultSpec, SchemaError> {
    Ok(ResultSpec::new(
        record.required("type")?,
        ResultOptions {
            success: record.string("success").map(str::to_string),
            error: record.string("error").map(str::to_string),
            info: record.string("info").map(str::to_string),
        },
    ))
}

pub fn function_from_record(record: &Record<'_>) -> Result<Function, SchemaError> {
    let placement = match (record.string("topic"), record.string("protocol")) {
        (Some(topic), None) => Placement::Topic(TopicId::from(topic)),
        (None, Some(protocol)) => Placement::Protocol(TopicId::from(protocol)),
        _ => {
            return Err(SchemaError::ExactlyOne(
                "function.topic, function.protocol".to_string(),
            ))
        }
    };

    let args = record
        .records("args")
        .iter()
        .map(argument_from_record)
        .collect::<Result<Vec<_>, _>>()?;
    let result = record
        .record("result")
        .map(|r| result_from_record(&r))
        .transpose()?;

    Ok(Function::new(
        record.required("name")?,
        record.required("info")?,
        placement,
        FunctionOptions {
            header: record.text("header"),
            args,
            result,
            prologue: record.text("prologue"),
            epilogue: record.text("epilogue"),
            add_to_synopsis: record.string("add_to_synopsis").map(str::to_string),
            add_to_errors: record.string("add_to_errors").map(str::to_string),
            capabilities: Capabilities {
                allocates_resource: record.flag("allocates_resource"),
                has_handle_argument: record.flag("has_handle_argument"),
                has_deadline: record.flag("has_deadline"),
                uses_connection: record.flag("uses_connection"),
                has_iol_list: record.flag("has_iol_list"),
            },
            storage: record.string("storage").map(str::to_string),
            errors: record.strings("errors"),
            custom_errors: record.string_map("custom_errors"),
            example: record.string("example").map(str::to_string),
            experimental: record.flag("experimental"),
            emit_signature: record.flag("emit_signature"),
            emit_boilerplate: record.flag("emit_boilerplate"),
        },
    ))
}
