//! Shape contracts for declaration records.
//!
//! Records arrive as loosely typed YAML values. [`validate`] checks a record
//! against a [`Shape`], fills in declared defaults and drops explicit nulls,
//! so everything downstream can read the record through [`Record`] without
//! re-checking kinds.

use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field '{path}' must be {expected}, found {found}")]
    WrongKind {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field '{path}' must be one of {allowed}, found '{found}'")]
    InvalidChoice {
        path: String,
        found: String,
        allowed: String,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Exactly one of {0} must be set")]
    ExactlyOne(String),
}

/// The kind of value a field holds.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    Str,
    Bool,
    Int,
    StrList,
    StrMap,
    OneOf(&'static [&'static str]),
    Record(&'static Shape),
    RecordList(&'static Shape),
}

impl Kind {
    fn describe(&self) -> &'static str {
        match self {
            Kind::Str => "a string",
            Kind::Bool => "a boolean",
            Kind::Int => "an integer",
            Kind::StrList => "a list of strings",
            Kind::StrMap => "a mapping of strings",
            Kind::OneOf(_) => "a string",
            Kind::Record(_) => "a mapping",
            Kind::RecordList(_) => "a list of mappings",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Presence {
    Required,
    Optional,
    Default(Fill),
}

/// Value substituted for an omitted field.
#[derive(Debug, Clone, Copy)]
pub enum Fill {
    Str(&'static str),
    Bool(bool),
    EmptyList,
    EmptyMap,
}

impl Fill {
    fn value(&self) -> Value {
        match self {
            Fill::Str(s) => Value::String((*s).to_string()),
            Fill::Bool(b) => Value::Bool(*b),
            Fill::EmptyList => Value::Sequence(Vec::new()),
            Fill::EmptyMap => Value::Mapping(Mapping::new()),
        }
    }
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub presence: Presence,
}

#[derive(Debug)]
pub struct Shape {
    pub name: &'static str,
    pub fields: &'static [Field],
}

impl Shape {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

const fn required(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Required,
    }
}

const fn optional(name: &'static str, kind: Kind) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Optional,
    }
}

const fn or(name: &'static str, kind: Kind, fill: Fill) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Default(fill),
    }
}

pub const PROTOCOL_CHOICES: &[&str] = &["bytestream", "message", "application"];

pub static ARGUMENT: Shape = Shape {
    name: "argument",
    fields: &[
        required("name", Kind::Str),
        required("info", Kind::Str),
        or("type", Kind::Str, Fill::Str("")),
        or("suffix", Kind::Str, Fill::Str("")),
        or("internal", Kind::Bool, Fill::Bool(false)),
    ],
};

pub static RESULT: Shape = Shape {
    name: "result",
    fields: &[
        required("type", Kind::Str),
        optional("success", Kind::Str),
        optional("error", Kind::Str),
        optional("info", Kind::Str),
    ],
};

pub static TOPIC: Shape = Shape {
    name: "topic",
    fields: &[
        required("name", Kind::Str),
        required("title", Kind::Str),
        optional("order", Kind::Int),
        optional("protocol", Kind::OneOf(PROTOCOL_CHOICES)),
        optional("info", Kind::Str),
        optional("example", Kind::Str),
        or("experimental", Kind::Bool, Fill::Bool(false)),
    ],
};

pub static FUNCTION: Shape = Shape {
    name: "function",
    fields: &[
        required("name", Kind::Str),
        required("info", Kind::Str),
        optional("topic", Kind::Str),
        optional("protocol", Kind::Str),
        or("header", Kind::Str, Fill::Str(crate::models::CANONICAL_HEADER)),
        or("args", Kind::RecordList(&ARGUMENT), Fill::EmptyList),
        optional("result", Kind::Record(&RESULT)),
        or("prologue", Kind::Str, Fill::Str("")),
        or("epilogue", Kind::Str, Fill::Str("")),
        optional("add_to_synopsis", Kind::Str),
        optional("add_to_errors", Kind::Str),
        or("allocates_resource", Kind::Bool, Fill::Bool(false)),
        or("has_handle_argument", Kind::Bool, Fill::Bool(false)),
        or("has_deadline", Kind::Bool, Fill::Bool(false)),
        or("uses_connection", Kind::Bool, Fill::Bool(false)),
        or("has_iol_list", Kind::Bool, Fill::Bool(false)),
        optional("storage", Kind::Str),
        or("errors", Kind::StrList, Fill::EmptyList),
        or("custom_errors", Kind::StrMap, Fill::EmptyMap),
        optional("example", Kind::Str),
        or("experimental", Kind::Bool, Fill::Bool(false)),
        or("emit_signature", Kind::Bool, Fill::Bool(true)),
        or("emit_boilerplate", Kind::Bool, Fill::Bool(true)),
    ],
};

/// Validate `value` against `shape`, applying defaults in place.
///
/// Explicit `null`s count as omitted. Unknown keys are rejected.
pub fn validate(shape: &'static Shape, value: &mut Value) -> Result<(), SchemaError> {
    validate_at(shape, value, shape.name)
}

fn validate_at(shape: &'static Shape, value: &mut Value, path: &str) -> Result<(), SchemaError> {
    let found = kind_of(value);
    let Value::Mapping(map) = value else {
        return Err(SchemaError::WrongKind {
            path: path.to_string(),
            expected: "a mapping",
            found,
        });
    };

    for key in map.keys() {
        let Some(name) = key.as_str() else {
            return Err(SchemaError::WrongKind {
                path: path.to_string(),
                expected: "a mapping with string keys",
                found: kind_of(key),
            });
        };
        if shape.field(name).is_none() {
            return Err(SchemaError::UnknownField(child(path, name)));
        }
    }

    for field in shape.fields {
        let field_path = child(path, field.name);
        let present = map.get(field.name).is_some_and(|v| !v.is_null());
        if !present {
            map.remove(field.name);
            match field.presence {
                Presence::Required => return Err(SchemaError::MissingField(field_path)),
                Presence::Optional => {}
                Presence::Default(fill) => {
                    map.insert(Value::String(field.name.to_string()), fill.value());
                }
            }
            continue;
        }
        if let Some(v) = map.get_mut(field.name) {
            check_kind(field.kind, v, &field_path)?;
        }
    }
    Ok(())
}

fn check_kind(kind: Kind, value: &mut Value, path: &str) -> Result<(), SchemaError> {
    let found = kind_of(value);
    let wrong = || SchemaError::WrongKind {
        path: path.to_string(),
        expected: kind.describe(),
        found,
    };

    match kind {
        Kind::Str => {
            // Numeric scalars such as `error: -1` are accepted as text.
            if let Value::Number(n) = value {
                *value = Value::String(n.to_string());
            }
            if !value.is_string() {
                return Err(wrong());
            }
        }
        Kind::Bool => {
            if !value.is_bool() {
                return Err(wrong());
            }
        }
        Kind::Int => {
            if value.as_i64().is_none() {
                return Err(wrong());
            }
        }
        Kind::StrList => {
            let Some(items) = value.as_sequence() else {
                return Err(wrong());
            };
            if let Some((idx, item)) = items.iter().enumerate().find(|(_, v)| !v.is_string()) {
                return Err(SchemaError::WrongKind {
                    path: format!("{}[{}]", path, idx),
                    expected: "a string",
                    found: kind_of(item),
                });
            }
        }
        Kind::StrMap => {
            let Some(map) = value.as_mapping() else {
                return Err(wrong());
            };
            for (k, v) in map {
                let Some(key) = k.as_str() else {
                    return Err(wrong());
                };
                if !v.is_string() {
                    return Err(SchemaError::WrongKind {
                        path: child(path, key),
                        expected: "a string",
                        found: kind_of(v),
                    });
                }
            }
        }
        Kind::OneOf(choices) => {
            let Some(s) = value.as_str() else {
                return Err(wrong());
            };
            if !choices.contains(&s) {
                return Err(SchemaError::InvalidChoice {
                    path: path.to_string(),
                    found: s.to_string(),
                    allowed: choices.join(", "),
                });
            }
        }
        Kind::Record(shape) => validate_at(shape, value, path)?,
        Kind::RecordList(shape) => {
            let Some(items) = value.as_sequence_mut() else {
                return Err(wrong());
            };
            for (idx, item) in items.iter_mut().enumerate() {
                validate_at(shape, item, &format!("{}[{}]", path, idx))?;
            }
        }
    }
    Ok(())
}

fn child(path: &str, name: &str) -> String {
    format!("{}.{}", path, name)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Read-only view over a validated record.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    map: &'a Mapping,
}

impl<'a> Record<'a> {
    pub fn new(value: &'a Value) -> Result<Self, SchemaError> {
        match value.as_mapping() {
            Some(map) => Ok(Self { map }),
            None => Err(SchemaError::WrongKind {
                path: "record".to_string(),
                expected: "a mapping",
                found: kind_of(value),
            }),
        }
    }

    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).and_then(Value::as_str)
    }

    pub fn required(&self, key: &str) -> Result<&'a str, SchemaError> {
        self.string(key)
            .ok_or_else(|| SchemaError::MissingField(key.to_string()))
    }

    /// Owned string, empty when absent.
    pub fn text(&self, key: &str) -> String {
        self.string(key).unwrap_or_default().to_string()
    }

    pub fn flag(&self, key: &str) -> bool {
        self.map.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        self.map.get(key).and_then(Value::as_i64)
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        self.map
            .get(key)
            .and_then(Value::as_sequence)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn string_map(&self, key: &str) -> BTreeMap<String, String> {
        self.map
            .get(key)
            .and_then(Value::as_mapping)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn record(&self, key: &str) -> Option<Record<'a>> {
        self.map
            .get(key)
            .and_then(Value::as_mapping)
            .map(|map| Record { map })
    }

    pub fn records(&self, key: &str) -> Vec<Record<'a>> {
        self.map
            .get(key)
            .and_then(Value::as_sequence)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_mapping)
                    .map(|map| Record { map })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_function_defaults_are_filled() {
        let mut value = yaml("name: hclose\ninfo: hard-closes a handle\ntopic: handles\n");
        validate(&FUNCTION, &mut value).unwrap();
        let record = Record::new(&value).unwrap();

        assert_eq!(record.string("header"), Some("libdill.h"));
        assert_eq!(record.string("prologue"), Some(""));
        assert!(!record.flag("has_deadline"));
        assert!(record.flag("emit_signature"));
        assert!(record.flag("emit_boilerplate"));
        assert!(record.strings("errors").is_empty());
        assert!(record.string_map("custom_errors").is_empty());
        assert!(record.string("storage").is_none());
        assert!(record.record("result").is_none());
    }

    #[test]
    fn test_argument_defaults_recurse() {
        let mut value = yaml(
            "name: f\ninfo: x\ntopic: t\nargs:\n  - name: h\n    info: handle\n    type: int\n  - name: expr\n    info: an expression\n",
        );
        validate(&FUNCTION, &mut value).unwrap();
        let record = Record::new(&value).unwrap();
        let args = record.records("args");

        assert_eq!(args.len(), 2);
        assert_eq!(args[1].string("type"), Some(""));
        assert_eq!(args[1].string("suffix"), Some(""));
        assert!(!args[1].flag("internal"));
    }

    #[test]
    fn test_missing_field_reports_path() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\nargs:\n  - name: a\n    info: y\n  - name: b\n");
        let err = validate(&FUNCTION, &mut value).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("function.args[1].info".to_string()));
    }

    #[test]
    fn test_wrong_kind_reports_path() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\nhas_deadline: sometimes\n");
        let err = validate(&FUNCTION, &mut value).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::WrongKind { ref path, expected: "a boolean", .. } if path == "function.has_deadline"
        ));
    }

    #[test]
    fn test_result_shape_is_validated() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\nresult:\n  success: zero\n");
        let err = validate(&FUNCTION, &mut value).unwrap_err();
        assert_eq!(err, SchemaError::MissingField("function.result.type".to_string()));
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\nresult:\n  type: int\n  success: 0\n  error: -1\n");
        validate(&FUNCTION, &mut value).unwrap();
        let record = Record::new(&value).unwrap();
        let result = record.record("result").unwrap();
        assert_eq!(result.string("success"), Some("0"));
        assert_eq!(result.string("error"), Some("-1"));
    }

    #[test]
    fn test_protocol_must_be_known() {
        let mut value = yaml("name: tcp\ntitle: TCP protocol\nprotocol: datagram\n");
        let err = validate(&TOPIC, &mut value).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidChoice { ref found, .. } if found == "datagram"));

        let mut value = yaml("name: tcp\ntitle: TCP protocol\nprotocol: bytestream\norder: 7\n");
        validate(&TOPIC, &mut value).unwrap();
        assert_eq!(Record::new(&value).unwrap().integer("order"), Some(7));
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\nhas_dealine: true\n");
        let err = validate(&FUNCTION, &mut value).unwrap_err();
        assert_eq!(err, SchemaError::UnknownField("function.has_dealine".to_string()));
    }

    #[test]
    fn test_null_counts_as_absent() {
        let mut value = yaml("name: t\ntitle: T\ninfo: ~\nexperimental: null\n");
        validate(&TOPIC, &mut value).unwrap();
        let record = Record::new(&value).unwrap();
        assert!(record.string("info").is_none());
        assert!(!record.flag("experimental"));
    }

    #[test]
    fn test_custom_errors_must_be_strings() {
        let mut value = yaml("name: f\ninfo: x\ntopic: t\ncustom_errors:\n  EPIPE: [1]\n");
        let err = validate(&FUNCTION, &mut value).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::WrongKind { ref path, .. } if path == "function.custom_errors.EPIPE"
        ));
    }

    #[test]
    fn test_protocol_choices_match_types() {
        for protocol in tiledoc_types::Protocol::ALL {
            assert!(PROTOCOL_CHOICES.contains(&protocol.as_str()));
        }
    }
}
