//! Core data models for topics and functions.

use std::collections::{BTreeMap, HashMap};
use tiledoc_types::{Protocol, TopicId};

/// Header every function is declared in unless it names another one.
pub const CANONICAL_HEADER: &str = "libdill.h";

/// The timer-sleep primitive. Its deadline is the point of the call, so it
/// never reports a timeout.
pub const SLEEP_PRIMITIVE: &str = "msleep";

/// Functions whose `_mem` variant takes `mem` as its first argument.
pub const MEM_FIRST: &[&str] = &["chmake", "ipc_pair"];

/// Topic compiled only with TLS support.
pub const TLS_TOPIC: &str = "tls";

/// Topic compiled only with socket support, despite having no protocol.
pub const IPADDR_TOPIC: &str = "ipaddr";

/// Descriptions for the error codes shared across the library.
pub const STANDARD_ERRORS: &[(&str, &str)] = &[
    ("EBADF", "Invalid handle."),
    (
        "EBUSY",
        "The handle is currently being used by a different coroutine.",
    ),
    ("ECANCELED", "Current coroutine was canceled."),
    ("ECONNRESET", "Broken connection."),
    ("EINVAL", "Invalid argument."),
    (
        "EMFILE",
        "The maximum number of file descriptors in the process are already open.",
    ),
    ("EMSGSIZE", "The data won't fit into the supplied buffer."),
    (
        "ENFILE",
        "The maximum number of file descriptors in the system are already open.",
    ),
    ("ENOMEM", "Not enough memory."),
    ("ENOTSUP", "The handle does not support this operation."),
    ("ETIMEDOUT", "Deadline was reached."),
];

pub fn standard_error(code: &str) -> Option<&'static str> {
    STANDARD_ERRORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, desc)| *desc)
}

/// A documented function argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub info: String,
    /// May be empty for expression-like parameters.
    pub type_name: String,
    pub suffix: String,
    /// Type lives in the library namespace and is prefixed in the header.
    pub internal: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ArgumentOptions {
    pub type_name: String,
    pub suffix: String,
    pub internal: bool,
}

impl Argument {
    pub fn new(name: impl Into<String>, info: impl Into<String>, opts: ArgumentOptions) -> Self {
        Self {
            name: name.into(),
            info: info.into(),
            type_name: opts.type_name,
            suffix: opts.suffix,
            internal: opts.internal,
        }
    }
}

/// Return value descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSpec {
    pub type_name: String,
    pub success: Option<String>,
    pub error: Option<String>,
    /// Free text that replaces the success/error sentence.
    pub info: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ResultOptions {
    pub success: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
}

impl ResultSpec {
    pub fn new(type_name: impl Into<String>, opts: ResultOptions) -> Self {
        Self {
            type_name: type_name.into(),
            success: opts.success,
            error: opts.error,
            info: opts.info,
        }
    }
}

/// Behaviours that imply synthesized arguments and error codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub allocates_resource: bool,
    pub has_handle_argument: bool,
    pub has_deadline: bool,
    pub uses_connection: bool,
    pub has_iol_list: bool,
}

/// How a function is attached to its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Topic(TopicId),
    /// Attached through a protocol topic, which must carry a classification.
    Protocol(TopicId),
}

impl Placement {
    pub fn topic_id(&self) -> &TopicId {
        match self {
            Placement::Topic(id) | Placement::Protocol(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionOptions {
    pub header: String,
    pub args: Vec<Argument>,
    pub result: Option<ResultSpec>,
    pub prologue: String,
    pub epilogue: String,
    pub add_to_synopsis: Option<String>,
    pub add_to_errors: Option<String>,
    pub capabilities: Capabilities,
    pub storage: Option<String>,
    pub errors: Vec<String>,
    pub custom_errors: BTreeMap<String, String>,
    pub example: Option<String>,
    pub experimental: bool,
    pub emit_signature: bool,
    pub emit_boilerplate: bool,
}

impl Default for FunctionOptions {
    fn default() -> Self {
        Self {
            header: CANONICAL_HEADER.to_string(),
            args: Vec::new(),
            result: None,
            prologue: String::new(),
            epilogue: String::new(),
            add_to_synopsis: None,
            add_to_errors: None,
            capabilities: Capabilities::default(),
            storage: None,
            errors: Vec::new(),
            custom_errors: BTreeMap::new(),
            example: None,
            experimental: false,
            emit_signature: true,
            emit_boilerplate: true,
        }
    }
}

/// A documented API entry point.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub info: String,
    pub placement: Placement,
    pub header: String,
    pub args: Vec<Argument>,
    pub result: Option<ResultSpec>,
    pub prologue: String,
    pub epilogue: String,
    pub add_to_synopsis: Option<String>,
    pub add_to_errors: Option<String>,
    pub capabilities: Capabilities,
    /// Storage structure name; the function then has a `_mem` variant.
    pub storage: Option<String>,
    /// For a `_mem` variant, the function it stores.
    pub storage_of: Option<String>,
    /// The variant's `mem` argument, placed by enrichment.
    pub mem_argument: Option<Argument>,
    pub errors: Vec<String>,
    pub custom_errors: BTreeMap<String, String>,
    pub example: Option<String>,
    pub experimental: bool,
    pub emit_signature: bool,
    pub emit_boilerplate: bool,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        info: impl Into<String>,
        placement: Placement,
        opts: FunctionOptions,
    ) -> Self {
        Self {
            name: name.into(),
            info: info.into(),
            placement,
            header: opts.header,
            args: opts.args,
            result: opts.result,
            prologue: opts.prologue,
            epilogue: opts.epilogue,
            add_to_synopsis: opts.add_to_synopsis,
            add_to_errors: opts.add_to_errors,
            capabilities: opts.capabilities,
            storage: opts.storage,
            storage_of: None,
            mem_argument: None,
            errors: opts.errors,
            custom_errors: opts.custom_errors,
            example: opts.example,
            experimental: opts.experimental,
            emit_signature: opts.emit_signature,
            emit_boilerplate: opts.emit_boilerplate,
        }
    }

    pub fn topic_id(&self) -> &TopicId {
        self.placement.topic_id()
    }

    /// The user-supplied-memory variant of a function with `storage` set.
    ///
    /// Must be taken before enrichment, which places the `mem` argument
    /// among the synthesized ones.
    pub fn storage_variant(&self) -> Option<Function> {
        let storage = self.storage.as_ref()?;
        let mut variant = self.clone();
        variant.name = format!("{}_mem", self.name);
        variant.mem_argument = Some(Argument::new(
            "mem",
            "The structure to store the newly created object in. \
             It must not be deallocated before the object is closed.",
            ArgumentOptions {
                type_name: format!("struct {}*", storage),
                suffix: String::new(),
                internal: true,
            },
        ));
        variant.storage = None;
        variant.storage_of = Some(self.name.clone());
        Some(variant)
    }
}

/// A named group of functions.
#[derive(Debug, Clone)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub order: Option<i64>,
    pub protocol: Option<Protocol>,
    pub info: Option<String>,
    pub example: Option<String>,
    pub experimental: bool,
    pub functions: HashMap<String, Function>,
}

#[derive(Debug, Clone, Default)]
pub struct TopicOptions {
    pub order: Option<i64>,
    pub protocol: Option<Protocol>,
    pub info: Option<String>,
    pub example: Option<String>,
    pub experimental: bool,
}

impl Topic {
    pub fn new(id: impl Into<String>, title: impl Into<String>, opts: TopicOptions) -> Self {
        Self {
            id: TopicId::new(id),
            title: title.into(),
            order: opts.order,
            protocol: opts.protocol,
            info: opts.info,
            example: opts.example,
            experimental: opts.experimental,
            functions: HashMap::new(),
        }
    }

    /// Functions sorted by name.
    pub fn sorted_functions(&self) -> Vec<&Function> {
        let mut functions: Vec<&Function> = self.functions.values().collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        functions
    }

    pub fn is_secure_transport(&self) -> bool {
        self.id.as_str() == TLS_TOPIC
    }

    /// Whether the topic disappears when sockets are compiled out.
    pub fn requires_sockets(&self) -> bool {
        self.protocol.is_some() || self.id.as_str() == IPADDR_TOPIC
    }
}
