//! Consolidated public header.
//!
//! Topics are emitted in corpus order. Each topic block declares its
//! functions under the library prefix and then maps the short names onto
//! them. Protocol topics sit behind the sockets guard and the TLS topic
//! additionally behind the TLS guard.

use crate::sections::signature;
use crate::RenderError;
use regex::Regex;
use std::sync::OnceLock;
use tiledoc_core::models::{Function, Topic, CANONICAL_HEADER};
use tiledoc_core::tile::{paragraphs, Context, Template, Tile};
use tiledoc_core::Corpus;

pub const EXPORT_MACRO: &str = "DILL_EXPORT";
pub const NAME_PREFIX: &str = "dill_";
pub const RAW_NAMES_GUARD: &str = "DILL_DISABLE_RAW_NAMES";
pub const SOCKETS_GUARD: &str = "DILL_DISABLE_SOCKETS";
pub const TLS_GUARD: &str = "DILL_DISABLE_TLS";

const BANNER_WIDTH: usize = 80;

/// Skeleton used when no header template is configured.
pub const DEFAULT_SKELETON: &str = "\
#ifndef LIBDILL_H_INCLUDED
#define LIBDILL_H_INCLUDED

#include <stddef.h>
#include <stdint.h>

#if DILL_NO_EXPORTS
#define DILL_EXPORT
#else
#define DILL_EXPORT __attribute__ ((visibility(\"default\")))
#endif

#ifdef __cplusplus
extern \"C\" {
#endif

@{hdrs}

#ifdef __cplusplus
}
#endif

#endif
";

const GUARDED: &str = "
    #if !defined @{guard}
    @{body}
    #endif /* !defined @{guard} */
";

const ALIAS: &str = "#define @{name} @{prefixed}";

const TYPE_QUALIFIERS: &[&str] = &[
    "const", "volatile", "struct", "union", "enum", "unsigned", "signed",
];

const PRIMITIVE_TYPES: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "_Bool", "bool",
    "size_t", "ssize_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t",
    "uint16_t", "uint32_t", "uint64_t", "intptr_t", "uintptr_t", "socklen_t",
];

static IDENT_REGEX: OnceLock<Regex> = OnceLock::new();

fn ident_regex() -> &'static Regex {
    IDENT_REGEX.get_or_init(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap())
}

/// Prefix the type name in an internal-marked type:
/// `const struct ipaddr*` becomes `const struct dill_ipaddr*`. Builtin C
/// types are never prefixed.
pub fn namespaced_type(type_name: &str) -> String {
    let found = ident_regex()
        .find_iter(type_name)
        .find(|m| !TYPE_QUALIFIERS.contains(&m.as_str()));
    match found {
        Some(m)
            if !m.as_str().starts_with(NAME_PREFIX)
                && !PRIMITIVE_TYPES.contains(&m.as_str()) =>
        {
            format!(
                "{}{}{}",
                &type_name[..m.start()],
                NAME_PREFIX,
                &type_name[m.start()..]
            )
        }
        _ => type_name.to_string(),
    }
}

fn banner(title: &str) -> Tile {
    let rule = format!("/{}/", "*".repeat(BANNER_WIDTH - 2));
    let inner = BANNER_WIDTH - 6;
    let title = format!("/*  {:<width$}*/", title, width = inner);
    Tile::from_lines([rule.clone(), title, rule])
}

fn guarded(guard: &str, body: Tile) -> Result<Tile, RenderError> {
    let ctx = Context::new().with("guard", guard).with("body", body);
    Ok(Template::new(GUARDED).render(&ctx)?)
}

/// Whether `function` gets a declaration in the consolidated header.
pub fn is_declared(function: &Function) -> bool {
    function.emit_signature && function.header == CANONICAL_HEADER
}

fn declaration(function: &Function) -> Result<Tile, RenderError> {
    let prefixed = format!("{}{}", NAME_PREFIX, function.name);
    let export = format!("{} ", EXPORT_MACRO);
    signature(function, &prefixed, &export, |t, internal| {
        if internal {
            namespaced_type(t)
        } else {
            t.to_string()
        }
    })
}

fn topic_block(topic: &Topic) -> Result<Option<Tile>, RenderError> {
    let functions: Vec<&Function> = topic
        .sorted_functions()
        .into_iter()
        .filter(|f| is_declared(f))
        .collect();
    if functions.is_empty() {
        return Ok(None);
    }

    let mut declarations = Tile::empty();
    let mut aliases = Tile::empty();
    for function in &functions {
        declarations = declarations | declaration(function)?;
        let ctx = Context::new()
            .with("name", function.name.as_str())
            .with("prefixed", format!("{}{}", NAME_PREFIX, function.name));
        aliases = aliases | Template::new(ALIAS).render(&ctx)?;
    }

    let mut block = paragraphs([
        banner(&topic.title),
        declarations,
        guarded(RAW_NAMES_GUARD, aliases)?,
    ]);
    if topic.is_secure_transport() {
        block = guarded(TLS_GUARD, block)?;
    }
    if topic.protocol.is_some() || topic.is_secure_transport() {
        block = guarded(SOCKETS_GUARD, block)?;
    }
    Ok(Some(block))
}

/// The generated declarations for every topic, in corpus order.
pub fn declarations(corpus: &Corpus) -> Result<Tile, RenderError> {
    let mut blocks = Vec::new();
    for topic in corpus.topics() {
        if let Some(block) = topic_block(topic)? {
            blocks.push(block);
        }
    }
    tracing::debug!("Header covers {} topics", blocks.len());
    Ok(paragraphs(blocks))
}

/// Fill `skeleton`'s `@{hdrs}` span with the generated declarations.
pub fn render_header(corpus: &Corpus, skeleton: &str) -> Result<String, RenderError> {
    let ctx = Context::new().with("hdrs", declarations(corpus)?);
    let header = Template::new(skeleton).render_raw(&ctx)?;
    Ok(header.to_string())
}
