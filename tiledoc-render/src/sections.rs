//! Per-function reference pages.
//!
//! A page is a stack of sections (NAME, SYNOPSIS, DESCRIPTION, RETURN
//! VALUE, ERRORS, optional EXAMPLE and SEE ALSO), each composed from tiles.

use crate::RenderError;
use std::collections::{BTreeMap, BTreeSet};
use tiledoc_core::models::{standard_error, Function, Topic};
use tiledoc_core::tile::{join, paragraphs, vjoin, Context, JoinMode, Template, Tile};
use tiledoc_types::Protocol;

const SECTION: &str = "
    # @{title}

    @{body}
";

const ARGUMENT: &str = "@{type} @{name}@{suffix}";

const SIGNATURE: &str = "@{rtype} @{name}(@{args}";

const ARGUMENT_INFO: &str = "**@{name}**: @{info}";

const SEE_ALSO_ITEM: &str = "**@{name}**(3)";

const EXPERIMENTAL_WARNING: &str =
    "**WARNING: This is experimental functionality and the API may change in the future.**";

const IOLIST_BOILERPLATE: &str = "
    This function accepts a linked list of I/O buffers instead of a
    single buffer. Argument **first** points to the first item in the
    list, **last** points to the last buffer in the list. The list
    represents a single, fragmented message, not a list of multiple
    messages. Structure **iolist** has the following members:

    ```c
    void *iol_base;          /* Pointer to the buffer. */
    size_t iol_len;          /* Size of the buffer. */
    struct iolist *iol_next; /* Next buffer in the list. */
    int iol_rsvd;            /* Reserved. Must be set to zero. */
    ```

    When receiving, **iol_base** equal to NULL means that **iol_len**
    bytes should be skipped.

    The function returns **EINVAL** error in the case the list is
    malformed:

    * If **last->iol_next** is not **NULL**.
    * If **first** and **last** don't belong to the same list.
    * If there's a loop in the list.
    * If **iol_rsvd** of any item is non-zero.

    The list (but not the buffers themselves) can be temporarily
    modified while the function is in progress. However, once the
    function returns the list is guaranteed to be the same as before
    the call.
";

const STORAGE_BOILERPLATE: &str = "
    This function allows to avoid one dynamic memory allocation by
    storing the object in user-supplied memory. Unless you are
    hyper-optimizing use **@{base}** instead.
";

const SOCKETS_CAVEAT: &str =
    "This function is not available if libdill is compiled with **--disable-sockets** option.";

const TLS_CAVEAT: &str =
    "This function is not available if libdill is compiled without **--enable-tls** option.";

const RETURNS_BOTH: &str = "In case of success the function returns @{success}. \
    In case of error it returns @{error} and sets **errno** to one of the values below.";

const RETURNS_SUCCESS: &str = "In case of success the function returns @{success}.";

const RETURNS_ERROR: &str =
    "In case of error it returns @{error} and sets **errno** to one of the values below.";

const DEADLINE_HELPER: &str = "now";

const RELEASE_HELPER: &str = "hclose";

const BYTESTREAM_HELPERS: [&str; 4] = ["brecv", "brecvl", "bsend", "bsendl"];

const MESSAGE_HELPERS: [&str; 4] = ["mrecv", "mrecvl", "msend", "msendl"];

fn none() -> Tile {
    Tile::text("None.")
}

fn section(title: &str, body: Tile) -> Result<Tile, RenderError> {
    let ctx = Context::new().with("title", title).with("body", body);
    Ok(Template::new(SECTION).render(&ctx)?)
}

fn fenced(code: Tile) -> Tile {
    Tile::text("```c") | code | Tile::text("```")
}

/// Render the whole page for `function`, which lives in `topic`.
pub fn render_page(topic: &Topic, function: &Function) -> Result<Tile, RenderError> {
    let name = Context::new()
        .with("name", function.name.as_str())
        .with("info", function.info.as_str());
    let mut parts = vec![
        section("NAME", Template::new("@{name} - @{info}").render(&name)?)?,
        section("SYNOPSIS", synopsis(function)?)?,
        section("DESCRIPTION", description(topic, function)?)?,
        section("RETURN VALUE", return_value(function)?)?,
        section("ERRORS", errors(function)?)?,
    ];
    if let Some(example) = example(topic, function) {
        parts.push(section("EXAMPLE", example)?);
    }
    parts.push(section("SEE ALSO", see_also(topic, function)?)?);
    Ok(paragraphs(parts))
}

/// Argument contexts in declaration order, synthesized ones included.
fn argument_contexts(function: &Function, type_of: impl Fn(&str, bool) -> String) -> Vec<Context> {
    function
        .args
        .iter()
        .map(|arg| {
            Context::new()
                .with("type", type_of(&arg.type_name, arg.internal))
                .with("name", arg.name.as_str())
                .with("suffix", arg.suffix.as_str())
                .with("info", arg.info.as_str())
        })
        .collect()
}

/// `rtype name(args);` with continuation lines aligned under the first
/// argument.
pub(crate) fn signature(
    function: &Function,
    name: &str,
    prefix: &str,
    type_of: impl Fn(&str, bool) -> String,
) -> Result<Tile, RenderError> {
    let items = argument_contexts(function, type_of);
    let args = if items.is_empty() {
        Tile::text("void);")
    } else {
        vjoin(
            &Template::new(ARGUMENT),
            &Context::new(),
            &items,
            &Tile::text(","),
            &Tile::text(");"),
            JoinMode::Inline,
        )?
    };
    let rtype = function
        .result
        .as_ref()
        .map(|r| r.type_name.as_str())
        .unwrap_or("void");
    let ctx = Context::new()
        .with("rtype", format!("{}{}", prefix, rtype))
        .with("name", name)
        .with("args", args);
    Ok(Template::new(SIGNATURE).render(&ctx)?)
}

fn synopsis(function: &Function) -> Result<Tile, RenderError> {
    let include = Tile::text(&format!("#include <{}>", function.header));
    let extra = function
        .add_to_synopsis
        .as_deref()
        .map(|s| Tile::text(s).trim())
        .unwrap_or_default();
    let signature = signature(function, &function.name, "", |t, _| t.to_string())?;
    Ok(fenced(paragraphs([include, extra, signature])))
}

fn description(topic: &Topic, function: &Function) -> Result<Tile, RenderError> {
    let mut parts: Vec<Tile> = Vec::new();

    if let Some(info) = &topic.info {
        parts.push(Tile::text(info).trim());
    }
    if function.experimental || topic.experimental {
        parts.push(Tile::text(EXPERIMENTAL_WARNING));
    }
    parts.push(Tile::text(&function.prologue).trim());

    if function.emit_boilerplate {
        if function.capabilities.has_iol_list {
            parts.push(Tile::text(IOLIST_BOILERPLATE).trim());
        }
        if let Some(base) = &function.storage_of {
            let ctx = Context::new().with("base", base.as_str());
            parts.push(Template::new(STORAGE_BOILERPLATE).render(&ctx)?);
        }
    }

    parts.push(vjoin(
        &Template::new(ARGUMENT_INFO),
        &Context::new(),
        &argument_contexts(function, |t, _| t.to_string()),
        &Tile::blank(),
        &Tile::empty(),
        JoinMode::Block,
    )?);
    parts.push(Tile::text(&function.epilogue).trim());

    if function.emit_boilerplate {
        if topic.requires_sockets() {
            parts.push(Tile::text(SOCKETS_CAVEAT));
        }
        if topic.is_secure_transport() {
            parts.push(Tile::text(TLS_CAVEAT));
        }
    }

    let body = paragraphs(parts);
    Ok(if body.is_empty() { none() } else { body })
}

fn return_value(function: &Function) -> Result<Tile, RenderError> {
    let Some(result) = &function.result else {
        return Ok(none());
    };
    if let Some(info) = &result.info {
        return Ok(Tile::text(info).trim());
    }

    let mut ctx = Context::new();
    let template = match (&result.success, &result.error) {
        (Some(success), Some(error)) => {
            ctx.set("success", success);
            ctx.set("error", error);
            RETURNS_BOTH
        }
        (Some(success), None) => {
            ctx.set("success", success);
            RETURNS_SUCCESS
        }
        (None, Some(error)) => {
            ctx.set("error", error);
            RETURNS_ERROR
        }
        (None, None) => return Ok(none()),
    };
    Ok(Template::new(template).render(&ctx)?)
}

/// Derived codes with their standard descriptions, overridden by the
/// function's custom errors.
pub fn error_table(function: &Function) -> Result<BTreeMap<String, String>, RenderError> {
    let mut table = BTreeMap::new();
    for code in &function.errors {
        if function.custom_errors.contains_key(code) {
            continue;
        }
        let desc = standard_error(code).ok_or_else(|| RenderError::UnknownErrorCode {
            function: function.name.clone(),
            code: code.clone(),
        })?;
        table.insert(code.clone(), desc.to_string());
    }
    table.extend(
        function
            .custom_errors
            .iter()
            .map(|(code, desc)| (code.clone(), desc.clone())),
    );
    Ok(table)
}

fn errors(function: &Function) -> Result<Tile, RenderError> {
    let table = error_table(function)?;
    let list = if table.is_empty() {
        none()
    } else {
        let items: Vec<Context> = table
            .iter()
            .map(|(code, desc)| {
                Context::new()
                    .with("code", code.as_str())
                    .with("desc", desc.as_str())
            })
            .collect();
        vjoin(
            &Template::new("* **@{code}**: @{desc}"),
            &Context::new(),
            &items,
            &Tile::empty(),
            &Tile::empty(),
            JoinMode::Block,
        )?
    };
    let extra = function
        .add_to_errors
        .as_deref()
        .map(|s| Tile::text(s).trim())
        .unwrap_or_default();
    Ok(paragraphs([list, extra]))
}

fn example(topic: &Topic, function: &Function) -> Option<Tile> {
    function
        .example
        .as_deref()
        .or(topic.example.as_deref())
        .map(|code| fenced(Tile::text(code).trim()))
}

/// Names listed under SEE ALSO, sorted and without `function` itself.
pub fn see_also_names(topic: &Topic, function: &Function) -> Vec<String> {
    let mut names: BTreeSet<&str> = topic.functions.keys().map(String::as_str).collect();
    if function.capabilities.has_deadline {
        names.insert(DEADLINE_HELPER);
    }
    if function.capabilities.allocates_resource {
        names.insert(RELEASE_HELPER);
    }
    match topic.protocol {
        Some(Protocol::Bytestream) => names.extend(BYTESTREAM_HELPERS),
        Some(Protocol::Message) => names.extend(MESSAGE_HELPERS),
        Some(Protocol::Application) | None => {}
    }
    names.remove(function.name.as_str());
    names.into_iter().map(str::to_string).collect()
}

fn see_also(topic: &Topic, function: &Function) -> Result<Tile, RenderError> {
    let items: Vec<Context> = see_also_names(topic, function)
        .into_iter()
        .map(|name| Context::new().with("name", name))
        .collect();
    if items.is_empty() {
        return Ok(none());
    }
    Ok(join(
        &Template::new(SEE_ALSO_ITEM),
        &Context::new(),
        &items,
        &Tile::text(" "),
        &Tile::empty(),
    )?)
}
