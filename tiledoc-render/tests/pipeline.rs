// Full pipeline tests: raw records in, rendered documents out.

use serde_yaml::Value;
use tiledoc_core::{BuildError, CorpusBuilder};
use tiledoc_render::{render_all, DocumentKind, RenderOptions, RenderedDocument};

fn yaml(src: &str) -> Value {
    serde_yaml::from_str(src).unwrap()
}

fn corpus_builder() -> CorpusBuilder {
    let mut builder = CorpusBuilder::new();
    builder
        .add_topic(
            "alpha.topic.yml",
            yaml("name: alpha\ntitle: Alpha\n"),
        )
        .add_topic(
            "zeta.topic.yml",
            yaml("name: zeta\ntitle: Zeta\norder: 10\n"),
        )
        .add_topic(
            "tcp.topic.yml",
            yaml(
                r#"
name: tcp
title: TCP protocol
protocol: bytestream
info: |
  TCP protocol is a reliable bytestream protocol for transporting data
  over network.
example: |
  int s = tcp_connect(&addr, -1);
  bsend(s, "ABC", 3, -1);
"#,
            ),
        )
        .add_function(
            "zeta_open.function.yml",
            yaml(
                r#"
name: zeta_open
info: opens a zeta handle
topic: zeta
has_handle_argument: true
has_deadline: true
allocates_resource: true
args:
  - name: h
    type: int
    info: The parent handle.
result:
  type: int
  success: newly created handle
  error: "-1"
"#,
            ),
        )
        .add_function(
            "alpha_ping.function.yml",
            yaml("name: alpha_ping\ninfo: pings alpha\ntopic: alpha\n"),
        )
        .add_function(
            "tcp_send.function.yml",
            yaml(
                r#"
name: tcp_sendl
info: sends a buffer list over a TCP connection
protocol: tcp
has_iol_list: true
has_deadline: true
uses_connection: true
storage: tcp_storage
args:
  - name: s
    type: int
    info: The TCP socket.
result:
  type: int
  success: "0"
  error: "-1"
custom_errors:
  ECONNRESET: The peer closed the connection.
"#,
            ),
        );
    builder
}

fn document<'a>(docs: &'a [RenderedDocument], path: &str) -> &'a RenderedDocument {
    docs.iter()
        .find(|d| d.path.to_string_lossy() == path)
        .unwrap_or_else(|| panic!("missing document {}", path))
}

fn section<'a>(page: &'a str, title: &str) -> &'a str {
    let start = page.find(&format!("# {}\n", title)).unwrap();
    let body = &page[start..];
    let body = &body[body.find('\n').unwrap() + 1..];
    let body = match body.find("\n# ") {
        Some(end) => &body[..end],
        None => body,
    };
    body.trim()
}

#[test]
fn test_errors_for_handle_deadline_allocation() {
    let corpus = corpus_builder().build().unwrap();
    let docs = render_all(&corpus, &RenderOptions::default()).unwrap();
    let page = &document(&docs, "zeta_open.md").contents;

    assert_eq!(
        section(page, "ERRORS"),
        "* **EBADF**: Invalid handle.\n\
         * **ECANCELED**: Current coroutine was canceled.\n\
         * **EMFILE**: The maximum number of file descriptors in the process are already open.\n\
         * **ENFILE**: The maximum number of file descriptors in the system are already open.\n\
         * **ENOMEM**: Not enough memory.\n\
         * **ENOTSUP**: The handle does not support this operation.\n\
         * **ETIMEDOUT**: Deadline was reached."
    );
    assert_eq!(
        section(page, "SEE ALSO"),
        "**hclose**(3) **now**(3)"
    );
}

#[test]
fn test_toc_puts_ordered_topic_first() {
    let corpus = corpus_builder().build().unwrap();
    let docs = render_all(&corpus, &RenderOptions::default()).unwrap();
    let toc = &document(&docs, "toc.md").contents;

    let zeta = toc.find("#### Zeta").unwrap();
    let alpha = toc.find("#### Alpha").unwrap();
    let tcp = toc.find("#### TCP protocol").unwrap();
    assert!(zeta < alpha && alpha < tcp);
    assert!(toc.contains("* [tcp_sendl(3)](tcp_sendl.html)\n* [tcp_sendl_mem(3)](tcp_sendl_mem.html)"));
}

#[test]
fn test_protocol_page_sections() {
    let corpus = corpus_builder().build().unwrap();
    let docs = render_all(&corpus, &RenderOptions::default()).unwrap();
    let page = &document(&docs, "tcp_sendl.md").contents;

    let synopsis = section(page, "SYNOPSIS");
    assert!(synopsis.contains("int tcp_sendl(int s,\n"));
    assert!(synopsis.contains("              struct iolist* first,\n"));
    assert!(synopsis.contains("              int64_t deadline);\n"));

    let description = section(page, "DESCRIPTION");
    assert!(description.starts_with(
        "TCP protocol is a reliable bytestream protocol for transporting data over network.\n"
    ));
    assert!(description.contains("Structure **iolist** has the following members:"));
    assert!(description.contains("**--disable-sockets**"));
    assert!(!description.contains("--enable-tls"));

    let errors = section(page, "ERRORS");
    assert!(errors.starts_with("* **ECANCELED**: Current coroutine was canceled.\n"));
    assert!(errors.contains("* **ECONNRESET**: The peer closed the connection.\n"));
    assert!(errors.contains("* **ENOMEM**: Not enough memory.\n"));

    assert!(section(page, "EXAMPLE").contains("bsend(s, \"ABC\", 3, -1);"));
    assert!(section(page, "SEE ALSO").contains("**bsendl**(3)"));
    assert!(section(page, "SEE ALSO").contains("**tcp_sendl_mem**(3)"));
}

#[test]
fn test_storage_variant_page() {
    let corpus = corpus_builder().build().unwrap();
    let docs = render_all(&corpus, &RenderOptions::default()).unwrap();
    let page = &document(&docs, "tcp_sendl_mem.md").contents;

    assert!(page.contains("struct tcp_storage* mem,"));
    assert!(page.contains("Unless you are hyper-optimizing use **tcp_sendl** instead."));
    assert!(!section(page, "ERRORS").contains("ENOMEM"));
}

#[test]
fn test_header_output() {
    let corpus = corpus_builder().build().unwrap();
    let docs = render_all(&corpus, &RenderOptions::default()).unwrap();
    let header = document(&docs, "libdill.h");

    assert_eq!(header.kind, DocumentKind::Header);
    let text = &header.contents;
    assert!(text.contains("DILL_EXPORT int dill_zeta_open(int h,"));
    assert!(text.contains("struct dill_iolist* first,"));
    assert!(text.contains("struct dill_tcp_storage* mem,"));
    assert!(text.contains("#define tcp_sendl_mem dill_tcp_sendl_mem"));
    assert!(text.find("dill_zeta_open").unwrap() < text.find("dill_alpha_ping").unwrap());
    assert!(text.contains("#endif /* !defined DILL_DISABLE_SOCKETS */"));
}

#[test]
fn test_options_disable_outputs() {
    let corpus = corpus_builder().build().unwrap();
    let opts = RenderOptions {
        enable_toc: false,
        enable_header: false,
        page_extension: "txt".to_string(),
        ..Default::default()
    };
    let docs = render_all(&corpus, &opts).unwrap();

    assert_eq!(docs.len(), corpus.function_count());
    assert!(docs.iter().all(|d| d.kind == DocumentKind::Page));
    assert!(docs.iter().all(|d| d.path.extension().unwrap() == "txt"));
}

#[test]
fn test_duplicate_function_aborts_before_rendering() {
    let mut builder = corpus_builder();
    builder.add_function(
        "again.function.yml",
        yaml("name: alpha_ping\ninfo: again\ntopic: alpha\n"),
    );
    assert!(matches!(
        builder.build(),
        Err(BuildError::DuplicateFunction(name)) if name == "alpha_ping"
    ));
}

#[test]
fn test_unterminated_header_template_is_fatal() {
    let corpus = corpus_builder().build().unwrap();
    let opts = RenderOptions {
        header_template: Some("#ifndef X\n@{hdrs\n#endif\n".to_string()),
        ..Default::default()
    };
    let err = render_all(&corpus, &opts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Template error: Unterminated interpolation on template line 2"
    );
}
