//! Derive implicit arguments and error codes from capability flags.
//!
//! Enrichment is not idempotent. [`enrich_all`] must run exactly once per
//! build; [`crate::CorpusBuilder::build`] takes care of that.

use crate::models::{Argument, ArgumentOptions, Function, MEM_FIRST, SLEEP_PRIMITIVE};

const IOLIST_TYPE: &str = "struct iolist*";

const DEADLINE_INFO: &str = "A point in time when the operation should time out, in \
    milliseconds. Use the **now** function to get your current point in time. \
    0 means immediate timeout, i.e., perform the operation if possible or return \
    without blocking if not. -1 means no deadline, i.e., the call will block \
    forever if the operation cannot be performed.";

fn iolist_argument(name: &str, which: &str) -> Argument {
    Argument::new(
        name,
        format!(
            "Pointer to the {} item of a linked list of I/O buffers.",
            which
        ),
        ArgumentOptions {
            type_name: IOLIST_TYPE.to_string(),
            suffix: String::new(),
            internal: true,
        },
    )
}

/// Append synthesized arguments and derived error codes to `function`.
pub fn enrich(function: &mut Function) {
    let caps = function.capabilities;

    if caps.has_iol_list {
        function.args.push(iolist_argument("first", "first"));
        function.args.push(iolist_argument("last", "last"));
    }
    if let Some(mem) = function.mem_argument.take() {
        let first = function
            .storage_of
            .as_deref()
            .is_some_and(|base| MEM_FIRST.contains(&base));
        if first {
            function.args.insert(0, mem);
        } else {
            function.args.push(mem);
        }
    }
    if caps.has_deadline {
        function.args.push(Argument::new(
            "deadline",
            DEADLINE_INFO,
            ArgumentOptions {
                type_name: "int64_t".to_string(),
                ..Default::default()
            },
        ));
    }

    let errors = &mut function.errors;
    if caps.has_handle_argument {
        errors.extend(["EBADF", "ENOTSUP"].map(String::from));
    }
    if caps.has_deadline {
        errors.push("ECANCELED".to_string());
        if function.name != SLEEP_PRIMITIVE {
            errors.push("ETIMEDOUT".to_string());
        }
    }
    if caps.allocates_resource {
        errors.extend(["EMFILE", "ENFILE", "ENOMEM"].map(String::from));
    }
    if caps.uses_connection {
        errors.extend(["ECONNRESET", "ECANCELED"].map(String::from));
    }
    // Functions with a `_mem` variant allocate their own storage.
    if function.storage.is_some() {
        errors.push("ENOMEM".to_string());
    }
}

/// Enrich every function, in declaration order.
pub fn enrich_all<'a, I>(functions: I)
where
    I: IntoIterator<Item = &'a mut Function>,
{
    let mut count = 0;
    for function in functions {
        enrich(function);
        count += 1;
    }
    tracing::debug!("Enriched {} functions", count);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capabilities, FunctionOptions, Placement};
    use tiledoc_types::TopicId;

    fn function(name: &str, capabilities: Capabilities) -> Function {
        Function::new(
            name,
            "test function",
            Placement::Topic(TopicId::from("test")),
            FunctionOptions {
                args: vec![Argument::new(
                    "s",
                    "The socket.",
                    ArgumentOptions {
                        type_name: "int".to_string(),
                        ..Default::default()
                    },
                )],
                capabilities,
                ..Default::default()
            },
        )
    }

    fn arg_names(f: &Function) -> Vec<&str> {
        f.args.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_iol_arguments_precede_deadline() {
        let mut f = function(
            "msendl",
            Capabilities {
                has_deadline: true,
                has_iol_list: true,
                ..Default::default()
            },
        );
        enrich(&mut f);

        assert_eq!(arg_names(&f), ["s", "first", "last", "deadline"]);
        assert_eq!(f.args[1].type_name, "struct iolist*");
        assert!(f.args[1].internal);
        assert_eq!(f.args[3].type_name, "int64_t");
        assert!(!f.args[3].internal);
    }

    #[test]
    fn test_error_derivation_order() {
        let mut f = function(
            "tcp_connect",
            Capabilities {
                allocates_resource: true,
                has_handle_argument: true,
                has_deadline: true,
                uses_connection: true,
                has_iol_list: false,
            },
        );
        enrich(&mut f);

        assert_eq!(
            f.errors,
            [
                "EBADF",
                "ENOTSUP",
                "ECANCELED",
                "ETIMEDOUT",
                "EMFILE",
                "ENFILE",
                "ENOMEM",
                "ECONNRESET",
                "ECANCELED",
            ]
        );
    }

    #[test]
    fn test_sleep_primitive_never_times_out() {
        let caps = Capabilities {
            has_deadline: true,
            ..Default::default()
        };
        let mut sleep = function("msleep", caps);
        enrich(&mut sleep);
        assert_eq!(sleep.errors, ["ECANCELED"]);

        let mut other = function("mrecv", caps);
        enrich(&mut other);
        assert_eq!(other.errors, ["ECANCELED", "ETIMEDOUT"]);
    }

    #[test]
    fn test_declared_errors_are_kept_first() {
        let mut f = function(
            "hclose",
            Capabilities {
                has_handle_argument: true,
                ..Default::default()
            },
        );
        f.errors = vec!["EBUSY".to_string()];
        enrich(&mut f);
        assert_eq!(f.errors, ["EBUSY", "EBADF", "ENOTSUP"]);
    }

    #[test]
    fn test_storage_base_gains_enomem() {
        let mut base = function("tcp_accept", Capabilities::default());
        base.storage = Some("tcp_storage".to_string());
        let mut variant = base.storage_variant().unwrap();

        enrich(&mut base);
        enrich(&mut variant);

        assert_eq!(base.errors, ["ENOMEM"]);
        assert!(variant.errors.is_empty());
    }

    #[test]
    fn test_mem_argument_precedes_synthesized() {
        let mut base = function(
            "tcp_accept",
            Capabilities {
                has_deadline: true,
                ..Default::default()
            },
        );
        base.storage = Some("tcp_storage".to_string());
        let mut variant = base.storage_variant().unwrap();
        enrich(&mut variant);
        assert_eq!(arg_names(&variant), ["s", "mem", "deadline"]);
    }

    #[test]
    fn test_mem_argument_follows_iol_list() {
        let mut base = function(
            "msendl",
            Capabilities {
                has_deadline: true,
                has_iol_list: true,
                ..Default::default()
            },
        );
        base.storage = Some("msock_storage".to_string());
        let mut variant = base.storage_variant().unwrap();
        enrich(&mut variant);
        assert_eq!(arg_names(&variant), ["s", "first", "last", "mem", "deadline"]);
        assert!(variant.mem_argument.is_none());
    }

    #[test]
    fn test_mem_argument_leads_for_channel_and_pair() {
        for name in MEM_FIRST {
            let mut base = function(name, Capabilities::default());
            base.storage = Some("chstorage".to_string());
            let mut variant = base.storage_variant().unwrap();
            enrich(&mut variant);
            assert_eq!(arg_names(&variant), ["mem", "s"]);
            assert_eq!(variant.args[0].type_name, "struct chstorage*");
        }
    }

    #[test]
    fn test_enrichment_is_not_idempotent() {
        let mut f = function(
            "bsend",
            Capabilities {
                has_deadline: true,
                ..Default::default()
            },
        );
        enrich(&mut f);
        enrich(&mut f);
        assert_eq!(arg_names(&f), ["s", "deadline", "deadline"]);
        assert_eq!(f.errors.len(), 4);
    }

    #[test]
    fn test_enrich_all_visits_every_function() {
        let caps = Capabilities {
            has_handle_argument: true,
            ..Default::default()
        };
        let mut functions = vec![function("a", caps), function("b", caps)];
        enrich_all(functions.iter_mut());
        assert!(functions.iter().all(|f| f.errors == ["EBADF", "ENOTSUP"]));
    }
}
