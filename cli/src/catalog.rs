//! Built-in entry points available to `capstan run`.

use capstan_core::{ArgOverride, CallArgs, Coercion, DefaultValue, Entrypoint, Signature, Value};

/// Every registered entry point, marked or not.
pub fn entries() -> Vec<Entrypoint> {
    vec![
        echo_args(),
        greet(),
        sum(),
        exit_with(),
        fail(),
        helper(),
    ]
}

pub fn find(name: &str) -> Option<Entrypoint> {
    entries().into_iter().find(|e| e.name() == name)
}

fn print_call(args: &CallArgs) {
    for (name, value) in args.keywords() {
        println!("{name} = {value}");
    }
    let positional: Vec<String> = args.positional().map(ToString::to_string).collect();
    println!("positional = [{}]", positional.join(", "));
    for (key, value) in args.extra() {
        println!("extra {key} = {value}");
    }
}

fn echo_args() -> Entrypoint {
    Entrypoint::new(
        "echo-args",
        Signature::new()
            .required("foo")
            .keyword("bar", 0)
            .args("args")
            .kwargs("kwargs"),
        |args| {
            print_call(args);
            Ok(None)
        },
    )
    .doc(
        "Print every argument received.\n\n\
         Unknown --key=value flags are collected and echoed back.",
    )
    .marked()
}

fn greet() -> Entrypoint {
    Entrypoint::new(
        "greet",
        Signature::new().keyword("name", "world").keyword("shout", false),
        |args| {
            let name = args.get("name").and_then(Value::as_str).unwrap_or("world");
            let mut line = format!("Hello, {name}!");
            if args.get("shout").and_then(Value::as_bool).unwrap_or(false) {
                line = line.to_uppercase();
            }
            println!("{line}");
            Ok(None)
        },
    )
    .doc("Say hello.")
    .arg(ArgOverride::new(["--name", "-n"]).help("who to greet"))
    .marked()
}

fn sum() -> Entrypoint {
    Entrypoint::new(
        "sum",
        Signature::new().keyword("n", DefaultValue::ListOf(Coercion::Int)),
        |args| {
            let total: i64 = match args.get("n") {
                Some(Value::List(items)) => items.iter().filter_map(Value::as_int).sum(),
                _ => 0,
            };
            println!("{total}");
            Ok(None)
        },
    )
    .doc("Add integers given as repeated --n flags.")
    .marked()
}

fn exit_with() -> Entrypoint {
    Entrypoint::new(
        "exit-with",
        Signature::new().keyword("code", Coercion::Int),
        |args| Ok(args.get("code").cloned()),
    )
    .doc("Exit with the given status code.")
    .marked()
}

fn fail() -> Entrypoint {
    Entrypoint::new("fail", Signature::new().args("args").kwargs("kwargs"), |_| {
        Err("boom_error".into())
    })
    .doc("Raise an error from the handler.")
    .marked()
}

/// Registered but not marked as a script; hidden from `list` and refused by `run`.
fn helper() -> Entrypoint {
    Entrypoint::new("helper", Signature::new(), |_| Ok(None)).doc("Internal helper.")
}
