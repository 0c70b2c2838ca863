//! Whole-pipeline tests: signature in, parsed values and exit codes out.

use std::sync::{Arc, Mutex};

use capstan_core::*;

fn script(signature: Signature) -> Script {
    Script::new(Entrypoint::new("main", signature, |_| Ok(Some(Value::Int(0)))).marked())
}

fn baboom() -> Coercion {
    Coercion::custom("baboom", |raw| {
        raw.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("baboom wants an integer, got '{raw}'"))
    })
}

#[test]
fn test_parse_good() {
    let cases: Vec<(Signature, Vec<&str>, Vec<(&str, Value)>)> = vec![
        (
            Signature::new().keyword("foo", DefaultValue::list([1, 2])),
            vec!["--foo=2"],
            vec![("foo", Value::Int(2))],
        ),
        (
            Signature::new()
                .keyword("count", 1)
                .keyword("dry_run", false)
                .keyword("matches_per", 5)
                .keyword("match_all", false)
                .keyword("testing", false),
            vec!["--match-all", "--testing"],
            vec![
                ("count", Value::Int(1)),
                ("dry_run", Value::Bool(false)),
                ("matches_per", Value::Int(5)),
                ("match_all", Value::Bool(true)),
                ("testing", Value::Bool(true)),
            ],
        ),
        (
            Signature::new()
                .required("foo")
                .keyword("bar", 0)
                .args("args")
                .kwargs("kwargs"),
            vec!["--foo=1", "--che=oh_yeah", "awesome"],
            vec![("foo", Value::from("1")), ("bar", Value::Int(0))],
        ),
        (
            Signature::new().keyword("foo", baboom()),
            vec!["--foo=5"],
            vec![("foo", Value::Int(5))],
        ),
        (
            Signature::new().keyword("foo", Coercion::Int),
            vec!["--foo=5"],
            vec![("foo", Value::Int(5))],
        ),
        (
            Signature::new().keyword("foo", 1.0),
            vec!["--foo=5.0"],
            vec![("foo", Value::Float(5.0))],
        ),
        (
            Signature::new().keyword("foo", DefaultValue::set(Vec::<Value>::new())),
            vec!["--foo=5"],
            vec![("foo", Value::from(vec!["5"]))],
        ),
        (
            Signature::new().keyword("foo", DefaultValue::set([1, 2])),
            vec!["--foo=1"],
            vec![("foo", Value::Int(1))],
        ),
        (
            Signature::new().args("args"),
            vec!["1", "2"],
            vec![("args", Value::from(vec!["1", "2"]))],
        ),
        (
            Signature::new().keyword("foo", DefaultValue::ListOf(Coercion::Int)),
            vec!["--foo=5", "--foo=6"],
            vec![("foo", Value::from(vec![5, 6]))],
        ),
        (
            Signature::new().keyword("foo", DefaultValue::List(Vec::new())),
            vec!["--foo=1", "--foo=2"],
            vec![("foo", Value::from(vec!["1", "2"]))],
        ),
        (
            Signature::new().keyword("foo", true),
            vec!["--foo"],
            vec![("foo", Value::Bool(false))],
        ),
        (
            Signature::new().keyword("foo", false),
            vec!["--foo"],
            vec![("foo", Value::Bool(true))],
        ),
        (
            Signature::new().keyword("foo", false).keyword("bar", 0),
            vec!["--bar=10"],
            vec![("foo", Value::Bool(false)), ("bar", Value::Int(10))],
        ),
        (
            Signature::new().keyword("foo", 0).keyword("bar", ""),
            vec!["--foo=10", "--bar=happy"],
            vec![("foo", Value::Int(10)), ("bar", Value::from("happy"))],
        ),
    ];

    for (signature, args, expected) in cases {
        let s = script(signature);
        let parsed = s
            .parse(args.clone())
            .unwrap_or_else(|e| panic!("{args:?} failed to parse: {e}"));
        for (name, value) in expected {
            assert_eq!(parsed.get(name), Some(&value), "{name} for {args:?}");
        }
    }
}

#[test]
fn test_parse_bad() {
    let cases: Vec<(Signature, Vec<&str>)> = vec![
        (Signature::new().keyword("foo", Coercion::Int), vec![]),
        (Signature::new().keyword("foo", DefaultValue::ListOf(Coercion::Int)), vec![]),
        (Signature::new().keyword("foo", DefaultValue::list([1, 2])), vec!["--foo=3"]),
        (Signature::new().keyword("foo", baboom()), vec!["--foo=five"]),
    ];

    for (signature, args) in cases {
        let err = script(signature).run(args.clone()).unwrap_err();
        assert!(matches!(err, Error::Usage(_)), "{args:?} should be a usage error");
        assert_ne!(err.exit_code(), 0);
    }
}

#[test]
fn test_kwargs_only_accepts_anything() {
    let s = script(Signature::new().kwargs("kwargs"));
    let parsed = s.parse(["--anything=1", "--flag"]).unwrap();
    assert_eq!(parsed.unknown().len(), 2);
    assert_eq!(s.run(["--what=ever"]).unwrap(), 0);
}

#[test]
fn test_override_positional_reaches_kwargs() {
    let seen: Arc<Mutex<Option<CallArgs>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let entry = Entrypoint::new(
        "main",
        Signature::new()
            .required("foo")
            .required("bar")
            .keyword("che", 1)
            .keyword("baz", 2)
            .args("args")
            .kwargs("kwargs"),
        move |args| {
            *sink.lock().unwrap() = Some(args.clone());
            Ok(Some(Value::Int(0)))
        },
    )
    .arg(ArgOverride::new(["--foo"]).default(true))
    .arg(ArgOverride::new(["--bar", "-b"]).default("bar"))
    .arg(ArgOverride::new(["--boom"]).default("boom"))
    .arg(ArgOverride::new(["a"]))
    .marked();

    let code = Script::new(entry).run(["aaaaaaaa"]).unwrap();
    assert_eq!(code, 0);

    let call = seen.lock().unwrap().clone().unwrap();
    assert_eq!(call.extra().get("a"), Some(&Value::from("aaaaaaaa")));
    assert_eq!(call.extra().get("boom"), Some(&Value::from("boom")));
    assert_eq!(call.get("foo"), Some(&Value::Bool(true)));
    assert_eq!(call.get("bar"), Some(&Value::from("bar")));
    assert_eq!(call.get("che"), Some(&Value::Int(1)));
    assert!(call.rest().is_empty());
}

#[test]
fn test_return_values_become_exit_codes() {
    let ok = Script::new(Entrypoint::new("main", Signature::new(), |_| Ok(None)));
    assert_eq!(ok.run(Vec::<String>::new()).unwrap(), 0);

    let failed = Script::new(Entrypoint::new("main", Signature::new(), |_| Ok(Some(Value::Int(2)))));
    assert_eq!(failed.run(Vec::<String>::new()).unwrap(), 2);

    let text = Script::new(Entrypoint::new("main", Signature::new(), |_| {
        Ok(Some(Value::from("finished")))
    }));
    assert_eq!(text.run(Vec::<String>::new()).unwrap(), 0);
}

#[test]
fn test_raised_error_is_not_swallowed() {
    let s = Script::new(Entrypoint::new(
        "main",
        Signature::new().args("args").kwargs("kwargs"),
        |_| Err("boom_error".into()),
    ));
    let err = s.run(Vec::<String>::new()).unwrap_err();
    assert_eq!(err.to_string(), "boom_error");
    assert_eq!(err.exit_code(), 1);
    assert_eq!(s.stage(), Stage::Parsed);
}

#[test]
fn test_help_exits_cleanly() {
    let s = Script::new(
        Entrypoint::new("main", Signature::new().keyword("count", 1), |_| Ok(None))
            .doc("this is the help description"),
    );
    let err = s.run(["--help"]).unwrap_err();
    let Error::Usage(usage) = &err else {
        panic!("expected usage error, got {err:?}");
    };
    assert!(usage.is_display());
    assert_eq!(err.exit_code(), 0);
    assert!(usage.message().contains("this is the help description"));
    assert!(usage.message().contains("--count"));
}

#[test]
fn test_settings_from_yaml_apply_to_script() {
    let settings = ParserSettings::from_yaml("program_name: tool\ndash_flags: false\n").unwrap();
    let s = Script::with_settings(
        Entrypoint::new("main", Signature::new().keyword("match_all", false), |_| Ok(None)),
        settings,
    );
    let parsed = s.parse(["--match_all"]).unwrap();
    assert_eq!(parsed.get("match_all"), Some(&Value::Bool(true)));
    assert!(s.parser().unwrap().render_help().contains("tool"));
}

#[test]
fn test_underscore_led_names_get_clean_flags() {
    let s = script(Signature::new().keyword("_private", 1));
    assert_eq!(s.specs().unwrap()[0].flags, vec!["--private"]);
    let parsed = s.parse(["--private=3"]).unwrap();
    assert_eq!(parsed.get("_private"), Some(&Value::Int(3)));

    let reserved = script(Signature::new().keyword("__help", 1));
    assert!(matches!(
        reserved.run(["--x"]),
        Err(Error::Resolve(ResolveError::DuplicateFlag(_)))
    ));

    let blank = script(Signature::new().keyword("_", 1));
    assert!(matches!(
        blank.run(Vec::<String>::new()),
        Err(Error::Resolve(ResolveError::InvalidLongFlag(_)))
    ));
}

#[test]
fn test_malformed_override_flag_is_a_conflict() {
    let s = Script::new(
        Entrypoint::new("main", Signature::new().keyword("foo", 1), |_| Ok(None))
            .arg(ArgOverride::named("foo").default(2))
            .arg(ArgOverride::new(["---foo"]).dest("foo")),
    );
    assert!(matches!(
        s.parse(["--x"]),
        Err(Error::Resolve(ResolveError::InvalidLongFlag(_)))
    ));
}

#[test]
fn test_positional_bool_is_a_conflict() {
    let bare = Script::new(
        Entrypoint::new("main", Signature::new().keyword("foo", false), |_| Ok(None))
            .arg(ArgOverride::new(["foo"]))
            .marked(),
    );
    assert!(matches!(
        bare.run(Vec::<String>::new()),
        Err(Error::Resolve(ResolveError::PositionalFlag(_)))
    ));
    assert!(!bare.is_cli());

    let extra = Script::new(
        Entrypoint::new("main", Signature::new().kwargs("kwargs"), |_| Ok(None))
            .arg(ArgOverride::new(["verbose"]).default(true)),
    );
    assert!(matches!(
        extra.run(Vec::<String>::new()),
        Err(Error::Resolve(ResolveError::PositionalFlag(_)))
    ));
}

#[test]
fn test_collected_key_may_not_shadow_a_keyword() {
    let s = script(Signature::new().keyword("match_all", false).kwargs("kwargs"));
    let err = s.run(["--match_all"]).unwrap_err();
    assert!(matches!(err, Error::Usage(_)));
    assert_eq!(err.exit_code(), 2);
}
