use std::cell::RefCell;
use std::rc::Rc;

use rill_core::{
    beginner_program, bridge, component, create_event_types, el, fragment, text, Dispatcher,
    DuplicatePolicy, EventMap, EventMux, EventRecord, EventTypes, Interactions, Mapper,
    MemoryRoot, Node, Program, ProgramSpec, Props, RillConfig, RillError,
};
use serde_json::json;
use test_case::test_case;

fn recorder() -> (rill_core::EventHandler, Rc<RefCell<Vec<EventRecord>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let handler = rill_core::EventHandler::new(move |record| {
        sink.borrow_mut().push(record);
        Ok(())
    });
    (handler, seen)
}

#[test]
fn bridged_callbacks_emit_tagged_records_independently() {
    let (handler, seen) = recorder();
    let root = rill_core::Mounted::mount(
        bridge(el("input").key("field"), ["click", "change"]).with_on_event(handler),
    );

    root.invoke("field", "click", json!({"x": 3, "y": [1, 2]})).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![EventRecord::new("click", json!({"x": 3, "y": [1, 2]}))]
    );

    root.invoke("field", "change", json!("text")).unwrap();
    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(seen.borrow()[0].event_type(), "click");
}

#[test]
fn mapped_payload_is_doubled_on_local_stream() {
    let mux = EventMux::new("doubler", Rc::new(Interactions::new()), &Default::default());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _sub = mux.events().subscribe(move |r| sink.borrow_mut().push(r));

    let view = mux.map(
        Mapper::transform(|e| e.map_payload(|p| json!(p.as_i64().unwrap_or(0) * 2))),
        bridge(el("button").key("b"), ["click"]),
    );
    let mounted = rill_core::Mounted::mount(view);
    mounted.invoke("b", "click", 5).unwrap();

    assert_eq!(*seen.borrow(), vec![EventRecord::new("click", 10)]);
}

#[test]
fn counter_renders_once_per_dispatch() {
    let root = MemoryRoot::new();
    let program = beginner_program(
        ProgramSpec {
            model: 0i64,
            update: |e: &EventRecord, m: &i64| if e.is("inc") { m + 1 } else { *m },
            view: |m: &i64, _: &Dispatcher| text(m.to_string()),
        },
        root.clone(),
    )
    .unwrap();

    for _ in 0..3 {
        program.dispatcher().send("inc", json!(null)).unwrap();
    }
    assert_eq!(root.history(), vec!["0", "1", "2", "3"]);
}

#[test]
fn unknown_event_in_keyed_map_fails_the_interaction() {
    let counter = component("Counter", |ctx| {
        ctx.mux().map(
            EventMap::new().to("click", "inc"),
            bridge(el("button").key("b"), ["click", "dblclick"]),
        )
    });
    let (handler, seen) = recorder();
    let mounted = rill_core::Mounted::mount(counter.element(Props::new()).with_on_event(handler));

    let err = mounted.invoke("b", "dblclick", json!(null)).unwrap_err();
    assert!(matches!(err, RillError::UnknownEventType { ref name } if name == "dblclick"));
    assert!(seen.borrow().is_empty());

    mounted.invoke("b", "click", json!(null)).unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

/// Shared log of renders and returns, in call-stack order.
type Log = Rc<RefCell<Vec<String>>>;

fn echo_component(log: Log) -> rill_core::ComponentDef {
    component("Echo", move |ctx| {
        let mux = ctx.mux().clone();
        let log = log.clone();
        ctx.lifecycles()
            .mounted()
            .subscribe(move |_| {
                log.borrow_mut().push("echo mounted".into());
                let _ = mux.send(EventRecord::new("inner", json!(null)));
            })
            .detach();
        Node::Empty
    })
}

#[test]
fn reentrant_dispatch_completes_before_outer_returns() {
    let log: Log = Rc::default();
    let echo = echo_component(log.clone());
    let view_log = log.clone();

    let root = MemoryRoot::new();
    let program = beginner_program(
        ProgramSpec {
            model: Vec::<String>::new(),
            update: |e: &EventRecord, m: &Vec<String>| {
                let mut next = m.clone();
                next.push(e.event_type().to_string());
                next
            },
            view: move |m: &Vec<String>, dispatch: &Dispatcher| {
                view_log.borrow_mut().push(format!("render [{}]", m.join(",")));
                if m.last().map(String::as_str) == Some("outer") {
                    // Mounting Echo dispatches "inner" while this render is on the stack.
                    echo.element(Props::new()).with_on_event(dispatch.handler())
                } else {
                    text(m.join(","))
                }
            },
        },
        root.clone(),
    )
    .unwrap();

    program.dispatcher().send("outer", json!(null)).unwrap();
    log.borrow_mut().push("outer returned".into());

    assert_eq!(
        *log.borrow(),
        vec![
            "render []",
            "render [outer]",
            "echo mounted",
            "render [outer,inner]",
            "outer returned",
        ]
    );
    assert_eq!(program.model(), vec!["outer".to_string(), "inner".to_string()]);
    assert_eq!(root.last_render().as_deref(), Some("outer,inner"));
}

#[test_case(DuplicatePolicy::Reject, None ; "reject fails fast")]
#[test_case(DuplicatePolicy::FirstWins, Some(vec!["save", "load"]) ; "first wins")]
#[test_case(DuplicatePolicy::LastWins, Some(vec!["load", "save"]) ; "last wins")]
fn duplicate_names_follow_configured_policy(
    policy: DuplicatePolicy,
    expected: Option<Vec<&str>>,
) {
    let source = format!("[registry]\nduplicates = \"{}\"\n", policy_name(policy));
    let config = RillConfig::from_toml_str(&source).unwrap();
    assert_eq!(config.registry.duplicates, policy);

    let result = EventTypes::from_config(["save", "load", "save"], &config);
    match expected {
        None => assert!(matches!(
            result,
            Err(RillError::DuplicateEventType { ref name }) if name == "save"
        )),
        Some(names) => assert_eq!(result.unwrap().names(), names),
    }
}

fn policy_name(policy: DuplicatePolicy) -> &'static str {
    match policy {
        DuplicatePolicy::Reject => "reject",
        DuplicatePolicy::FirstWins => "first_wins",
        DuplicatePolicy::LastWins => "last_wins",
    }
}

#[test]
fn registry_constructors_name_their_records() {
    let types = create_event_types(["inc", "dec"]).unwrap();
    for ty in types.iter() {
        for payload in [json!(null), json!({"deep": {"er": [1, {"x": null}]}}), json!(0)] {
            let record = ty.record(payload.clone());
            assert_eq!(record.event_type(), ty);
            assert_eq!(record.payload(), &payload);
            assert_eq!(ty.to_string(), ty.name());
        }
    }
}

#[test]
fn program_reads_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rill.toml");
    std::fs::write(&path, "[dispatch]\nmax_depth = 1\n").unwrap();
    let config = RillConfig::load(&path).unwrap();

    let root = MemoryRoot::new();
    let program: Program<i64> = Program::start(
        ProgramSpec {
            model: 0,
            update: |_: &EventRecord, m: &i64| m + 1,
            view: |m: &i64, dispatch: &Dispatcher| {
                if *m == 1 {
                    let nested = dispatch.send("again", json!(null));
                    assert!(matches!(nested, Err(RillError::DispatchDepthExceeded { limit: 1 })));
                }
                fragment([text(m.to_string())])
            },
        },
        root,
        &config,
    )
    .unwrap();

    program.dispatcher().send("once", json!(null)).unwrap();
    assert_eq!(program.model(), 1);
}
