use crate::common::{MockValue, TestEnv};
use bugstalker_mi::engine::StoppointHandle;
use bugstalker_mi::Config;

#[test]
fn test_insert_at_line() {
    let env = TestEnv::new();
    assert_eq!(
        env.cmd("1-break-insert main.c:5"),
        r#"1^done,bkpt={number="1",type="breakpoint",disp="keep",enabled="y",thread-groups=["i1"],times="0",addr="0x0000000000401010",func="main",file="main.c",fullname="/src/main.c",line="5",original-location="main.c:5"}"#
    );
    let info = env.adapter.session().stoppoint(1).unwrap();
    assert_eq!(info.handle(), StoppointHandle::breakpoint(1));
}

#[test]
fn test_insert_with_options() {
    let env = TestEnv::new();
    assert_eq!(
        env.cmd(r#"2-break-insert -t -d -c "x > 1" -i 3 -p 2 compute"#),
        r#"2^done,bkpt={number="1",type="breakpoint",disp="del",enabled="n",thread-groups=["i1"],times="0",thread="2",cond="x > 1",ignore="3",addr="0x0000000000401010",func="compute",file="main.c",fullname="/src/main.c",line="1",original-location="compute"}"#
    );

    let engine_bp = env
        .engine
        .stoppoint(StoppointHandle::breakpoint(1))
        .unwrap();
    assert!(!engine_bp.state.enabled);
    assert!(engine_bp.state.one_shot);
    assert_eq!(engine_bp.state.condition.as_deref(), Some("x > 1"));
    assert_eq!(engine_bp.state.ignore_count, 3);
    assert_eq!(engine_bp.state.thread, Some(2));
}

#[test]
fn test_insert_unresolved_location() {
    let env = TestEnv::new();
    env.state().unresolved.insert("nowhere".to_string());

    assert_eq!(
        env.cmd("1-break-insert nowhere"),
        r#"1^error,msg="command 'break-insert': breakpoint location 'nowhere' not found""#
    );
    assert_eq!(env.engine.stoppoint_count(), 0);
    assert!(env.adapter.session().stoppoints().is_empty());

    // failed insertion allocates no number
    assert!(env
        .cmd("2-break-insert main")
        .starts_with(r#"2^done,bkpt={number="1""#));
}

#[test]
fn test_insert_pending() {
    let env = TestEnv::new();
    env.state().unresolved.insert("lib.c:10".to_string());

    assert_eq!(
        env.cmd("1-break-insert -f lib.c:10"),
        r#"1^done,bkpt={number="1",type="breakpoint",disp="keep",enabled="y",pending=["lib.c:10"],thread-groups=["i1"],times="0",addr="??",func="??",file="??",fullname="??",line="??",original-location="lib.c:10"}"#
    );
    assert_eq!(env.engine.stoppoint_count(), 1);
}

#[test]
fn test_insert_argument_errors() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            line: "1-break-insert",
            expected: r#"1^error,msg="command 'break-insert': argument 'location' not found""#,
        },
        TestCase {
            line: "2-break-insert -i many main",
            expected: r#"2^error,msg="command 'break-insert': argument 'i' has an invalid value '-i many'""#,
        },
        TestCase {
            line: "3-break-insert -p -1 main",
            expected: r#"3^error,msg="command 'break-insert': argument 'p' has an invalid value '-1'""#,
        },
    ];

    let env = TestEnv::new();
    for tc in cases {
        assert_eq!(env.cmd(tc.line), tc.expected);
    }
    assert_eq!(env.engine.stoppoint_count(), 0);
}

#[test]
fn test_delete_and_numbering() {
    let env = TestEnv::new();
    env.cmd("1-break-insert main");
    env.cmd("2-break-insert main.c:5");

    assert_eq!(env.cmd("3-break-delete 1"), "3^done");
    assert_eq!(env.engine.stoppoint_count(), 1);
    assert!(env.adapter.session().stoppoint(1).is_none());
    assert_eq!(
        env.adapter.session().ids().get(StoppointHandle::breakpoint(1)),
        None
    );

    // numbers are never reused
    assert!(env
        .cmd("4-break-insert other")
        .starts_with(r#"4^done,bkpt={number="3""#));

    assert_eq!(
        env.cmd("5-break-delete 1"),
        r#"5^error,msg="command 'break-delete': breakpoint 1 not found""#
    );

    // engine lost the breakpoint behind the adapter back
    env.state().stoppoints.clear();
    assert_eq!(
        env.cmd("6-break-disable 2"),
        r#"6^error,msg="command 'break-disable': breakpoint 2 has no valid engine handle""#
    );
}

#[test]
fn test_delete_list_is_atomic() {
    let env = TestEnv::new();
    env.cmd("1-break-insert main");

    assert_eq!(
        env.cmd("2-break-delete 1 9"),
        r#"2^error,msg="command 'break-delete': breakpoint 9 not found""#
    );
    assert_eq!(env.engine.stoppoint_count(), 1);
    assert!(env.adapter.session().stoppoint(1).is_some());
}

#[test]
fn test_modify_commands() {
    let env = TestEnv::new();
    env.cmd("1-break-insert main");
    let handle = StoppointHandle::breakpoint(1);
    let session = env.adapter.session();

    assert_eq!(env.cmd("2-break-disable 1"), "2^done");
    assert!(!session.stoppoint(1).unwrap().enabled);
    assert!(!env.engine.stoppoint(handle).unwrap().state.enabled);

    assert_eq!(env.cmd("3-break-enable 1"), "3^done");
    assert!(session.stoppoint(1).unwrap().enabled);
    assert!(env.engine.stoppoint(handle).unwrap().state.enabled);

    assert_eq!(env.cmd("4-break-after 1 5"), "4^done");
    assert_eq!(session.stoppoint(1).unwrap().ignore_count, 5);
    assert_eq!(env.engine.stoppoint(handle).unwrap().state.ignore_count, 5);

    assert_eq!(env.cmd("5-break-condition 1 i == 2"), "5^done");
    assert_eq!(
        session.stoppoint(1).unwrap().condition.as_deref(),
        Some("i == 2")
    );
    assert_eq!(
        env.engine.stoppoint(handle).unwrap().state.condition.as_deref(),
        Some("i == 2")
    );

    // thread group and flag shaped tokens are part of the expression
    assert_eq!(env.cmd("5-break-condition 1 i2 > 3 && a == -b"), "5^done");
    assert_eq!(
        session.stoppoint(1).unwrap().condition.as_deref(),
        Some("i2 > 3 && a == -b")
    );
    assert_eq!(
        env.cmd(r#"5-break-condition 1 "x" y"#),
        r#"5^error,msg="command 'break-condition': argument 'expression' has an invalid value 'y'""#
    );
    assert_eq!(
        session.stoppoint(1).unwrap().condition.as_deref(),
        Some("i2 > 3 && a == -b")
    );

    assert_eq!(env.cmd("6-break-condition 1"), "6^done");
    assert_eq!(session.stoppoint(1).unwrap().condition, None);
    assert_eq!(env.engine.stoppoint(handle).unwrap().state.condition, None);

    assert_eq!(
        env.cmd("7-break-after 1 -1"),
        r#"7^error,msg="command 'break-after': argument 'count' has an invalid value '-1'""#
    );
}

#[test]
fn test_watch() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
        read: bool,
        write: bool,
    }
    let cases = vec![
        TestCase {
            line: "1-break-watch -r counter",
            expected: r#"1^done,hw-rwpt={number="2",exp="counter"}"#,
            read: true,
            write: false,
        },
        TestCase {
            line: "2-break-watch -a counter",
            expected: r#"2^done,hw-awpt={number="3",exp="counter"}"#,
            read: true,
            write: true,
        },
        TestCase {
            line: "3-break-watch counter",
            expected: r#"3^done,wpt={number="4",exp="counter"}"#,
            read: false,
            write: true,
        },
    ];

    let env = TestEnv::new();
    env.state().add_variable(
        "counter",
        MockValue {
            value: "0".to_string(),
            type_name: "int".to_string(),
            children: vec![],
        },
    );
    // breakpoint and watchpoint share native id 1, numbers differ
    env.cmd("0-break-insert main");

    for (i, tc) in cases.into_iter().enumerate() {
        assert_eq!(env.cmd(tc.line), tc.expected);
        let wp = env
            .engine
            .stoppoint(StoppointHandle::watchpoint(i as u32 + 1))
            .unwrap();
        let (_, size, read, write) = wp.watch.unwrap();
        assert_eq!(size, 4);
        assert_eq!((read, write), (tc.read, tc.write));
    }

    assert_eq!(
        env.cmd("4-break-watch nope"),
        r#"4^error,msg="command 'break-watch': could not evaluate expression 'nope'""#
    );
}

#[test]
fn test_id_exhaustion() {
    let env = TestEnv::with_config(Config {
        prompt: false,
        max_stoppoint_id: 1,
        ..Config::default()
    });

    assert!(env.cmd("1-break-insert main").starts_with("1^done"));
    assert_eq!(
        env.cmd("2-break-insert other"),
        r#"2^error,msg="command 'break-insert': stoppoint id limit (1) exhausted""#
    );
    assert_eq!(env.engine.stoppoint_count(), 1);
    assert_eq!(env.adapter.session().stoppoints().len(), 1);
}
