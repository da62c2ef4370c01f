use crate::common::{MockValue, TestEnv};

fn int(value: &str) -> MockValue {
    MockValue {
        value: value.to_string(),
        type_name: "int".to_string(),
        children: vec![],
    }
}

#[test]
fn test_create_and_update_plain() {
    let env = TestEnv::new();
    let handle = env.state().add_variable("x", int("42"));

    assert_eq!(
        env.cmd("1-var-create - * x"),
        r#"1^done,name="var1",numchild="0",value="42",type="int",thread-id="1",has_more="0""#
    );
    assert_eq!(env.cmd("2-var-update var1"), "2^done,changelist=[]");

    {
        let mut state = env.state();
        state.values.get_mut(&handle).unwrap().value = "43".to_string();
        state.changed.insert(handle);
    }
    assert_eq!(
        env.cmd("3-var-update 1 var1"),
        r#"3^done,changelist=[{name="var1",value="43",in_scope="true",type_changed="false",has_more="0"}]"#
    );
    assert_eq!(env.cmd("4-var-update *"), "4^done,changelist=[]");
}

#[test]
fn test_expression_result_always_changes() {
    let env = TestEnv::new();
    env.state()
        .expressions
        .insert("a + b".to_string(), "3".to_string());

    assert_eq!(
        env.cmd(r#"1-var-create sum * "a + b""#),
        r#"1^done,name="sum",numchild="0",value="3",type="int",thread-id="1",has_more="0""#
    );
    let expected = r#"changelist=[{name="sum",value="3",in_scope="true",type_changed="false",has_more="0"}]"#;
    assert_eq!(env.cmd("2-var-update 1 sum"), format!("2^done,{expected}"));
    assert_eq!(env.cmd("3-var-update --all-values *"), format!("3^done,{expected}"));
    assert_eq!(
        env.cmd("4-var-update sum"),
        r#"4^done,changelist=[{name="sum",in_scope="true",type_changed="false",has_more="0"}]"#
    );
}

/// Struct `s` with members `x` (int) and `inner` (struct with one int member).
fn add_struct(env: &TestEnv) -> (u64, u64) {
    let mut state = env.state();
    let x = state.add_value(int("1"));
    let y = state.add_value(int("2"));
    let inner = state.add_value(MockValue {
        value: "{...}".to_string(),
        type_name: "struct I".to_string(),
        children: vec![("y".to_string(), y)],
    });
    let s = state.add_variable(
        "s",
        MockValue {
            value: "{...}".to_string(),
            type_name: "struct S".to_string(),
            children: vec![("x".to_string(), x), ("inner".to_string(), inner)],
        },
    );
    (s, x)
}

#[test]
fn test_update_print_values() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            line: "2-var-update var1",
            expected: r#"2^done,changelist=[{name="var1",in_scope="true",type_changed="false",has_more="0"}]"#,
        },
        TestCase {
            line: "3-var-update --no-values var1",
            expected: r#"3^done,changelist=[{name="var1",in_scope="true",type_changed="false",has_more="0"}]"#,
        },
        TestCase {
            line: "4-var-update --simple-values var1",
            expected: r#"4^done,changelist=[{name="var1",in_scope="true",type_changed="false",has_more="0"}]"#,
        },
        TestCase {
            line: "5-var-update --simple-values var2",
            expected: r#"5^done,changelist=[{name="var2",value="7",in_scope="true",type_changed="false",has_more="0"}]"#,
        },
        TestCase {
            line: "6-var-update 2 var2",
            expected: r#"6^done,changelist=[{name="var2",value="7",in_scope="true",type_changed="false",has_more="0"}]"#,
        },
    ];

    let env = TestEnv::new();
    let (s, _) = add_struct(&env);
    let i = env.state().add_variable("i", int("7"));
    env.cmd("0-var-create - * s");
    env.cmd("1-var-create - * i");

    for tc in cases {
        {
            let mut state = env.state();
            state.changed.insert(s);
            state.changed.insert(i);
        }
        assert_eq!(env.cmd(tc.line), tc.expected);
    }
}

#[test]
fn test_update_reports_listed_children() {
    let env = TestEnv::new();
    let (s, x) = add_struct(&env);
    env.cmd("1-var-create - * s");

    // children are unknown before listing
    env.state().changed.insert(x);
    assert_eq!(env.cmd("2-var-update 1 var1"), "2^done,changelist=[]");

    env.cmd("3-var-list-children var1");
    {
        let mut state = env.state();
        state.values.get_mut(&x).unwrap().value = "5".to_string();
        state.changed.insert(x);
    }
    let expected = r#"changelist=[{name="var1.x",value="5",in_scope="true",type_changed="false",has_more="0"}]"#;
    assert_eq!(env.cmd("4-var-update 1 var1"), format!("4^done,{expected}"));

    // a changed parent is hidden by its changed child, children are not reported twice
    {
        let mut state = env.state();
        state.values.get_mut(&x).unwrap().value = "6".to_string();
        state.changed.insert(x);
        state.changed.insert(s);
    }
    assert_eq!(
        env.cmd("5-var-update 1 *"),
        r#"5^done,changelist=[{name="var1.x",value="6",in_scope="true",type_changed="false",has_more="0"}]"#
    );
    assert_eq!(env.adapter.session().var("var1.x").unwrap().info.value, "6");

    env.state().changed.insert(s);
    assert_eq!(
        env.cmd("6-var-update 1 var1"),
        r#"6^done,changelist=[{name="var1",value="{...}",in_scope="true",type_changed="false",has_more="0"}]"#
    );
}

#[test]
fn test_var_errors() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            line: "1-var-create - * nope",
            expected: r#"1^error,msg="command 'var-create': use of undeclared identifier 'nope'""#,
        },
        TestCase {
            line: "2-var-update var9",
            expected: r#"2^error,msg="command 'var-update': variable object 'var9' not found""#,
        },
        TestCase {
            line: "3-var-set-format var1 roman",
            expected: r#"3^error,msg="command 'var-set-format': unknown variable format 'roman'""#,
        },
        TestCase {
            line: "4-var-list-children var1 0",
            expected: r#"4^error,msg="command 'var-list-children': arguments 'from' and 'to' must be specified together""#,
        },
    ];

    let env = TestEnv::new();
    env.state().add_variable("x", int("1"));
    env.cmd("0-var-create - * x");
    for tc in cases {
        assert_eq!(env.cmd(tc.line), tc.expected);
    }
}

#[test]
fn test_list_children() {
    let env = TestEnv::new();
    {
        let mut state = env.state();
        let x = state.add_value(int("1"));
        let elem = state.add_value(int("2"));
        state.add_variable(
            "s",
            MockValue {
                value: "{...}".to_string(),
                type_name: "struct S".to_string(),
                children: vec![("x".to_string(), x), (String::new(), elem)],
            },
        );
    }
    assert!(env
        .cmd("1-var-create - * s")
        .starts_with(r#"1^done,name="var1",numchild="2""#));

    assert_eq!(
        env.cmd("2-var-list-children 1 var1"),
        r#"2^done,numchild="2",children=[child={name="var1.x",exp="x",numchild="0",value="1",type="int",thread-id="1",has_more="0"},child={name="var1.$1",exp="1",numchild="0",value="2",type="int",thread-id="1",has_more="0"}],has_more="0""#
    );
    assert_eq!(env.adapter.session().var("var1.x").unwrap().parent.as_deref(), Some("var1"));

    assert_eq!(
        env.cmd("3-var-list-children var1 0 1"),
        r#"3^done,numchild="1",children=[child={name="var1.x",exp="x",numchild="0",type="int",thread-id="1",has_more="0"}],has_more="1""#
    );
    assert_eq!(
        env.cmd("4-var-list-children var1 5 9"),
        r#"4^done,numchild="0",has_more="0""#
    );
}

#[test]
fn test_list_children_simple_values() {
    let env = TestEnv::new();
    add_struct(&env);
    env.cmd("1-var-create - * s");

    assert_eq!(
        env.cmd("2-var-list-children --simple-values var1"),
        r#"2^done,numchild="2",children=[child={name="var1.x",exp="x",numchild="0",value="1",type="int",thread-id="1",has_more="0"},child={name="var1.inner",exp="inner",numchild="1",type="struct I",thread-id="1",has_more="0"}],has_more="0""#
    );
}

#[test]
fn test_evaluate_expression() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            line: "2-var-evaluate-expression var1",
            expected: r#"2^done,value="43""#,
        },
        TestCase {
            line: "3-var-evaluate-expression -f hexadecimal var1",
            expected: r#"3^done,value="0x2b""#,
        },
        TestCase {
            line: "4-var-evaluate-expression var1",
            expected: r#"4^done,value="43""#,
        },
        TestCase {
            line: "5-var-evaluate-expression -f roman var1",
            expected: r#"5^error,msg="command 'var-evaluate-expression': unknown variable format 'roman'""#,
        },
        TestCase {
            line: "6-var-evaluate-expression var9",
            expected: r#"6^error,msg="command 'var-evaluate-expression': variable object 'var9' not found""#,
        },
    ];

    let env = TestEnv::new();
    let handle = env.state().add_variable("x", int("42"));
    env.cmd("1-var-create - * x");
    // value changes behind the object, no update in between
    env.state().values.get_mut(&handle).unwrap().value = "43".to_string();

    for tc in cases {
        assert_eq!(env.cmd(tc.line), tc.expected);
    }
    assert_eq!(env.adapter.session().var("var1").unwrap().info.value, "43");
}

#[test]
fn test_path_expression_and_attributes() {
    struct TestCase {
        line: &'static str,
        expected: &'static str,
    }
    let cases = vec![
        TestCase {
            line: "3-var-info-path-expression var1",
            expected: r#"3^done,path_expr="s""#,
        },
        TestCase {
            line: "4-var-info-path-expression var1.x",
            expected: r#"4^done,path_expr="s.x""#,
        },
        TestCase {
            line: "5-var-info-path-expression var1.$1",
            expected: r#"5^done,path_expr="s[1]""#,
        },
        TestCase {
            line: "6-var-info-path-expression var9",
            expected: r#"6^error,msg="command 'var-info-path-expression': variable object 'var9' not found""#,
        },
        TestCase {
            line: "7-var-show-attributes var1.x",
            expected: r#"7^done,status="editable""#,
        },
        TestCase {
            line: "8-var-show-attributes var9",
            expected: r#"8^error,msg="command 'var-show-attributes': variable object 'var9' not found""#,
        },
    ];

    let env = TestEnv::new();
    {
        let mut state = env.state();
        let x = state.add_value(int("1"));
        let elem = state.add_value(int("2"));
        state.add_variable(
            "s",
            MockValue {
                value: "{...}".to_string(),
                type_name: "struct S".to_string(),
                children: vec![("x".to_string(), x), (String::new(), elem)],
            },
        );
    }
    env.cmd("1-var-create - * s");
    env.cmd("2-var-list-children var1");

    for tc in cases {
        assert_eq!(env.cmd(tc.line), tc.expected);
    }
}

#[test]
fn test_set_format_and_assign() {
    let env = TestEnv::new();
    env.state().add_variable("x", int("42"));
    env.cmd("1-var-create - * x");

    assert_eq!(
        env.cmd("2-var-set-format var1 hexadecimal"),
        r#"2^done,changelist=[{name="var1",value="0x2a",in_scope="true",type_changed="false",has_more="0"}]"#
    );
    assert_eq!(env.cmd("3-var-assign var1 7"), r#"3^done,value="0x7""#);

    env.cmd("4-var-set-format var1 decimal");
    assert_eq!(env.cmd("5-var-assign var1 8"), r#"5^done,value="8""#);
}

#[test]
fn test_delete_exact_name() {
    let env = TestEnv::new();
    env.state().add_variable("x", int("1"));
    env.cmd("1-var-create v * x");
    env.cmd("2-var-create v2 * x");

    assert_eq!(env.cmd("3-var-delete v"), "3^done");
    assert!(env.adapter.session().var("v").is_none());
    assert!(env.adapter.session().var("v2").is_some());

    // unknown object is not an error
    assert_eq!(env.cmd("4-var-delete v"), "4^done");
    assert_eq!(env.adapter.session().var_count(), 1);
}
