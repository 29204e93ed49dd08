//! End-to-end scenarios driving a script state through the public API

use luatab::mlua::prelude::*;
use luatab::{Config, Error, ScriptState, Table, TableDumper, TableMode, Value};
use std::sync::{Arc, Mutex};

#[test]
fn test_push_then_pull_user() {
    let state = ScriptState::new().unwrap();
    state
        .set_table("user", &Table::from_pairs([("name", "dan")]))
        .unwrap();

    let user = state.pull_global("user").unwrap().unwrap();
    assert_eq!(user.len(), 1);
    assert_eq!(user.entries()[0].name.as_deref(), Some("name"));
    assert_eq!(user.get("name").unwrap().as_str(), Some("dan"));
}

#[test]
fn test_indexed_table_visible_to_script() {
    let state = ScriptState::new().unwrap();
    let table = Table::from_values([Value::from("string1"), Value::from(4.20)]);
    state.set_table("MY_INDEXED_TABLE", &table).unwrap();

    let results = state
        .eval("return #MY_INDEXED_TABLE, MY_INDEXED_TABLE[1], MY_INDEXED_TABLE[2]")
        .unwrap();
    assert_eq!(
        results,
        vec![Value::Integer(2), Value::from("string1"), Value::from(4.20)]
    );
}

#[test]
fn test_path_upsert_then_pull() {
    let state = ScriptState::new().unwrap();
    state.set_path(&["G", "a", "b", "c"], "deep").unwrap();
    state.set_path(&["G", "a", "d"], true).unwrap();

    let g = state.pull_global("G").unwrap().unwrap();
    assert_eq!(g.get_path(&["a", "b", "c"]).unwrap().as_str(), Some("deep"));
    assert_eq!(g.get_path(&["a", "d"]).unwrap().as_bool(), Some(true));

    let a = g.get("a").unwrap().as_table().unwrap();
    assert_eq!(a.mode(), Some(TableMode::Named));
    assert_eq!(a.len(), 2);
}

#[test]
fn test_host_path_upsert_then_push() {
    let mut settings = Table::new();
    settings.set_path(&["window", "size", "width"], 800).unwrap();
    settings.set_path(&["window", "size", "height"], 600).unwrap();
    settings.set_path(&["window", "title"], "main").unwrap();

    let state = ScriptState::new().unwrap();
    state.set_table("settings", &settings).unwrap();

    let area: i64 = state
        .lua()
        .load("return settings.window.size.width * settings.window.size.height")
        .eval()
        .unwrap();
    assert_eq!(area, 480_000);
}

#[test]
fn test_callback_pulls_argument_table() {
    let state = ScriptState::new().unwrap();
    let seen: Arc<Mutex<Option<Table>>> = Arc::new(Mutex::new(None));

    let sink = Arc::clone(&seen);
    let callback = state
        .lua()
        .create_function(move |lua, arg: LuaValue| {
            let table =
                luatab::pull_table(lua, &arg).map_err(|e| LuaError::external(e.to_string()))?;
            if let Ok(mut slot) = sink.lock() {
                *slot = table;
            }
            Ok("Return from my_function")
        })
        .unwrap();

    let mut api = Table::new();
    api.set("my_function", Value::function(state.lua(), callback));
    state.set_table("api", &api).unwrap();

    let reply = state
        .eval(r#"return api.my_function({ NAME_LIST = { "john", "marie" }, count = 2 })"#)
        .unwrap();
    assert_eq!(reply, vec![Value::from("Return from my_function")]);

    let guard = seen.lock().unwrap();
    let arg = guard.as_ref().unwrap();
    assert_eq!(arg.get("count").unwrap().as_i64(), Some(2));
    let names = arg.get("NAME_LIST").unwrap().as_table().unwrap();
    assert_eq!(names.mode(), Some(TableMode::Indexed));
    assert_eq!(names.index(2).unwrap().as_str(), Some("marie"));
}

#[test]
fn test_call_script_function_and_dump_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.lua");
    std::fs::write(
        &path,
        r#"
        function callMe(a, b, n)
            return { message = a .. " " .. b, number = n }
        end
        "#,
    )
    .unwrap();

    let state = ScriptState::new().unwrap();
    state.exec_file(&path).unwrap();

    let results = state
        .call_function(
            "callMe",
            &[Value::from("Hello"), Value::from("world"), Value::from(420)],
        )
        .unwrap();
    let table = results[0].as_table().unwrap();

    let mut buf = Vec::new();
    TableDumper::default()
        .dump_named("return callMe", Some(table), &mut buf)
        .unwrap();
    let text = String::from_utf8(buf).unwrap();

    assert!(text.starts_with("==== Dumping Table: return callMe ====\n"));
    assert!(text.contains("message = Hello world\n"));
    assert!(text.contains("number = 420\n"));
    assert!(text.ends_with("==== Dumping End ====\n\n"));
}

#[test]
fn test_pull_depth_from_config() {
    let config = Config {
        pull_depth: 2,
        ..Default::default()
    };
    let state = ScriptState::with_config(config).unwrap();
    state.exec_string("shallow = { a = { b = 1 } }").unwrap();
    state.exec_string("deep = { a = { b = { c = 1 } } }").unwrap();

    assert!(state.pull_global("shallow").unwrap().is_some());
    assert!(matches!(
        state.pull_global("deep"),
        Err(Error::DepthExceeded(2))
    ));
}

#[test]
fn test_mixed_table_is_rejected_before_reaching_lua() {
    let state = ScriptState::new().unwrap();
    let mixed = Table::from(vec![
        luatab::Entry::named("a", 1),
        luatab::Entry::indexed(2),
    ]);

    assert!(matches!(
        state.set_table("mixed", &mixed),
        Err(Error::MixedTable { index: 1 })
    ));
    assert_eq!(state.get_global("mixed").unwrap(), None);
}
