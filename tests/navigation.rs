//! End-to-end resolution and navigation over small fixture trees

use cjump::core::config::Config;
use cjump::core::error::Error;
use cjump::history::NavigationEntry;
use cjump::host::{Action, Host, TerminalHost};
use cjump::inventory::canonical_path;
use cjump::session::{Event, Session};
use cjump::Engine;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    temp
}

fn path(temp: &TempDir, name: &str) -> PathBuf {
    canonical_path(&temp.path().join(name))
}

fn quiet_host() -> TerminalHost<Vec<u8>> {
    TerminalHost::new(Vec::new())
}

const A_C: &str = "#include <stdio.h>\n\nint foo(void);\n\nint main(void)\n{\n    return foo();\n}\n";

fn b_c() -> String {
    let mut text = "\n".repeat(9);
    text.push_str("int foo(void) { return 1; }\n");
    text
}

#[test]
fn prototype_resolves_to_definition_in_sibling_file() {
    let b = b_c();
    let temp = fixture(&[("dir/a.c", A_C), ("dir/b.c", &b)]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    let host = quiet_host();

    // Cursor on `foo` in `return foo();`
    let resolution = engine.resolve(&host, &path(&temp, "dir/a.c"), 7, 11).unwrap();

    assert_eq!(resolution.symbol, "foo");
    assert!(!resolution.is_self);
    assert_eq!(resolution.target.file, path(&temp, "dir/b.c"));
    assert_eq!(resolution.target.line, 10);
    assert!(engine.is_indexed(&path(&temp, "dir/b.c")));
}

#[test]
fn missing_definition_is_unresolved() {
    let temp = fixture(&[("dir/a.c", A_C), ("dir/other.c", "int bar(void) { return 2; }\n")]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();

    let err = engine
        .resolve(&quiet_host(), &path(&temp, "dir/a.c"), 7, 11)
        .unwrap_err();

    match err {
        Error::DeclarationUnresolved { name, scope } => {
            assert_eq!(name, "foo");
            assert_eq!(scope, path(&temp, "dir"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fallback_stays_under_parent_directory() {
    let b = b_c();
    let temp = fixture(&[("dir/a.c", A_C), ("elsewhere/b.c", &b)]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();

    let err = engine
        .resolve(&quiet_host(), &path(&temp, "dir/a.c"), 7, 11)
        .unwrap_err();
    assert!(matches!(err, Error::DeclarationUnresolved { .. }));
    assert!(!engine.is_indexed(&path(&temp, "elsewhere/b.c")));
}

#[test]
fn non_utf8_comments_do_not_hide_definitions() {
    let temp = fixture(&[]);
    let dir = temp.path().join("dir");
    std::fs::create_dir_all(&dir).unwrap();
    let mut caller = b"/* caf\xE9 */\n".to_vec();
    caller.extend_from_slice(b"int foo(void);\nint main(void) { return foo(); }\n");
    std::fs::write(dir.join("a.c"), caller).unwrap();
    std::fs::write(dir.join("b.c"), b"/* \xE9 */\nint foo(void) { return 1; }\n").unwrap();
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();

    // `foo` in `return foo();` on line 3
    let resolution = engine.resolve(&quiet_host(), &path(&temp, "dir/a.c"), 3, 24).unwrap();

    assert_eq!(resolution.symbol, "foo");
    assert_eq!(resolution.target.file, path(&temp, "dir/b.c"));
    assert_eq!(resolution.target.line, 2);
}

#[test]
fn cursor_on_declaration_resolves_to_itself() {
    let temp = fixture(&[("dir/a.c", A_C)]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();

    // `foo` in the prototype on line 3 starts at 0-based column 4
    let resolution = engine.resolve(&quiet_host(), &path(&temp, "dir/a.c"), 3, 4).unwrap();

    assert!(resolution.is_self);
    assert_eq!(resolution.target, resolution.origin);
    assert_eq!(resolution.target.line, 3);
    assert_eq!(resolution.target.column, 5);
}

#[test]
fn lookup_picks_rightmost_start_not_after_cursor() {
    // `aaaaa` starts at column 5 and `b` at column 12 (1-based)
    let temp = fixture(&[("d.c", "int aaaaa, b;\n")]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    let file = path(&temp, "d.c");
    engine.index_file(&file).unwrap();

    let hit = engine.occurrence_at(&file, 1, 10).unwrap();
    assert_eq!(hit.spelling, "aaaaa");
    assert_eq!(hit.location.column, 5);

    assert_eq!(engine.occurrence_at(&file, 1, 11).unwrap().spelling, "b");
    assert!(matches!(
        engine.occurrence_at(&file, 2, 0),
        Err(Error::SymbolNotFound { .. })
    ));
}

#[test]
fn unchanged_buffer_is_not_reparsed() {
    let temp = fixture(&[("a.c", "int value;\nint read(void) { return value; }\n")]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    let file = path(&temp, "a.c");
    let mut host = quiet_host();
    host.open_file(&file).unwrap();

    assert!(engine.refresh(&host, &file).unwrap(), "first use parses from disk");
    let fingerprint = engine.unit(&file).unwrap().fingerprint;
    let before = engine.index().symbols().len();

    // Modified flag set, content identical
    host.edit_buffer(&file, "int value;\nint read(void) { return value; }\n")
        .unwrap();
    assert!(!engine.refresh(&host, &file).unwrap());
    engine.resolve(&host, &file, 2, 24).unwrap();
    engine.resolve(&host, &file, 2, 24).unwrap();

    assert_eq!(engine.unit(&file).unwrap().fingerprint, fingerprint);
    assert_eq!(engine.index().symbols().len(), before);
}

#[test]
fn modified_buffer_is_reparsed_at_its_own_path() {
    let temp = fixture(&[("a.c", "int value;\n")]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    let file = path(&temp, "a.c");
    let mut host = quiet_host();
    host.open_file(&file).unwrap();
    engine.refresh(&host, &file).unwrap();

    host.edit_buffer(&file, "int value;\nint renamed;\nint get(void) { return renamed; }\n")
        .unwrap();
    let resolution = engine.resolve(&host, &file, 3, 23).unwrap();

    assert_eq!(resolution.symbol, "renamed");
    assert_eq!(resolution.target.file, file);
    assert_eq!(resolution.target.line, 2);
    // Disk content is untouched
    assert_eq!(std::fs::read_to_string(&file).unwrap(), "int value;\n");
}

#[test]
fn definitions_in_headers_are_filed_under_the_header() {
    let temp = fixture(&[
        ("include/point.h", "struct point {\n    int x;\n};\n"),
        ("src/main.c", "#include \"point.h\"\nint get(struct point *p) { return p->x; }\n"),
    ]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    let main = path(&temp, "src/main.c");

    // `x` in `p->x`
    let resolution = engine.resolve(&quiet_host(), &main, 2, 37).unwrap();
    assert_eq!(resolution.symbol, "x");
    assert_eq!(resolution.target.file, path(&temp, "include/point.h"));
    assert_eq!(resolution.target.line, 2);

    let header_hits = engine.index().candidates(&path(&temp, "include/point.h"), 1);
    assert_eq!(header_hits[0].spelling, "point");
}

#[test]
fn build_defines_select_the_indexed_branch() {
    let temp = fixture(&[
        ("Makefile", "CFLAGS = -O2 -DUSE_FAST\n"),
        (
            "impl.c",
            "#ifdef USE_FAST\nint speed(void) { return 2; }\n#else\nint speed(void) { return 1; }\n#endif\nint main(void) { return speed(); }\n",
        ),
    ]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();
    assert!(engine.defines().contains("USE_FAST"));

    let resolution = engine.resolve(&quiet_host(), &path(&temp, "impl.c"), 6, 24).unwrap();
    assert_eq!(resolution.target.line, 2);
}

#[test]
fn body_is_never_replaced_by_a_prototype() {
    let temp = fixture(&[
        ("lib/impl.c", "int shared(void) { return 0; }\n"),
        ("lib/user.c", "int shared(void);\nint call(void) { return shared(); }\n"),
        ("lib/again.c", "int shared(void);\n"),
    ]);
    let mut engine = Engine::open(temp.path(), Config::default()).unwrap();

    for name in ["lib/impl.c", "lib/user.c", "lib/again.c"] {
        engine.index_file(&path(&temp, name)).unwrap();
        if name != "lib/impl.c" {
            let best = engine.index().declaration("shared").unwrap();
            assert!(best.has_body);
            assert_eq!(best.location.file, path(&temp, "lib/impl.c"));
        }
    }
}

#[test]
fn session_jump_back_and_forward() {
    let b = b_c();
    let temp = fixture(&[("dir/a.c", A_C), ("dir/b.c", &b)]);
    let a = path(&temp, "dir/a.c");
    let b = path(&temp, "dir/b.c");

    let mut session = Session::start(temp.path(), Config::default(), quiet_host()).unwrap();
    session.host_mut().open_file(&a).unwrap();
    session.host_mut().goto_position(7, 11);

    assert!(session.dispatch(Event::Key(Action::JumpToDefinition)).is_continue());
    assert_eq!(session.host().current_file(), Some(b.clone()));
    assert_eq!(session.host().current_position(), (10, 4));

    session.dispatch(Event::Input("M--".to_string()));
    assert_eq!(
        NavigationEntry::current(session.host()),
        Some(NavigationEntry::new(&a, 7, 11))
    );

    session.dispatch(Event::Input("M-=".to_string()));
    assert_eq!(
        NavigationEntry::current(session.host()),
        Some(NavigationEntry::new(&b, 10, 4))
    );

    // Both files are open now, the jump back switches buffers
    assert_eq!(session.host().open_buffers().len(), 2);
    assert!(!session.error_log().path().exists());
}

#[test]
fn session_refresh_reparses_only_modified_buffers() {
    let temp = fixture(&[("a.c", "int one;\n"), ("b.c", "int two;\n")]);
    let a = path(&temp, "a.c");
    let b = path(&temp, "b.c");

    let mut session = Session::start(temp.path(), Config::default(), quiet_host()).unwrap();
    session.host_mut().open_file(&a).unwrap();
    session.host_mut().open_file(&b).unwrap();
    assert_eq!(session.refresh_open_buffers(), 0);

    session.host_mut().edit_buffer(&a, "int one;\nint three;\n").unwrap();
    assert_eq!(session.refresh_open_buffers(), 1);
    assert_eq!(session.refresh_open_buffers(), 0, "fingerprint now matches");

    assert!(session.engine().index().knows_name("three"));
    assert!(!session.engine().is_indexed(Path::new(&b)));
}
