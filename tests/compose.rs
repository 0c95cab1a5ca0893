// Copyright 2023 the xcompose Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests over a Compose file with the standard X rules.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use xcompose::{
    keysyms, CompileFlags, ComposeState, ComposeTable, Error, Format, Keysym, StateFlags, Status,
    NO_SYMBOL,
};

/// Discovery tests rewrite process-wide environment variables; they must
/// not interleave.
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn data_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("Compose")
}

fn compose_table() -> Arc<ComposeTable> {
    let file = File::open(data_path()).unwrap();
    Arc::new(
        ComposeTable::from_file(&file, "en_US.UTF-8", Format::TextV1, CompileFlags::NONE)
            .unwrap(),
    )
}

fn sym(name: &str) -> Keysym {
    Keysym::from_name(name).unwrap_or_else(|| panic!("unknown keysym {name:?}"))
}

/// Feed a sequence of keysyms to a fresh session and check the status,
/// string and keysym after every single feed.
fn check_sequence(table: &Arc<ComposeTable>, steps: &[(Keysym, Status, &str, Keysym)]) {
    let mut state = ComposeState::new(table.clone(), StateFlags::NONE).unwrap();
    for (i, &(input, status, utf8, one_sym)) in steps.iter().enumerate() {
        state.feed(input);
        assert_eq!(state.status(), status, "status after feeding {} keysyms", i + 1);
        assert_eq!(state.utf8(), utf8, "string after feeding {} keysyms", i + 1);
        assert_eq!(state.one_sym(), one_sym, "keysym after feeding {} keysyms", i + 1);
    }
}

#[test_log::test]
fn dead_tilde_space() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::DEAD_TILDE, Status::Composing, "", NO_SYMBOL),
            (keysyms::SPACE, Status::Composed, "~", keysyms::ASCIITILDE),
        ],
    );
}

#[test]
fn composed_does_not_auto_reset_but_feeds_restart() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::DEAD_TILDE, Status::Composing, "", NO_SYMBOL),
            (keysyms::SPACE, Status::Composed, "~", keysyms::ASCIITILDE),
            (keysyms::DEAD_TILDE, Status::Composing, "", NO_SYMBOL),
            (keysyms::SPACE, Status::Composed, "~", keysyms::ASCIITILDE),
        ],
    );
}

#[test]
fn doubled_dead_tilde() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::DEAD_TILDE, Status::Composing, "", NO_SYMBOL),
            (keysyms::DEAD_TILDE, Status::Composed, "~", keysyms::ASCIITILDE),
        ],
    );
}

#[test]
fn dead_acute_space() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::DEAD_ACUTE, Status::Composing, "", NO_SYMBOL),
            (keysyms::SPACE, Status::Composed, "'", keysyms::APOSTROPHE),
        ],
    );
}

#[test]
fn doubled_dead_acute() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::DEAD_ACUTE, Status::Composing, "", NO_SYMBOL),
            (keysyms::DEAD_ACUTE, Status::Composed, "\u{b4}", keysyms::ACUTE),
        ],
    );
}

#[test]
fn modifiers_pass_through_a_sequence() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::MULTI_KEY, Status::Composing, "", NO_SYMBOL),
            (keysyms::SHIFT_L, Status::Composing, "", NO_SYMBOL),
            (sym("A"), Status::Composing, "", NO_SYMBOL),
            (keysyms::CAPS_LOCK, Status::Composing, "", NO_SYMBOL),
            (sym("T"), Status::Composed, "@", keysyms::AT),
        ],
    );
}

#[test]
fn unrelated_keys_do_nothing() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (sym("7"), Status::Nothing, "", NO_SYMBOL),
            (sym("a"), Status::Nothing, "", NO_SYMBOL),
            (sym("b"), Status::Nothing, "", NO_SYMBOL),
        ],
    );
}

#[test]
fn broken_sequence_cancels_once() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::MULTI_KEY, Status::Composing, "", NO_SYMBOL),
            (keysyms::APOSTROPHE, Status::Composing, "", NO_SYMBOL),
            (sym("7"), Status::Cancelled, "", NO_SYMBOL),
            (sym("7"), Status::Nothing, "", NO_SYMBOL),
        ],
    );
}

#[test]
fn three_key_sequences() {
    let table = compose_table();
    check_sequence(
        &table,
        &[
            (keysyms::MULTI_KEY, Status::Composing, "", NO_SYMBOL),
            (sym("minus"), Status::Composing, "", NO_SYMBOL),
            (sym("minus"), Status::Composing, "", NO_SYMBOL),
            (sym("minus"), Status::Composed, "\u{2014}", sym("emdash")),
        ],
    );
}

#[test]
fn reset_abandons_progress() {
    let table = compose_table();
    let mut state = ComposeState::new(table.clone(), StateFlags::NONE).unwrap();
    state.feed(keysyms::MULTI_KEY);
    state.feed(keysyms::APOSTROPHE);
    assert_eq!(state.status(), Status::Composing);
    state.reset();
    assert_eq!(state.status(), Status::Nothing);
    assert_eq!(state.utf8(), "");
    assert_eq!(state.one_sym(), NO_SYMBOL);
}

#[test]
fn comment_only_file_matches_nothing() {
    let table = ComposeTable::from_buffer(
        b"# nothing here\n\n   \n",
        "C",
        Format::TextV1,
        CompileFlags::NONE,
    )
    .unwrap();
    let mut state = ComposeState::new(Arc::new(table), StateFlags::NONE).unwrap();
    state.feed(keysyms::DEAD_TILDE);
    assert_eq!(state.status(), Status::Nothing);
}

#[test]
fn from_file_can_recompile_the_same_handle() {
    let file = File::open(data_path()).unwrap();
    for _ in 0..3 {
        let table =
            ComposeTable::from_file(&file, "en_US.UTF-8", Format::TextV1, CompileFlags::NONE)
                .unwrap();
        assert_eq!(table.locale(), "en_US.UTF-8");
    }
}

#[test_log::test]
fn home_expansion_in_include() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(".XCompose"),
        "<dead_grave> <space> : \"`\" grave\n",
    )
    .unwrap();
    let old_home = std::env::var_os("HOME");
    std::env::set_var("HOME", home.path());

    let table = ComposeTable::from_buffer(
        b"include \"%H/.XCompose\"\n",
        "C",
        Format::TextV1,
        CompileFlags::NONE,
    );

    match old_home {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }

    let mut state = ComposeState::new(Arc::new(table.unwrap()), StateFlags::NONE).unwrap();
    state.feed(keysyms::DEAD_GRAVE);
    state.feed(keysyms::SPACE);
    assert_eq!(state.status(), Status::Composed);
    assert_eq!(state.utf8(), "`");
}

#[test]
fn discovery_prefers_xcomposefile() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = SavedEnv::capture();

    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(".XCompose"),
        "<dead_grave> <a> : \"\u{e0}\" agrave\n",
    )
    .unwrap();
    std::env::set_var("XCOMPOSEFILE", data_path());
    std::env::set_var("HOME", home.path());
    std::env::set_var("XLOCALEDIR", home.path()); // no compose.dir here

    let table = ComposeTable::from_locale("en_US.UTF-8", CompileFlags::NONE);
    saved.restore();
    let table = table.unwrap();

    // The explicit file won over $HOME/.XCompose.
    let mut state = ComposeState::new(Arc::new(table), StateFlags::NONE).unwrap();
    state.feed(keysyms::DEAD_TILDE);
    state.feed(keysyms::SPACE);
    assert_eq!(state.status(), Status::Composed);
    assert_eq!(state.utf8(), "~");
}

#[test]
fn discovery_falls_back_to_home() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = SavedEnv::capture();

    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        home.path().join(".XCompose"),
        "<dead_grave> <a> : \"\u{e0}\" agrave\n",
    )
    .unwrap();
    std::env::remove_var("XCOMPOSEFILE");
    std::env::set_var("HOME", home.path());
    std::env::set_var("XLOCALEDIR", home.path());

    let table = ComposeTable::from_locale("en_US.UTF-8", CompileFlags::NONE);
    saved.restore();

    let mut state = ComposeState::new(Arc::new(table.unwrap()), StateFlags::NONE).unwrap();
    state.feed(keysyms::DEAD_GRAVE);
    state.feed(sym("a"));
    assert_eq!(state.status(), Status::Composed);
    assert_eq!(state.utf8(), "\u{e0}");
}

#[test_log::test]
fn discovery_uses_the_locale_directory() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = SavedEnv::capture();

    let xlocaledir = tempfile::tempdir().unwrap();
    let locale_dir = xlocaledir.path().join("en_US.UTF-8");
    std::fs::create_dir(&locale_dir).unwrap();
    std::fs::copy(data_path(), locale_dir.join("Compose")).unwrap();
    std::fs::write(
        xlocaledir.path().join("compose.dir"),
        "en_US.UTF-8/Compose:\t\ten_US.UTF-8\n",
    )
    .unwrap();
    let home = tempfile::tempdir().unwrap(); // no .XCompose inside
    std::env::remove_var("XCOMPOSEFILE");
    std::env::set_var("HOME", home.path());
    std::env::set_var("XLOCALEDIR", xlocaledir.path());

    let table = ComposeTable::from_locale("en_US.UTF-8", CompileFlags::NONE);
    saved.restore();

    let table = table.unwrap();
    assert_eq!(table.locale(), "en_US.UTF-8");
    let mut state = ComposeState::new(Arc::new(table), StateFlags::NONE).unwrap();
    state.feed(keysyms::MULTI_KEY);
    state.feed(sym("e"));
    state.feed(sym("equal"));
    assert_eq!(state.status(), Status::Composed);
    assert_eq!(state.utf8(), "\u{20ac}");
}

#[test]
fn discovery_failure_reports_the_locale() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = SavedEnv::capture();

    let empty = tempfile::tempdir().unwrap();
    std::env::remove_var("XCOMPOSEFILE");
    std::env::set_var("HOME", empty.path());
    std::env::set_var("XLOCALEDIR", empty.path());

    let result = ComposeTable::from_locale("xx_XX.UTF-8", CompileFlags::NONE);
    saved.restore();

    assert!(matches!(
        result,
        Err(Error::NoComposeFile { locale }) if locale == "xx_XX.UTF-8"
    ));
}

#[test]
fn empty_locale_resolves_from_the_environment() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let saved = SavedEnv::capture();

    std::env::set_var("XCOMPOSEFILE", data_path());
    std::env::set_var("LC_ALL", "de_DE.UTF-8");

    let table = ComposeTable::from_locale("", CompileFlags::NONE);
    saved.restore();

    assert_eq!(table.unwrap().locale(), "de_DE.UTF-8");
}

/// Snapshot of the environment the discovery tests touch.
struct SavedEnv {
    vars: Vec<(&'static str, Option<std::ffi::OsString>)>,
}

impl SavedEnv {
    fn capture() -> SavedEnv {
        let vars = ["XCOMPOSEFILE", "HOME", "XLOCALEDIR", "LC_ALL"]
            .into_iter()
            .map(|name| (name, std::env::var_os(name)))
            .collect();
        SavedEnv { vars }
    }

    fn restore(self) {
        for (name, value) in self.vars {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run with `cargo test --release -- --ignored bench_compile` for a rough
/// compile-throughput number.
#[test]
#[ignore = "benchmark"]
fn bench_compile() {
    const ITERATIONS: u32 = 500;
    let file = File::open(data_path()).unwrap();
    let start = std::time::Instant::now();
    for _ in 0..ITERATIONS {
        let table =
            ComposeTable::from_file(&file, "en_US.UTF-8", Format::TextV1, CompileFlags::NONE)
                .unwrap();
        drop(table);
    }
    let mut out = std::io::stderr();
    writeln!(
        out,
        "compiled {} compose tables in {:?}",
        ITERATIONS,
        start.elapsed()
    )
    .unwrap();
}
