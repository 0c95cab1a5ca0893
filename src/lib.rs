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

//! Compose sequences for keyboard input, without the C library.
//!
//! X applications turn multi-key sequences into characters through
//! Compose tables: `<dead_tilde> <a>` becomes `ã`, `<Multi_key> <o> <c>`
//! becomes `©`. This crate compiles the XCompose(5) text format into a
//! compact trie ([`ComposeTable`]) and drives per-session matchers over
//! it ([`ComposeState`]), with the same observable behavior a toolkit
//! gets from libxkbcommon's compose support.
//!
//! A table is built once, from an explicit file or buffer or from the
//! user's environment ([`ComposeTable::from_locale`]), and is immutable
//! and cheaply shared from then on. Each keyboard (or window, as the
//! consumer prefers) gets its own [`ComposeState`]; every key press is
//! [`fed`](ComposeState::feed) to it, and the session reports whether a
//! sequence is in progress, just completed (with the resulting string
//! and keysym), broke off, or never started.
//!
//! ```
//! use std::sync::Arc;
//! use xcompose::{keysyms, CompileFlags, ComposeState, ComposeTable, Format, StateFlags, Status};
//!
//! let table = ComposeTable::from_buffer(
//!     b"<dead_tilde> <a> : \"\xc3\xa3\" atilde\n",
//!     "en_US.UTF-8",
//!     Format::TextV1,
//!     CompileFlags::NONE,
//! )?;
//! let mut state = ComposeState::new(Arc::new(table), StateFlags::NONE)?;
//!
//! state.feed(keysyms::DEAD_TILDE);
//! assert_eq!(state.status(), Status::Composing);
//! state.feed(xcompose::Keysym::from_name("a").unwrap());
//! assert_eq!(state.status(), Status::Composed);
//! assert_eq!(state.utf8(), "ã");
//! # Ok::<(), xcompose::Error>(())
//! ```
//!
//! Keysyms are passed around as the raw 32-bit protocol values, wrapped
//! in [`Keysym`]; how they are obtained from key presses (xkb state,
//! evdev, a test harness) is up to the consumer.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
mod keysym;
mod lexer;
mod parser;
mod paths;
mod scanner;
mod state;
mod table;
mod util;

pub use error::Error;
pub use keysym::{keysyms, Keysym, NO_SYMBOL};
pub use state::{ComposeState, StateFlags, Status};
pub use table::{CompileFlags, ComposeTable, Format};
