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

//! The XCompose parser.
//!
//! The grammar (from XCompose(5), minus the modifier syntax, which is not
//! supported):
//!
//! ```text
//! FILE       := { [PRODUCTION] [COMMENT] "\n" | INCLUDE }
//! INCLUDE    := "include" '"' INCLUDE_STRING '"'
//! PRODUCTION := LHS ":" RHS [COMMENT]
//! COMMENT    := "#" {<any character except null or newline>}
//! LHS        := EVENT { EVENT }
//! EVENT      := "<" keysym ">"
//! RHS        := ( STRING | keysym | STRING keysym )
//! STRING     := '"' { CHAR } '"'
//! CHAR       := printable | '\\' | '\"' | '\xHH' | '\OOO'
//! ```
//!
//! Parsing is line oriented and forgiving: a malformed line is reported
//! and skipped, and only a pile-up of unrecognized tokens (or a failing
//! include) abandons the file.

use std::fs::File;

use crate::keysym::Keysym;
use crate::lexer::{lex, lex_include_string, Token};
use crate::scanner::Scanner;
use crate::table::ComposeTable;
use crate::util::FileMap;

/// Longest left-hand side a production may have.
const MAX_LHS_LEN: usize = 10;
/// Longest right-hand side string, in bytes.
const MAX_STRING_LEN: usize = 255;
/// How deep `include` may nest before assuming a loop.
const MAX_INCLUDE_DEPTH: u32 = 5;
/// How many unrecognized-token errors to tolerate before giving up.
const MAX_ERRORS: u32 = 10;

/// One `LHS : RHS` line, between lexing and trie insertion.
pub(crate) struct Production {
    pub(crate) lhs: Vec<Keysym>,
    pub(crate) string: Option<String>,
    pub(crate) keysym: Option<Keysym>,
}

impl Production {
    fn new() -> Production {
        Production {
            lhs: Vec::with_capacity(MAX_LHS_LEN),
            string: None,
            keysym: None,
        }
    }

    fn clear(&mut self) {
        self.lhs.clear();
        self.string = None;
        self.keysym = None;
    }
}

enum State {
    /// Start of a line; resets the production in progress.
    Initial,
    /// Start of a line, production already clean.
    InitialEol,
    /// After `include`, expecting the path string.
    Include,
    /// After the include path, expecting the end of the line.
    IncludeEol,
    /// Accumulating LHS events.
    Lhs,
    /// After the colon, accumulating the RHS.
    Rhs,
    /// The current token doesn't belong here.
    Unexpected,
    /// Discard tokens through the end of the line.
    Skip,
}

/// Parse Compose source into `table`. Returns false if the file had to be
/// abandoned; the caller discards the partially filled table.
pub(crate) fn parse(table: &mut ComposeTable, s: &mut Scanner, include_depth: u32) -> bool {
    let mut state = State::Initial;
    let mut tok = Token::EndOfLine;
    let mut production = Production::new();
    let mut include_path = String::new();
    let mut num_errors: u32 = 0;

    loop {
        match state {
            State::Initial => {
                production.clear();
                state = State::InitialEol;
            }

            State::InitialEol => {
                tok = lex(s);
                match &tok {
                    Token::EndOfLine => {}
                    Token::EndOfFile => return true,
                    Token::Include => state = State::Include,
                    Token::LhsKeysym(keysym) => {
                        production.lhs.push(*keysym);
                        state = State::Lhs;
                    }
                    _ => state = State::Unexpected,
                }
            }

            State::Include => {
                tok = lex_include_string(s, table.locale());
                match &tok {
                    Token::IncludeString(path) => {
                        include_path = path.clone();
                        state = State::IncludeEol;
                    }
                    _ => state = State::Unexpected,
                }
            }

            State::IncludeEol => {
                tok = lex(s);
                match &tok {
                    Token::EndOfLine => {
                        if !do_include(table, s, &include_path, include_depth) {
                            return fail(s);
                        }
                        state = State::Initial;
                    }
                    _ => state = State::Unexpected,
                }
            }

            State::Lhs => {
                tok = lex(s);
                match &tok {
                    Token::LhsKeysym(keysym) => {
                        if production.lhs.len() + 1 > MAX_LHS_LEN {
                            s.warn(format_args!(
                                "too many keysyms ({}) on left-hand side; skipping line",
                                MAX_LHS_LEN + 1
                            ));
                            state = State::Skip;
                        } else {
                            production.lhs.push(*keysym);
                        }
                    }
                    Token::Colon => {
                        if production.lhs.is_empty() {
                            s.warn(
                                "expected at least one keysym on left-hand side; \
                                 skipping line",
                            );
                            state = State::Skip;
                        } else {
                            state = State::Rhs;
                        }
                    }
                    _ => state = State::Unexpected,
                }
            }

            State::Rhs => {
                tok = lex(s);
                match &tok {
                    Token::String(string) => {
                        // An escaped NUL ends the value, C-string style.
                        let value = match string.find('\0') {
                            Some(nul) => &string[..nul],
                            None => string.as_str(),
                        };
                        if production.string.is_some() {
                            s.warn(
                                "right-hand side can have at most one string; \
                                 skipping line",
                            );
                            state = State::Skip;
                        } else if value.is_empty() {
                            s.warn("right-hand side string must not be empty; skipping line");
                            state = State::Skip;
                        } else if value.len() > MAX_STRING_LEN {
                            s.warn("right-hand side string is too long; skipping line");
                            state = State::Skip;
                        } else {
                            production.string = Some(value.to_owned());
                        }
                    }
                    Token::RhsKeysym(keysym) => {
                        if production.keysym.is_some() {
                            s.warn(
                                "right-hand side can have at most one keysym; \
                                 skipping line",
                            );
                            state = State::Skip;
                        } else {
                            // A keysym ends the production immediately; no
                            // trailing newline is required.
                            production.keysym = Some(*keysym);
                            table.insert(s, &production);
                            state = State::Initial;
                        }
                    }
                    Token::EndOfLine => {
                        if production.string.is_none() && production.keysym.is_none() {
                            s.warn(
                                "right-hand side must have at least one of string \
                                 or keysym; skipping line",
                            );
                            state = State::Skip;
                        } else {
                            table.insert(s, &production);
                            state = State::Initial;
                        }
                    }
                    _ => state = State::Unexpected,
                }
            }

            State::Unexpected => {
                // Lexer errors already carry their own diagnostic.
                if tok != Token::Error {
                    s.err("unexpected token");
                }
                num_errors += 1;
                if num_errors <= MAX_ERRORS {
                    state = State::Skip;
                } else {
                    s.err("too many errors");
                    return fail(s);
                }
            }

            State::Skip => {
                while !matches!(tok, Token::EndOfLine | Token::EndOfFile) {
                    tok = lex(s);
                }
                state = State::Initial;
            }
        }
    }
}

fn fail(s: &Scanner) -> bool {
    s.err("failed to parse file");
    false
}

/// Parse an included file into the same table.
fn do_include(table: &mut ComposeTable, s: &Scanner, path: &str, include_depth: u32) -> bool {
    if include_depth >= MAX_INCLUDE_DEPTH {
        s.err(format_args!(
            "maximum include depth ({MAX_INCLUDE_DEPTH}) exceeded; \
             maybe there is an include loop?"
        ));
        return false;
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            s.err(format_args!(
                "failed to open included Compose file \"{path}\": {err}"
            ));
            return false;
        }
    };
    let map = match FileMap::new(&file) {
        Ok(map) => map,
        Err(err) => {
            s.err(format_args!(
                "failed to read included Compose file \"{path}\": {err}"
            ));
            return false;
        }
    };

    let mut scanner = Scanner::new(&map, path);
    parse(table, &mut scanner, include_depth + 1)
}
