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

//! Tokenization of the XCompose grammar.
//!
//! Two lexers share one scanner: [`lex`] produces the ordinary token
//! stream, and [`lex_include_string`] is invoked by the parser only for
//! the path after an `include`, where `%`-expansion replaces the usual
//! escape rules.

use crate::keysym::Keysym;
use crate::scanner::{is_space, Scanner};
use crate::{paths, util};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    EndOfFile,
    EndOfLine,
    /// The literal identifier `include`.
    Include,
    /// An include path, with `%` expansions already applied.
    IncludeString(String),
    /// A `<keysym>` event on the left-hand side.
    LhsKeysym(Keysym),
    Colon,
    /// A cooked (escape-processed, UTF-8 validated) string literal.
    String(String),
    /// A bare keysym name on the right-hand side.
    RhsKeysym(Keysym),
    /// A malformed token. The diagnostic has already been reported; the
    /// parser treats this like any other unexpected token.
    Error,
}

/// Produce the next ordinary token.
pub(crate) fn lex(s: &mut Scanner) -> Token {
    loop {
        // Skip spaces; consuming a newline ends the line.
        while is_space(s.peek()) {
            if s.next() == b'\n' {
                return Token::EndOfLine;
            }
        }

        // Comments run to the end of the line.
        if s.chr(b'#') {
            s.skip_to_eol();
            continue;
        }

        break;
    }

    if s.eof() {
        return Token::EndOfFile;
    }

    s.start_token();

    // LHS keysym event.
    if s.chr(b'<') {
        while s.peek() != b'>' && !s.eol() {
            let b = s.next();
            s.buf_append(b);
        }
        if !s.chr(b'>') {
            s.err("unterminated keysym literal");
            return Token::Error;
        }
        if !s.buf_append(0) {
            s.err("keysym literal is too long");
            return Token::Error;
        }
        let name = String::from_utf8_lossy(trim_nul(s.buf())).into_owned();
        return match Keysym::from_name(&name) {
            Some(keysym) => Token::LhsKeysym(keysym),
            None => {
                s.err(format_args!(
                    "unrecognized keysym \"{name}\" on left-hand side"
                ));
                Token::Error
            }
        };
    }

    if s.chr(b':') {
        return Token::Colon;
    }

    // String literal.
    if s.chr(b'"') {
        while !s.eof() && !s.eol() && s.peek() != b'"' {
            if s.chr(b'\\') {
                if s.chr(b'\\') {
                    s.buf_append(b'\\');
                } else if s.chr(b'"') {
                    s.buf_append(b'"');
                } else if s.chr(b'x') || s.chr(b'X') {
                    match s.hex() {
                        Some(b) => {
                            s.buf_append(b);
                        }
                        None => {
                            s.warn("illegal hexadecimal escape sequence in string literal");
                        }
                    }
                } else if let Some(b) = s.oct() {
                    s.buf_append(b);
                } else {
                    s.warn(format_args!(
                        "unknown escape sequence ({}) in string literal",
                        s.peek() as char
                    ));
                    // The escape is dropped; the escaped byte is kept.
                }
            } else {
                let b = s.next();
                s.buf_append(b);
            }
        }
        if !s.chr(b'"') {
            s.err("unterminated string literal");
            return Token::Error;
        }
        if !s.buf_append(0) {
            s.err("string literal is too long");
            return Token::Error;
        }
        return match std::str::from_utf8(trim_nul(s.buf())) {
            Ok(string) => Token::String(string.to_owned()),
            Err(_) => {
                s.err("string literal is not a valid UTF-8 string");
                Token::Error
            }
        };
    }

    // `include` or an RHS keysym name.
    if s.peek().is_ascii_alphabetic() || s.peek() == b'_' {
        while s.peek().is_ascii_alphanumeric() || s.peek() == b'_' {
            let b = s.next();
            s.buf_append(b);
        }
        if !s.buf_append(0) {
            s.err("identifier is too long");
            return Token::Error;
        }
        let name = String::from_utf8_lossy(trim_nul(s.buf())).into_owned();

        if name == "include" {
            return Token::Include;
        }

        return match Keysym::from_name(&name) {
            Some(keysym) => Token::RhsKeysym(keysym),
            None => {
                s.err(format_args!(
                    "unrecognized keysym \"{name}\" on right-hand side"
                ));
                Token::Error
            }
        };
    }

    // Nothing we know; discard the rest of the line.
    while !s.eof() && !s.eol() {
        s.next();
    }
    s.err("unrecognized token");
    Token::Error
}

/// Produce the path token that must follow `include`.
///
/// Inside the quotes, `%` starts an expansion (`%%`, `%H`, `%L`, `%S`);
/// the string escapes of ordinary literals do not apply. `locale` is the
/// table's resolved locale, needed for `%L`.
pub(crate) fn lex_include_string(s: &mut Scanner, locale: &str) -> Token {
    while is_space(s.peek()) {
        if s.next() == b'\n' {
            return Token::EndOfLine;
        }
    }

    s.start_token();

    if !s.chr(b'"') {
        s.err("include statement must be followed by a path");
        return Token::Error;
    }

    while !s.eof() && !s.eol() && s.peek() != b'"' {
        if s.chr(b'%') {
            if s.chr(b'%') {
                s.buf_append(b'%');
            } else if s.chr(b'H') {
                let Some(home) = util::secure_getenv("HOME") else {
                    s.err(
                        "%H was used in an include statement, but the HOME \
                         environment variable is not set",
                    );
                    return Token::Error;
                };
                if !s.buf_appends(&home) {
                    s.err("include path after expanding %H is too long");
                    return Token::Error;
                }
            } else if s.chr(b'L') {
                let Some(path) = paths::locale_compose_file_path(locale) else {
                    s.err("failed to expand %L to the locale Compose file");
                    return Token::Error;
                };
                if !s.buf_appends(&path.to_string_lossy()) {
                    s.err("include path after expanding %L is too long");
                    return Token::Error;
                }
            } else if s.chr(b'S') {
                let xlocaledir = paths::xlocaledir();
                if !s.buf_appends(&xlocaledir.to_string_lossy()) {
                    s.err("include path after expanding %S is too long");
                    return Token::Error;
                }
            } else {
                s.err(format_args!(
                    "unknown % format ({}) in include statement",
                    s.peek() as char
                ));
                return Token::Error;
            }
        } else {
            let b = s.next();
            s.buf_append(b);
        }
    }
    if !s.chr(b'"') {
        s.err("unterminated include statement");
        return Token::Error;
    }
    if !s.buf_append(0) {
        s.err("include path is too long");
        return Token::Error;
    }

    Token::IncludeString(String::from_utf8_lossy(trim_nul(s.buf())).into_owned())
}

/// The scratch buffer is NUL-terminated C style so that overflow is
/// detected uniformly; strip that terminator to get the value.
fn trim_nul(buf: &[u8]) -> &[u8] {
    &buf[..buf.len() - 1]
}
