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

//! A byte cursor over Compose file text.
//!
//! Compose files are byte oriented: string literals may contain arbitrary
//! escapes and the only structure the scanner needs is lines and columns
//! for diagnostics. UTF-8 validity is checked where it matters, on cooked
//! string literals, not here.

use std::fmt;

/// Capacity of the token scratch buffer. No token a Compose file can
/// reasonably contain comes close; overflow is reported, not grown past.
const SCRATCH_CAPACITY: usize = 1024;

pub(crate) struct Scanner<'input> {
    input: &'input [u8],
    pos: usize,
    /// 1-based position of the cursor.
    line: u64,
    column: u64,
    /// Position of the start of the token being lexed, for diagnostics.
    token_line: u64,
    token_column: u64,
    /// Scratch storage for the token being cooked (keysym name, string
    /// literal bytes, expanded include path).
    buf: [u8; SCRATCH_CAPACITY],
    buf_pos: usize,
    file_name: String,
}

impl<'input> Scanner<'input> {
    pub(crate) fn new(input: &'input [u8], file_name: &str) -> Scanner<'input> {
        Scanner {
            input,
            pos: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
            buf: [0; SCRATCH_CAPACITY],
            buf_pos: 0,
            file_name: file_name.to_owned(),
        }
    }

    /// The byte at the cursor, or 0 at end of input.
    pub(crate) fn peek(&self) -> u8 {
        if self.eof() {
            return 0;
        }
        self.input[self.pos]
    }

    /// Consume and return the byte at the cursor (0 at end of input).
    pub(crate) fn next(&mut self) -> u8 {
        if self.eof() {
            return 0;
        }
        if self.eol() {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        let b = self.input[self.pos];
        self.pos += 1;
        b
    }

    /// Consume `b` if it is the next byte.
    pub(crate) fn chr(&mut self, b: u8) -> bool {
        if self.peek() != b {
            return false;
        }
        self.next();
        true
    }

    pub(crate) fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// At a line terminator (or the end of input).
    pub(crate) fn eol(&self) -> bool {
        self.peek() == b'\n' || self.eof()
    }

    /// Advance to the next newline without consuming it.
    pub(crate) fn skip_to_eol(&mut self) {
        let rest = &self.input[self.pos.min(self.input.len())..];
        let skipped = memchr::memchr(b'\n', rest).unwrap_or(rest.len());
        self.pos += skipped;
        self.column += skipped as u64;
    }

    /// Mark the start of a new token and reset the scratch buffer.
    pub(crate) fn start_token(&mut self) {
        self.token_line = self.line;
        self.token_column = self.column;
        self.buf_pos = 0;
    }

    /// Append a byte to the scratch buffer; false once it is full.
    pub(crate) fn buf_append(&mut self, b: u8) -> bool {
        if self.buf_pos + 1 >= SCRATCH_CAPACITY {
            return false;
        }
        self.buf[self.buf_pos] = b;
        self.buf_pos += 1;
        true
    }

    /// Append a whole string; false once the buffer is full.
    pub(crate) fn buf_appends(&mut self, s: &str) -> bool {
        for &b in s.as_bytes() {
            if !self.buf_append(b) {
                return false;
            }
        }
        true
    }

    /// The bytes cooked so far for the current token.
    pub(crate) fn buf(&self) -> &[u8] {
        &self.buf[..self.buf_pos]
    }

    /// Decode up to three octal digits. The value wraps at 8 bits, as it
    /// always has in Compose parsers.
    pub(crate) fn oct(&mut self) -> Option<u8> {
        let mut out: u8 = 0;
        let mut digits = 0;
        while (b'0'..=b'7').contains(&self.peek()) && digits < 3 {
            out = out.wrapping_mul(8).wrapping_add(self.next() - b'0');
            digits += 1;
        }
        (digits > 0).then_some(out)
    }

    /// Decode up to two hex digits.
    pub(crate) fn hex(&mut self) -> Option<u8> {
        let mut out: u8 = 0;
        let mut digits = 0;
        while self.peek().is_ascii_hexdigit() && digits < 2 {
            let b = self.next();
            let value = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                _ => b - b'A' + 10,
            };
            out = out * 16 + value;
            digits += 1;
        }
        (digits > 0).then_some(out)
    }

    /// Report a fatal problem at the current token, `file:line:column`.
    pub(crate) fn err(&self, msg: impl fmt::Display) {
        tracing::error!(
            file = %self.file_name,
            line = self.token_line,
            column = self.token_column,
            "{msg}"
        );
    }

    /// Report a recoverable problem at the current token.
    pub(crate) fn warn(&self, msg: impl fmt::Display) {
        tracing::warn!(
            file = %self.file_name,
            line = self.token_line,
            column = self.token_column,
            "{msg}"
        );
    }
}

/// The horizontal and vertical whitespace the grammar skips.
pub(crate) fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r')
}
