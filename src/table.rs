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

//! The compiled compose table.

use std::fs::File;
use std::path::Path;

use crate::error::Error;
use crate::keysym::{Keysym, NO_SYMBOL};
use crate::parser::{self, Production};
use crate::paths;
use crate::scanner::Scanner;
use crate::util::FileMap;

/// The Compose file format. Only the textual v1 format has ever existed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    TextV1,
}

/// Flags for table compilation. No flags are defined yet; anything other
/// than [`CompileFlags::NONE`] is rejected so future flags stay available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileFlags(pub u32);

impl CompileFlags {
    pub const NONE: CompileFlags = CompileFlags(0);
}

/// One trie node.
///
/// The trie is stored as a single array, linked by index on two axes:
/// `next` chains siblings that share a parent, `successor` points at the
/// first node of the following sequence position. Index 0 is the root
/// sentinel, whose `next` chain is the top level of the trie; 0 therefore
/// doubles as "none" for both links. A node with an output (`utf8` arena
/// offset or `ks` keysym) is a terminal, and terminals never have
/// successors: no accepted sequence is a prefix of another.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Node {
    pub(crate) keysym: Keysym,
    pub(crate) next: u32,
    pub(crate) successor: u32,
    pub(crate) utf8: u32,
    pub(crate) ks: Keysym,
}

/// A compiled set of compose sequences.
///
/// Tables are immutable once built and safe to share; feeding happens
/// through a per-session [`ComposeState`](crate::ComposeState), any number
/// of which can walk one shared table.
pub struct ComposeTable {
    locale: String,
    format: Format,
    tree: Vec<Node>,
    /// Byte arena of NUL-terminated UTF-8 strings. Byte 0 is a reserved
    /// NUL so that offset 0 means "no string".
    utf8: Vec<u8>,
}

impl ComposeTable {
    fn new(locale: &str, format: Format) -> ComposeTable {
        ComposeTable {
            locale: paths::resolve_locale(locale),
            format,
            tree: vec![Node {
                keysym: NO_SYMBOL,
                next: 0,
                successor: 0,
                utf8: 0,
                ks: NO_SYMBOL,
            }],
            utf8: vec![0],
        }
    }

    /// Compile a table from an already-open Compose file.
    ///
    /// The whole file is read regardless of the current read position.
    pub fn from_file(
        file: &File,
        locale: &str,
        format: Format,
        flags: CompileFlags,
    ) -> Result<ComposeTable, Error> {
        check_flags(flags)?;

        const FILE_NAME: &str = "(unknown file)";
        let map = map_file(file, FILE_NAME.as_ref())?;
        let mut table = ComposeTable::new(locale, format);
        let mut scanner = Scanner::new(&map, FILE_NAME);
        if !parser::parse(&mut table, &mut scanner, 0) {
            return Err(Error::Parse {
                file: FILE_NAME.to_owned(),
            });
        }
        Ok(table)
    }

    /// Compile a table from Compose source text in memory.
    pub fn from_buffer(
        buffer: &[u8],
        locale: &str,
        format: Format,
        flags: CompileFlags,
    ) -> Result<ComposeTable, Error> {
        check_flags(flags)?;

        const FILE_NAME: &str = "(input string)";
        let mut table = ComposeTable::new(locale, format);
        let mut scanner = Scanner::new(buffer, FILE_NAME);
        if !parser::parse(&mut table, &mut scanner, 0) {
            return Err(Error::Parse {
                file: FILE_NAME.to_owned(),
            });
        }
        Ok(table)
    }

    /// Compile the table a user with this locale would expect.
    ///
    /// Tries `$XCOMPOSEFILE`, then `$HOME/.XCompose`, then the system
    /// table for the locale; the first file that opens wins. An empty
    /// `locale` is resolved from `LC_ALL`/`LC_CTYPE`/`LANG`.
    pub fn from_locale(locale: &str, flags: CompileFlags) -> Result<ComposeTable, Error> {
        check_flags(flags)?;

        let mut table = ComposeTable::new(locale, Format::TextV1);

        let candidates = [
            paths::xcomposefile_path(),
            paths::home_xcompose_path(),
            paths::locale_compose_file_path(&table.locale),
        ];
        let mut found = None;
        for path in candidates.into_iter().flatten() {
            if let Ok(file) = File::open(&path) {
                found = Some((file, path));
                break;
            }
        }
        let Some((file, path)) = found else {
            tracing::error!(
                "couldn't find a Compose file for locale \"{}\"",
                table.locale
            );
            return Err(Error::NoComposeFile {
                locale: table.locale,
            });
        };

        let map = map_file(&file, &path)?;
        let file_name = path.display().to_string();
        let mut scanner = Scanner::new(&map, &file_name);
        if !parser::parse(&mut table, &mut scanner, 0) {
            return Err(Error::Parse { file: file_name });
        }

        tracing::debug!(
            "created compose table for locale {} from {}",
            table.locale,
            file_name
        );
        Ok(table)
    }

    /// The locale the table was built for, after resolution.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// The format the table was compiled from.
    pub fn format(&self) -> Format {
        self.format
    }

    pub(crate) fn node(&self, index: u32) -> &Node {
        &self.tree[index as usize]
    }

    /// The NUL-terminated string at `offset`, as validated UTF-8.
    /// Offset 0 is the empty string.
    pub(crate) fn utf8_at(&self, offset: u32) -> &str {
        let bytes = &self.utf8[offset as usize..];
        let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).expect("arena strings were validated at insertion")
    }

    /// Insert one parsed production, resolving prefix conflicts.
    ///
    /// A new sequence that extends an existing terminal overrides it (the
    /// shorter sequence's output is discarded with a warning); a new
    /// sequence that stops on a node which already has continuations, or
    /// lands on an existing terminal, is dropped with a warning.
    pub(crate) fn insert(&mut self, s: &Scanner, production: &Production) {
        let mut curr = 0usize;

        for (i, &keysym) in production.lhs.iter().enumerate() {
            // Find this keysym in the sibling chain, extending the chain
            // when it was never seen at this position. The root's chain is
            // the top level, so the first iteration starts there.
            while self.tree[curr].keysym != keysym {
                if self.tree[curr].next == 0 {
                    let next = self.add_node(keysym);
                    self.tree[curr].next = next;
                }
                curr = self.tree[curr].next as usize;
            }

            if i + 1 == production.lhs.len() {
                break;
            }

            if self.tree[curr].successor == 0 {
                if self.tree[curr].utf8 != 0 || self.tree[curr].ks != NO_SYMBOL {
                    s.warn(
                        "a sequence already exists which is a prefix of this \
                         sequence; overriding",
                    );
                    self.tree[curr].utf8 = 0;
                    self.tree[curr].ks = NO_SYMBOL;
                }
                let successor = self.add_node(production.lhs[i + 1]);
                self.tree[curr].successor = successor;
            }
            curr = self.tree[curr].successor as usize;
        }

        if self.tree[curr].successor != 0 {
            s.warn("the compose sequence is a prefix of another; skipping line");
            return;
        }
        if self.tree[curr].utf8 != 0 || self.tree[curr].ks != NO_SYMBOL {
            s.warn("the compose sequence already exists; skipping line");
            return;
        }

        if let Some(string) = &production.string {
            self.tree[curr].utf8 = self.utf8.len() as u32;
            self.utf8.extend_from_slice(string.as_bytes());
            self.utf8.push(0);
        }
        if let Some(keysym) = production.keysym {
            self.tree[curr].ks = keysym;
        }
    }

    fn add_node(&mut self, keysym: Keysym) -> u32 {
        self.tree.push(Node {
            keysym,
            next: 0,
            successor: 0,
            utf8: 0,
            ks: NO_SYMBOL,
        });
        (self.tree.len() - 1) as u32
    }

    #[cfg(test)]
    pub(crate) fn nodes(&self) -> &[Node] {
        &self.tree
    }

    #[cfg(test)]
    pub(crate) fn arena(&self) -> &[u8] {
        &self.utf8
    }
}

fn check_flags(flags: CompileFlags) -> Result<(), Error> {
    if flags != CompileFlags::NONE {
        tracing::error!("unrecognized flags: {:#x}", flags.0);
        return Err(Error::UnrecognizedFlags(flags.0));
    }
    Ok(())
}

fn map_file(file: &File, path: &Path) -> Result<FileMap, Error> {
    FileMap::new(file).map_err(|source| {
        tracing::error!("couldn't read Compose file {}: {}", path.display(), source);
        Error::Io {
            path: path.to_owned(),
            source,
        }
    })
}
