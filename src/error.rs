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

//! Errors reported while building a compose table.

use std::io;
use std::path::PathBuf;

/// The reasons building a [`ComposeTable`] can fail.
///
/// Per-line problems in a Compose file (bad escapes, unknown keysyms,
/// conflicting sequences) are not errors; they are logged through `tracing`
/// and the offending line is skipped. Only unusable arguments, I/O failures
/// and files too broken to recover from surface here.
///
/// [`ComposeTable`]: crate::ComposeTable
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A flags argument carried bits this version does not know about.
    #[error("unrecognized flags: {0:#x}")]
    UnrecognizedFlags(u32),

    /// The Compose file could not be opened or read.
    #[error("couldn't read Compose file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file accumulated too many unrecoverable syntax errors.
    ///
    /// The individual diagnostics, with line and column, were already
    /// emitted as `tracing` events while parsing.
    #[error("failed to parse Compose file {file}")]
    Parse { file: String },

    /// None of `$XCOMPOSEFILE`, `$HOME/.XCompose` or the locale's system
    /// Compose file could be opened.
    #[error("couldn't find a Compose file for locale {locale:?}")]
    NoComposeFile { locale: String },
}
