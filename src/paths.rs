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

//! Where Compose files live.
//!
//! Discovery follows the conventions of libX11: an explicit
//! `$XCOMPOSEFILE`, then `$HOME/.XCompose`, then the system table for the
//! locale under the X locale directory, found through its `compose.dir`
//! index.

use std::fs;
use std::path::PathBuf;

use crate::util::secure_getenv;

const DEFAULT_XLOCALEDIR: &str = "/usr/share/X11/locale";

/// Resolve the locale a table is built for. An empty locale means "take
/// it from the environment", in the usual precedence order.
pub(crate) fn resolve_locale(locale: &str) -> String {
    if !locale.is_empty() {
        return locale.to_owned();
    }
    for var in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Some(value) = secure_getenv(var) {
            if !value.is_empty() {
                return value;
            }
        }
    }
    "C".to_owned()
}

/// The `$XCOMPOSEFILE` override, if set.
pub(crate) fn xcomposefile_path() -> Option<PathBuf> {
    secure_getenv("XCOMPOSEFILE").map(PathBuf::from)
}

/// `$HOME/.XCompose`, if `$HOME` is set.
pub(crate) fn home_xcompose_path() -> Option<PathBuf> {
    let home = secure_getenv("HOME")?;
    Some(PathBuf::from(home).join(".XCompose"))
}

/// The X locale directory, honoring the `$XLOCALEDIR` override.
pub(crate) fn xlocaledir() -> PathBuf {
    secure_getenv("XLOCALEDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_XLOCALEDIR))
}

/// The system Compose file for `locale`, per the `compose.dir` index.
pub(crate) fn locale_compose_file_path(locale: &str) -> Option<PathBuf> {
    let base = xlocaledir();
    let index = match fs::read_to_string(base.join("compose.dir")) {
        Ok(index) => index,
        Err(err) => {
            tracing::debug!(
                "couldn't read compose.dir in {}: {}",
                base.display(),
                err
            );
            return None;
        }
    };
    let relative = lookup_compose_dir(&index, locale)?;
    Some(base.join(relative))
}

/// Find `locale`'s Compose file in the `compose.dir` index.
///
/// Lines look like
///
/// ```text
/// en_US.UTF-8/Compose:        en_US.UTF-8
/// ```
///
/// with the left column a path relative to the locale directory (the
/// trailing colon is optional in the wild) and the right column the
/// locale name. An exact match wins; a case-insensitive match is accepted
/// as a fallback, like libX11 does.
fn lookup_compose_dir<'a>(index: &'a str, locale: &str) -> Option<&'a str> {
    let mut case_insensitive_match = None;

    for line in index.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut columns = line.split_whitespace();
        let (Some(left), Some(right)) = (columns.next(), columns.next()) else {
            continue;
        };
        let path = left.strip_suffix(':').unwrap_or(left);
        if right == locale {
            return Some(path);
        }
        if case_insensitive_match.is_none() && right.eq_ignore_ascii_case(locale) {
            case_insensitive_match = Some(path);
        }
    }

    case_insensitive_match
}
