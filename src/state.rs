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

//! The per-session compose matcher.

use std::sync::Arc;

use crate::error::Error;
use crate::keysym::{Keysym, NO_SYMBOL};
use crate::table::ComposeTable;

/// Flags for matcher creation. None are defined yet; anything other than
/// [`StateFlags::NONE`] is rejected so future flags stay available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateFlags(pub u32);

impl StateFlags {
    pub const NONE: StateFlags = StateFlags(0);
}

/// What a matcher is currently doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The last keysym did not (re)start a sequence.
    Nothing,
    /// Mid-sequence; more keysyms are needed.
    Composing,
    /// A sequence just completed; the results are available from
    /// [`ComposeState::utf8`] and [`ComposeState::one_sym`].
    Composed,
    /// The keysym broke off a sequence in progress.
    Cancelled,
}

/// A matcher session over a compiled [`ComposeTable`].
///
/// Feed it one keysym per key press and inspect [`status`] afterwards.
/// The state holds a strong reference to its table; tables are freely
/// shared between sessions, but a single session is a mutable object for
/// one logical owner (wrap it in a lock if producers must share it).
///
/// A completed or cancelled sequence does not reset automatically: the
/// next [`feed`] starts matching from the top again, so no key press is
/// lost. Call [`reset`] to abandon whatever is in progress, for example
/// when focus changes.
///
/// [`status`]: ComposeState::status
/// [`feed`]: ComposeState::feed
/// [`reset`]: ComposeState::reset
pub struct ComposeState {
    table: Arc<ComposeTable>,
    /// Node reached before the most recent feed, to tell "nothing ever
    /// matched" apart from "a sequence just broke".
    prev_context: u32,
    /// Node reached by the sequence so far; 0 when not composing.
    context: u32,
}

impl ComposeState {
    /// Create a fresh session over `table`.
    pub fn new(table: Arc<ComposeTable>, flags: StateFlags) -> Result<ComposeState, Error> {
        if flags != StateFlags::NONE {
            tracing::error!("unrecognized flags: {:#x}", flags.0);
            return Err(Error::UnrecognizedFlags(flags.0));
        }
        Ok(ComposeState {
            table,
            prev_context: 0,
            context: 0,
        })
    }

    /// The table this session walks.
    pub fn table(&self) -> &Arc<ComposeTable> {
        &self.table
    }

    /// Advance the session by one keysym.
    ///
    /// Modifier keysyms are ignored entirely, so `<dead_tilde> <A>`
    /// composes even though reaching `A` involves pressing Shift.
    pub fn feed(&mut self, keysym: Keysym) {
        // Swallowing modifiers outright is questionable (a sequence can
        // never match one), but toolkits rely on it; revisit together
        // with Keysym::is_modifier if that ever changes.
        if keysym.is_modifier() {
            return;
        }

        // Step to the children of the current node and look for the
        // keysym among them. From the root (context 0), and equally from
        // a terminal (no successor), this lands back on node 0, whose
        // `next` chain is the top level of the trie, so a finished or
        // never-started session simply matches from the top.
        let mut context = self.table.node(self.context).successor;
        let mut node = self.table.node(context);
        while node.keysym != keysym && node.next != 0 {
            context = node.next;
            node = self.table.node(context);
        }
        if node.keysym != keysym {
            context = 0;
        }

        self.prev_context = self.context;
        self.context = context;
    }

    /// Abandon any sequence in progress.
    pub fn reset(&mut self) {
        self.prev_context = 0;
        self.context = 0;
    }

    /// The session's status after the last feed.
    pub fn status(&self) -> Status {
        let prev_node = self.table.node(self.prev_context);
        let node = self.table.node(self.context);

        if self.context == 0 && prev_node.successor != 0 {
            return Status::Cancelled;
        }
        if self.context == 0 {
            return Status::Nothing;
        }
        if node.successor != 0 {
            return Status::Composing;
        }
        Status::Composed
    }

    /// The string produced by the sequence, empty unless [`Status::Composed`].
    ///
    /// A terminal that carries only a keysym produces that keysym's UTF-8
    /// encoding, when it has one.
    pub fn utf8(&self) -> String {
        let node = self.table.node(self.context);

        if node.utf8 == 0 && node.ks != NO_SYMBOL {
            return node.ks.to_utf8().unwrap_or_default();
        }

        self.table.utf8_at(node.utf8).to_owned()
    }

    /// The keysym produced by the sequence, [`NO_SYMBOL`] if none.
    pub fn one_sym(&self) -> Keysym {
        self.table.node(self.context).ks
    }
}
