// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user session registry: transient message-ref bookkeeping.
//!
//! The registry remembers, per user, the refs of the last tracked exchange
//! (for `/delete`) and a bounded window of every message the bot has seen
//! or posted this process lifetime (for `/clear`). It is a best-effort
//! cache scoped to the running process: losing it degrades the transport
//! cleanup commands, never the durable history.

use std::collections::VecDeque;

use confab_core::MessageRef;
use dashmap::DashMap;

/// Most message refs remembered per user for `/clear` sweeps.
/// Telegram cannot enumerate chat history, so this window is the whole
/// transport retention surface.
const RETENTION_WINDOW: usize = 256;

/// Transient per-user pointer state.
#[derive(Debug, Default)]
struct SessionEntry {
    /// Ref of the user message that started the last tracked exchange.
    last_user_ref: Option<MessageRef>,
    /// Ref of the bot reply that completed it.
    last_bot_ref: Option<MessageRef>,
    /// Bounded ring of every ref seen or posted, oldest first.
    window: VecDeque<MessageRef>,
}

impl SessionEntry {
    fn push_window(&mut self, message: MessageRef) {
        if self.window.len() == RETENTION_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(message);
    }
}

/// Process-lifetime registry of per-user message pointers.
///
/// Entry mutation is atomic per user via DashMap shard locking; there is
/// no global lock, so users never contend with each other.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completed exchange, overwriting both pointers and adding
    /// the refs to the retention window. Last write wins.
    pub fn record_exchange(&self, user_id: &str, user_ref: MessageRef, bot_ref: MessageRef) {
        let mut entry = self.entries.entry(user_id.to_string()).or_default();
        entry.push_window(user_ref.clone());
        entry.push_window(bot_ref.clone());
        entry.last_user_ref = Some(user_ref);
        entry.last_bot_ref = Some(bot_ref);
    }

    /// Window-only record for messages that are not a tracked exchange
    /// (denials, command confirmations), so `/clear` can sweep them too.
    pub fn remember(&self, user_id: &str, message: MessageRef) {
        let mut entry = self.entries.entry(user_id.to_string()).or_default();
        entry.push_window(message);
    }

    /// The last tracked exchange's refs, if any survive in this process.
    pub fn last_exchange(&self, user_id: &str) -> Option<(Option<MessageRef>, Option<MessageRef>)> {
        let entry = self.entries.get(user_id)?;
        if entry.last_user_ref.is_none() && entry.last_bot_ref.is_none() {
            return None;
        }
        Some((entry.last_user_ref.clone(), entry.last_bot_ref.clone()))
    }

    /// Drops the last-exchange pointers so a repeated `/delete` is a no-op.
    /// The retention window is kept for later `/clear` sweeps.
    pub fn clear_exchange(&self, user_id: &str) {
        if let Some(mut entry) = self.entries.get_mut(user_id) {
            entry.last_user_ref = None;
            entry.last_bot_ref = None;
        }
    }

    /// Takes and empties the user's retention window, dropping the whole
    /// entry. Used by `/clear`.
    pub fn drain_window(&self, user_id: &str) -> Vec<MessageRef> {
        match self.entries.remove(user_id) {
            Some((_, entry)) => entry.window.into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Number of users with live entries, for observability.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
