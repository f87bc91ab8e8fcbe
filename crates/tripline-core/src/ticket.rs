//! Support-ticket aggregation.
//!
//! Folds flat ordered content lines into per-ticket conversation threads.
//! The server is the source of truth for thread content: a ticket's lines
//! are always replaced wholesale by the latest snapshot for that ticket,
//! never incrementally patched. Aggregation never loses content - a line
//! that does not match the attribution convention is kept verbatim as a
//! system-authored line.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tripline_proto::{SupportUpdate, ThreadRecord};

/// One content line in a ticket thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketLine {
    /// Sender recovered from the `"senderId: text"` convention. `None`
    /// for system-authored lines (e.g. "ticket created for X").
    pub sender: Option<String>,
    /// Line text, attribution prefix stripped when one was recovered.
    pub text: String,
}

impl TicketLine {
    /// Parse one flat line with the legacy `"senderId: text"` convention.
    ///
    /// The prefix counts as a sender id only when it is non-empty and
    /// contains no whitespace; anything else is retained verbatim rather
    /// than misattributed or discarded.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        if let Some((prefix, rest)) = line.split_once(':') {
            let sender = prefix.trim();
            if !sender.is_empty() && !sender.contains(char::is_whitespace) {
                return Self { sender: Some(sender.to_owned()), text: rest.trim_start().to_owned() };
            }
        }
        Self { sender: None, text: line.to_owned() }
    }
}

/// Derived, non-persisted conversation thread for one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Thread key shared by all pushes for this conversation.
    pub ticket_id: String,
    /// Ordered content lines, latest snapshot wins wholesale.
    pub lines: Vec<TicketLine>,
}

impl Ticket {
    /// Build a ticket from a flat line snapshot.
    #[must_use]
    pub fn from_lines(ticket_id: impl Into<String>, lines: &[String]) -> Self {
        Self {
            ticket_id: ticket_id.into(),
            lines: lines.iter().map(|l| TicketLine::parse(l)).collect(),
        }
    }
}

/// In-memory map of ticket threads, rebuilt from server snapshots.
#[derive(Debug, Clone, Default)]
pub struct TicketBoard {
    tickets: HashMap<String, Ticket>,
}

impl TicketBoard {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one push snapshot: the ticket's content is replaced wholesale
    /// by the snapshot's lines.
    pub fn apply_update(&mut self, update: &SupportUpdate) {
        self.tickets.insert(
            update.ticket_id.clone(),
            Ticket::from_lines(update.ticket_id.clone(), &update.lines),
        );
    }

    /// Rebuild the whole board from the authoritative per-user thread
    /// snapshot fetched on reload. Records without a usable thread key
    /// are skipped; everything previously held is dropped.
    pub fn replace_all(&mut self, records: &[ThreadRecord]) {
        self.tickets.clear();
        for record in records {
            if let Some(key) = record.ticket_key() {
                self.tickets.insert(key.to_owned(), Ticket::from_lines(key, record.lines()));
            }
        }
    }

    /// Drop all threads. Happens alongside a full store clear.
    pub fn clear(&mut self) {
        self.tickets.clear();
    }

    /// Look up one thread.
    #[must_use]
    pub fn get(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.get(ticket_id)
    }

    /// All threads, ordered by ticket id for stable presentation.
    #[must_use]
    pub fn tickets(&self) -> Vec<&Ticket> {
        let mut all: Vec<&Ticket> = self.tickets.values().collect();
        all.sort_by(|a, b| a.ticket_id.cmp(&b.ticket_id));
        all
    }

    /// Number of threads on the board.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// True when no threads are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
