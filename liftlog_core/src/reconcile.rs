//! Auto-save identity reconciliation.
//!
//! The backend assigns log entry ids, so after the first auto-save of a
//! session the client has to find its own entry in the returned history
//! before it can send updates. Matching is best effort, in priority order:
//!
//! 1. the client-generated submission id
//! 2. the last entry with the same day name and date
//! 3. the last entry in the log
//!
//! Responses to overlapping saves are ordered with [`SaveSequencer`] so a
//! slow, older response never overwrites what a newer one established.

use crate::{ProgramDayProgress, ProgramHistory};
use chrono::NaiveDate;

/// Which rule picked the entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchedBy {
    SubmissionId,
    DayAndDate,
    LastEntry,
}

/// Locate the entry a save just created or updated
pub fn find_saved_entry<'a>(
    history: &'a ProgramHistory,
    day_name: &str,
    date: NaiveDate,
    submission_id: Option<&str>,
) -> Option<(&'a ProgramDayProgress, MatchedBy)> {
    let logs = &history.progress.day_logs;

    submission_id
        .and_then(|sid| {
            logs.iter()
                .rev()
                .find(|log| log.submission_id.as_deref() == Some(sid))
        })
        .map(|log| (log, MatchedBy::SubmissionId))
        .or_else(|| {
            logs.iter()
                .rev()
                .find(|log| log.day_name == day_name && log.date == date)
                .map(|log| (log, MatchedBy::DayAndDate))
        })
        .or_else(|| logs.last().map(|log| (log, MatchedBy::LastEntry)))
}

/// Server id of the entry a save just created, if it can be determined
///
/// `None` means identity is unknown; the next save goes out as a new entry.
pub fn resolve_session_identity(
    history: &ProgramHistory,
    day_name: &str,
    date: NaiveDate,
    submission_id: Option<&str>,
) -> Option<String> {
    let Some((entry, matched_by)) = find_saved_entry(history, day_name, date, submission_id) else {
        tracing::warn!(
            "Saved history has no day logs; identity of '{}' on {} unknown",
            day_name,
            date
        );
        return None;
    };

    if matched_by == MatchedBy::LastEntry {
        tracing::warn!(
            "No entry matched '{}' on {}; assuming the last log entry",
            day_name,
            date
        );
    }

    match entry.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => {
            tracing::debug!("Resolved session id {} via {:?}", id, matched_by);
            Some(id.to_string())
        }
        None => {
            tracing::warn!("Matched log entry via {:?} carries no id", matched_by);
            None
        }
    }
}

/// Position of a save request in the session's save order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveTicket(u64);

impl SaveTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Per-session ordering of save requests and their responses
#[derive(Clone, Debug, Default)]
pub struct SaveSequencer {
    issued: u64,
    applied: u64,
}

impl SaveSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a request about to be sent
    pub fn issue(&mut self) -> SaveTicket {
        self.issued += 1;
        SaveTicket(self.issued)
    }

    /// Whether a response may be applied; records it if so
    ///
    /// A response whose ticket is not newer than the last applied one is stale.
    pub fn accept(&mut self, ticket: SaveTicket) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(
                "Discarding stale save response #{} (already applied #{})",
                ticket.0,
                self.applied
            );
            return false;
        }
        self.applied = ticket.0;
        true
    }

    pub fn last_applied(&self) -> Option<SaveTicket> {
        (self.applied > 0).then_some(SaveTicket(self.applied))
    }
}
