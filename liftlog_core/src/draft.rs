//! Crash-recovery drafts for sessions in progress.
//!
//! Each (program, day) pair has at most one draft, stored as a JSON file in
//! the drafts directory. Writes are atomic and locked so a crash or a
//! second editor never leaves a half-written draft behind.

use crate::types::session_date;
use crate::{Error, ExerciseProgress, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Editor mode a draft was written in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    New,
    Edit,
}

/// Snapshot of an unfinished session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDraft {
    pub exercises: Vec<ExerciseProgress>,
    #[serde(with = "session_date")]
    pub session_date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub mode: DraftMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
}

/// Directory of session drafts
#[derive(Clone, Debug)]
pub struct DraftStore {
    dir: PathBuf,
    max_age: Duration,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>, max_age_hours: i64) -> Self {
        Self {
            dir: dir.into(),
            max_age: Duration::hours(max_age_hours),
        }
    }

    /// Storage key of the draft for a program day
    pub fn key(program_id: &str, day_name: &str) -> String {
        format!("session_progress_v2_{}_{}", program_id, day_name)
    }

    /// File holding the draft for a program day
    ///
    /// Anything outside `[A-Za-z0-9-]` is hex-escaped so that day names
    /// containing spaces or slashes map to distinct, valid file names.
    pub fn path_for(&self, program_id: &str, day_name: &str) -> PathBuf {
        let mut name = String::new();
        for byte in Self::key(program_id, day_name).bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(byte as char);
            } else {
                name.push_str(&format!("_{:02x}", byte));
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    /// Load a draft with shared locking
    ///
    /// Returns `None` if there is no draft. An unreadable or corrupted draft
    /// is logged and treated as absent.
    pub fn load(&self, program_id: &str, day_name: &str) -> Result<Option<SessionDraft>> {
        let path = self.path_for(program_id, day_name);
        if !path.exists() {
            return Ok(None);
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open draft {:?}: {}. Ignoring draft.", path, e);
                return Ok(None);
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock draft {:?}: {}. Ignoring draft.", path, e);
            return Ok(None);
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read draft {:?}: {}. Ignoring draft.", path, e);
            return Ok(None);
        }

        file.unlock()?;

        match serde_json::from_str::<SessionDraft>(&contents) {
            Ok(draft) => {
                tracing::debug!("Loaded draft from {:?}", path);
                Ok(Some(draft))
            }
            Err(e) => {
                tracing::warn!("Failed to parse draft {:?}: {}. Ignoring draft.", path, e);
                Ok(None)
            }
        }
    }

    /// Draft worth resuming at `now`
    ///
    /// Only drafts younger than the configured age with at least one
    /// exercise qualify. Recovered sets always come back unchecked.
    pub fn recover(
        &self,
        program_id: &str,
        day_name: &str,
        now: DateTime<Utc>,
    ) -> Option<SessionDraft> {
        let mut draft = match self.load(program_id, day_name) {
            Ok(Some(draft)) => draft,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Draft recovery for '{}' failed: {}", day_name, e);
                return None;
            }
        };

        if now - draft.timestamp >= self.max_age || draft.exercises.is_empty() {
            tracing::debug!("Draft for '{}' is stale or empty, not recovering", day_name);
            return None;
        }

        for set in draft.exercises.iter_mut().flat_map(|ex| ex.sets.iter_mut()) {
            set.completed = false;
        }
        tracing::info!("Recovering session draft for '{}'", day_name);
        Some(draft)
    }

    /// Save a draft with exclusive locking
    ///
    /// Atomically writes the draft by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the existing draft
    pub fn save(&self, program_id: &str, day_name: &str, draft: &SessionDraft) -> Result<()> {
        let path = self.path_for(program_id, day_name);
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(draft)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved draft to {:?}", path);
        Ok(())
    }

    /// Remove the draft for a program day, if any
    pub fn clear(&self, program_id: &str, day_name: &str) -> Result<()> {
        let path = self.path_for(program_id, day_name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Cleared draft {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
