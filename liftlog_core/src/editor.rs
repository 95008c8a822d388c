//! In-memory state of a session being logged or edited.
//!
//! The editor owns the exercise list for one session. Edits are applied
//! locally and synchronously; only saves talk to the backend. Saves are
//! split into a `prepare_*` step that snapshots the payload and an
//! `apply_*`/`complete_*` step that folds the backend's answer back in, so
//! a caller may run the request elsewhere. [`SessionEditor::auto_save`] and
//! [`SessionEditor::commit`] do both steps in place.

use crate::backend::{LogSessionPayload, SessionBackend};
use crate::draft::{DraftMode, DraftStore, SessionDraft};
use crate::prefill::{self, PrefillDefaults};
use crate::reconcile::{resolve_session_identity, SaveSequencer, SaveTicket};
use crate::sets::{self, DropField, SetField};
use crate::summary::{session_volume, SessionProgress};
use crate::{Error, ExerciseProgress, ProgramDayProgress, ProgramHistory, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Whether the editor logs a new session or edits a logged one
#[derive(Clone, Debug, PartialEq)]
pub enum EditorMode {
    New,
    Edit(ProgramDayProgress),
}

/// A save request ready to be sent
#[derive(Clone, Debug)]
pub struct PendingSave {
    ticket: SaveTicket,
    revision: u64,
    pub payload: LogSessionPayload,
}

impl PendingSave {
    pub fn ticket(&self) -> SaveTicket {
        self.ticket
    }
}

/// What an auto-save attempt did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AutoSaveOutcome {
    /// Nothing to save (no changes, no exercises, or no program id)
    Skipped,
    /// Saved; carries the session's server id if known
    Saved { session_id: Option<String> },
    /// A newer save already answered; this response was ignored
    Stale,
    /// The request failed; local state is unchanged and still dirty
    Failed,
}

/// Editable state of one training session
#[derive(Debug)]
pub struct SessionEditor {
    history: ProgramHistory,
    mode: EditorMode,
    defaults: PrefillDefaults,
    drafts: Option<DraftStore>,
    selected_day: String,
    session_date: NaiveDate,
    exercises: Vec<ExerciseProgress>,
    server_session_id: Option<String>,
    submission_id: Option<String>,
    revision: u64,
    saved_revision: u64,
    last_saved_at: Option<DateTime<Utc>>,
    committing: bool,
    committed: bool,
    sequencer: SaveSequencer,
}

impl SessionEditor {
    /// Editor for a new session dated `date`, on the program's first day
    pub fn new(history: ProgramHistory, date: NaiveDate) -> Self {
        let selected_day = history
            .program
            .days
            .first()
            .map(|d| d.name.clone())
            .unwrap_or_default();

        Self {
            history,
            mode: EditorMode::New,
            defaults: PrefillDefaults::default(),
            drafts: None,
            selected_day,
            session_date: date,
            exercises: Vec::new(),
            server_session_id: None,
            submission_id: Some(Uuid::new_v4().to_string()),
            revision: 0,
            saved_revision: 0,
            last_saved_at: None,
            committing: false,
            committed: false,
            sequencer: SaveSequencer::new(),
        }
    }

    /// Editor for changing an already logged session
    pub fn edit(history: ProgramHistory, initial: ProgramDayProgress) -> Self {
        let date = initial.date;
        Self {
            selected_day: initial.day_name.clone(),
            session_date: date,
            server_session_id: initial.id.clone(),
            submission_id: initial.submission_id.clone(),
            mode: EditorMode::Edit(initial),
            ..Self::new(history, date)
        }
    }

    pub fn with_defaults(mut self, defaults: PrefillDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_drafts(mut self, drafts: DraftStore) -> Self {
        self.drafts = Some(drafts);
        self
    }

    /// Load the initially selected day
    pub fn open(&mut self) -> Result<()> {
        let day = self.selected_day.clone();
        self.select_day(&day)
    }

    /// Switch to a day and load its exercises
    ///
    /// Source, in order: the session being edited (edit mode, same day), a
    /// fresh crash-recovery draft, then the pre-fill from history.
    pub fn select_day(&mut self, day_name: &str) -> Result<()> {
        let day = self
            .history
            .program
            .day(day_name)
            .ok_or_else(|| Error::Validation(format!("Program has no day named '{}'", day_name)))?;

        if let EditorMode::Edit(initial) = &self.mode {
            if initial.day_name == day_name {
                self.exercises = prefill::load_for_edit(day, initial, self.defaults);
                self.session_date = initial.date;
                self.server_session_id = initial.id.clone();
                self.submission_id = initial.submission_id.clone();
                self.selected_day = day_name.to_string();
                self.mark_clean();
                tracing::debug!("Loaded logged session for '{}' into editor", day_name);
                return Ok(());
            }
        }

        let exercises = prefill::prefill_day(day, &self.history.progress.day_logs, self.defaults);
        self.selected_day = day_name.to_string();

        // Any other day is a separate session with its own identity
        self.server_session_id = None;
        self.submission_id = Some(Uuid::new_v4().to_string());

        if let Some(draft) = self.recover_draft() {
            self.exercises = draft.exercises;
            self.session_date = draft.session_date;
            self.last_saved_at = Some(draft.timestamp);
            if draft.server_session_id.is_some() {
                self.server_session_id = draft.server_session_id;
            }
            if draft.submission_id.is_some() {
                self.submission_id = draft.submission_id;
            }
        } else {
            self.exercises = exercises;
        }
        self.mark_clean();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edits
    // ------------------------------------------------------------------

    pub fn update_set(&mut self, ex_index: usize, set_index: usize, field: SetField) -> Result<()> {
        let next = sets::update_set(&self.exercises, ex_index, set_index, field)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn add_set(&mut self, ex_index: usize) -> Result<()> {
        let next = sets::add_set(&self.exercises, ex_index)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn remove_set(&mut self, ex_index: usize, set_index: usize) -> Result<()> {
        let next = sets::remove_set(&self.exercises, ex_index, set_index)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn add_drop_set(&mut self, ex_index: usize, set_index: usize) -> Result<()> {
        let next = sets::add_drop_set(&self.exercises, ex_index, set_index)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn update_drop_set(
        &mut self,
        ex_index: usize,
        set_index: usize,
        drop_index: usize,
        field: DropField,
    ) -> Result<()> {
        let next = sets::update_drop_set(&self.exercises, ex_index, set_index, drop_index, field)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn remove_drop_set(&mut self, ex_index: usize, set_index: usize, drop_index: usize) -> Result<()> {
        let next = sets::remove_drop_set(&self.exercises, ex_index, set_index, drop_index)?;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn complete_all(&mut self) {
        let next = sets::complete_all(&self.exercises);
        self.replace_exercises(next);
    }

    pub fn set_exercise_notes(&mut self, ex_index: usize, notes: Option<String>) -> Result<()> {
        let len = self.exercises.len();
        let mut next = self.exercises.clone();
        next.get_mut(ex_index)
            .ok_or_else(|| Error::out_of_range("exercise", ex_index, len))?
            .notes = notes;
        self.replace_exercises(next);
        Ok(())
    }

    pub fn set_session_date(&mut self, date: NaiveDate) {
        self.session_date = date;
        self.touch();
    }

    fn replace_exercises(&mut self, next: Vec<ExerciseProgress>) {
        self.exercises = next;
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.committed = false;
        self.write_draft();
    }

    fn mark_clean(&mut self) {
        self.saved_revision = self.revision;
    }

    // ------------------------------------------------------------------
    // Auto-save
    // ------------------------------------------------------------------

    /// Snapshot an auto-save request, if there is anything to save
    pub fn prepare_auto_save(&mut self) -> Option<PendingSave> {
        if !self.is_dirty() {
            return None;
        }
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!("Skipping auto-save: {}", e);
                return None;
            }
        };

        Some(PendingSave {
            ticket: self.sequencer.issue(),
            revision: self.revision,
            payload,
        })
    }

    /// Fold an auto-save response back into the editor
    ///
    /// Failures are logged and otherwise ignored; the session stays dirty
    /// and the next auto-save retries.
    pub fn apply_auto_save(
        &mut self,
        pending: PendingSave,
        result: Result<ProgramHistory>,
    ) -> AutoSaveOutcome {
        let history = match result {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Auto-save of '{}' failed: {}", pending.payload.day_name, e);
                return AutoSaveOutcome::Failed;
            }
        };

        if !self.sequencer.accept(pending.ticket) {
            return AutoSaveOutcome::Stale;
        }

        self.absorb_saved(&pending, history);
        self.last_saved_at = Some(Utc::now());
        tracing::debug!(
            "Auto-saved '{}' (session {:?})",
            pending.payload.day_name,
            self.server_session_id
        );

        AutoSaveOutcome::Saved {
            session_id: self.server_session_id.clone(),
        }
    }

    /// Persist in-progress work without finishing the session
    pub fn auto_save<B: SessionBackend + ?Sized>(&mut self, backend: &mut B) -> AutoSaveOutcome {
        let Some(pending) = self.prepare_auto_save() else {
            return AutoSaveOutcome::Skipped;
        };
        let result = backend.auto_save_session(&pending.payload);
        self.apply_auto_save(pending, result)
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Snapshot the final session payload
    ///
    /// Fails if the session is incomplete or a commit is already in flight.
    pub fn prepare_commit(&mut self) -> Result<PendingSave> {
        if self.committing {
            return Err(Error::SaveInProgress);
        }
        let payload = self.payload()?;
        self.committing = true;

        Ok(PendingSave {
            ticket: self.sequencer.issue(),
            revision: self.revision,
            payload,
        })
    }

    /// Fold the commit response back into the editor
    ///
    /// On failure the error is returned and local state is left intact so
    /// the user can retry.
    pub fn complete_commit(
        &mut self,
        pending: PendingSave,
        result: Result<ProgramHistory>,
    ) -> Result<ProgramHistory> {
        self.committing = false;

        let history = match result {
            Ok(history) => history,
            Err(e) => {
                tracing::error!("Saving session '{}' failed: {}", pending.payload.day_name, e);
                return Err(e);
            }
        };

        if !self.sequencer.accept(pending.ticket) {
            tracing::debug!("Newer save answered before commit; commit payload still sent in full");
        }
        self.committed = true;
        self.absorb_saved(&pending, history.clone());
        self.last_saved_at = Some(Utc::now());
        self.clear_draft();

        tracing::info!(
            "Logged session '{}' on {}",
            pending.payload.day_name,
            pending.payload.date
        );
        Ok(history)
    }

    /// Finish the session and send the full payload
    pub fn commit<B: SessionBackend + ?Sized>(&mut self, backend: &mut B) -> Result<ProgramHistory> {
        let pending = self.prepare_commit()?;
        let result = backend.log_session(&pending.payload);
        self.complete_commit(pending, result)
    }

    fn absorb_saved(&mut self, pending: &PendingSave, history: ProgramHistory) {
        // A response for a session the editor has since moved away from
        // must not hand its identity to the current one
        let same_session = pending.payload.submission_id == self.submission_id;
        if pending.payload.session_id.is_none() && same_session {
            let payload = &pending.payload;
            match resolve_session_identity(
                &history,
                &payload.day_name,
                payload.date,
                payload.submission_id.as_deref(),
            ) {
                Some(id) => self.server_session_id = Some(id),
                None => tracing::warn!("Session identity unknown; next save creates a new entry"),
            }
        }
        if same_session && pending.revision > self.saved_revision {
            self.saved_revision = pending.revision;
        }
        self.history = history;
        if !self.committed {
            self.write_draft();
        }
    }

    fn payload(&self) -> Result<LogSessionPayload> {
        let program_id = self
            .program_id()
            .ok_or_else(|| Error::Validation("Program has no id".into()))?;
        if self.selected_day.is_empty() {
            return Err(Error::Validation("No day selected".into()));
        }
        if self.exercises.is_empty() {
            return Err(Error::Validation(format!(
                "Session for '{}' has no exercises",
                self.selected_day
            )));
        }

        Ok(LogSessionPayload {
            program_id: program_id.to_string(),
            day_name: self.selected_day.clone(),
            date: self.session_date,
            exercises: self.exercises.clone(),
            session_id: self.server_session_id.clone(),
            submission_id: self.submission_id.clone(),
            notes: None,
        })
    }

    // ------------------------------------------------------------------
    // Drafts
    // ------------------------------------------------------------------

    fn recover_draft(&self) -> Option<SessionDraft> {
        let store = self.drafts.as_ref()?;
        let program_id = self.program_id()?;
        store.recover(program_id, &self.selected_day, Utc::now())
    }

    fn write_draft(&self) {
        let (Some(store), Some(program_id)) = (self.drafts.as_ref(), self.program_id()) else {
            return;
        };
        if self.exercises.is_empty() || self.selected_day.is_empty() {
            return;
        }

        let draft = SessionDraft {
            exercises: self.exercises.clone(),
            session_date: self.session_date,
            timestamp: Utc::now(),
            mode: match self.mode {
                EditorMode::New => DraftMode::New,
                EditorMode::Edit(_) => DraftMode::Edit,
            },
            server_session_id: self.server_session_id.clone(),
            submission_id: self.submission_id.clone(),
        };
        if let Err(e) = store.save(program_id, &self.selected_day, &draft) {
            tracing::warn!("Could not write draft for '{}': {}", self.selected_day, e);
        }
    }

    fn clear_draft(&self) {
        let (Some(store), Some(program_id)) = (self.drafts.as_ref(), self.program_id()) else {
            return;
        };
        if let Err(e) = store.clear(program_id, &self.selected_day) {
            tracing::warn!("Could not clear draft for '{}': {}", self.selected_day, e);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    fn program_id(&self) -> Option<&str> {
        self.history
            .program
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| Some(self.history.progress.program_id.as_str()).filter(|id| !id.is_empty()))
    }

    pub fn exercises(&self) -> &[ExerciseProgress] {
        &self.exercises
    }

    pub fn history(&self) -> &ProgramHistory {
        &self.history
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn selected_day(&self) -> &str {
        &self.selected_day
    }

    pub fn day_names(&self) -> impl Iterator<Item = &str> {
        self.history.program.days.iter().map(|d| d.name.as_str())
    }

    pub fn session_date(&self) -> NaiveDate {
        self.session_date
    }

    pub fn server_session_id(&self) -> Option<&str> {
        self.server_session_id.as_deref()
    }

    pub fn submission_id(&self) -> Option<&str> {
        self.submission_id.as_deref()
    }

    /// Whether there are edits no save has acknowledged yet
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn is_committing(&self) -> bool {
        self.committing
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress::from_exercises(&self.exercises)
    }

    pub fn volume(&self) -> f64 {
        session_volume(&self.exercises)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::{Block, Exercise, ExerciseSet, ProgramDay, ProgramProgress, TrainingProgram};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, day).unwrap()
    }

    fn program() -> TrainingProgram {
        TrainingProgram {
            id: Some("prog-1".into()),
            name: "Push/Pull".into(),
            days_per_week: 2,
            days: vec![
                ProgramDay {
                    name: "Push Day".into(),
                    blocks: vec![
                        Block::single(Exercise {
                            id: Some("bench".into()),
                            recommended_sets: Some(3),
                            recommended_reps: Some(10),
                            ..Exercise::new("Bench Press")
                        }),
                        Block::single(Exercise {
                            recommended_sets: Some(2),
                            recommended_reps: Some(12),
                            ..Exercise::new("Dips")
                        }),
                    ],
                },
                ProgramDay {
                    name: "Pull Day".into(),
                    blocks: vec![Block::single(Exercise::new("Row"))],
                },
            ],
            ..Default::default()
        }
    }

    fn history(logs: Vec<ProgramDayProgress>) -> ProgramHistory {
        ProgramHistory {
            id: Some("hist-1".into()),
            program: program(),
            progress: ProgramProgress {
                program_id: "prog-1".into(),
                day_logs: logs,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn logged(id: &str, day: u32, weight: f64) -> ProgramDayProgress {
        ProgramDayProgress {
            id: Some(id.into()),
            submission_id: None,
            day_name: "Push Day".into(),
            date: date(day),
            exercises: vec![ExerciseProgress {
                exercise_id: "bench".into(),
                sets: vec![
                    ExerciseSet {
                        completed: true,
                        ..ExerciseSet::new(8, weight)
                    };
                    2
                ],
                notes: Some("felt heavy".into()),
            }],
            notes: None,
        }
    }

    fn opened(history: ProgramHistory) -> SessionEditor {
        let mut editor = SessionEditor::new(history, date(20));
        editor.open().unwrap();
        editor
    }

    #[test]
    fn test_open_prefills_first_day_from_history() {
        let editor = opened(history(vec![logged("log-1", 10, 80.0)]));

        assert_eq!(editor.selected_day(), "Push Day");
        assert_eq!(editor.exercises().len(), 2);
        let bench = &editor.exercises()[0];
        assert_eq!(bench.sets.len(), 2);
        assert_eq!(bench.sets[0].weight, 80.0);
        assert!(!bench.sets[0].completed);
        assert_eq!(editor.exercises()[1].sets.len(), 2);
        assert_eq!(editor.exercises()[1].sets[0].reps, 12);
        assert!(!editor.is_dirty());
        assert!(editor.submission_id().is_some());
    }

    #[test]
    fn test_select_unknown_day_fails() {
        let mut editor = opened(history(vec![]));
        assert!(matches!(editor.select_day("Leg Day"), Err(Error::Validation(_))));
        assert_eq!(editor.selected_day(), "Push Day");
    }

    #[test]
    fn test_edits_mark_dirty_and_track_progress() {
        let mut editor = opened(history(vec![]));

        editor.update_set(0, 0, SetField::Weight(60.0)).unwrap();
        assert!(editor.is_dirty());
        assert_eq!(editor.exercises()[0].sets[2].weight, 60.0);

        let progress = editor.progress();
        assert_eq!(progress.total_sets, 5);
        assert_eq!(progress.completed_sets, 1);
        assert_eq!(progress.progress_percent, 20);
        assert_eq!(editor.volume(), 60.0 * 10.0 * 3.0);
    }

    #[test]
    fn test_auto_save_skipped_when_clean() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));

        assert_eq!(editor.auto_save(&mut backend), AutoSaveOutcome::Skipped);
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn test_first_auto_save_resolves_identity_then_updates() {
        crate::logging::init_test();
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![logged("log-0", 1, 50.0)]));

        editor.update_set(0, 0, SetField::Weight(60.0)).unwrap();
        let outcome = editor.auto_save(&mut backend);
        assert_eq!(
            outcome,
            AutoSaveOutcome::Saved {
                session_id: Some("log-1".into())
            }
        );
        assert!(!editor.is_dirty());
        assert!(editor.last_saved_at().is_some());

        editor.update_set(0, 1, SetField::Completed(true)).unwrap();
        editor.auto_save(&mut backend);

        let logs = &backend.history().unwrap().progress.day_logs;
        assert_eq!(logs.len(), 2);
        assert!(logs[1].exercises[0].sets[1].completed);
        assert_eq!(editor.server_session_id(), Some("log-1"));
    }

    #[test]
    fn test_auto_save_failure_is_swallowed() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));
        backend.fail_next(1);

        editor.add_set(0).unwrap();
        assert_eq!(editor.auto_save(&mut backend), AutoSaveOutcome::Failed);
        assert!(editor.is_dirty());
        assert_eq!(editor.server_session_id(), None);

        assert!(matches!(
            editor.auto_save(&mut backend),
            AutoSaveOutcome::Saved { session_id: Some(_) }
        ));
    }

    #[test]
    fn test_stale_auto_save_response_is_discarded() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.update_set(0, 0, SetField::Reps(8)).unwrap();
        let older = editor.prepare_auto_save().unwrap();
        editor.update_set(0, 0, SetField::Reps(6)).unwrap();
        let newer = editor.prepare_auto_save().unwrap();

        let newer_result = backend.auto_save_session(&newer.payload);
        let older_result = backend.auto_save_session(&older.payload);

        assert!(matches!(
            editor.apply_auto_save(newer, newer_result),
            AutoSaveOutcome::Saved { .. }
        ));
        assert_eq!(editor.apply_auto_save(older, older_result), AutoSaveOutcome::Stale);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_edit_during_in_flight_save_stays_dirty() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.add_set(1).unwrap();
        let pending = editor.prepare_auto_save().unwrap();
        editor.add_set(1).unwrap();

        let result = backend.auto_save_session(&pending.payload);
        editor.apply_auto_save(pending, result);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_commit_validates_exercises() {
        let mut h = history(vec![]);
        h.program.days[1].blocks.clear();
        let mut editor = opened(h.clone());
        editor.select_day("Pull Day").unwrap();

        let mut backend = InMemoryBackend::new(h);
        assert!(matches!(editor.commit(&mut backend), Err(Error::Validation(_))));
        assert!(!editor.is_committing());
        assert_eq!(backend.writes(), 0);
    }

    #[test]
    fn test_commit_rejects_duplicate_submission() {
        let mut editor = opened(history(vec![]));

        let pending = editor.prepare_commit().unwrap();
        assert!(editor.is_committing());
        assert!(matches!(editor.prepare_commit(), Err(Error::SaveInProgress)));

        let mut backend = InMemoryBackend::new(history(vec![]));
        let result = backend.log_session(&pending.payload);
        editor.complete_commit(pending, result).unwrap();
        assert!(!editor.is_committing());
    }

    #[test]
    fn test_commit_failure_keeps_state_for_retry() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));
        backend.fail_next(1);

        editor.update_set(0, 0, SetField::Weight(40.0)).unwrap();
        assert!(matches!(editor.commit(&mut backend), Err(Error::Transport(_))));
        assert!(editor.is_dirty());
        assert_eq!(editor.exercises()[0].sets[0].weight, 40.0);

        let history = editor.commit(&mut backend).unwrap();
        assert_eq!(history.progress.day_logs.len(), 1);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_commit_after_auto_save_updates_same_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(temp_dir.path(), 24);
        let mut editor = SessionEditor::new(history(vec![]), date(20)).with_drafts(store.clone());
        editor.open().unwrap();
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.update_set(0, 0, SetField::Weight(70.0)).unwrap();
        editor.auto_save(&mut backend);
        editor.complete_all();
        assert!(store.load("prog-1", "Push Day").unwrap().is_some());

        let history = editor.commit(&mut backend).unwrap();
        assert_eq!(history.progress.day_logs.len(), 1);
        assert!(history.progress.day_logs[0].exercises[1].sets[0].completed);
        assert!(store.load("prog-1", "Push Day").unwrap().is_none());
    }

    #[test]
    fn test_draft_recovered_by_next_editor() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(temp_dir.path(), 24);

        let mut first = SessionEditor::new(history(vec![]), date(20)).with_drafts(store.clone());
        first.open().unwrap();
        first.update_set(0, 0, SetField::Weight(55.0)).unwrap();
        first.set_session_date(date(19));
        let submission = first.submission_id().map(String::from);
        drop(first);

        let mut second = SessionEditor::new(history(vec![]), date(20)).with_drafts(store);
        second.open().unwrap();

        assert_eq!(second.exercises()[0].sets[0].weight, 55.0);
        assert!(!second.exercises()[0].sets[0].completed);
        assert_eq!(second.session_date(), date(19));
        assert_eq!(second.submission_id().map(String::from), submission);
        assert!(second.last_saved_at().is_some());
    }

    #[test]
    fn test_edit_mode_loads_logged_session() {
        let initial = logged("log-7", 12, 90.0);
        let h = history(vec![initial.clone()]);
        let mut editor = SessionEditor::edit(h.clone(), initial);
        editor.open().unwrap();

        assert_eq!(editor.session_date(), date(12));
        assert_eq!(editor.server_session_id(), Some("log-7"));
        assert!(editor.exercises()[0].sets[0].completed);
        assert_eq!(editor.exercises()[0].notes.as_deref(), Some("felt heavy"));

        let mut backend = InMemoryBackend::new(h);
        editor.update_set(0, 0, SetField::Reps(5)).unwrap();
        let saved = editor.commit(&mut backend).unwrap();
        assert_eq!(saved.progress.day_logs.len(), 1);
        assert_eq!(saved.progress.day_logs[0].exercises[0].sets[0].reps, 5);
    }

    #[test]
    fn test_edit_mode_other_day_prefills() {
        let initial = logged("log-7", 12, 90.0);
        let mut editor = SessionEditor::edit(history(vec![initial.clone()]), initial);
        editor.open().unwrap();
        editor.select_day("Pull Day").unwrap();

        assert_eq!(editor.exercises().len(), 1);
        assert_eq!(editor.exercises()[0].exercise_id, "Row");
        assert_eq!(editor.exercises()[0].sets.len(), 3);
    }

    #[test]
    fn test_edit_out_of_range_leaves_state() {
        let mut editor = opened(history(vec![]));
        assert!(editor.remove_set(5, 0).is_err());
        assert!(editor.set_exercise_notes(9, None).is_err());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_switching_day_starts_new_session() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.update_set(0, 0, SetField::Weight(60.0)).unwrap();
        editor.auto_save(&mut backend);
        assert_eq!(editor.server_session_id(), Some("log-1"));
        let push_submission = editor.submission_id().map(String::from);

        editor.select_day("Pull Day").unwrap();
        assert_eq!(editor.server_session_id(), None);
        assert_ne!(editor.submission_id().map(String::from), push_submission);

        editor.update_set(0, 0, SetField::Weight(40.0)).unwrap();
        editor.auto_save(&mut backend);

        let logs = &backend.history().unwrap().progress.day_logs;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].day_name, "Push Day");
        assert_eq!(logs[0].exercises[0].sets[0].weight, 60.0);
        assert_eq!(logs[1].day_name, "Pull Day");
        assert_eq!(editor.server_session_id(), Some("log-2"));
    }

    #[test]
    fn test_edit_mode_other_day_does_not_overwrite_edited_session() {
        let initial = logged("log-7", 12, 90.0);
        let h = history(vec![initial.clone()]);
        let mut editor = SessionEditor::edit(h.clone(), initial);
        editor.open().unwrap();
        let mut backend = InMemoryBackend::new(h);

        editor.select_day("Pull Day").unwrap();
        assert_eq!(editor.server_session_id(), None);
        let saved = editor.commit(&mut backend).unwrap();

        let logs = &saved.progress.day_logs;
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].id.as_deref(), Some("log-7"));
        assert_eq!(logs[0].day_name, "Push Day");
        assert_eq!(logs[0].exercises[0].sets[0].weight, 90.0);

        editor.select_day("Push Day").unwrap();
        assert_eq!(editor.server_session_id(), Some("log-7"));
        assert_eq!(editor.session_date(), date(12));
    }

    #[test]
    fn test_late_response_for_previous_day_is_not_adopted() {
        let mut editor = opened(history(vec![]));
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.update_set(0, 0, SetField::Reps(5)).unwrap();
        let pending = editor.prepare_auto_save().unwrap();
        editor.select_day("Pull Day").unwrap();

        let result = backend.auto_save_session(&pending.payload);
        editor.apply_auto_save(pending, result);
        assert_eq!(editor.server_session_id(), None);
        assert_eq!(editor.selected_day(), "Pull Day");
    }

    #[test]
    fn test_auto_save_answered_after_commit_leaves_no_draft() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(temp_dir.path(), 24);
        let mut editor = SessionEditor::new(history(vec![]), date(20)).with_drafts(store.clone());
        editor.open().unwrap();
        let mut backend = InMemoryBackend::new(history(vec![]));

        editor.update_set(0, 0, SetField::Weight(50.0)).unwrap();
        let commit = editor.prepare_commit().unwrap();
        editor.update_set(0, 1, SetField::Completed(true)).unwrap();
        let auto = editor.prepare_auto_save().unwrap();

        let commit_result = backend.log_session(&commit.payload);
        editor.complete_commit(commit, commit_result).unwrap();
        assert!(store.load("prog-1", "Push Day").unwrap().is_none());

        let auto_result = backend.auto_save_session(&auto.payload);
        assert!(matches!(
            editor.apply_auto_save(auto, auto_result),
            AutoSaveOutcome::Saved { .. }
        ));
        assert!(store.load("prog-1", "Push Day").unwrap().is_none());
    }
}
