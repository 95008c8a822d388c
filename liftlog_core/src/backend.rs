//! Persistence of sessions through the training backend.
//!
//! The backend owns log entry identity. Every write returns the updated
//! [`ProgramHistory`], which the caller uses to learn the id of the entry
//! it just wrote.

use crate::config::ApiConfig;
use crate::types::session_date;
use crate::{Error, ExerciseProgress, ProgramDayProgress, ProgramHistory, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const SESSIONS_PATH: &str = "training/sessions";
const AUTO_SAVE_PATH: &str = "training/sessions/auto-save";
const ACTIVE_PATH: &str = "training/active";

/// Body of a session write
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogSessionPayload {
    pub program_id: String,
    pub day_name: String,
    #[serde(with = "session_date")]
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseProgress>,
    /// Server id of the entry to update; absent for a first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Client-generated id used to find the entry again after a first save
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Session persistence trait
pub trait SessionBackend {
    /// Commit a finished session
    fn log_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory>;

    /// Persist an in-progress session
    fn auto_save_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory>;

    /// The user's current program history, if one is active
    fn get_active_program(&mut self) -> Result<Option<ProgramHistory>>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Response envelope used by every backend endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEnvelope<T> {
    success: bool,
    error_code: Option<String>,
    message: Option<String>,
    data: Option<T>,
}

/// REST backend over HTTP
pub struct HttpBackend {
    base_url: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token,
            agent: ureq::Agent::new(),
        }
    }

    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            token: api.resolve_token(),
            agent: ureq::AgentBuilder::new().timeout(api.timeout()).build(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let request = self
            .agent
            .request(method, &self.url(path))
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    fn post_session(&self, path: &str, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        tracing::debug!(
            "POST {} for '{}' on {} (session {:?})",
            path,
            payload.day_name,
            payload.date,
            payload.session_id
        );
        let response = self.request("POST", path).send_json(payload);
        read_envelope::<ProgramHistory>(response)?
            .ok_or_else(|| Error::Api {
                status: 200,
                message: "Response carried no program history".into(),
            })
    }
}

impl SessionBackend for HttpBackend {
    fn log_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        self.post_session(SESSIONS_PATH, payload)
    }

    fn auto_save_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        self.post_session(AUTO_SAVE_PATH, payload)
    }

    fn get_active_program(&mut self) -> Result<Option<ProgramHistory>> {
        tracing::debug!("GET {}", ACTIVE_PATH);
        read_envelope(self.request("GET", ACTIVE_PATH).call())
    }
}

fn read_envelope<T: DeserializeOwned>(
    response: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<Option<T>> {
    let body = match response {
        Ok(response) => response.into_string()?,
        Err(ureq::Error::Status(401, response)) => {
            return Err(Error::Unauthorized(error_message(response)));
        }
        Err(ureq::Error::Status(status, response)) => {
            return Err(Error::Api {
                status,
                message: error_message(response),
            });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(Error::Transport(transport.to_string()));
        }
    };

    let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;
    if !envelope.success {
        let message = envelope.message.unwrap_or_else(|| "Request failed".into());
        return Err(Error::Api {
            status: 200,
            message: match envelope.error_code {
                Some(code) => format!("{} ({})", message, code),
                None => message,
            },
        });
    }
    Ok(envelope.data)
}

fn error_message(response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or(body)
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Backend kept in process memory
///
/// Mirrors the server's behavior: assigns entry ids, updates the entry
/// named by `sessionId`, and folds repeated submissions of the same
/// `submissionId` into one entry.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    history: Option<ProgramHistory>,
    next_id: u64,
    fail_next: usize,
    writes: usize,
}

impl InMemoryBackend {
    pub fn new(history: ProgramHistory) -> Self {
        Self {
            history: Some(history),
            ..Default::default()
        }
    }

    pub fn history(&self) -> Option<&ProgramHistory> {
        self.history.as_ref()
    }

    /// Make the next `n` writes fail with a transport error
    pub fn fail_next(&mut self, n: usize) {
        self.fail_next = n;
    }

    /// Number of write requests received, failed ones included
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn write(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        self.writes += 1;
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(Error::Transport("simulated network failure".into()));
        }

        let history = self.history.as_mut().ok_or_else(|| Error::Api {
            status: 404,
            message: "No active program".into(),
        })?;
        if let Some(program_id) = history.program.id.as_deref() {
            if program_id != payload.program_id {
                return Err(Error::Api {
                    status: 400,
                    message: format!("Program {} is not active", payload.program_id),
                });
            }
        }

        let logs = &mut history.progress.day_logs;
        let existing = payload
            .session_id
            .as_deref()
            .and_then(|id| logs.iter().position(|l| l.id.as_deref() == Some(id)))
            .or_else(|| {
                payload.submission_id.as_deref().and_then(|sid| {
                    logs.iter()
                        .position(|l| l.submission_id.as_deref() == Some(sid))
                })
            });

        match existing {
            Some(index) => {
                let entry = &mut logs[index];
                entry.day_name = payload.day_name.clone();
                entry.date = payload.date;
                entry.exercises = payload.exercises.clone();
                entry.notes = payload.notes.clone();
            }
            None => {
                self.next_id += 1;
                logs.push(ProgramDayProgress {
                    id: Some(format!("log-{}", self.next_id)),
                    submission_id: payload.submission_id.clone(),
                    day_name: payload.day_name.clone(),
                    date: payload.date,
                    exercises: payload.exercises.clone(),
                    notes: payload.notes.clone(),
                });
            }
        }

        history.progress.days_completed = logs.len() as u32;
        Ok(history.clone())
    }
}

impl SessionBackend for InMemoryBackend {
    fn log_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        self.write(payload)
    }

    fn auto_save_session(&mut self, payload: &LogSessionPayload) -> Result<ProgramHistory> {
        self.write(payload)
    }

    fn get_active_program(&mut self) -> Result<Option<ProgramHistory>> {
        Ok(self.history.clone().filter(|h| h.status.is_active()))
    }
}
