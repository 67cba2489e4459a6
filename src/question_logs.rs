use chrono::Local;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api_client::{endpoints, ApiClient};
use crate::errors::ErrorContext;
use crate::interaction::{Confirm, CONFIRM_DELETE_LOG};
use crate::models::{LogId, LogPayload, Outcome, Question, QuestionId, QuestionLog};
use crate::state::Shared;
use crate::log_store_event;

const STORE: &str = "question_logs";

/// `YYYY-MM-DDTHH:MM` in local time, the shape a datetime-local input uses.
pub fn local_datetime_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M").to_string()
}

/// Form buffer for a new or edited attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LogDraft {
    pub date_attempted: String,
    pub time_spent_min: Option<u32>,
    pub outcome: Outcome,
    pub solution_approach: String,
    pub self_notes: String,
}

impl LogDraft {
    /// Fresh attempt stamped with the current local time.
    pub fn new() -> Self {
        Self {
            date_attempted: local_datetime_now(),
            time_spent_min: None,
            outcome: Outcome::Unset,
            solution_approach: String::new(),
            self_notes: String::new(),
        }
    }

    pub fn to_payload(&self, question_id: QuestionId) -> LogPayload {
        LogPayload {
            question: question_id,
            date_attempted: self.date_attempted.clone(),
            time_spent_min: self.time_spent_min,
            outcome: self.outcome,
            solution_approach: self.solution_approach.clone(),
            self_notes: self.self_notes.clone(),
        }
    }
}

impl Default for LogDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&QuestionLog> for LogDraft {
    fn from(log: &QuestionLog) -> Self {
        Self {
            date_attempted: log.date_attempted.clone().unwrap_or_default(),
            time_spent_min: log.time_spent_min,
            outcome: log.outcome,
            solution_approach: log.solution_approach.clone(),
            self_notes: log.self_notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogsSnapshot {
    pub question_id: Option<QuestionId>,
    pub logs: Vec<QuestionLog>,
    pub question: Option<Question>,
    pub error: Option<String>,
}

/// Attempts of one question plus that question's detail.
///
/// Switching to another question with [`QuestionLogStore::select`]
/// invalidates both and reloads them.
#[derive(Clone)]
pub struct QuestionLogStore {
    api: ApiClient,
    confirm: Arc<dyn Confirm>,
    supplied: Shared<Option<Question>>,
    state: Shared<LogsSnapshot>,
}

impl QuestionLogStore {
    pub fn new(api: ApiClient, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            api,
            confirm,
            supplied: Shared::new(None),
            state: Shared::new(LogsSnapshot::default()),
        }
    }

    /// Point the store at `question_id` and load its logs and detail. A
    /// `question` the caller already holds is reused instead of fetched.
    pub async fn select(&self, question_id: QuestionId, question: Option<Question>) {
        self.supplied.replace(question.clone());
        self.state.replace(LogsSnapshot {
            question_id: Some(question_id),
            logs: Vec::new(),
            question,
            error: None,
        });
        log_store_event!(STORE, "select", id = question_id, "question selected");

        tokio::join!(self.fetch_logs(), self.fetch_question());
    }

    pub fn question_id(&self) -> Option<QuestionId> {
        self.state.read().question_id
    }

    pub fn logs(&self) -> Vec<QuestionLog> {
        self.state.read().logs.clone()
    }

    pub fn question(&self) -> Option<Question> {
        self.state.read().question.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn set_error(&self, message: Option<String>) {
        self.state.update(|state| state.error = message);
    }

    pub fn snapshot(&self) -> LogsSnapshot {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    pub async fn fetch_logs(&self) {
        let Some(question_id) = self.question_id() else {
            return;
        };
        self.set_error(None);

        let result = self
            .api
            .get::<Vec<QuestionLog>>(&endpoints::question_logs(question_id))
            .await;

        match result {
            Ok(logs) => {
                log_store_event!(STORE, "fetch_logs", count = logs.len());
                self.apply(question_id, |state| state.logs = logs);
            }
            Err(err) => {
                let message = ErrorContext::new("fetch_logs", "question_log")
                    .with_id(question_id)
                    .report(&err, "Error fetching logs.");
                self.apply(question_id, |state| {
                    state.logs.clear();
                    state.error = Some(message);
                });
            }
        }
    }

    pub async fn fetch_question(&self) {
        let Some(question_id) = self.question_id() else {
            return;
        };

        if let Some(question) = self.supplied.get() {
            self.apply(question_id, |state| state.question = Some(question));
            return;
        }

        self.set_error(None);
        match self.api.get::<Question>(&endpoints::question(question_id)).await {
            Ok(question) => self.apply(question_id, |state| state.question = Some(question)),
            Err(err) => {
                let message = ErrorContext::new("fetch_question", "question")
                    .with_id(question_id)
                    .report(&err, "Error fetching question.");
                self.apply(question_id, |state| {
                    state.question = None;
                    state.error = Some(message);
                });
            }
        }
    }

    /// POST a new attempt or PUT over `edit`, then refetch the logs either way.
    pub async fn save_log(&self, draft: &LogDraft, edit: Option<&QuestionLog>) -> bool {
        let Some(question_id) = self.question_id() else {
            self.set_error(Some("No question selected.".to_string()));
            return false;
        };
        self.set_error(None);

        let payload = draft.to_payload(question_id);
        let result = match edit {
            Some(log) => {
                self.api
                    .put::<_, Value>(&endpoints::question_log(question_id, log.id), &payload)
                    .await
            }
            None => {
                self.api
                    .post::<_, Value>(&endpoints::question_logs(question_id), &payload)
                    .await
            }
        };

        let saved = match result {
            Ok(_) => {
                log_store_event!(STORE, "save_log", id = question_id, "log saved");
                true
            }
            Err(err) => {
                let mut context = ErrorContext::new("save_log", "question_log");
                if let Some(log) = edit {
                    context = context.with_id(log.id);
                }
                let message = context.report(&err, "Error saving log.");
                self.set_error(Some(message));
                false
            }
        };

        // A failed save keeps its message; the refetch must not wipe it.
        let error = self.error();
        self.fetch_logs().await;
        if !saved && self.error().is_none() {
            self.set_error(error);
        }
        saved
    }

    pub async fn delete_log(&self, log_id: LogId) -> bool {
        let Some(question_id) = self.question_id() else {
            return false;
        };
        if !self.confirm.confirm(CONFIRM_DELETE_LOG).await {
            return false;
        }
        self.set_error(None);

        match self.api.delete(&endpoints::question_log(question_id, log_id)).await {
            Ok(()) => {
                log_store_event!(STORE, "delete_log", id = log_id, "log deleted");
                self.fetch_logs().await;
                true
            }
            Err(err) => {
                let message = ErrorContext::new("delete_log", "question_log")
                    .with_id(log_id)
                    .report(&err, "Error deleting log.");
                self.set_error(Some(message));
                false
            }
        }
    }

    /// Write only if the store still points at `question_id`; a response for
    /// a question the user has already left is dropped.
    fn apply(&self, question_id: QuestionId, f: impl FnOnce(&mut LogsSnapshot)) {
        self.state.update(|state| {
            if state.question_id == Some(question_id) {
                f(state);
            } else {
                tracing::debug!(store = STORE, stale = question_id, "Ignoring response for a deselected question");
            }
        });
    }
}

impl std::fmt::Debug for QuestionLogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionLogStore")
            .field("api", &self.api)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
