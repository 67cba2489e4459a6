use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

use crate::api_client::{endpoints, ApiClient};
use crate::errors::{ActionResult, ClientError, ErrorContext};
use crate::interaction::{Confirm, CONFIRM_DELETE_QUESTION, CONFIRM_DELETE_TAG};
use crate::models::{Question, QuestionId, QuestionPayload, Tag, TagId, TagPayload};
use crate::state::Shared;
use crate::{log_store_event, log_validation};

const STORE: &str = "questions";

/// Last-fetched snapshot of the question and tag collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionsSnapshot {
    pub questions: Vec<Question>,
    pub tags: Vec<Tag>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Owns the canonical in-memory questions and tags.
///
/// Every write is followed by a full refetch of the affected collection;
/// nothing is patched locally. Operations never return `Err`: reads fall
/// back to an empty collection, writes resolve to an [`ActionResult`].
#[derive(Clone)]
pub struct QuestionStore {
    api: ApiClient,
    confirm: Arc<dyn Confirm>,
    state: Shared<QuestionsSnapshot>,
}

impl QuestionStore {
    pub fn new(api: ApiClient, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            api,
            confirm,
            state: Shared::new(QuestionsSnapshot::default()),
        }
    }

    pub fn questions(&self) -> Vec<Question> {
        self.state.read().questions.clone()
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.state.read().tags.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn set_error(&self, message: Option<String>) {
        self.state.update(|state| state.error = message);
    }

    pub fn snapshot(&self) -> QuestionsSnapshot {
        self.state.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.state.subscribe()
    }

    /// Forget everything loaded so far, as after a logout.
    pub fn reset(&self) {
        self.state.replace(QuestionsSnapshot::default());
        log_store_event!(STORE, "reset", "store cleared");
    }

    /// Initial load: questions and tags side by side.
    pub async fn load(&self) {
        tokio::join!(self.fetch_questions(), self.fetch_tags());
    }

    pub async fn fetch_questions(&self) {
        self.state.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.api.get::<Vec<Question>>(endpoints::QUESTIONS).await;
        let error = match &result {
            Ok(_) => None,
            Err(err) => Some(
                ErrorContext::new("fetch_questions", "question").report(err, "Error fetching questions."),
            ),
        };

        self.state.update(|state| {
            match result {
                Ok(questions) => {
                    log_store_event!(STORE, "fetch_questions", count = questions.len());
                    state.questions = questions;
                }
                Err(_) => {
                    state.questions.clear();
                    state.error = error;
                }
            }
            state.loading = false;
        });
    }

    /// Refresh the tag collection. Leaves the loading flag alone.
    pub async fn fetch_tags(&self) {
        match self.api.get::<Vec<Tag>>(endpoints::TAGS).await {
            Ok(tags) => {
                log_store_event!(STORE, "fetch_tags", count = tags.len());
                self.state.update(|state| state.tags = tags);
            }
            Err(err) => {
                let message = ErrorContext::new("fetch_tags", "tag").report(&err, "Error fetching tags.");
                self.state.update(|state| {
                    state.tags.clear();
                    state.error = Some(message);
                });
            }
        }
    }

    /// Create (`is_edit == false`) or replace a question, then refetch.
    ///
    /// Fails without touching the network when the title is blank or an
    /// edit has no id. Tag ids the loaded tag collection does not know are
    /// dropped before sending.
    pub async fn save_question(
        &self,
        payload: QuestionPayload,
        is_edit: bool,
        edit_id: Option<QuestionId>,
    ) -> ActionResult {
        let mut context = ErrorContext::new("save_question", "question");
        if let Some(id) = edit_id {
            context = context.with_id(id);
        }

        match self.submit_question(payload, is_edit, edit_id).await {
            Ok(()) => {
                log_store_event!(STORE, "save_question", if is_edit { "question updated" } else { "question created" });
                self.fetch_questions().await;
                ActionResult::ok()
            }
            Err(err) => {
                let message = context.report(&err, "Error saving question.");
                self.set_error(Some(message.clone()));
                ActionResult::failed(message)
            }
        }
    }

    async fn submit_question(
        &self,
        mut payload: QuestionPayload,
        is_edit: bool,
        edit_id: Option<QuestionId>,
    ) -> Result<(), ClientError> {
        if payload.title.trim().is_empty() {
            log_validation!(failure, "question", error = "Title is required");
            return Err(ClientError::Validation("Title is required".to_string()));
        }

        self.reconcile_tags(&mut payload);

        if is_edit {
            let id = edit_id.ok_or(ClientError::MissingId("question"))?;
            self.api
                .put::<_, Value>(&endpoints::question(id), &payload)
                .await?;
        } else {
            self.api.post::<_, Value>(endpoints::QUESTIONS, &payload).await?;
        }
        Ok(())
    }

    /// Replace a question from a payload the caller already holds and hand
    /// back the server's updated record.
    pub async fn put_question(&self, id: QuestionId, mut payload: QuestionPayload) -> ActionResult<Question> {
        self.reconcile_tags(&mut payload);

        match self.api.put::<_, Question>(&endpoints::question(id), &payload).await {
            Ok(updated) => {
                log_store_event!(STORE, "put_question", id = id, "question replaced");
                self.fetch_questions().await;
                ActionResult::ok_with(updated)
            }
            Err(err) => {
                let message = ErrorContext::new("put_question", "question")
                    .with_id(id)
                    .report(&err, "Error updating question.");
                self.set_error(Some(message.clone()));
                ActionResult::failed(message)
            }
        }
    }

    /// Ask first; a "no" returns a neutral non-success with no message.
    pub async fn delete_question(&self, id: QuestionId) -> ActionResult {
        self.set_error(None);
        if !self.confirm.confirm(CONFIRM_DELETE_QUESTION).await {
            return ActionResult::declined();
        }

        match self.api.delete(&endpoints::question(id)).await {
            Ok(()) => {
                log_store_event!(STORE, "delete_question", id = id, "question deleted");
                self.fetch_questions().await;
                ActionResult::ok()
            }
            Err(err) => {
                let message = ErrorContext::new("delete_question", "question")
                    .with_id(id)
                    .report(&err, "Error deleting question.");
                self.set_error(Some(message.clone()));
                ActionResult::failed(message)
            }
        }
    }

    /// Create or replace a tag, then refetch tags.
    pub async fn save_tag(&self, payload: TagPayload, edit_id: Option<TagId>) -> ActionResult {
        let mut context = ErrorContext::new("save_tag", "tag");
        if let Some(id) = edit_id {
            context = context.with_id(id);
        }

        if payload.name.trim().is_empty() {
            log_validation!(failure, "tag", error = "Name is required");
            return ActionResult::failed("Name is required");
        }

        let result = match edit_id {
            Some(id) => self.api.put::<_, Value>(&endpoints::tag(id), &payload).await,
            None => self.api.post::<_, Value>(endpoints::TAGS, &payload).await,
        };

        match result {
            Ok(_) => {
                log_store_event!(STORE, "save_tag", "tag saved");
                self.fetch_tags().await;
                ActionResult::ok()
            }
            Err(err) => {
                let message = context.report(&err, "Error saving tag.");
                self.set_error(Some(message.clone()));
                ActionResult::failed(message)
            }
        }
    }

    pub async fn delete_tag(&self, id: TagId) -> ActionResult {
        self.set_error(None);
        if !self.confirm.confirm(CONFIRM_DELETE_TAG).await {
            return ActionResult::declined();
        }

        match self.api.delete(&endpoints::tag(id)).await {
            Ok(()) => {
                log_store_event!(STORE, "delete_tag", id = id, "tag deleted");
                self.fetch_tags().await;
                ActionResult::ok()
            }
            Err(err) => {
                let message = ErrorContext::new("delete_tag", "tag")
                    .with_id(id)
                    .report(&err, "Error deleting tag.");
                self.set_error(Some(message.clone()));
                ActionResult::failed(message)
            }
        }
    }

    fn reconcile_tags(&self, payload: &mut QuestionPayload) {
        let before = payload.tag_ids.len();
        payload.retain_known_tags(&self.state.read().tags);
        let dropped = before - payload.tag_ids.len();
        if dropped > 0 {
            tracing::debug!(store = STORE, dropped, "Dropped unknown tag ids from payload");
        }
    }
}

impl std::fmt::Debug for QuestionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionStore")
            .field("api", &self.api)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
