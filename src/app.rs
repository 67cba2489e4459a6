use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::config::ApiConfig;
use crate::errors::{ActionResult, ClientResult};
use crate::interaction::{Confirm, Navigator};
use crate::log_system_event;
use crate::models::{Question, QuestionId};
use crate::question_form::QuestionFormState;
use crate::question_logs::QuestionLogStore;
use crate::questions::QuestionStore;
use crate::session::{Session, SessionState};

/// Application root: the one place process-wide client state lives.
#[derive(Clone)]
pub struct App {
    api: ApiClient,
    confirm: Arc<dyn Confirm>,
    session: Session,
    questions: QuestionStore,
    question_form: QuestionFormState,
}

impl App {
    pub fn new(
        config: &ApiConfig,
        confirm: Arc<dyn Confirm>,
        navigator: Arc<dyn Navigator>,
    ) -> ClientResult<Self> {
        let api = ApiClient::new(config)?;
        Ok(Self {
            session: Session::new(api.clone(), navigator),
            questions: QuestionStore::new(api.clone(), Arc::clone(&confirm)),
            question_form: QuestionFormState::new(),
            confirm,
            api,
        })
    }

    /// One-shot startup: probe identity, then load questions and tags if
    /// someone is logged in.
    pub async fn bootstrap(&self) -> SessionState {
        log_system_event!(startup, component = "app", "resolving session");
        let state = self.session.probe().await;
        if state.is_authenticated() {
            self.questions.load().await;
        }
        state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn questions(&self) -> &QuestionStore {
        &self.questions
    }

    pub fn question_form(&self) -> &QuestionFormState {
        &self.question_form
    }

    /// Logs view for one question, loaded before it is returned.
    pub async fn logs_for(&self, question_id: QuestionId, question: Option<Question>) -> QuestionLogStore {
        let store = QuestionLogStore::new(self.api.clone(), Arc::clone(&self.confirm));
        store.select(question_id, question).await;
        store
    }

    /// Submit the open question dialog and close it on success.
    pub async fn submit_question_form(&self) -> ActionResult {
        let snapshot = self.question_form.snapshot();
        self.question_form.set_saving(true);
        let result = self
            .questions
            .save_question(snapshot.draft.to_payload(), snapshot.is_edit(), snapshot.edit_id())
            .await;
        self.question_form.set_saving(false);
        if result.success {
            self.question_form.close();
        }
        result
    }

    /// Log out and drop every piece of the previous user's state.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.questions.reset();
        self.question_form.close();
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("session", &self.session)
            .field("questions", &self.questions)
            .finish_non_exhaustive()
    }
}
