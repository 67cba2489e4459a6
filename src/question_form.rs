//! Transient edit/create buffer behind the question dialog.
//!
//! Nothing here touches the network. The buffer only turns into a
//! [`QuestionPayload`] when a store submits it.

use crate::models::{Difficulty, Question, QuestionId, QuestionPayload, QuestionSource, TagId};
use crate::state::Shared;

/// Field buffer of the question dialog, including the UI-only
/// `custom_source` escape for the "Other" source.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    pub title: String,
    pub source: String,
    pub custom_source: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tag_ids: Vec<TagId>,
    pub is_active: bool,
}

impl Default for QuestionDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            source: String::new(),
            custom_source: String::new(),
            content: String::new(),
            difficulty: Difficulty::Unset,
            tag_ids: Vec::new(),
            is_active: true,
        }
    }
}

impl From<&Question> for QuestionDraft {
    fn from(question: &Question) -> Self {
        let payload = QuestionPayload::from(question);
        // Free text the catalogue does not know comes back as Other + custom text.
        let (source, custom_source) = if payload.source.is_empty()
            || QuestionSource::parse(&payload.source).is_some()
        {
            (payload.source, String::new())
        } else {
            (QuestionSource::Other.as_str().to_string(), payload.source)
        };

        Self {
            title: payload.title,
            source,
            custom_source,
            content: payload.content,
            difficulty: payload.difficulty,
            tag_ids: payload.tag_ids,
            is_active: payload.is_active,
        }
    }
}

impl QuestionDraft {
    /// Allow-listed projection sent to the backend.
    pub fn to_payload(&self) -> QuestionPayload {
        let source = if self.source == QuestionSource::Other.as_str()
            && !self.custom_source.trim().is_empty()
        {
            self.custom_source.trim().to_string()
        } else {
            self.source.clone()
        };

        QuestionPayload {
            title: self.title.clone(),
            source,
            content: self.content.clone(),
            difficulty: self.difficulty,
            tag_ids: self.tag_ids.clone(),
            is_active: self.is_active,
        }
    }
}

/// One field edit.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionField {
    Title(String),
    Source(String),
    CustomSource(String),
    Content(String),
    Difficulty(Difficulty),
    IsActive(bool),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionFormSnapshot {
    pub open: bool,
    pub editing: Option<Question>,
    pub draft: QuestionDraft,
    pub saving: bool,
}

impl QuestionFormSnapshot {
    pub fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    pub fn edit_id(&self) -> Option<QuestionId> {
        self.editing.as_ref().map(|question| question.id)
    }
}

/// Open/closed flag, edit target, buffer and saving flag of the dialog.
#[derive(Debug, Clone)]
pub struct QuestionFormState {
    state: Shared<QuestionFormSnapshot>,
}

impl Default for QuestionFormState {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionFormState {
    pub fn new() -> Self {
        Self {
            state: Shared::new(QuestionFormSnapshot::default()),
        }
    }

    /// Seed from `question` for an edit, or from defaults for a create.
    pub fn open(&self, question: Option<&Question>) {
        self.state.update(|form| {
            form.draft = question.map(QuestionDraft::from).unwrap_or_default();
            form.editing = question.cloned();
            form.open = true;
        });
    }

    pub fn close(&self) {
        self.state.update(|form| {
            form.open = false;
            form.editing = None;
            form.draft = QuestionDraft::default();
        });
    }

    pub fn change_field(&self, field: QuestionField) {
        self.state.update(|form| {
            let draft = &mut form.draft;
            match field {
                QuestionField::Title(value) => draft.title = value,
                QuestionField::Source(value) => draft.source = value,
                QuestionField::CustomSource(value) => draft.custom_source = value,
                QuestionField::Content(value) => draft.content = value,
                QuestionField::Difficulty(value) => draft.difficulty = value,
                QuestionField::IsActive(value) => draft.is_active = value,
            }
        });
    }

    pub fn change_tags(&self, tag_ids: Vec<TagId>) {
        self.state.update(|form| form.draft.tag_ids = tag_ids);
    }

    pub fn set_saving(&self, saving: bool) {
        self.state.update(|form| form.saving = saving);
    }

    pub fn snapshot(&self) -> QuestionFormSnapshot {
        self.state.get()
    }

    pub fn is_open(&self) -> bool {
        self.state.read().open
    }

    pub fn draft(&self) -> QuestionDraft {
        self.state.read().draft.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<u64> {
        self.state.subscribe()
    }
}
