use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type QuestionId = i64;
pub type TagId = i64;
pub type LogId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

/// Editable fields of a tag, as sent on POST/PUT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPayload {
    pub name: String,
    pub description: String,
    pub is_active: bool,
}

impl Default for TagPayload {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            is_active: true,
        }
    }
}

/// The tag dialog edits the write shape directly: `Default` for a new tag,
/// `From<&Tag>` to edit one.
pub type TagDraft = TagPayload;

impl From<&Tag> for TagPayload {
    fn from(tag: &Tag) -> Self {
        Self {
            name: tag.name.clone(),
            description: tag.description.clone(),
            is_active: tag.is_active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    #[serde(rename = "")]
    Unset,
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const LEVELS: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Unset => "",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    #[serde(rename = "")]
    Unset,
    Solved,
    Partial,
    Failed,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Solved, Outcome::Partial, Outcome::Failed];
}

/// Known practice sites. Anything else travels as free text under `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    CodeWars,
    LeetCode,
    HackerRank,
    Other,
}

impl QuestionSource {
    pub const ALL: [QuestionSource; 4] = [
        QuestionSource::CodeWars,
        QuestionSource::LeetCode,
        QuestionSource::HackerRank,
        QuestionSource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSource::CodeWars => "CodeWars",
            QuestionSource::LeetCode => "LeetCode",
            QuestionSource::HackerRank => "HackerRank",
            QuestionSource::Other => "Other",
        }
    }

    /// Exact match against the known names; unknown text is not a known source.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.as_str() == value)
    }
}

/// A question as the backend returns it. `tags` is the read projection;
/// writes go through [`QuestionPayload`] with `tag_ids`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solved_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|tag| tag.id).collect()
    }
}

/// The allow-listed write projection of a question. Read-only fields such
/// as `slug` or the attempt counters have no place here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub title: String,
    pub source: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tag_ids: Vec<TagId>,
    pub is_active: bool,
}

impl From<&Question> for QuestionPayload {
    fn from(question: &Question) -> Self {
        Self {
            title: question.title.clone(),
            source: question.source.clone(),
            content: question.content.clone(),
            difficulty: question.difficulty,
            tag_ids: question.tag_ids(),
            is_active: question.is_active,
        }
    }
}

impl QuestionPayload {
    /// Drop every tag id that is not in `known`, keeping order.
    pub fn retain_known_tags(&mut self, known: &[Tag]) {
        self.tag_ids.retain(|id| known.iter().any(|tag| tag.id == *id));
    }
}

/// The question a log points at. Reads embed a summary; writes send the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionRef {
    Summary { id: QuestionId, title: String },
    Id(QuestionId),
}

impl QuestionRef {
    pub fn id(&self) -> QuestionId {
        match self {
            QuestionRef::Summary { id, .. } => *id,
            QuestionRef::Id(id) => *id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            QuestionRef::Summary { title, .. } => Some(title),
            QuestionRef::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionLog {
    pub id: LogId,
    pub question: QuestionRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub date_attempted: Option<String>,
    #[serde(default)]
    pub time_spent_min: Option<u32>,
    #[serde(default)]
    pub outcome: Outcome,
    #[serde(default)]
    pub solution_approach: String,
    #[serde(default)]
    pub self_notes: String,
}

impl QuestionLog {
    pub fn question_title(&self) -> Option<&str> {
        self.question.title().or(self.title.as_deref())
    }
}

/// Write shape of a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPayload {
    pub question: QuestionId,
    pub date_attempted: String,
    pub time_spent_min: Option<u32>,
    pub outcome: Outcome,
    pub solution_approach: String,
    pub self_notes: String,
}

impl From<&QuestionLog> for LogPayload {
    fn from(log: &QuestionLog) -> Self {
        Self {
            question: log.question.id(),
            date_attempted: log.date_attempted.clone().unwrap_or_default(),
            time_spent_min: log.time_spent_min,
            outcome: log.outcome,
            solution_approach: log.solution_approach.clone(),
            self_notes: log.self_notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Answer of the identity probe. The backend nests the user record; a flat
/// `username` is accepted too.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Identity {
    pub fn username(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or_else(|| self.user.as_ref().map(|user| user.username.as_str()))
    }
}

impl From<UserProfile> for Identity {
    fn from(user: UserProfile) -> Self {
        Self {
            authenticated: true,
            username: Some(user.username.clone()),
            user: Some(user),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

fn default_active() -> bool {
    true
}
