pub mod api_client;
pub mod app;
pub mod config;
pub mod errors;
pub mod interaction;
pub mod logging;
pub mod models;
pub mod question_form;
pub mod question_logs;
pub mod questions;
pub mod session;
pub mod state;

pub use api_client::ApiClient;
pub use app::App;
pub use config::{ApiConfig, Config, LoggingConfig};
pub use errors::{ActionResult, ClientError, ClientResult};
pub use interaction::{Confirm, FixedAnswer, Navigator, NoopNavigator};
pub use models::*;
pub use question_form::{QuestionDraft, QuestionField, QuestionFormState};
pub use question_logs::{LogDraft, QuestionLogStore};
pub use questions::QuestionStore;
pub use session::{Session, SessionState};
