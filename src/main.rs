use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use interviewq::{log_system_event, App, Config, FixedAnswer, NoopNavigator, SessionState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = interviewq::logging::init_tracing(&config.logging)?;
    config.validate()?;

    log_system_event!(startup, component = "client", "InterviewQ client starting");

    // Headless run: never confirm anything destructive, nowhere to navigate.
    let app = App::new(&config.api, Arc::new(FixedAnswer(false)), Arc::new(NoopNavigator))?;

    match app.bootstrap().await {
        SessionState::Authenticated(identity) => {
            let snapshot = app.questions().snapshot();
            info!(
                username = identity.username().unwrap_or("unknown"),
                questions = snapshot.questions.len(),
                tags = snapshot.tags.len(),
                error = ?snapshot.error,
                "Session active"
            );
        }
        SessionState::Unauthenticated => {
            warn!(base_url = %app.api().base_url(), "No authenticated session; log in first");
        }
    }

    Ok(())
}
