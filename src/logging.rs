//! Standardized logging macros plus subscriber setup.
//!
//! The macros keep field names consistent across the client:
//! `operation`, `resource_type`, `resource_id`, `status`, `error`.

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

// ============================================================================
// HTTP Request Logging Macros
// ============================================================================

/// Log an outgoing request
#[macro_export]
macro_rules! log_request {
    ($method:expr, $path:expr) => {
        tracing::debug!(
            component = "api_client",
            method = %$method,
            path = %$path,
            "Sending request"
        );
    };
    ($method:expr, $path:expr, status = $status:expr) => {
        tracing::debug!(
            component = "api_client",
            method = %$method,
            path = %$path,
            status = %$status,
            "Request completed"
        );
    };
}

/// Log a failed request; the error is still returned to the caller
#[macro_export]
macro_rules! log_request_error {
    ($method:expr, $path:expr, status = $status:expr, detail = $detail:expr) => {
        tracing::error!(
            component = "api_client",
            method = %$method,
            path = %$path,
            status = %$status,
            detail = ?$detail,
            "API error response"
        );
    };
    ($method:expr, $path:expr, error = $error:expr) => {
        tracing::error!(
            component = "api_client",
            method = %$method,
            path = %$path,
            error = %$error,
            "API request failed"
        );
    };
}

// ============================================================================
// Store Logging Macros
// ============================================================================

/// Log a state change inside one of the data stores
#[macro_export]
macro_rules! log_store_event {
    ($store:expr, $operation:expr, count = $count:expr) => {
        tracing::debug!(
            store = $store,
            operation = $operation,
            count = $count,
            "Store refreshed"
        );
    };
    ($store:expr, $operation:expr, id = $id:expr, $msg:expr) => {
        tracing::info!(
            store = $store,
            operation = $operation,
            resource_id = %$id,
            "Store operation: {}", $msg
        );
    };
    ($store:expr, $operation:expr, $msg:expr) => {
        tracing::info!(
            store = $store,
            operation = $operation,
            "Store operation: {}", $msg
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (session, $msg:expr) => {
        tracing::info!(event_type = "session", "System event: {}", $msg);
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

/// Install the global subscriber: console always, daily-rotated file when
/// enabled. Keep the returned guard alive for as long as file output matters.
pub fn init_tracing(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true);

    if !config.file_enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .try_init()?;
        return Ok(None);
    }

    std::fs::create_dir_all(&config.log_directory)?;
    let file_appender = tracing_appender::rolling::daily(&config.log_directory, "interviewq.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    // No ANSI colors in files
    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking_file);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        directory = %config.log_directory,
        "Logging initialized with daily file rotation"
    );

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_logging_macros_compile() {
        let error = anyhow::anyhow!("test error");

        log_request!("GET", "questions/");
        log_request!("GET", "questions/", status = 200);
        log_request_error!("PUT", "questions/1/", status = 400, detail = Some("bad"));
        log_request_error!("DELETE", "tags/2/", error = error);

        log_store_event!("questions", "fetch_questions", count = 3);
        log_store_event!("questions", "delete_question", id = 4, "deleted");
        log_store_event!("session", "logout", "session cleared");

        log_system_event!(startup, component = "client", "starting");
        log_system_event!(session, "identity resolved");
        log_system_event!(config, "configuration loaded");

        log_validation!(success, "question_form", "payload ok");
        log_validation!(failure, "question_form", error = "Title is required");
    }
}
