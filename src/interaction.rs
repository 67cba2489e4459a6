use async_trait::async_trait;

pub const CONFIRM_DELETE_QUESTION: &str = "Delete this question?";
pub const CONFIRM_DELETE_TAG: &str = "Delete this tag?";
pub const CONFIRM_DELETE_LOG: &str = "Delete this log?";

/// Asks the person at the keyboard before something destructive happens.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

#[async_trait]
impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    async fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answers every prompt the same way. Useful for scripted runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl Confirm for FixedAnswer {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Hard navigation back to the application root, which tears down all
/// process-wide state.
pub trait Navigator: Send + Sync {
    fn to_root(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn to_root(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn to_root(&self) {}
}
