use std::sync::Arc;

pub type LoggerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str) -> LoggerResult;

    /// Child logger whose lines are prefixed with `parent:namespace`.
    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync>;

    fn info(&self, message: &str) -> LoggerResult {
        self.log(Level::Info, message)
    }

    fn warn(&self, message: &str) -> LoggerResult {
        self.log(Level::Warn, message)
    }

    fn error(&self, message: &str) -> LoggerResult {
        self.log(Level::Error, message)
    }
}
