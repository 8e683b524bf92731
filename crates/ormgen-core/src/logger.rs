//! Logging capability handed to the resolver.
//!
//! The resolver reports every validation problem through a [`Logger`] so the
//! surrounding build task decides where messages go. [`TracingLogger`] routes
//! them to `tracing`; [`MemoryLogger`] keeps them for inspection in tests.

use parking_lot::Mutex;
use std::error::Error as StdError;
use std::sync::Arc;

/// Sink for resolver messages.
pub trait Logger: Send + Sync {
    /// Log an informational message.
    fn info(&self, message: &str);

    /// Log a warning.
    fn warn(&self, message: &str);

    /// Log an error.
    fn error(&self, message: &str);

    /// Log a debug message.
    fn debug(&self, message: &str);

    /// Log an informational message with its cause.
    fn info_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.info(&format!("{}: {}", message, cause));
    }

    /// Log a warning with its cause.
    fn warn_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.warn(&format!("{}: {}", message, cause));
    }

    /// Log an error with its cause.
    fn error_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.error(&format!("{}: {}", message, cause));
    }

    /// Log a debug message with its cause.
    fn debug_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.debug(&format!("{}: {}", message, cause));
    }
}

/// Logger that forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "ormgen", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "ormgen", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "ormgen", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "ormgen", "{}", message);
    }

    fn info_with_cause(&self, message: &str, cause: &dyn StdError) {
        tracing::info!(target: "ormgen", cause = %cause, "{}", message);
    }

    fn warn_with_cause(&self, message: &str, cause: &dyn StdError) {
        tracing::warn!(target: "ormgen", cause = %cause, "{}", message);
    }

    fn error_with_cause(&self, message: &str, cause: &dyn StdError) {
        tracing::error!(target: "ormgen", cause = %cause, "{}", message);
    }

    fn debug_with_cause(&self, message: &str, cause: &dyn StdError) {
        tracing::debug!(target: "ormgen", cause = %cause, "{}", message);
    }
}

/// Severity of a captured log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warning.
    Warn,
    /// Error.
    Error,
}

/// A captured log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// Rendered cause, if one was given.
    pub cause: Option<String>,
}

/// In-memory logger for testing.
#[derive(Debug, Default, Clone)]
pub struct MemoryLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemoryLogger {
    /// Create a new memory logger.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: LogLevel, message: &str, cause: Option<&dyn StdError>) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            cause: cause.map(|c| c.to_string()),
        });
    }

    /// Get all captured records.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Messages captured at the given level.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level)
            .map(|r| r.message.clone())
            .collect()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.lock().clear();
    }

    /// Get record count.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message, None);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message, None);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message, None);
    }

    fn debug(&self, message: &str) {
        self.push(LogLevel::Debug, message, None);
    }

    fn info_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.push(LogLevel::Info, message, Some(cause));
    }

    fn warn_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.push(LogLevel::Warn, message, Some(cause));
    }

    fn error_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.push(LogLevel::Error, message, Some(cause));
    }

    fn debug_with_cause(&self, message: &str, cause: &dyn StdError) {
        self.push(LogLevel::Debug, message, Some(cause));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_memory_logger_captures_levels() {
        let logger = MemoryLogger::new();
        logger.info("starting");
        logger.error("broken");
        logger.warn("odd");

        assert_eq!(logger.len(), 3);
        assert_eq!(logger.messages(LogLevel::Error), vec!["broken".to_string()]);
        logger.clear();
        assert!(logger.is_empty());
    }

    #[test]
    fn test_cause_is_recorded() {
        let logger = MemoryLogger::new();
        let cause = Error::UnknownCardinality("few-to-few".into());
        logger.error_with_cause("bad relationship", &cause);

        let records = logger.records();
        assert_eq!(records[0].level, LogLevel::Error);
        assert!(records[0].cause.as_deref().unwrap().contains("few-to-few"));
    }

    #[test]
    fn test_clones_share_records() {
        let logger = MemoryLogger::new();
        let handle: Arc<dyn Logger> = Arc::new(logger.clone());
        handle.debug("shared");
        assert_eq!(logger.len(), 1);
    }
}
