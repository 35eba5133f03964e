use serde::{Deserialize, Serialize};
use std::fmt;

/// Verbosity levels, from always shown to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Fatal,
    Error,
    #[default]
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Fatal => "fatal",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<LogLevel> {
        match name {
            "fatal" => Some(LogLevel::Fatal),
            "error" => Some(LogLevel::Error),
            "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// Collects diagnostic records at or below a threshold level.
///
/// Passed explicitly to whichever stage wants to trace, so independent
/// assembler runs never share state.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    pub level: LogLevel,
    records: Vec<LogRecord>,
}

impl Logger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            records: Vec::new(),
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.enabled(level) {
            self.records.push(LogRecord {
                level,
                message: message.into(),
            });
        }
    }

    /// Like [`Logger::log`] but only formats the message when it will be kept.
    pub fn log_with(&mut self, level: LogLevel, message: impl FnOnce() -> String) {
        if self.enabled(level) {
            self.log(level, message());
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn take_records(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.records)
    }
}
