use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Metadata, Record};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// One stderr line: time, level, message
    pub fn line(&self) -> String {
        format!(
            "{} {:<5} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Keeps the most recent log records in memory, echoing the important ones to stderr.
///
/// Clones share the same buffer, so a clone kept after [`AppLogger::init`]
/// can still read what was captured.
#[derive(Clone)]
pub struct AppLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    max_entries: usize,
    level: LevelFilter,
    echo_level: LevelFilter,
}

impl AppLogger {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            max_entries,
            level: LevelFilter::Info,
            echo_level: LevelFilter::Off,
        }
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Print captured records at or above `level` to stderr as they arrive
    pub fn with_echo_level(mut self, level: LevelFilter) -> Self {
        self.echo_level = level;
        self
    }

    pub fn init(self) -> Result<(), log::SetLoggerError> {
        let level = self.level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(level);
        Ok(())
    }

    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Captured records that were too detailed to be echoed
    pub fn unechoed_entries(&self) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.level > self.echo_level)
            .cloned()
            .collect()
    }

    // A panic while logging must not take the log down with it
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl log::Log for AppLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now(),
            level: record.level(),
            target: record.target().to_string(),
            message: format!("{}", record.args()),
        };

        if entry.level <= self.echo_level {
            eprintln!("{}", entry.line());
        }

        let mut entries = self.lock();
        entries.push(entry);

        // Keep only the most recent entries
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(0..excess);
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;

    fn log_at(logger: &AppLogger, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn test_keeps_only_most_recent_entries() {
        let logger = AppLogger::new(2);
        for message in ["one", "two", "three"] {
            log_at(&logger, Level::Info, message);
        }

        let entries = logger.get_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "two");
        assert_eq!(entries[1].message, "three");
    }

    #[test]
    fn test_level_filter_applies() {
        let logger = AppLogger::new(10);
        log_at(&logger, Level::Debug, "hidden");
        assert!(logger.get_entries().is_empty());

        let verbose = AppLogger::new(10).with_level(LevelFilter::Debug);
        log_at(&verbose, Level::Debug, "shown");
        assert_eq!(verbose.get_entries()[0].message, "shown");
    }

    #[test]
    fn test_unechoed_entries_are_the_detailed_ones() {
        let logger = AppLogger::new(10)
            .with_level(LevelFilter::Debug)
            .with_echo_level(LevelFilter::Warn);
        log_at(&logger, Level::Debug, "rasterized 1200x4000 px");
        log_at(&logger, Level::Warn, "skipping logo");

        let quiet: Vec<_> = logger
            .unechoed_entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert_eq!(quiet, vec!["rasterized 1200x4000 px".to_string()]);
        assert_eq!(logger.get_entries().len(), 2);
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let logger = AppLogger::new(10);
        let reader = logger.clone();
        log_at(&logger, Level::Error, "write failed");

        let entries = reader.get_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].line().contains("ERROR write failed"));
    }
}
