//! Server session analytics.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Subsystem;

/// One serve run, appended to `sessions.jsonl` on close
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
}

/// Lifecycle-only analytics collaborator
pub trait Analytics: Subsystem {}

pub struct SessionAnalytics {
    dir: PathBuf,
    started_at: Mutex<Option<DateTime<Utc>>>,
}

impl SessionAnalytics {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            started_at: Mutex::new(None),
        }
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.dir.join("sessions.jsonl")
    }
}

impl Subsystem for SessionAnalytics {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn init(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create analytics directory")?;
        *self.started_at.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
        Ok(())
    }

    fn close(&self) -> anyhow::Result<()> {
        let Some(started_at) = self
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Ok(());
        };

        let record = SessionRecord {
            started_at,
            stopped_at: Utc::now(),
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.sessions_path())
            .context("Failed to open analytics sessions file")?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;
        Ok(())
    }
}

impl Analytics for SessionAnalytics {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_records(analytics: &SessionAnalytics) -> Vec<SessionRecord> {
        std::fs::read_to_string(analytics.sessions_path())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_close_appends_session() {
        let temp_dir = TempDir::new().unwrap();
        let analytics = SessionAnalytics::new(temp_dir.path().join("analytics"));

        analytics.init().unwrap();
        analytics.close().unwrap();
        analytics.init().unwrap();
        analytics.close().unwrap();

        let records = read_records(&analytics);
        assert_eq!(records.len(), 2);
        assert!(records[0].started_at <= records[0].stopped_at);
    }

    #[test]
    fn test_close_without_init_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let analytics = SessionAnalytics::new(temp_dir.path().join("analytics"));

        analytics.close().unwrap();
        assert!(!analytics.sessions_path().exists());
    }

    #[test]
    fn test_double_close_records_once() {
        let temp_dir = TempDir::new().unwrap();
        let analytics = SessionAnalytics::new(temp_dir.path().join("analytics"));

        analytics.init().unwrap();
        analytics.close().unwrap();
        analytics.close().unwrap();

        assert_eq!(read_records(&analytics).len(), 1);
    }
}
