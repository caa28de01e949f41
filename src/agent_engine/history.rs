use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::PhoneClawResult;

/// Entries retained for operator views; older ones are dropped from the front.
pub const HISTORY_CAPACITY: usize = 100;
pub const LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub step: u32,
    pub action_summary: String,
    pub rationale: String,
    pub ts: i64,
}

impl HistoryEntry {
    pub fn new(step: u32, action_summary: impl Into<String>, rationale: impl Into<String>) -> Self {
        Self {
            step,
            action_summary: action_summary.into(),
            rationale: rationale.into(),
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Per-run action history, optionally mirrored to a JSONL file.
pub struct SessionHistory {
    pub session_id: String,
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    file_path: Option<PathBuf>,
}

impl SessionHistory {
    pub fn new(session_dir: Option<&Path>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let file_path = session_dir.map(|dir| dir.join(format!("session_{session_id}.jsonl")));
        Self {
            session_id,
            entries: VecDeque::new(),
            capacity: HISTORY_CAPACITY,
            file_path,
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// The most recent `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<HistoryEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append the latest entry to the JSONL file.
    pub fn flush(&self) -> PhoneClawResult<()> {
        let (Some(path), Some(last)) = (&self.file_path, self.entries.back()) else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let line = serde_json::to_string(last)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{}", line)?;
        tracing::debug!(path = %path.display(), "history entry flushed");
        Ok(())
    }
}

/// Timestamped operator-facing log lines, capped like the history.
#[derive(Debug, Default)]
pub struct OperatorLog {
    lines: VecDeque<String>,
}

impl OperatorLog {
    pub fn push(&mut self, msg: impl AsRef<str>) {
        let ts = chrono::Local::now().format("%H:%M:%S");
        self.lines.push_back(format!("[{ts}] {}", msg.as_ref()));
        while self.lines.len() > LOG_CAPACITY {
            self.lines.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}
