//! Append-only lead log.
//!
//! One JSON object per line:
//!
//! ```text
//! {"capturedAt":1735689600000,"contact":{"email":"a@x.com","name":"A"}}
//! ```

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use gatehouse_core::{ContactInfo, Environment, LeadError, LeadSink};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadLine<'a> {
    captured_at: u64,
    contact: &'a ContactInfo,
}

/// Lead sink appending JSON lines to a file.
#[derive(Debug)]
pub struct JsonlLeadSink<E> {
    path: PathBuf,
    env: E,
    append_lock: Mutex<()>,
}

impl<E: Environment> JsonlLeadSink<E> {
    /// Append leads to `path`, creating it on first submit.
    pub fn new(path: impl Into<PathBuf>, env: E) -> Self {
        Self { path: path.into(), env, append_lock: Mutex::new(()) }
    }

    /// Location of the log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<E: Environment> LeadSink for JsonlLeadSink<E> {
    fn submit(&self, contact: &ContactInfo) -> Result<(), LeadError> {
        let submit_err = |reason: String| LeadError::Submit { reason };

        let mut line =
            serde_json::to_string(&LeadLine { captured_at: self.env.now_ms(), contact })
                .map_err(|e| submit_err(e.to_string()))?;
        line.push('\n');

        let _guard = self.append_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| submit_err(format!("{}: {e}", self.path.display())))?;
        file.write_all(line.as_bytes()).map_err(|e| submit_err(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "lead appended");
        Ok(())
    }
}
