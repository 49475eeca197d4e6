//! Lead capture.
//!
//! Submitting the unlock form also hands the visitor's details to sales. That
//! hand-off is a side effect: access is granted before the lead is submitted
//! and a failed submission never revokes or delays it.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::contact::ContactInfo;

/// Errors from lead submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeadError {
    /// Destination rejected or could not receive the lead.
    #[error("lead submission failed: {reason}")]
    Submit {
        /// Description of the failure.
        reason: String,
    },
}

/// Destination for captured contact details.
pub trait LeadSink: Send + Sync {
    /// Record one submitted contact.
    fn submit(&self, contact: &ContactInfo) -> Result<(), LeadError>;
}

impl<L: LeadSink + ?Sized> LeadSink for Arc<L> {
    fn submit(&self, contact: &ContactInfo) -> Result<(), LeadError> {
        (**self).submit(contact)
    }
}

/// In-memory sink; clones share the captured list.
#[derive(Debug, Clone, Default)]
pub struct MemoryLeadSink {
    leads: Arc<Mutex<Vec<ContactInfo>>>,
    reject: bool,
}

impl MemoryLeadSink {
    /// Sink that accepts every lead.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every lead.
    pub fn rejecting() -> Self {
        Self { reject: true, ..Self::default() }
    }

    /// Leads captured so far.
    pub fn leads(&self) -> Vec<ContactInfo> {
        self.leads.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LeadSink for MemoryLeadSink {
    fn submit(&self, contact: &ContactInfo) -> Result<(), LeadError> {
        if self.reject {
            return Err(LeadError::Submit { reason: "sink rejects all leads".to_owned() });
        }
        self.leads.lock().unwrap_or_else(PoisonError::into_inner).push(contact.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_captures() {
        let sink = MemoryLeadSink::new();
        let shared = sink.clone();
        sink.submit(&ContactInfo::new().with("email", "a@x.com")).expect("submit");
        assert_eq!(shared.leads().len(), 1);
        assert_eq!(shared.leads()[0].email(), Some("a@x.com"));
    }

    #[test]
    fn rejecting_sink_fails() {
        let sink = MemoryLeadSink::rejecting();
        assert!(sink.submit(&ContactInfo::new()).is_err());
        assert!(sink.leads().is_empty());
    }
}
