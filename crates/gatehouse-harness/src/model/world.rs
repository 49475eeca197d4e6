//! Model world - one page, one visitor, one store.
//!
//! The world is the top-level container that manages the model state and
//! applies operations. It's the oracle against which the real controller and
//! widgets are verified.

use std::time::Duration;

use gatehouse_core::WidgetState;

use super::{
    operation::{Operation, OperationError, OperationResult, WidgetSlot},
    widget::ModelWidget,
};

const HOUR_MS: u64 = 60 * 60 * 1000;

/// Observable state for oracle comparison.
///
/// This is the subset of world state that can be compared against the real
/// implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Current clock reading.
    pub now_ms: u64,
    /// Controller's answer to "may the visitor open gated resources?".
    pub unlocked: bool,
    /// Expiry of current access, if any.
    pub unlocked_until: Option<u64>,
    /// Registered unlock callbacks.
    pub subscribers: usize,
    /// Displayed state per slot (`None` for an empty slot).
    pub widgets: Vec<Option<WidgetState>>,
}

/// Model world - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelWorld {
    now_ms: u64,
    window_ms: u64,
    /// Timestamp of the stored record. `None` when absent or corrupt.
    stored: Option<u64>,
    /// Grant held in memory after a failed write.
    session: Option<u64>,
    fail_writes: bool,
    widgets: Vec<Option<ModelWidget>>,
}

impl ModelWorld {
    /// Create a page with `num_slots` empty widget slots.
    pub fn new(num_slots: usize, window: Duration) -> Self {
        Self {
            now_ms: 0,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            stored: None,
            session: None,
            fail_writes: false,
            widgets: vec![None; num_slots],
        }
    }

    /// Number of widget slots.
    pub fn num_slots(&self) -> usize {
        self.widgets.len()
    }

    /// Widget in `slot`, if mounted.
    pub fn widget(&self, slot: WidgetSlot) -> Option<&ModelWidget> {
        self.widgets.get(usize::from(slot)).and_then(Option::as_ref)
    }

    /// Whether access is currently granted.
    pub fn is_unlocked(&self) -> bool {
        self.effective_grant().is_some()
    }

    /// Apply an operation and return the result.
    ///
    /// The result should match the real implementation's result.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        match op {
            Operation::Mount { slot, gated } => self.apply_mount(*slot, *gated),
            Operation::Unmount { slot } => match self.slot_mut(*slot).map(Option::take) {
                Ok(Some(_)) => OperationResult::Ok,
                Ok(None) => OperationResult::Error(OperationError::NoWidget),
                Err(e) => OperationResult::Error(e),
            },
            Operation::Click { slot } => {
                let unlocked = self.is_unlocked();
                match self.widget_mut(*slot) {
                    Ok(widget) => widget.click(unlocked),
                    Err(e) => OperationResult::Error(e),
                }
            },
            Operation::Submit { slot, complete } => self.apply_submit(*slot, *complete),
            Operation::CloseForm { slot } => match self.widget_mut(*slot) {
                Ok(widget) => widget.close_form(),
                Err(e) => OperationResult::Error(e),
            },
            Operation::AdvanceTime { hours } => {
                self.now_ms = self.now_ms.saturating_add(u64::from(*hours) * HOUR_MS);
                OperationResult::Ok
            },
            Operation::SetWriteFailure { fail } => {
                self.fail_writes = *fail;
                OperationResult::Ok
            },
            Operation::CorruptRecord => {
                self.stored = None;
                OperationResult::Ok
            },
            Operation::Reload => {
                self.widgets.iter_mut().for_each(|w| *w = None);
                self.session = None;
                OperationResult::Ok
            },
        }
    }

    /// Extract observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            now_ms: self.now_ms,
            unlocked: self.is_unlocked(),
            unlocked_until: self.effective_grant().map(|t| t.saturating_add(self.window_ms)),
            subscribers: self.widgets.iter().flatten().count(),
            widgets: self.widgets.iter().map(|w| w.as_ref().map(ModelWidget::state)).collect(),
        }
    }

    fn apply_mount(&mut self, slot: WidgetSlot, gated: bool) -> OperationResult {
        let unlocked = self.is_unlocked();
        match self.slot_mut(slot) {
            Ok(entry) if entry.is_none() => {
                *entry = Some(ModelWidget::mount(gated, unlocked));
                OperationResult::Ok
            },
            Ok(_) => OperationResult::Error(OperationError::SlotOccupied),
            Err(e) => OperationResult::Error(e),
        }
    }

    fn apply_submit(&mut self, slot: WidgetSlot, complete: bool) -> OperationResult {
        match self.widget_mut(slot) {
            Ok(widget) if !widget.is_form_open() => {
                return OperationResult::Error(OperationError::FormNotOpen);
            },
            Ok(_) => {},
            Err(e) => return OperationResult::Error(e),
        }

        if !complete {
            return OperationResult::ValidationFailed;
        }

        if self.fail_writes {
            self.session = Some(self.now_ms);
        } else {
            self.stored = Some(self.now_ms);
            self.session = None;
        }

        let unlocked = self.is_unlocked();
        for widget in self.widgets.iter_mut().flatten() {
            widget.notify(unlocked);
        }
        if let Ok(widget) = self.widget_mut(slot) {
            widget.form_submitted();
        }

        OperationResult::Opened
    }

    /// Newest grant still inside the window.
    fn effective_grant(&self) -> Option<u64> {
        let stored = self.stored.filter(|&t| self.is_valid(t));
        let session = self.session.filter(|&t| self.is_valid(t));
        stored.max(session)
    }

    fn is_valid(&self, granted_at: u64) -> bool {
        self.now_ms.checked_sub(granted_at).is_none_or(|age| age < self.window_ms)
    }

    fn slot_mut(&mut self, slot: WidgetSlot) -> Result<&mut Option<ModelWidget>, OperationError> {
        self.widgets.get_mut(usize::from(slot)).ok_or(OperationError::InvalidSlot)
    }

    fn widget_mut(&mut self, slot: WidgetSlot) -> Result<&mut ModelWidget, OperationError> {
        self.slot_mut(slot)?.as_mut().ok_or(OperationError::NoWidget)
    }
}
