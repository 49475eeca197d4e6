//! Model widget state machine.
//!
//! Tracks only what the page can observe: whether the resource is gated, the
//! last access value the widget saw, and whether its form is showing.

use gatehouse_core::WidgetState;

use super::operation::{OperationError, OperationResult};

/// Model widget state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelWidget {
    gated: bool,
    /// Access value observed at mount, on the last click, or on the last
    /// unlock broadcast.
    seen_unlocked: bool,
    form_open: bool,
}

impl ModelWidget {
    /// Mount a widget that observes `unlocked` as current access.
    pub fn mount(gated: bool, unlocked: bool) -> Self {
        Self { gated, seen_unlocked: unlocked, form_open: false }
    }

    /// Whether the widget's resource is gated.
    pub fn is_gated(&self) -> bool {
        self.gated
    }

    /// Whether the unlock form is showing.
    pub fn is_form_open(&self) -> bool {
        self.form_open
    }

    /// Displayed state.
    pub fn state(&self) -> WidgetState {
        if self.form_open {
            WidgetState::FormOpen
        } else if self.opens_directly() {
            WidgetState::Unlocked
        } else {
            WidgetState::Locked
        }
    }

    /// Click with `unlocked` as the current access value.
    pub fn click(&mut self, unlocked: bool) -> OperationResult {
        if self.gated {
            self.seen_unlocked = unlocked;
        }

        if self.opens_directly() {
            return OperationResult::Opened;
        }

        self.form_open = true;
        OperationResult::FormShown
    }

    /// Unlock broadcast observed with `unlocked` as the current access value.
    pub fn notify(&mut self, unlocked: bool) {
        self.seen_unlocked = unlocked;
    }

    /// Close the form.
    pub fn close_form(&mut self) -> OperationResult {
        if !self.form_open {
            return OperationResult::Error(OperationError::FormNotOpen);
        }
        self.form_open = false;
        OperationResult::Ok
    }

    /// Form accepted: hide it.
    pub fn form_submitted(&mut self) {
        self.form_open = false;
    }

    fn opens_directly(&self) -> bool {
        !self.gated || self.seen_unlocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_click_opens_form() {
        let mut widget = ModelWidget::mount(true, false);
        assert_eq!(widget.click(false), OperationResult::FormShown);
        assert_eq!(widget.state(), WidgetState::FormOpen);
        assert_eq!(widget.close_form(), OperationResult::Ok);
        assert_eq!(widget.state(), WidgetState::Locked);
    }

    #[test]
    fn ungated_ignores_access() {
        let mut widget = ModelWidget::mount(false, false);
        assert_eq!(widget.click(false), OperationResult::Opened);
        assert_eq!(widget.state(), WidgetState::Unlocked);
    }

    #[test]
    fn notify_unlocks() {
        let mut widget = ModelWidget::mount(true, false);
        widget.notify(true);
        assert_eq!(widget.state(), WidgetState::Unlocked);
    }
}
