//! Resource display widget.
//!
//! One widget per downloadable resource on a page. The widget is a pure state
//! machine in the same style as the rest of the crate: it receives
//! [`WidgetEvent`]s from the UI and returns [`WidgetAction`]s for the caller to
//! perform. It never renders or opens anything itself.
//!
//! # Lifecycle
//!
//! 1. [`ResourceWidget::mount`] reads access once and subscribes to unlocks.
//! 2. Any grant on the page flips every mounted widget to unlocked through the
//!    subscription, without reload or polling.
//! 3. [`ResourceWidget::unmount`] (or drop) deregisters the subscription.
//!
//! A successful form submission grants access first, then submits the lead
//! and opens the resource. Lead failures are logged, never surfaced.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use url::Url;

use crate::{
    broadcast::Subscription,
    contact::{ContactInfo, UnlockForm},
    controller::{AccessController, GrantOutcome},
    env::Environment,
    lead::LeadSink,
    resource::DownloadableResource,
    store::Store,
    viewer::{Viewer, ViewerError},
};

/// What the widget currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    /// Lock icon; clicking opens the unlock form.
    Locked,
    /// Unlock form is showing.
    FormOpen,
    /// Open icon; clicking opens the resource.
    Unlocked,
}

/// Input from the UI.
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    /// Visitor clicked the resource.
    Click,
    /// Visitor submitted the unlock form.
    SubmitForm(ContactInfo),
    /// Visitor dismissed the unlock form.
    CloseForm,
}

/// Log severity for [`WidgetAction::Log`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Info,
    /// Degraded but recovered.
    Warn,
}

/// Output for the caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetAction {
    /// Show the unlock form.
    ShowUnlockForm,
    /// Hide the unlock form.
    HideUnlockForm,
    /// Show messages for missing fields.
    ShowValidationErrors(Vec<String>),
    /// Open the resource at this canonical URL.
    Open(Url),
    /// Emit a log line.
    Log {
        /// Severity.
        level: LogLevel,
        /// Message text.
        message: String,
    },
}

/// Errors from widget event handling.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// The resource URL cannot be opened.
    #[error("cannot open resource: {0}")]
    Viewer(#[from] ViewerError),

    /// Form event arrived while no form was showing.
    #[error("unlock form is not open")]
    FormNotOpen,
}

impl WidgetError {
    /// Returns true if the error indicates bad catalog data rather than a UI
    /// sequencing glitch.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Viewer(_) => true,
            Self::FormNotOpen => false,
        }
    }
}

/// Display widget for one [`DownloadableResource`].
pub struct ResourceWidget<E, S> {
    resource: DownloadableResource,
    controller: AccessController<E, S>,
    viewer: Viewer,
    form: UnlockForm,
    leads: Option<Arc<dyn LeadSink>>,
    /// Last observed access state; flipped by the unlock subscription.
    unlocked: Arc<AtomicBool>,
    form_open: bool,
    subscription: Option<Subscription>,
}

impl<E, S> std::fmt::Debug for ResourceWidget<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceWidget")
            .field("resource", &self.resource)
            .field("unlocked", &self.unlocked.load(Ordering::SeqCst))
            .field("form_open", &self.form_open)
            .finish_non_exhaustive()
    }
}

impl<E: Environment, S: Store + 'static> ResourceWidget<E, S> {
    /// Mount a widget: read access once and subscribe to unlocks.
    pub fn mount(
        resource: DownloadableResource,
        controller: AccessController<E, S>,
        viewer: Viewer,
    ) -> Self {
        let unlocked = Arc::new(AtomicBool::new(controller.check_access()));

        let flag = Arc::clone(&unlocked);
        let probe = controller.clone();
        let subscription = controller.on_unlock_changed(move |_| {
            flag.store(probe.check_access(), Ordering::SeqCst);
        });

        Self {
            resource,
            controller,
            viewer,
            form: UnlockForm::default(),
            leads: None,
            unlocked,
            form_open: false,
            subscription: Some(subscription),
        }
    }

    /// Use `form` to validate submissions.
    #[must_use]
    pub fn with_form(mut self, form: UnlockForm) -> Self {
        self.form = form;
        self
    }

    /// Forward validated contacts to `sink`.
    #[must_use]
    pub fn with_lead_sink(mut self, sink: Arc<dyn LeadSink>) -> Self {
        self.leads = Some(sink);
        self
    }

    /// Displayed resource.
    pub fn resource(&self) -> &DownloadableResource {
        &self.resource
    }

    /// Current display state.
    pub fn state(&self) -> WidgetState {
        if self.form_open {
            WidgetState::FormOpen
        } else if self.is_unlocked() {
            WidgetState::Unlocked
        } else {
            WidgetState::Locked
        }
    }

    /// Whether a click would open the resource directly.
    pub fn is_unlocked(&self) -> bool {
        !self.resource.gated || self.unlocked.load(Ordering::SeqCst)
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// Returns `WidgetError` if a click targets a resource URL that cannot be
    /// normalized or a form event arrives while no form is open. A submitted
    /// form always grants; an unusable URL then surfaces as a warning log.
    pub fn handle(&mut self, event: WidgetEvent) -> Result<Vec<WidgetAction>, WidgetError> {
        match event {
            WidgetEvent::Click => self.handle_click(),
            WidgetEvent::SubmitForm(contact) => self.handle_submit(&contact),
            WidgetEvent::CloseForm => self.handle_close(),
        }
    }

    /// Tear down: deregister the unlock subscription.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    fn handle_click(&mut self) -> Result<Vec<WidgetAction>, WidgetError> {
        if self.resource.gated {
            // The window may have lapsed since mount.
            self.unlocked.store(self.controller.check_access(), Ordering::SeqCst);
        }

        if self.is_unlocked() {
            return Ok(vec![WidgetAction::Open(self.viewer.normalize(&self.resource.target_url)?)]);
        }

        self.form_open = true;
        Ok(vec![WidgetAction::ShowUnlockForm])
    }

    fn handle_submit(&mut self, contact: &ContactInfo) -> Result<Vec<WidgetAction>, WidgetError> {
        if !self.form_open {
            return Err(WidgetError::FormNotOpen);
        }

        if let Err(e) = self.form.validate(contact) {
            return Ok(vec![WidgetAction::ShowValidationErrors(e.missing)]);
        }

        let mut actions = Vec::with_capacity(4);
        let outcome = self.controller.grant_access(contact);
        self.form_open = false;

        if outcome == GrantOutcome::SessionOnly {
            actions.push(WidgetAction::Log {
                level: LogLevel::Warn,
                message: "unlock not persisted; access lasts for this page only".to_owned(),
            });
        }

        if let Some(sink) = &self.leads {
            if let Err(e) = sink.submit(contact) {
                actions.push(WidgetAction::Log { level: LogLevel::Warn, message: e.to_string() });
            }
        }

        actions.push(WidgetAction::HideUnlockForm);

        // The grant already happened; a bad URL only affects this widget.
        match self.viewer.normalize(&self.resource.target_url) {
            Ok(url) => actions.push(WidgetAction::Open(url)),
            Err(e) => actions.push(WidgetAction::Log {
                level: LogLevel::Warn,
                message: WidgetError::from(e).to_string(),
            }),
        }

        actions.push(WidgetAction::Log {
            level: LogLevel::Info,
            message: format!("unlocked via {:?}", self.resource.title),
        });

        Ok(actions)
    }

    fn handle_close(&mut self) -> Result<Vec<WidgetAction>, WidgetError> {
        if !self.form_open {
            return Err(WidgetError::FormNotOpen);
        }
        self.form_open = false;
        Ok(vec![WidgetAction::HideUnlockForm])
    }
}
