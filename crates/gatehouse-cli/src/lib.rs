//! Gatehouse runtime.
//!
//! This crate provides the production pieces around `gatehouse-core`:
//! - `SystemEnv`: wall-clock time
//! - `FileStore`: durable key/value file standing in for browser storage
//! - `JsonlLeadSink`: append-only lead log
//! - `Runtime`: the operations behind the `gatehouse` binary
//!
//! ## Architecture
//!
//! ```text
//! gatehouse (bin)
//!   └─ Runtime
//!        ├─ AccessController<SystemEnv, FileStore>
//!        ├─ Viewer            (URL normalization)
//!        └─ JsonlLeadSink     (optional lead log)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file_store;
mod lead_log;
mod system_env;

use std::{fmt, fmt::Write as _, path::PathBuf, sync::Arc};

pub use error::CliError;
pub use file_store::FileStore;
use gatehouse_core::{
    AccessController, ContactInfo, ControllerConfig, Environment, GrantOutcome, LeadSink,
    ResourceCatalog, ResourceWidget, UnlockForm, Url, Viewer, WidgetState,
};
pub use lead_log::JsonlLeadSink;
pub use system_env::SystemEnv;

/// Default asset host for relative resource paths.
pub const DEFAULT_ASSET_BASE: &str = "https://assets.example.com/";

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Store file path
    pub store_path: PathBuf,
    /// Lead log path (leads are discarded when unset)
    pub leads_path: Option<PathBuf>,
    /// Asset host for relative resource paths
    pub asset_base: String,
    /// Access controller configuration (window, record key)
    pub controller: ControllerConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("gatehouse-store.json"),
            leads_path: None,
            asset_base: DEFAULT_ASSET_BASE.to_string(),
            controller: ControllerConfig::default(),
        }
    }
}

/// Access state as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessStatus {
    /// No valid grant.
    Locked,
    /// Valid grant expiring at the given epoch milliseconds.
    Unlocked {
        /// First instant at which access lapses.
        until: u64,
    },
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Unlocked { until } => write!(f, "unlocked until {}", until),
        }
    }
}

/// Operations behind the `gatehouse` binary.
pub struct Runtime<E: Environment> {
    controller: AccessController<E, FileStore>,
    viewer: Viewer,
    leads: Option<Arc<dyn LeadSink>>,
}

impl<E: Environment> Runtime<E> {
    /// Build a runtime from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the asset host is not a valid URL.
    pub fn open(config: RuntimeConfig, env: E) -> Result<Self, CliError> {
        let viewer = Viewer::parse(&config.asset_base)
            .map_err(|e| CliError::Config(format!("asset base: {}", e)))?;

        let leads = config
            .leads_path
            .map(|path| Arc::new(JsonlLeadSink::new(path, env.clone())) as Arc<dyn LeadSink>);

        let store = FileStore::open(config.store_path);
        let controller = AccessController::with_config(env, store, config.controller);

        Ok(Self { controller, viewer, leads })
    }

    /// Underlying access controller.
    pub fn controller(&self) -> &AccessController<E, FileStore> {
        &self.controller
    }

    /// Current access state.
    pub fn status(&self) -> AccessStatus {
        match self.controller.unlocked_until() {
            Some(until) => AccessStatus::Unlocked { until },
            None => AccessStatus::Locked,
        }
    }

    /// Validate `contact` against `form`, grant access and record the lead.
    ///
    /// Lead capture failures are logged and do not fail the grant.
    pub fn grant(
        &self,
        contact: &ContactInfo,
        form: &UnlockForm,
    ) -> Result<GrantOutcome, CliError> {
        form.validate(contact)?;

        let outcome = self.controller.grant_access(contact);

        if let Some(sink) = &self.leads {
            if let Err(e) = sink.submit(contact) {
                tracing::warn!("lead not recorded: {}", e);
            }
        }

        Ok(outcome)
    }

    /// Canonical URL for `raw`, refusing gated resources while locked.
    pub fn open_url(&self, raw: &str, gated: bool) -> Result<Url, CliError> {
        if gated && !self.controller.check_access() {
            return Err(CliError::Locked);
        }
        Ok(self.viewer.normalize(raw)?)
    }

    /// Render `catalog` as one line per resource, grouped by category.
    pub fn catalog_listing(&self, catalog: &ResourceCatalog) -> String {
        let mut out = String::new();

        for category in catalog.categories() {
            let _ = writeln!(out, "{}", category);

            for resource in catalog.resources(category) {
                let widget = ResourceWidget::mount(
                    resource.clone(),
                    self.controller.clone(),
                    self.viewer.clone(),
                );
                let marker = match widget.state() {
                    WidgetState::Unlocked => "open",
                    WidgetState::Locked | WidgetState::FormOpen => "locked",
                };
                let target = self
                    .viewer
                    .normalize(&resource.target_url)
                    .map_or_else(|e| format!("<{}>", e), |url| url.to_string());

                let _ = writeln!(out, "  [{}] {} -> {}", marker, resource.title, target);
                widget.unmount();
            }
        }

        out
    }
}
