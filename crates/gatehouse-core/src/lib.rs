//! Gatehouse core.
//!
//! Sans-IO access control for gated downloads. A visitor unlocks every gated
//! resource at once by submitting a contact form; the unlock is persisted in a
//! visitor-scoped store for a fixed window and broadcast to every resource
//! widget on the page.
//!
//! # Architecture
//!
//! ```text
//! ResourceWidget ──check/grant──▶ AccessController ──get/set──▶ Store
//!       ▲                               │
//!       └──────── UnlockEvent ◀── Broadcaster
//! ```
//!
//! # Components
//!
//! - [`AccessController`]: access check, grant, unlock subscriptions
//! - [`UnlockRecord`]: persisted grant timestamp and expiry rule
//! - [`Store`]: key/value persistence ([`MemoryStore`], [`ChaoticStore`])
//! - [`Broadcaster`]: zero-buffer unlock fan-out
//! - [`ResourceWidget`]: per-resource display state machine
//! - [`UnlockForm`], [`ContactInfo`]: caller-side form validation
//! - [`ResourceCatalog`], [`Viewer`]: resource descriptors and URL
//!   normalization
//! - [`Environment`]: time source (deterministic in tests)

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod broadcast;
pub mod config;
pub mod contact;
pub mod controller;
pub mod env;
pub mod lead;
pub mod record;
pub mod resource;
pub mod store;
pub mod viewer;
pub mod widget;

pub use broadcast::{Broadcaster, SubscriberId, Subscription, UnlockEvent};
pub use config::{ControllerConfig, DEFAULT_RECORD_KEY, DEFAULT_UNLOCK_DURATION};
pub use contact::{ContactInfo, UnlockForm, ValidationError};
pub use controller::{AccessController, GrantOutcome};
pub use env::Environment;
pub use lead::{LeadError, LeadSink, MemoryLeadSink};
pub use record::{RecordError, UnlockRecord};
pub use resource::{CatalogError, DownloadableResource, ResourceCatalog};
pub use store::{ChaoticStore, MemoryStore, Store, StoreError};
pub use url::Url;
pub use viewer::{Viewer, ViewerError};
pub use widget::{LogLevel, ResourceWidget, WidgetAction, WidgetError, WidgetEvent, WidgetState};
