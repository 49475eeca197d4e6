//! Fuzz target for the access controller and its widgets
//!
//! Drives one page through arbitrary operation sequences and compares the
//! real controller against the reference model after every step.
//!
//! # Strategy
//!
//! - Operations: mount, click, submit, close, unmount on a few widget slots
//! - Time: arbitrary clock advances across the window boundary
//! - Faults: store write failures and corrupted records
//! - Lifecycle: reloads that drop every widget and the session grant
//!
//! # Invariants
//!
//! - Controller access matches the model after every operation
//! - A completed submission unlocks every mounted widget
//! - Subscriber count equals the number of mounted widgets
//! - NEVER panic on any sequence

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use gatehouse_core::{
    AccessController, ChaoticStore, ContactInfo, DEFAULT_RECORD_KEY, DownloadableResource,
    MemoryStore, ResourceWidget, Store, Viewer, WidgetAction, WidgetEvent,
};
use gatehouse_harness::{ModelWorld, Operation, SimEnv};
use libfuzzer_sys::fuzz_target;

const SLOTS: usize = 3;
const WINDOW: Duration = Duration::from_secs(14 * 24 * 60 * 60);

type Widget = ResourceWidget<SimEnv, ChaoticStore<MemoryStore>>;

#[derive(Debug, Arbitrary)]
struct Input {
    ops: Vec<Operation>,
}

fn contact(complete: bool) -> ContactInfo {
    let contact = ContactInfo::new().with("name", "A").with("email", "a@x.com").with("company", "X");
    if complete { contact.with("phone", "123") } else { contact }
}

fuzz_target!(|input: Input| {
    let env = SimEnv::new();
    let store = ChaoticStore::new(MemoryStore::new());
    let viewer = Viewer::parse("https://assets.example.com/").expect("static base URL");
    let mut controller = AccessController::new(env.clone(), store.clone());
    let mut widgets: Vec<Option<Widget>> = (0..SLOTS).map(|_| None).collect();
    let mut model = ModelWorld::new(SLOTS, WINDOW);

    for op in input.ops.into_iter().take(256) {
        let op = op.clamp_slot(SLOTS);
        model.apply(&op);

        let mut granted = false;
        match op {
            Operation::Mount { slot, gated } => {
                let entry = &mut widgets[usize::from(slot)];
                if entry.is_none() {
                    let resource = if gated {
                        DownloadableResource::gated("Guide", "/files/guide.pdf")
                    } else {
                        DownloadableResource::open("Care", "/files/care.pdf")
                    };
                    *entry = Some(ResourceWidget::mount(resource, controller.clone(), viewer.clone()));
                }
            },
            Operation::Unmount { slot } => {
                if let Some(widget) = widgets[usize::from(slot)].take() {
                    widget.unmount();
                }
            },
            Operation::Click { slot } => {
                if let Some(widget) = widgets[usize::from(slot)].as_mut() {
                    let _ = widget.handle(WidgetEvent::Click);
                }
            },
            Operation::Submit { slot, complete } => {
                if let Some(widget) = widgets[usize::from(slot)].as_mut() {
                    if let Ok(actions) = widget.handle(WidgetEvent::SubmitForm(contact(complete))) {
                        granted = actions.iter().any(|a| matches!(a, WidgetAction::Open(_)));
                    }
                }
            },
            Operation::CloseForm { slot } => {
                if let Some(widget) = widgets[usize::from(slot)].as_mut() {
                    let _ = widget.handle(WidgetEvent::CloseForm);
                }
            },
            Operation::AdvanceTime { hours } => env.advance(Duration::from_secs(u64::from(hours) * 3600)),
            Operation::SetWriteFailure { fail } => store.set_fail_writes(fail),
            Operation::CorruptRecord => {
                let _ = store.inner().set(DEFAULT_RECORD_KEY, "not a record");
            },
            Operation::Reload => {
                widgets.iter_mut().for_each(|w| *w = None);
                controller = AccessController::new(env.clone(), store.clone());
            },
        }

        assert_eq!(controller.check_access(), model.is_unlocked());
        assert_eq!(controller.subscriber_count(), widgets.iter().flatten().count());

        if granted {
            assert!(controller.check_access());
            assert!(widgets.iter().flatten().all(Widget::is_unlocked));
        }
    }
});
